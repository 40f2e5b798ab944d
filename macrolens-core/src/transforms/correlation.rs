//! Pearson correlation over pairwise-valid observations.

use crate::domain::valid;

/// Pearson correlation of `xs` and `ys`.
///
/// Only indices where both values are valid contribute. Returns 0 for
/// mismatched lengths, fewer than two pairs, or a zero-variance side.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    if xs.len() != ys.len() {
        tracing::debug!(xs = xs.len(), ys = ys.len(), "pearson: length mismatch");
        return 0.0;
    }
    pearson_pairs(
        xs.iter()
            .zip(ys)
            .filter_map(|(x, y)| Some((valid(*x)?, valid(*y)?))),
    )
    .0
}

/// Pearson correlation over an iterator of pairs, with the pair count.
///
/// Uses centered sums (mean first, second pass for co-moments).
pub(crate) fn pearson_pairs<I>(pairs: I) -> (f64, usize)
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let pairs: Vec<(f64, f64)> = pairs.into_iter().collect();
    let n = pairs.len();
    if n < 2 {
        return (0.0, n);
    }
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|p| p.0 == x0) || pairs.iter().all(|p| p.1 == y0) {
        return (0.0, n);
    }

    let nf = n as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return (0.0, n);
    }
    let r = (sxy / denom).clamp(-1.0, 1.0);
    (if r.is_finite() { r } else { 0.0 }, n)
}
