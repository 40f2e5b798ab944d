//! Z-score normalization.
//!
//! Mean and population standard deviation are taken over valid entries only;
//! missing entries stay missing. With fewer than two valid entries, or zero
//! deviation, every valid entry maps to 0.

use crate::domain::valid;

pub fn zscore(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().filter_map(|v| valid(*v)).collect();
    let count = present.len();

    // Exact check: the mean of a constant that is not representable (0.1)
    // leaves rounding-level deviations that would normalize to ±1.
    if count < 2 || present.iter().all(|x| *x == present[0]) {
        return values.iter().map(|v| valid(*v).map(|_| 0.0)).collect();
    }

    let n = count as f64;
    let mean = present.iter().sum::<f64>() / n;
    let variance = present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    if std == 0.0 || !std.is_finite() {
        return values.iter().map(|v| valid(*v).map(|_| 0.0)).collect();
    }

    values
        .iter()
        .map(|v| valid(*v).map(|x| (x - mean) / std))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::assert_approx;

    #[test]
    fn zscore_one_to_five() {
        let z = zscore(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]);
        let s = 2.0_f64.sqrt();
        assert_approx(z[0].unwrap(), -2.0 / s, 1e-12);
        assert_approx(z[0].unwrap(), -1.4142, 1e-4);
        assert_approx(z[2].unwrap(), 0.0, 1e-12);
        assert_approx(z[4].unwrap(), 1.4142, 1e-4);
    }

    #[test]
    fn zscore_ignores_nulls_instead_of_zero_filling() {
        let z = zscore(&[Some(1.0), None, Some(3.0)]);
        // mean 2, std 1 -> -1, None, 1
        assert_eq!(z[1], None);
        assert_approx(z[0].unwrap(), -1.0, 1e-12);
        assert_approx(z[2].unwrap(), 1.0, 1e-12);
    }

    #[test]
    fn zscore_constant_series_is_zero() {
        let z = zscore(&[Some(7.0), Some(7.0), None, Some(7.0)]);
        assert_eq!(z, vec![Some(0.0), Some(0.0), None, Some(0.0)]);
    }

    #[test]
    fn zscore_inexact_constant_is_zero() {
        assert_eq!(zscore(&[Some(0.1); 3]), vec![Some(0.0); 3]);
        let z = zscore(&[Some(-266509.7805470141); 6]);
        assert!(z.iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn zscore_single_value_is_zero() {
        assert_eq!(zscore(&[None, Some(3.0)]), vec![None, Some(0.0)]);
        assert!(zscore(&[]).is_empty());
    }

    #[test]
    fn zscore_treats_nan_as_missing() {
        let z = zscore(&[Some(1.0), Some(f64::NAN), Some(3.0)]);
        assert_eq!(z[1], None);
    }
}
