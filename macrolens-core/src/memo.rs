//! Memoized derivations keyed by input identity.
//!
//! Each derived value (range cache, Z-score column, ROC column, lag result)
//! is keyed by a BLAKE3 fingerprint of everything it depends on: the axis
//! identity, the input values and the parameters. A key is computed once and
//! never overwritten; a refresh that changes any input produces a new key.

use crate::domain::{AxisId, Series};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Content fingerprint of a derivation's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn builder(tag: &str) -> FingerprintBuilder {
        let mut b = FingerprintBuilder {
            hasher: blake3::Hasher::new(),
        };
        b.hasher.update(tag.as_bytes());
        b.hasher.update(&[0]);
        b
    }

    /// Fingerprint of a series' values and the axis it sits on.
    pub fn of_series(series: &Series) -> Self {
        Self::builder("series")
            .axis(series.axis.id())
            .values(&series.values)
            .finish()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

pub struct FingerprintBuilder {
    hasher: blake3::Hasher,
}

impl FingerprintBuilder {
    pub fn str(mut self, s: &str) -> Self {
        self.hasher.update(&(s.len() as u64).to_le_bytes());
        self.hasher.update(s.as_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.hasher.update(&v.to_le_bytes());
        self
    }

    pub fn i64(mut self, v: i64) -> Self {
        self.hasher.update(&v.to_le_bytes());
        self
    }

    pub fn axis(mut self, id: AxisId) -> Self {
        self.hasher.update(&id.0);
        self
    }

    pub fn fingerprint(mut self, fp: Fingerprint) -> Self {
        self.hasher.update(&fp.0);
        self
    }

    /// Missing entries hash differently from every number, zero included.
    pub fn values(mut self, values: &[Option<f64>]) -> Self {
        self.hasher.update(&(values.len() as u64).to_le_bytes());
        for v in values {
            match v {
                Some(x) => {
                    self.hasher.update(&[1]);
                    self.hasher.update(&x.to_bits().to_le_bytes());
                }
                None => {
                    self.hasher.update(&[0]);
                }
            }
        }
        self
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(*self.hasher.finalize().as_bytes())
    }
}

/// Write-once table of derived values.
///
/// When the table reaches capacity it is emptied before the next insert;
/// entries from past snapshots are never read again once inputs change.
#[derive(Debug)]
pub struct MemoTable<V> {
    name: &'static str,
    entries: HashMap<Fingerprint, Arc<V>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<V> MemoTable<V> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&self, key: &Fingerprint) -> Option<Arc<V>> {
        self.entries.get(key).cloned()
    }

    pub fn get_or_insert_with<F>(&mut self, key: Fingerprint, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_insert_with::<std::convert::Infallible, _>(key, || Ok(compute())) {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }

    pub fn get_or_try_insert_with<E, F>(&mut self, key: Fingerprint, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(v) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(v));
        }
        self.misses += 1;
        let value = Arc::new(compute()?);
        if self.entries.len() >= self.capacity {
            tracing::debug!(table = self.name, entries = self.entries.len(), "memo table full, clearing");
            self.entries.clear();
        }
        tracing::debug!(table = self.name, key = %key, "memo miss");
        self.entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MemoStats {
        MemoStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Fingerprint {
        Fingerprint::builder("test").str(s).finish()
    }

    #[test]
    fn computes_once_per_key() {
        let mut table = MemoTable::new("t", 8);
        let mut calls = 0;
        let a = table.get_or_insert_with(key("a"), || {
            calls += 1;
            1
        });
        let b = table.get_or_insert_with(key("a"), || {
            calls += 1;
            2
        });
        assert_eq!((*a, *b), (1, 1));
        assert_eq!(calls, 1);
        assert_eq!(table.stats(), MemoStats { entries: 1, hits: 1, misses: 1 });
    }

    #[test]
    fn errors_are_not_cached() {
        let mut table: MemoTable<i32> = MemoTable::new("t", 8);
        let r: Result<_, &str> = table.get_or_try_insert_with(key("a"), || Err("boom"));
        assert!(r.is_err());
        assert!(table.is_empty());
        let r: Result<_, &str> = table.get_or_try_insert_with(key("a"), || Ok(5));
        assert_eq!(*r.unwrap(), 5);
    }

    #[test]
    fn clears_when_full() {
        let mut table = MemoTable::new("t", 2);
        table.get_or_insert_with(key("a"), || 1);
        table.get_or_insert_with(key("b"), || 2);
        table.get_or_insert_with(key("c"), || 3);
        assert_eq!(table.len(), 1);
        assert!(table.get(&key("c")).is_some());
    }

    #[test]
    fn null_and_zero_fingerprint_differently() {
        let a = Fingerprint::builder("v").values(&[None]).finish();
        let b = Fingerprint::builder("v").values(&[Some(0.0)]).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let a = Fingerprint::builder("s").str("ab").str("c").finish();
        let b = Fingerprint::builder("s").str("a").str("bc").finish();
        assert_ne!(a, b);
    }
}
