//! Bounded memoization of function evaluations.
//!
//! Refinement re-evaluates the same x positions across iterations, and an
//! interactive client often requests the same view repeatedly while
//! dragging a slider back and forth. The cache keys on the exact bit
//! patterns of the argument tuple, so two arguments are equal only if the
//! evaluations would be identical.

use std::collections::HashMap;

/// Upper bound on memoized entries held by one cache.
///
/// Once full, further evaluations are computed but not retained, keeping
/// memory bounded under repeated refinement of the same region.
pub const EVAL_CACHE_CAPACITY: usize = 40_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EvalKey {
    x: u64,
    params: Vec<u64>,
}

/// A bounded memo map for `(x, parameters) -> y` evaluations.
#[derive(Debug, Clone, Default)]
pub struct EvalCache {
    entries: HashMap<EvalKey, f64>,
}

impl EvalCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized evaluations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all memoized evaluations. Called when the bound function
    /// changes, since old entries would answer for the wrong function.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn get(&self, x: f64, param_bits: &[u64]) -> Option<f64> {
        self.entries
            .get(&EvalKey {
                x: x.to_bits(),
                params: param_bits.to_vec(),
            })
            .copied()
    }

    pub(crate) fn insert(&mut self, x: f64, param_bits: &[u64], y: f64) {
        if self.entries.len() < EVAL_CACHE_CAPACITY {
            self.entries.insert(
                EvalKey {
                    x: x.to_bits(),
                    params: param_bits.to_vec(),
                },
                y,
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_exact_arguments() {
        let mut cache = EvalCache::new();
        cache.insert(1.5, &[2.0f64.to_bits()], 42.0);

        assert_eq!(cache.get(1.5, &[2.0f64.to_bits()]), Some(42.0));
        // A different parameter tuple is a different key.
        assert_eq!(cache.get(1.5, &[3.0f64.to_bits()]), None);
        // So is a different x, even one that compares close.
        assert_eq!(cache.get(1.5 + 1e-12, &[2.0f64.to_bits()]), None);
    }

    #[test]
    fn stops_retaining_at_capacity() {
        let mut cache = EvalCache::new();
        for i in 0..(EVAL_CACHE_CAPACITY + 100) {
            cache.insert(i as f64, &[], 0.0);
        }
        assert_eq!(cache.len(), EVAL_CACHE_CAPACITY);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = EvalCache::new();
        cache.insert(0.0, &[], 1.0);
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
    }
}
