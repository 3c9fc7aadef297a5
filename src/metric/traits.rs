//! Distance metric trait definition

use crate::core::SparseVector;

/// Distance metric trait
///
/// Mirrors [`KernelTrick`](crate::kernel::KernelTrick): a plain `dist`, plus
/// an optional acceleration cache (one scalar per stored vector) and per-query
/// info so collections can avoid recomputing norms. The indexed variants must
/// agree with `dist` for the same vectors.
pub trait DistanceMetric: Send + Sync {
    /// Distance between two vectors
    fn dist(&self, a: &SparseVector, b: &SparseVector) -> f64;

    /// Whether `d(a,c) <= d(a,b) + d(b,c)` holds for every triple
    ///
    /// Metric trees prune with the triangle inequality and refuse metrics that
    /// return `false` here.
    fn is_subadditive(&self) -> bool;

    /// Whether the caches below carry any information for this metric
    fn supports_acceleration(&self) -> bool {
        false
    }

    /// Per-query cached values for `x`
    fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        let _ = x;
        Vec::new()
    }

    /// Acceleration cache for a list of vectors
    fn accel_cache(&self, vecs: &[SparseVector]) -> Vec<f64> {
        if !self.supports_acceleration() {
            return Vec::new();
        }
        vecs.iter().flat_map(|v| self.query_info(v)).collect()
    }

    /// d(vecs\[i\], vecs\[j\]) using the cached values
    fn dist_pair(&self, i: usize, j: usize, vecs: &[SparseVector], cache: &[f64]) -> f64 {
        let _ = cache;
        self.dist(&vecs[i], &vecs[j])
    }

    /// d(vecs\[i\], q) using the cached values
    fn dist_query(
        &self,
        i: usize,
        q: &SparseVector,
        qi: &[f64],
        vecs: &[SparseVector],
        cache: &[f64],
    ) -> f64 {
        let _ = (qi, cache);
        self.dist(&vecs[i], q)
    }

    /// Short human-readable name
    fn name(&self) -> String;
}
