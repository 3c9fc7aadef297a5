//! Kernel trick trait definition

use crate::core::SparseVector;

/// Kernel function trait
///
/// A kernel function K(x, y) must be positive semi-definite; nothing here
/// checks that. Beyond plain evaluation the trait exposes two optional caches:
///
/// * an *acceleration cache*, one scalar per stored vector, computed once for
///   a basis and extended as vectors are appended;
/// * *query info*, computed once per query vector and reused for every
///   evaluation against the same basis.
///
/// The indexed evaluation methods must return exactly what [`eval`] would for
/// the same pair of vectors.
///
/// [`eval`]: KernelTrick::eval
pub trait KernelTrick: Send + Sync {
    /// Compute kernel value K(x, y)
    fn eval(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// Whether the caches below carry any information for this kernel
    fn supports_acceleration(&self) -> bool {
        false
    }

    /// Per-query cached values for `x`
    fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        let _ = x;
        Vec::new()
    }

    /// Acceleration cache for a whole list of vectors
    fn accel_cache(&self, vecs: &[SparseVector]) -> Vec<f64> {
        let mut cache = Vec::with_capacity(vecs.len());
        for v in vecs {
            self.extend_accel_cache(v, &mut cache);
        }
        cache
    }

    /// Append the cache entry for a newly stored vector
    fn extend_accel_cache(&self, x: &SparseVector, cache: &mut Vec<f64>) {
        if self.supports_acceleration() {
            cache.extend(self.query_info(x));
        }
    }

    /// K(vecs\[i\], x) using the cached values
    fn eval_query(
        &self,
        i: usize,
        x: &SparseVector,
        qi: &[f64],
        vecs: &[SparseVector],
        cache: &[f64],
    ) -> f64 {
        let _ = (qi, cache);
        self.eval(&vecs[i], x)
    }

    /// K(vecs\[i\], vecs\[j\]) using the cached values
    fn eval_pair(&self, i: usize, j: usize, vecs: &[SparseVector], cache: &[f64]) -> f64 {
        let _ = cache;
        self.eval(&vecs[i], &vecs[j])
    }

    /// Gaussian width when this is an RBF kernel `exp(-γ‖x−y‖²)`
    ///
    /// Budget merging relies on `k(m, z) = k(m, n)^{(1-h)²}` for points on the
    /// segment between `m` and `n`, which only holds for this family.
    fn rbf_gamma(&self) -> Option<f64> {
        None
    }

    /// Short human-readable name
    fn name(&self) -> String;
}

impl<K: KernelTrick + ?Sized> KernelTrick for std::sync::Arc<K> {
    fn eval(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (**self).eval(x, y)
    }

    fn supports_acceleration(&self) -> bool {
        (**self).supports_acceleration()
    }

    fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        (**self).query_info(x)
    }

    fn accel_cache(&self, vecs: &[SparseVector]) -> Vec<f64> {
        (**self).accel_cache(vecs)
    }

    fn extend_accel_cache(&self, x: &SparseVector, cache: &mut Vec<f64>) {
        (**self).extend_accel_cache(x, cache)
    }

    fn eval_query(
        &self,
        i: usize,
        x: &SparseVector,
        qi: &[f64],
        vecs: &[SparseVector],
        cache: &[f64],
    ) -> f64 {
        (**self).eval_query(i, x, qi, vecs, cache)
    }

    fn eval_pair(&self, i: usize, j: usize, vecs: &[SparseVector], cache: &[f64]) -> f64 {
        (**self).eval_pair(i, j, vecs, cache)
    }

    fn rbf_gamma(&self) -> Option<f64> {
        (**self).rbf_gamma()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}
