//! Distance in a kernel-induced feature space

use crate::core::SparseVector;
use crate::kernel::KernelTrick;
use crate::metric::DistanceMetric;

/// `d(a,b) = ‖φ(a) − φ(b)‖ = sqrt(k(a,a) + k(b,b) − 2k(a,b))`
///
/// A norm distance in the feature space, so it satisfies the triangle
/// inequality for any positive semi-definite kernel. The acceleration cache
/// holds `k(v,v)` for every stored vector.
#[derive(Debug, Clone)]
pub struct KernelDistance<K: KernelTrick> {
    kernel: K,
}

impl<K: KernelTrick> KernelDistance<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    #[inline]
    fn combine(k_aa: f64, k_bb: f64, k_ab: f64) -> f64 {
        (k_aa + k_bb - 2.0 * k_ab).max(0.0).sqrt()
    }
}

impl<K: KernelTrick> DistanceMetric for KernelDistance<K> {
    fn dist(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        Self::combine(
            self.kernel.eval(a, a),
            self.kernel.eval(b, b),
            self.kernel.eval(a, b),
        )
    }

    fn is_subadditive(&self) -> bool {
        true
    }

    fn supports_acceleration(&self) -> bool {
        true
    }

    fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        vec![self.kernel.eval(x, x)]
    }

    fn dist_pair(&self, i: usize, j: usize, vecs: &[SparseVector], cache: &[f64]) -> f64 {
        match (cache.get(i), cache.get(j)) {
            (Some(&a), Some(&b)) => Self::combine(a, b, self.kernel.eval(&vecs[i], &vecs[j])),
            _ => self.dist(&vecs[i], &vecs[j]),
        }
    }

    fn dist_query(
        &self,
        i: usize,
        q: &SparseVector,
        qi: &[f64],
        vecs: &[SparseVector],
        cache: &[f64],
    ) -> f64 {
        match (cache.get(i), qi.first()) {
            (Some(&a), Some(&b)) => Self::combine(a, b, self.kernel.eval(&vecs[i], q)),
            _ => self.dist(&vecs[i], q),
        }
    }

    fn name(&self) -> String {
        format!("kernel[{}]", self.kernel.name())
    }
}
