//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-γ * ||x - y||²)
//! where γ (gamma) is a hyperparameter that controls the kernel width.

use crate::core::SparseVector;
use crate::kernel::KernelTrick;

/// RBF (Radial Basis Function) kernel: K(x, y) = exp(-γ * ||x - y||²)
///
/// The acceleration cache stores ||v||² for every basis vector and the query
/// info holds ||x||², so each evaluation against a basis costs one sparse dot
/// product:
///
/// ||x - y||² = ||x||² + ||y||² - 2 x·y
///
/// This is the only kernel family that supports merge-based budget
/// maintenance.
#[derive(Debug, Clone, Copy)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// Create a new RBF kernel with specified gamma parameter
    ///
    /// # Panics
    /// Panics if gamma is not positive
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self { gamma }
    }

    /// Create RBF kernel with gamma = 1.0 / n_features
    pub fn with_auto_gamma(n_features: usize) -> Self {
        assert!(n_features > 0, "Number of features must be positive");
        Self::new(1.0 / n_features as f64)
    }

    /// Create an RBF kernel from the Gaussian width σ, γ = 1 / (2σ²)
    pub fn from_sigma(sigma: f64) -> Self {
        assert!(sigma > 0.0, "Sigma must be positive, got: {}", sigma);
        Self::new(1.0 / (2.0 * sigma * sigma))
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    #[inline]
    fn from_squared_distance(&self, squared_distance: f64) -> f64 {
        // Round-off can push the expanded form slightly below zero
        (-self.gamma * squared_distance.max(0.0)).exp()
    }
}

impl Default for RBFKernel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl KernelTrick for RBFKernel {
    fn eval(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        self.from_squared_distance(x.squared_distance(y))
    }

    fn supports_acceleration(&self) -> bool {
        true
    }

    fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        vec![x.norm_squared()]
    }

    fn eval_query(
        &self,
        i: usize,
        x: &SparseVector,
        qi: &[f64],
        vecs: &[SparseVector],
        cache: &[f64],
    ) -> f64 {
        match (cache.get(i), qi.first()) {
            (Some(&vi_norm_sq), Some(&x_norm_sq)) => {
                let dot = vecs[i].dot(x);
                self.from_squared_distance(vi_norm_sq + x_norm_sq - 2.0 * dot)
            }
            _ => self.eval(&vecs[i], x),
        }
    }

    fn eval_pair(&self, i: usize, j: usize, vecs: &[SparseVector], cache: &[f64]) -> f64 {
        match (cache.get(i), cache.get(j)) {
            (Some(&a), Some(&b)) => {
                let dot = vecs[i].dot(&vecs[j]);
                self.from_squared_distance(a + b - 2.0 * dot)
            }
            _ => self.eval(&vecs[i], &vecs[j]),
        }
    }

    fn rbf_gamma(&self) -> Option<f64> {
        Some(self.gamma)
    }

    fn name(&self) -> String {
        format!("rbf(gamma={})", self.gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rbf_kernel_creation() {
        assert_eq!(RBFKernel::new(0.5).gamma(), 0.5);
        assert_eq!(RBFKernel::with_auto_gamma(10).gamma(), 0.1);
        assert_eq!(RBFKernel::default().gamma(), 1.0);
        assert_relative_eq!(RBFKernel::from_sigma(0.5).gamma(), 2.0);
    }

    #[test]
    #[should_panic(expected = "Gamma must be positive")]
    fn test_rbf_kernel_invalid_gamma() {
        RBFKernel::new(-0.5);
    }

    #[test]
    fn test_rbf_kernel_identical_vectors() {
        let kernel = RBFKernel::new(1.0);
        let x = SparseVector::new(vec![0, 1, 2], vec![1.0, 2.0, 3.0]);

        assert_relative_eq!(kernel.eval(&x, &x), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rbf_kernel_orthogonal_vectors() {
        let kernel = RBFKernel::new(1.0);
        let x = SparseVector::new(vec![0, 2], vec![1.0, 1.0]);
        let y = SparseVector::new(vec![1, 3], vec![1.0, 1.0]);

        // ||x - y||² = 4 with no overlap
        assert_relative_eq!(kernel.eval(&x, &y), (-4.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_cached_evaluation_matches_direct() {
        let kernel = RBFKernel::new(0.3);
        let vecs = vec![
            SparseVector::new(vec![0, 1], vec![3.0, 4.0]),
            SparseVector::new(vec![0, 2], vec![1.0, 2.0]),
            SparseVector::new(vec![5], vec![-1.0]),
        ];
        let cache = kernel.accel_cache(&vecs);
        assert_eq!(cache, vec![25.0, 5.0, 1.0]);

        let x = SparseVector::new(vec![1, 2], vec![0.5, -1.5]);
        let qi = kernel.query_info(&x);
        for i in 0..vecs.len() {
            assert_relative_eq!(
                kernel.eval_query(i, &x, &qi, &vecs, &cache),
                kernel.eval(&vecs[i], &x),
                epsilon = 1e-12
            );
            for j in 0..vecs.len() {
                assert_relative_eq!(
                    kernel.eval_pair(i, j, &vecs, &cache),
                    kernel.eval(&vecs[i], &vecs[j]),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_missing_cache_falls_back() {
        let kernel = RBFKernel::new(2.0);
        let vecs = vec![SparseVector::new(vec![0], vec![1.0])];
        let x = SparseVector::new(vec![0], vec![2.0]);
        assert_relative_eq!(
            kernel.eval_query(0, &x, &[], &vecs, &[]),
            (-2.0_f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rbf_kernel_numerical_stability() {
        let kernel = RBFKernel::new(1e-6);
        let x = SparseVector::new(vec![0], vec![1e6]);
        let y = SparseVector::new(vec![0], vec![-1e6]);

        let result = kernel.eval(&x, &y);
        assert!(result.is_finite());
        assert!((0.0..=1.0).contains(&result));
    }
}
