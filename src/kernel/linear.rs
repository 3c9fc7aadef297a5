//! Linear kernel implementation

use crate::core::SparseVector;
use crate::kernel::KernelTrick;

/// Linear kernel: K(x, y) = x^T * y
///
/// The feature space is the input space itself, which makes this kernel the
/// easiest one to check kernel-space arithmetic against.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl KernelTrick for LinearKernel {
    fn eval(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        x.dot(y)
    }

    fn name(&self) -> String {
        "linear".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_kernel_basic() {
        let kernel = LinearKernel::new();

        let x = SparseVector::new(vec![0, 2, 4], vec![1.0, 2.0, 3.0]);
        let y = SparseVector::new(vec![1, 2, 3], vec![1.0, 2.0, 3.0]);

        // Only index 2 overlaps: 2.0 * 2.0 = 4.0
        assert_eq!(kernel.eval(&x, &y), 4.0);
    }

    #[test]
    fn test_linear_kernel_identical() {
        let kernel = LinearKernel::new();

        let x = SparseVector::new(vec![0, 1, 2], vec![1.0, 2.0, 3.0]);

        // x^T * x = 1^2 + 2^2 + 3^2 = 14
        assert_eq!(kernel.eval(&x, &x), 14.0);
    }

    #[test]
    fn test_linear_kernel_has_no_cache() {
        let kernel = LinearKernel::new();
        let vecs = vec![
            SparseVector::new(vec![0], vec![1.0]),
            SparseVector::new(vec![1], vec![2.0]),
        ];

        assert!(kernel.accel_cache(&vecs).is_empty());
        assert!(kernel.query_info(&vecs[0]).is_empty());
        assert_eq!(kernel.eval_pair(0, 1, &vecs, &[]), 0.0);
        assert!(kernel.rbf_gamma().is_none());
    }
}
