//! A single vector in a kernel-induced feature space

use crate::core::{Result, SparseVector};
use crate::kernel::KernelTrick;
use crate::kernel_point::budget::{AddOutcome, BudgetConfig, BudgetStrategy};
use crate::kernel_point::points::{KernelPointRef, KernelPoints};
use crate::linalg::MatrixView;

/// `Σ_i alpha_i·φ(basis_i)` for one kernel, with budget maintenance
///
/// A one-point [`KernelPoints`] group; every operation gives the same result
/// as the corresponding group operation on point 0.
///
/// # Examples
/// ```
/// use kernelspace::kernel::LinearKernel;
/// use kernelspace::kernel_point::{BudgetConfig, KernelPoint};
/// use kernelspace::SparseVector;
///
/// let config = BudgetConfig::default().with_error_tolerance(0.0);
/// let mut point = KernelPoint::with_config(LinearKernel, config).unwrap();
/// point.mutable_add_vec(1.0, &SparseVector::new(vec![0], vec![1.0]));
/// point.mutable_add_vec(1.0, &SparseVector::new(vec![1], vec![1.0]));
///
/// assert!((point.dot(&point) - 2.0).abs() < 1e-12);
/// assert!((point.dist_vec(&SparseVector::empty()) - 2f64.sqrt()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct KernelPoint<K: KernelTrick> {
    inner: KernelPoints<K>,
}

impl<K: KernelTrick> KernelPoint<K> {
    /// Empty point with the default budget configuration
    pub fn new(kernel: K) -> Self {
        Self {
            inner: KernelPoints::new(kernel, 1),
        }
    }

    pub fn with_config(kernel: K, config: BudgetConfig) -> Result<Self> {
        Ok(Self {
            inner: KernelPoints::with_config(kernel, 1, config)?,
        })
    }

    /// Seed the generator used by random eviction
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            inner: self.inner.with_seed(seed),
        }
    }

    pub fn kernel(&self) -> &K {
        self.inner.kernel()
    }

    pub fn config(&self) -> &BudgetConfig {
        self.inner.config()
    }

    pub fn set_budget_strategy(&mut self, strategy: BudgetStrategy) -> Result<()> {
        self.inner.set_budget_strategy(strategy)
    }

    pub fn set_error_tolerance(&mut self, error_tolerance: f64) -> Result<()> {
        self.inner.set_error_tolerance(error_tolerance)
    }

    pub fn set_max_budget(&mut self, max_budget: usize) -> Result<()> {
        self.inner.set_max_budget(max_budget)
    }

    pub fn basis_size(&self) -> usize {
        self.inner.basis_size()
    }

    pub fn basis(&self) -> &[SparseVector] {
        self.inner.basis()
    }

    pub fn alpha(&self) -> &[f64] {
        self.inner.alpha(0)
    }

    pub fn gram(&self) -> Option<MatrixView<'_>> {
        self.inner.gram()
    }

    pub fn inverse_gram(&self) -> Option<MatrixView<'_>> {
        self.inner.inverse_gram()
    }

    /// Borrowed view usable against points of other groups
    pub fn view(&self) -> KernelPointRef<'_, K> {
        self.inner.point(0)
    }

    pub fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        self.inner.query_info(x)
    }

    /// `⟨self, other⟩` in feature space
    pub fn dot(&self, other: &KernelPoint<K>) -> f64 {
        self.view().dot_point(&other.view())
    }

    /// `⟨self, φ(x)⟩` with a precomputed query info
    pub fn dot_vec_with(&self, x: &SparseVector, qi: &[f64]) -> f64 {
        self.inner.dot_vec(0, x, qi)
    }

    /// `⟨self, φ(x)⟩`
    pub fn dot_vec(&self, x: &SparseVector) -> f64 {
        self.dot_vec_with(x, &self.query_info(x))
    }

    pub fn norm_squared(&self) -> f64 {
        self.inner.norm_squared(0)
    }

    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// `‖self − other‖` in feature space
    pub fn dist(&self, other: &KernelPoint<K>) -> f64 {
        self.view().dist_point(&other.view())
    }

    pub fn dist_vec_with(&self, x: &SparseVector, qi: &[f64]) -> f64 {
        self.inner.dist_vec(0, x, qi)
    }

    /// `‖self − φ(x)‖`
    pub fn dist_vec(&self, x: &SparseVector) -> f64 {
        self.dist_vec_with(x, &self.query_info(x))
    }

    /// `self ← self + c·φ(x)` with a precomputed query info
    pub fn mutable_add(&mut self, c: f64, x: &SparseVector, qi: &[f64]) -> AddOutcome {
        self.inner.mutable_add(0, c, x, qi)
    }

    /// `self ← self + c·φ(x)`
    pub fn mutable_add_vec(&mut self, c: f64, x: &SparseVector) -> AddOutcome {
        let qi = self.query_info(x);
        self.mutable_add(c, x, &qi)
    }

    /// `self ← c·self`
    pub fn mutable_multiply(&mut self, c: f64) {
        self.inner.mutable_multiply(0, c)
    }

    /// Back to the empty point; the budget configuration stays locked
    pub fn zero_out(&mut self) {
        self.inner.clear()
    }

    /// `Σ_i Σ_j α_i·α_j·k(basis_i, basis_j)` with plain kernel evaluations
    pub fn dot_self_bruteforce(&self) -> f64 {
        self.inner.dot_pair_bruteforce(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{LinearKernel, RBFKernel};
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_point() {
        let point = KernelPoint::new(RBFKernel::new(1.0));
        let x = SparseVector::new(vec![0], vec![1.0]);
        assert_eq!(point.basis_size(), 0);
        assert_eq!(point.dot_vec(&x), 0.0);
        assert_eq!(point.dot(&point), 0.0);
        assert_relative_eq!(point.dist_vec(&x), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_multiply_scales_dot() {
        let mut point = KernelPoint::new(LinearKernel);
        let x = SparseVector::new(vec![0, 1], vec![1.0, 2.0]);
        point.mutable_add_vec(1.0, &x);
        point.mutable_multiply(-2.0);
        assert_relative_eq!(point.dot_vec(&x), -10.0, epsilon = 1e-12);
        assert_relative_eq!(point.norm(), 2.0 * 5.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_out_empties_basis() {
        let mut point = KernelPoint::new(LinearKernel);
        point.mutable_add_vec(1.0, &SparseVector::new(vec![0], vec![1.0]));
        point.zero_out();
        assert_eq!(point.basis_size(), 0);
        assert_eq!(point.norm_squared(), 0.0);
    }

    #[test]
    fn test_zero_vector_under_linear_kernel_is_ignored() {
        let mut point = KernelPoint::new(LinearKernel);
        let outcome = point.mutable_add_vec(1.0, &SparseVector::empty());
        assert_eq!(outcome, AddOutcome::Projected { residual: 0.0 });
        assert_eq!(point.basis_size(), 0);
    }
}
