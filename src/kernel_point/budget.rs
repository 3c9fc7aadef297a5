//! Budget maintenance configuration and the RBF merge search

use crate::core::{KernelSpaceError, Result};
use serde::{Deserialize, Serialize};

/// What happens when a new vector would grow the basis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetStrategy {
    /// Keep vectors that are not (nearly) spanned by the basis, project the
    /// rest onto it
    #[default]
    Projection,
    /// Append, then merge two basis vectors once over budget (Gaussian RBF
    /// kernels only)
    MergeRbf,
    /// Append until the budget is reached, then ignore new vectors
    Stop,
    /// Evict a uniformly random basis vector once the budget is reached
    Random,
}

/// Budget maintenance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub strategy: BudgetStrategy,
    /// Largest projection residual `δ = ‖φ(x) − Pφ(x)‖` that is still folded
    /// into the existing basis (projection only); a vector joins the basis
    /// only when `δ` is strictly larger
    pub error_tolerance: f64,
    /// Upper bound on the number of basis vectors
    pub max_budget: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            strategy: BudgetStrategy::Projection,
            error_tolerance: 1e-3,
            max_budget: usize::MAX,
        }
    }
}

impl BudgetConfig {
    pub fn with_strategy(mut self, strategy: BudgetStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_error_tolerance(mut self, error_tolerance: f64) -> Self {
        self.error_tolerance = error_tolerance;
        self
    }

    pub fn with_max_budget(mut self, max_budget: usize) -> Self {
        self.max_budget = max_budget;
        self
    }

    /// Reject values that cannot describe a budget
    pub fn validate(&self) -> Result<()> {
        if !(self.error_tolerance >= 0.0 && self.error_tolerance.is_finite()) {
            return Err(KernelSpaceError::InvalidParameter(format!(
                "Error tolerance must be non-negative and finite, got {}",
                self.error_tolerance
            )));
        }
        if self.max_budget == 0 {
            return Err(KernelSpaceError::InvalidParameter(
                "Maximum budget must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of folding a scaled vector into a set of kernel points
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddOutcome {
    /// Every coefficient was zero; nothing changed
    Skipped,
    /// The vector joined the basis
    Appended,
    /// The vector was projected onto the basis; `residual` is the squared
    /// distance between φ(x) and its projection
    Projected { residual: f64 },
    /// The vector joined the basis and two basis vectors were then merged
    Merged,
    /// The basis entry previously at `index` was evicted to make room
    Evicted { index: usize },
    /// The budget was full and the vector was ignored
    Dropped,
}

/// Best way to merge basis vectors `m` and `n` into `z = h·m + (1−h)·n`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MergePlan {
    pub h: f64,
    /// Squared feature-space error summed over all points
    pub loss: f64,
}

/// `(k(m,z), k(n,z))` for `z = h·m + (1−h)·n` under a Gaussian kernel
#[inline]
pub(crate) fn merge_weights(k_mn: f64, h: f64) -> (f64, f64) {
    let one_minus = 1.0 - h;
    (k_mn.powf(one_minus * one_minus), k_mn.powf(h * h))
}

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_894_8;
const MERGE_SEARCH_TOLERANCE: f64 = 1e-6;

/// Find `h ∈ [0,1]` maximising `Σ_p (a_p·k(m,z) + b_p·k(n,z))²`
///
/// For a unit-diagonal kernel the best single coefficient for `z` is
/// `α_z = a·k(m,z) + b·k(n,z)`, and the squared error of replacing
/// `a·φ(m) + b·φ(n)` with `α_z·φ(z)` is `a² + b² + 2ab·k(m,n) − α_z²`.
/// The objective is searched with golden-section steps and compared against
/// both endpoints.
pub(crate) fn plan_merge(k_mn: f64, a: &[f64], b: &[f64]) -> MergePlan {
    let objective = |h: f64| -> f64 {
        let (km, kn) = merge_weights(k_mn, h);
        a.iter()
            .zip(b)
            .map(|(&ap, &bp)| {
                let alpha_z = ap * km + bp * kn;
                alpha_z * alpha_z
            })
            .sum()
    };

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut x1 = hi - GOLDEN_RATIO_CONJUGATE * (hi - lo);
    let mut x2 = lo + GOLDEN_RATIO_CONJUGATE * (hi - lo);
    let mut f1 = objective(x1);
    let mut f2 = objective(x2);

    while hi - lo > MERGE_SEARCH_TOLERANCE {
        if f1 < f2 {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + GOLDEN_RATIO_CONJUGATE * (hi - lo);
            f2 = objective(x2);
        } else {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - GOLDEN_RATIO_CONJUGATE * (hi - lo);
            f1 = objective(x1);
        }
    }

    let mut h = 0.5 * (lo + hi);
    let mut best = objective(h);
    for edge in [0.0, 1.0] {
        let f = objective(edge);
        if f > best {
            best = f;
            h = edge;
        }
    }

    let original: f64 = a
        .iter()
        .zip(b)
        .map(|(&ap, &bp)| ap * ap + bp * bp + 2.0 * ap * bp * k_mn)
        .sum();

    MergePlan {
        h,
        loss: (original - best).max(0.0),
    }
}
