//! Online learners built on kernel-space points
//!
//! All learners observe one example at a time through [`OnlineLearner`].
//! The kernel learners keep their weight vector as a combination of stored
//! support vectors; [`Scw`] is linear and keeps a Gaussian over weights.

pub mod metrics;
pub mod perceptron;
pub mod projectron;
pub mod scw;

pub use self::metrics::EvaluationMetrics;
pub use self::perceptron::{BudgetKernelPerceptron, MulticlassKernelPerceptron};
pub use self::projectron::Projectron;
pub use self::scw::{Covariance, Scw, ScwBuilder, ScwMode};
pub use crate::core::OnlineLearner;

/// `Σ a_i·b_i`
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
