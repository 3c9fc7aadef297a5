//! Serializable kernel description
//!
//! Persisted models and the CLI need to name a kernel without knowing its
//! concrete type at compile time. `KernelSpec` is that name; it implements
//! [`KernelTrick`] by delegating to the concrete kernels.

use crate::core::{KernelSpaceError, Result, SparseVector};
use crate::kernel::{KernelTrick, LinearKernel, PolynomialKernel, RBFKernel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KernelSpec {
    Linear,
    Rbf { gamma: f64 },
    Polynomial { degree: u32, gamma: f64, coef0: f64 },
}

impl KernelSpec {
    /// Check hyperparameters without panicking
    pub fn validate(&self) -> Result<()> {
        match *self {
            KernelSpec::Linear => Ok(()),
            KernelSpec::Rbf { gamma } if gamma > 0.0 && gamma.is_finite() => Ok(()),
            KernelSpec::Rbf { gamma } => Err(KernelSpaceError::InvalidParameter(format!(
                "RBF gamma must be positive, got {gamma}"
            ))),
            KernelSpec::Polynomial { degree, gamma, .. } => {
                if degree == 0 {
                    Err(KernelSpaceError::InvalidParameter(
                        "Polynomial degree must be positive".to_string(),
                    ))
                } else if gamma <= 0.0 || !gamma.is_finite() {
                    Err(KernelSpaceError::InvalidParameter(format!(
                        "Polynomial gamma must be positive, got {gamma}"
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn with_kernel<T>(&self, f: impl FnOnce(&dyn KernelTrick) -> T) -> T {
        match *self {
            KernelSpec::Linear => f(&LinearKernel),
            KernelSpec::Rbf { gamma } => f(&RBFKernel::new(gamma)),
            KernelSpec::Polynomial {
                degree,
                gamma,
                coef0,
            } => f(&PolynomialKernel::new(degree, gamma, coef0)),
        }
    }
}

impl Default for KernelSpec {
    fn default() -> Self {
        KernelSpec::Rbf { gamma: 1.0 }
    }
}

impl KernelTrick for KernelSpec {
    fn eval(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        self.with_kernel(|k| k.eval(x, y))
    }

    fn supports_acceleration(&self) -> bool {
        self.with_kernel(|k| k.supports_acceleration())
    }

    fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        self.with_kernel(|k| k.query_info(x))
    }

    fn eval_query(
        &self,
        i: usize,
        x: &SparseVector,
        qi: &[f64],
        vecs: &[SparseVector],
        cache: &[f64],
    ) -> f64 {
        self.with_kernel(|k| k.eval_query(i, x, qi, vecs, cache))
    }

    fn eval_pair(&self, i: usize, j: usize, vecs: &[SparseVector], cache: &[f64]) -> f64 {
        self.with_kernel(|k| k.eval_pair(i, j, vecs, cache))
    }

    fn rbf_gamma(&self) -> Option<f64> {
        match *self {
            KernelSpec::Rbf { gamma } => Some(gamma),
            _ => None,
        }
    }

    fn name(&self) -> String {
        self.with_kernel(|k| k.name())
    }
}
