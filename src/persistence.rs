//! Model serialization and persistence
//!
//! Trained learners are saved as JSON so the CLI can train in one process and
//! predict in another. Kernel models store their support vectors with one
//! coefficient each; the linear SCW model stores its mean weight vector.

use crate::core::{KernelSpaceError, Prediction, Result, Sample, SparseVector};
use crate::kernel::{KernelSpec, KernelTrick};
use crate::kernel_point::BudgetConfig;
use crate::learner::{dot, BudgetKernelPerceptron, Covariance, EvaluationMetrics, Projectron, Scw, ScwMode};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Which learner produced a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LearnerKind {
    Perceptron,
    Projectron,
    ProjectronPlusPlus,
    Scw,
}

impl LearnerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LearnerKind::Perceptron => "budget kernel perceptron",
            LearnerKind::Projectron => "projectron",
            LearnerKind::ProjectronPlusPlus => "projectron++",
            LearnerKind::Scw => "soft confidence-weighted",
        }
    }
}

/// Serializable representation of a trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableModel {
    pub learner: LearnerKind,
    /// Kernel of the support-vector expansion; absent for linear models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<KernelSpec>,
    #[serde(default)]
    pub support_vectors: Vec<SparseVector>,
    /// One coefficient per support vector
    #[serde(default)]
    pub coefficients: Vec<f64>,
    /// Dense weights of a linear model
    #[serde(default)]
    pub weights: Vec<f64>,
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    pub n_support_vectors: usize,
    pub n_training_samples: usize,
    pub training_params: TrainingParams,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// Training parameters for reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub epochs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ScwMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covariance: Option<Covariance>,
}

impl SerializableModel {
    fn new(learner: LearnerKind, n_training_samples: usize, training_params: TrainingParams) -> Self {
        Self {
            learner,
            kernel: None,
            support_vectors: Vec::new(),
            coefficients: Vec::new(),
            weights: Vec::new(),
            metadata: ModelMetadata {
                library_version: crate::VERSION.to_string(),
                n_support_vectors: 0,
                n_training_samples,
                training_params,
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    fn with_expansion(
        mut self,
        kernel: &KernelSpec,
        support_vectors: &[SparseVector],
        coefficients: &[f64],
    ) -> Self {
        self.kernel = Some(kernel.clone());
        self.support_vectors = support_vectors.to_vec();
        self.coefficients = coefficients.to_vec();
        self.metadata.n_support_vectors = support_vectors.len();
        self
    }

    pub fn from_perceptron(
        model: &BudgetKernelPerceptron<KernelSpec>,
        n_training_samples: usize,
        epochs: usize,
    ) -> Self {
        let weight = model.weight();
        let params = TrainingParams {
            epochs,
            budget: Some(weight.config().clone()),
            ..TrainingParams::default()
        };
        Self::new(LearnerKind::Perceptron, n_training_samples, params).with_expansion(
            weight.kernel(),
            weight.basis(),
            weight.alpha(),
        )
    }

    pub fn from_projectron(
        model: &Projectron<KernelSpec>,
        n_training_samples: usize,
        epochs: usize,
    ) -> Self {
        let kind = if model.margin_updates() {
            LearnerKind::ProjectronPlusPlus
        } else {
            LearnerKind::Projectron
        };
        let params = TrainingParams {
            epochs,
            eta: Some(model.eta()),
            ..TrainingParams::default()
        };
        Self::new(kind, n_training_samples, params).with_expansion(
            model.kernel(),
            model.support_vectors(),
            model.coefficients(),
        )
    }

    pub fn from_scw(model: &Scw, n_training_samples: usize, epochs: usize) -> Self {
        let params = TrainingParams {
            epochs,
            eta: Some(model.eta()),
            c: Some(model.c()),
            mode: Some(model.mode()),
            covariance: Some(model.covariance()),
            ..TrainingParams::default()
        };
        let mut saved = Self::new(LearnerKind::Scw, n_training_samples, params);
        saved.weights = model.weights().to_vec();
        saved
    }

    /// Check that the stored parts fit together
    pub fn validate(&self) -> Result<()> {
        match &self.kernel {
            Some(kernel) => {
                kernel.validate()?;
                if self.support_vectors.len() != self.coefficients.len() {
                    return Err(KernelSpaceError::SerializationError(format!(
                        "{} support vectors but {} coefficients",
                        self.support_vectors.len(),
                        self.coefficients.len()
                    )));
                }
                Ok(())
            }
            None if self.learner == LearnerKind::Scw => Ok(()),
            None => Err(KernelSpaceError::SerializationError(format!(
                "{} model without a kernel",
                self.learner.name()
            ))),
        }
    }

    /// Decision value for `x`
    pub fn score(&self, x: &SparseVector) -> f64 {
        match &self.kernel {
            Some(kernel) => {
                let qi = kernel.query_info(x);
                let cache = kernel.accel_cache(&self.support_vectors);
                let k: Vec<f64> = (0..self.support_vectors.len())
                    .map(|i| kernel.eval_query(i, x, &qi, &self.support_vectors, &cache))
                    .collect();
                dot(&self.coefficients, &k)
            }
            None => x
                .iter()
                .filter(|&(j, _)| j < self.weights.len())
                .map(|(j, v)| self.weights[j] * v)
                .sum(),
        }
    }

    pub fn predict(&self, x: &SparseVector) -> Prediction {
        Prediction::from_decision_value(self.score(x))
    }

    pub fn evaluate(&self, samples: &[Sample]) -> EvaluationMetrics {
        EvaluationMetrics::from_scores(samples, |x| self.score(x))
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| KernelSpaceError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let model: Self = serde_json::from_reader(reader)
            .map_err(|e| KernelSpaceError::SerializationError(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    /// Print model summary
    pub fn print_summary(&self) {
        println!("=== Model Summary ===");
        println!("Learner: {}", self.learner.name());
        match &self.kernel {
            Some(kernel) => println!("Kernel: {}", kernel.name()),
            None => println!("Kernel: none (linear, {} weights)", self.weights.len()),
        }
        println!("Support Vectors: {}", self.metadata.n_support_vectors);
        println!("Training Samples: {}", self.metadata.n_training_samples);
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);

        let params = &self.metadata.training_params;
        println!("Training Parameters:");
        println!("  Epochs: {}", params.epochs);
        if let Some(budget) = &params.budget {
            println!("  Budget Strategy: {:?}", budget.strategy);
            println!("  Error Tolerance: {}", budget.error_tolerance);
            if budget.max_budget != usize::MAX {
                println!("  Max Budget: {}", budget.max_budget);
            }
        }
        if let Some(eta) = params.eta {
            println!("  Eta: {eta}");
        }
        if let Some(c) = params.c {
            println!("  C: {c}");
        }
        if let Some(mode) = params.mode {
            println!("  Mode: SCW-{mode:?}");
        }
        if let Some(covariance) = params.covariance {
            println!("  Covariance: {covariance:?}");
        }
    }
}
