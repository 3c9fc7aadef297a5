//! Core traits for data access and online learning

use crate::core::{Prediction, Result, Sample, SparseVector};

/// Dataset abstraction for efficient data access
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Get a single sample by index
    ///
    /// # Panics
    /// Panics if index >= len()
    fn get_sample(&self, i: usize) -> Sample;

    /// Get all labels as a vector
    fn get_labels(&self) -> Vec<f64>;

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collect every sample in order
    fn samples(&self) -> Vec<Sample> {
        (0..self.len()).map(|i| self.get_sample(i)).collect()
    }
}

/// Binary classifier trained one example at a time
///
/// Labels are `+1` / `-1`. Implementations reject anything else with
/// [`KernelSpaceError::InvalidLabel`](crate::core::KernelSpaceError::InvalidLabel).
pub trait OnlineLearner {
    /// Observe one labelled example and update the model
    fn update(&mut self, sample: &Sample) -> Result<()>;

    /// Raw decision value for `x`
    fn score(&self, x: &SparseVector) -> f64;

    /// Number of stored support vectors (zero for linear models)
    fn n_support_vectors(&self) -> usize;

    /// Predict the label of `x`
    fn predict(&self, x: &SparseVector) -> Prediction {
        Prediction::from_decision_value(self.score(x))
    }

    /// Run a single pass over `samples`
    fn train(&mut self, samples: &[Sample]) -> Result<()> {
        for sample in samples {
            self.update(sample)?;
        }
        Ok(())
    }

    /// Fraction of `samples` classified correctly
    fn accuracy(&self, samples: &[Sample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let correct = samples
            .iter()
            .filter(|s| self.predict(&s.features).label == s.label)
            .count();
        correct as f64 / samples.len() as f64
    }
}

pub(crate) fn check_binary_label(label: f64) -> Result<()> {
    if label == 1.0 || label == -1.0 {
        Ok(())
    } else {
        Err(crate::core::KernelSpaceError::InvalidLabel(label))
    }
}
