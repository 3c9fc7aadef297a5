//! Binary classification metrics

use crate::core::{OnlineLearner, Prediction, Sample, SparseVector};

/// Confusion counts of a binary classifier on a labelled set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    /// Score every sample with `learner` and tally the outcomes
    pub fn evaluate<L: OnlineLearner + ?Sized>(learner: &L, samples: &[Sample]) -> Self {
        Self::from_scores(samples, |x| learner.score(x))
    }

    /// Tally outcomes of any decision function; non-negative scores count
    /// as positive predictions
    pub fn from_scores<F>(samples: &[Sample], score: F) -> Self
    where
        F: Fn(&SparseVector) -> f64,
    {
        let mut metrics = Self::default();
        for sample in samples {
            let predicted = Prediction::from_decision_value(score(&sample.features)).label > 0.0;
            match (predicted, sample.label > 0.0) {
                (true, true) => metrics.true_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        metrics
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
