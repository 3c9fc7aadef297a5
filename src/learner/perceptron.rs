//! Kernel perceptrons whose weights live in a budgeted kernel point

use crate::core::{check_binary_label, KernelSpaceError, OnlineLearner, Result, Sample, SparseVector};
use crate::kernel::KernelTrick;
use crate::kernel_point::{AddOutcome, BudgetConfig, KernelPoint, KernelPoints};
use log::debug;

/// Binary kernel perceptron
///
/// The weight vector is a [`KernelPoint`], so the support set follows the
/// configured budget strategy: mistakes add `y·φ(x)` and the point decides
/// whether that grows, projects, merges or evicts.
#[derive(Debug, Clone)]
pub struct BudgetKernelPerceptron<K: KernelTrick> {
    weight: KernelPoint<K>,
    n_mistakes: usize,
}

impl<K: KernelTrick> BudgetKernelPerceptron<K> {
    pub fn new(kernel: K, config: BudgetConfig) -> Result<Self> {
        Ok(Self {
            weight: KernelPoint::with_config(kernel, config)?,
            n_mistakes: 0,
        })
    }

    /// Seed random eviction
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            weight: self.weight.with_seed(seed),
            ..self
        }
    }

    pub fn weight(&self) -> &KernelPoint<K> {
        &self.weight
    }

    pub fn n_mistakes(&self) -> usize {
        self.n_mistakes
    }
}

impl<K: KernelTrick> OnlineLearner for BudgetKernelPerceptron<K> {
    fn update(&mut self, sample: &Sample) -> Result<()> {
        check_binary_label(sample.label)?;
        let x = &sample.features;
        let qi = self.weight.query_info(x);
        if sample.label * self.weight.dot_vec_with(x, &qi) <= 0.0 {
            self.n_mistakes += 1;
            let outcome = self.weight.mutable_add(sample.label, x, &qi);
            if outcome != AddOutcome::Appended {
                debug!("Perceptron mistake {} handled as {outcome:?}", self.n_mistakes);
            }
        }
        Ok(())
    }

    fn score(&self, x: &SparseVector) -> f64 {
        self.weight.dot_vec(x)
    }

    fn n_support_vectors(&self) -> usize {
        self.weight.basis_size()
    }
}

/// One-vs-rest kernel perceptron over an arbitrary set of class labels
///
/// Every class owns one point of a shared [`KernelPoints`] group, so a single
/// pass of kernel evaluations scores all classes. A mistake adds `+φ(x)` to
/// the true class and `−φ(x)` to its strongest rival in a single update;
/// a tie with the true class counts as a mistake.
#[derive(Debug, Clone)]
pub struct MulticlassKernelPerceptron<K: KernelTrick> {
    classes: Vec<f64>,
    weights: KernelPoints<K>,
    n_mistakes: usize,
}

impl<K: KernelTrick> MulticlassKernelPerceptron<K> {
    /// Perceptron over the given class labels, in that order
    pub fn new(kernel: K, classes: Vec<f64>, config: BudgetConfig) -> Result<Self> {
        if classes.len() < 2 {
            return Err(KernelSpaceError::InvalidParameter(format!(
                "At least two classes are required, got: {}",
                classes.len()
            )));
        }
        for (i, c) in classes.iter().enumerate() {
            if !c.is_finite() || classes[..i].contains(c) {
                return Err(KernelSpaceError::InvalidLabel(*c));
            }
        }
        let weights = KernelPoints::with_config(kernel, classes.len(), config)?;
        Ok(Self {
            classes,
            weights,
            n_mistakes: 0,
        })
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            weights: self.weights.with_seed(seed),
            ..self
        }
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn weights(&self) -> &KernelPoints<K> {
        &self.weights
    }

    pub fn n_mistakes(&self) -> usize {
        self.n_mistakes
    }

    pub fn n_support_vectors(&self) -> usize {
        self.weights.basis_size()
    }

    /// Score of every class, in class order
    pub fn scores(&self, x: &SparseVector) -> Vec<f64> {
        let qi = self.weights.query_info(x);
        self.weights.dot_all(x, &qi)
    }

    /// Label of the highest-scoring class, ties going to the earlier class
    pub fn predict(&self, x: &SparseVector) -> f64 {
        self.classes[argmax(&self.scores(x))]
    }

    pub fn update(&mut self, sample: &Sample) -> Result<()> {
        let truth = self
            .classes
            .iter()
            .position(|&c| c == sample.label)
            .ok_or(KernelSpaceError::InvalidLabel(sample.label))?;

        let x = &sample.features;
        let qi = self.weights.query_info(x);
        let scores = self.weights.dot_all(x, &qi);
        let rival = (0..scores.len())
            .filter(|&c| c != truth)
            .fold(None, |best: Option<usize>, c| match best {
                Some(b) if scores[b] >= scores[c] => Some(b),
                _ => Some(c),
            });
        let Some(rival) = rival else {
            return Ok(());
        };
        if scores[truth] > scores[rival] {
            return Ok(());
        }

        self.n_mistakes += 1;
        let mut cs = vec![0.0; self.classes.len()];
        cs[truth] = 1.0;
        cs[rival] = -1.0;
        self.weights.mutable_add_all(&cs, x, &qi);
        Ok(())
    }

    pub fn train(&mut self, samples: &[Sample]) -> Result<()> {
        for sample in samples {
            self.update(sample)?;
        }
        Ok(())
    }

    pub fn accuracy(&self, samples: &[Sample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let correct = samples
            .iter()
            .filter(|s| self.predict(&s.features) == s.label)
            .count();
        correct as f64 / samples.len() as f64
    }
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
