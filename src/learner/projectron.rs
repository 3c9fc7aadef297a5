//! Projectron and Projectron++
//!
//! A kernel perceptron that keeps its support set small by projecting
//! mistakes onto the span of the current support vectors whenever the
//! projection residual in feature space is at most `eta`. Only mistakes whose
//! residual exceeds `eta` add a support vector. The inverse Gram matrix of the
//! support set is maintained incrementally, one rank-1 step per new vector.
//!
//! With margin updates enabled (Projectron++), correctly classified examples
//! with margin below one also trigger a projected step of length
//! `τ = min(ℓ/‖Pφ‖², 2(ℓ − ‖δ‖/η)/‖Pφ‖², 1)`.

use crate::core::{check_binary_label, KernelSpaceError, OnlineLearner, Result, Sample, SparseVector};
use crate::kernel::KernelTrick;
use crate::learner::dot;
use crate::linalg::{ExpandableMatrix, MatrixView};
use log::debug;

#[derive(Debug, Clone)]
pub struct Projectron<K: KernelTrick> {
    kernel: K,
    eta: f64,
    margin_updates: bool,
    vecs: Vec<SparseVector>,
    accel: Vec<f64>,
    alpha: Vec<f64>,
    inv_gram: ExpandableMatrix,
    n_mistakes: usize,
}

impl<K: KernelTrick> Projectron<K> {
    /// Plain Projectron with projection threshold `eta`
    ///
    /// # Examples
    /// ```
    /// use kernelspace::kernel::RBFKernel;
    /// use kernelspace::learner::{OnlineLearner, Projectron};
    /// use kernelspace::{Sample, SparseVector};
    ///
    /// let mut model = Projectron::new(RBFKernel::new(1.0), 0.1).unwrap();
    /// model.update(&Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0)).unwrap();
    /// model.update(&Sample::new(SparseVector::new(vec![0], vec![-1.0]), -1.0)).unwrap();
    /// assert_eq!(model.predict(&SparseVector::new(vec![0], vec![0.8])).label, 1.0);
    /// ```
    pub fn new(kernel: K, eta: f64) -> Result<Self> {
        if eta <= 0.0 || !eta.is_finite() {
            return Err(KernelSpaceError::InvalidParameter(format!(
                "Projection threshold eta must be positive, got: {eta}"
            )));
        }
        Ok(Self {
            kernel,
            eta,
            margin_updates: false,
            vecs: Vec::new(),
            accel: Vec::new(),
            alpha: Vec::new(),
            inv_gram: ExpandableMatrix::default(),
            n_mistakes: 0,
        })
    }

    /// Projectron++: also update on low-margin correct predictions
    pub fn plus_plus(kernel: K, eta: f64) -> Result<Self> {
        Ok(Self::new(kernel, eta)?.with_margin_updates(true))
    }

    pub fn with_margin_updates(mut self, margin_updates: bool) -> Self {
        self.margin_updates = margin_updates;
        self
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn margin_updates(&self) -> bool {
        self.margin_updates
    }

    pub fn support_vectors(&self) -> &[SparseVector] {
        &self.vecs
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.alpha
    }

    /// Number of prediction mistakes seen during training
    pub fn n_mistakes(&self) -> usize {
        self.n_mistakes
    }

    /// Inverse Gram matrix of the support set
    pub fn inverse_gram(&self) -> MatrixView<'_> {
        self.inv_gram.view()
    }

    fn kernel_column(&self, x: &SparseVector, qi: &[f64]) -> Vec<f64> {
        (0..self.vecs.len())
            .map(|i| self.kernel.eval_query(i, x, qi, &self.vecs, &self.accel))
            .collect()
    }

    fn add_projected(&mut self, c: f64, d: &[f64]) {
        for (a, &di) in self.alpha.iter_mut().zip(d) {
            *a += c * di;
        }
    }

    /// Append `x` with coefficient `c`; `d = K⁻¹k` and `residual` is `δ²`
    fn add_support_vector(&mut self, x: &SparseVector, c: f64, d: &[f64], residual: f64) {
        let mut u = d.to_vec();
        u.push(-1.0);
        self.inv_gram.grow();
        self.inv_gram.rank_one_update(1.0 / residual, &u, &u);

        self.kernel.extend_accel_cache(x, &mut self.accel);
        self.vecs.push(x.clone());
        self.alpha.push(c);
        debug!(
            "Projectron added support vector {} (residual {residual:.3e})",
            self.vecs.len()
        );
    }
}

impl<K: KernelTrick> OnlineLearner for Projectron<K> {
    fn update(&mut self, sample: &Sample) -> Result<()> {
        check_binary_label(sample.label)?;
        let x = &sample.features;
        let y = sample.label;

        let qi = self.kernel.query_info(x);
        let k = self.kernel_column(x, &qi);
        let margin = y * dot(&self.alpha, &k);
        let is_mistake = margin <= 0.0;
        if !is_mistake && !(self.margin_updates && margin < 1.0) {
            return Ok(());
        }

        let d = self.inv_gram.multiply(&k);
        let projected_norm_sq = dot(&k, &d);
        let residual = (self.kernel.eval(x, x) - projected_norm_sq).max(0.0);
        let delta = residual.sqrt();

        if is_mistake {
            self.n_mistakes += 1;
            if delta <= self.eta {
                self.add_projected(y, &d);
            } else {
                self.add_support_vector(x, y, &d, residual);
            }
        } else if projected_norm_sq > 0.0 {
            let loss = 1.0 - margin;
            let tau = (loss / projected_norm_sq)
                .min(2.0 * (loss - delta / self.eta) / projected_norm_sq)
                .min(1.0);
            if tau > 0.0 {
                self.add_projected(y * tau, &d);
            }
        }
        Ok(())
    }

    fn score(&self, x: &SparseVector) -> f64 {
        let qi = self.kernel.query_info(x);
        dot(&self.alpha, &self.kernel_column(x, &qi))
    }

    fn n_support_vectors(&self) -> usize {
        self.vecs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{LinearKernel, RBFKernel};
    use approx::assert_relative_eq;

    fn sample(values: &[f64], label: f64) -> Sample {
        Sample::new(SparseVector::from_dense(values), label)
    }

    #[test]
    fn test_eta_must_be_positive() {
        assert!(Projectron::new(LinearKernel, 0.0).is_err());
        assert!(Projectron::new(LinearKernel, -1.0).is_err());
        assert!(Projectron::new(LinearKernel, f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_non_binary_labels() {
        let mut model = Projectron::new(LinearKernel, 0.1).unwrap();
        assert!(matches!(
            model.update(&sample(&[1.0], 2.0)),
            Err(KernelSpaceError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_spanned_mistake_is_projected() {
        // Linear kernel in one dimension: every vector is spanned by the first
        let mut model = Projectron::new(LinearKernel, 0.1).unwrap();
        model.update(&sample(&[1.0], 1.0)).unwrap();
        model.update(&sample(&[-2.0], 1.0)).unwrap();

        assert_eq!(model.n_support_vectors(), 1);
        assert_eq!(model.n_mistakes(), 2);
        // alpha = 1 + (K⁻¹k) = 1 + (-2 / 1)
        assert_relative_eq!(model.coefficients()[0], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_gram_stays_consistent() {
        let kernel = RBFKernel::new(0.5);
        let mut model = Projectron::new(kernel, 0.01).unwrap();
        let data = [
            (vec![0.0, 0.0], 1.0),
            (vec![3.0, 0.0], -1.0),
            (vec![0.0, 3.0], -1.0),
            (vec![3.0, 3.0], 1.0),
        ];
        for (x, y) in &data {
            model.update(&sample(x, *y)).unwrap();
        }

        let n = model.n_support_vectors();
        assert!(n >= 2);
        let inv = model.inverse_gram();
        let vecs = model.support_vectors();
        for i in 0..n {
            for j in 0..n {
                let entry: f64 = (0..n).map(|m| kernel.eval(&vecs[i], &vecs[m]) * inv.get(m, j)).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(entry, expected, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_margin_updates_move_low_margin_points() {
        let first = sample(&[1.0], 1.0);
        let near = sample(&[0.5], 1.0);

        let mut plain = Projectron::new(LinearKernel, 0.5).unwrap();
        let mut plus = Projectron::plus_plus(LinearKernel, 0.5).unwrap();
        for model in [&mut plain, &mut plus] {
            model.update(&first).unwrap();
            model.update(&near).unwrap();
        }

        assert_eq!(plain.n_support_vectors(), 1);
        assert_eq!(plus.n_support_vectors(), 1);
        assert_relative_eq!(plain.score(&near.features), 0.5, epsilon = 1e-12);
        // ℓ = 0.5, ‖Pφ‖² = 0.25, δ = 0: τ = 1 and alpha grows by 0.5
        assert_relative_eq!(plus.score(&near.features), 0.75, epsilon = 1e-12);
    }
}
