//! Soft Confidence-Weighted learning
//!
//! A linear classifier keeping a Gaussian `N(μ, Σ)` over weight vectors.
//! Each example moves the mean just far enough that the probability of a
//! correct prediction reaches the confidence level `η`, with the step capped
//! (SCW-I) or softly penalised (SCW-II) by the aggressiveness `C`.

use crate::core::{check_binary_label, KernelSpaceError, OnlineLearner, Result, Sample, SparseVector};
use crate::linalg::DenseMatrix;
use log::debug;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// How the step length is regularised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScwMode {
    /// Step length capped at `C`
    #[default]
    I,
    /// Squared slack penalised with weight `1/(2C)`
    II,
}

/// Shape of the weight covariance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Covariance {
    /// Dense `dim × dim` matrix
    #[default]
    Full,
    /// Diagonal only, linear in the dimension
    Diagonal,
}

#[derive(Debug, Clone)]
enum Sigma {
    Full(DenseMatrix),
    Diagonal(Vec<f64>),
}

impl Sigma {
    /// `Σx` as a dense vector
    fn times(&self, x: &SparseVector) -> Vec<f64> {
        match self {
            Sigma::Full(m) => (0..m.rows())
                .map(|i| {
                    let row = m.row(i);
                    x.iter().map(|(j, v)| row[j] * v).sum()
                })
                .collect(),
            Sigma::Diagonal(d) => {
                let mut out = vec![0.0; d.len()];
                for (j, v) in x.iter() {
                    out[j] = d[j] * v;
                }
                out
            }
        }
    }

    /// `Σ ← Σ − β(Σx)(Σx)ᵀ`, keeping only the diagonal when diagonal
    fn shrink(&mut self, beta: f64, sx: &[f64]) {
        match self {
            Sigma::Full(m) => m.rank_one_update(-beta, sx, sx),
            Sigma::Diagonal(d) => {
                for (s, &v) in d.iter_mut().zip(sx) {
                    *s -= beta * v * v;
                }
            }
        }
    }
}

/// Builder for [`Scw`]
#[derive(Debug, Clone)]
pub struct ScwBuilder {
    dim: usize,
    c: f64,
    eta: f64,
    mode: ScwMode,
    covariance: Covariance,
}

impl ScwBuilder {
    /// Aggressiveness `C`, must be positive
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Confidence level `η`, must lie strictly between 0.5 and 1
    pub fn with_eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    pub fn with_mode(mut self, mode: ScwMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_covariance(mut self, covariance: Covariance) -> Self {
        self.covariance = covariance;
        self
    }

    pub fn build(self) -> Result<Scw> {
        if self.dim == 0 {
            return Err(KernelSpaceError::InvalidParameter(
                "Dimension must be positive".to_string(),
            ));
        }
        if self.c <= 0.0 || !self.c.is_finite() {
            return Err(KernelSpaceError::InvalidParameter(format!(
                "C must be positive, got: {}",
                self.c
            )));
        }
        if !(self.eta > 0.5 && self.eta < 1.0) {
            return Err(KernelSpaceError::InvalidParameter(format!(
                "Confidence eta must lie in (0.5, 1), got: {}",
                self.eta
            )));
        }

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| KernelSpaceError::InvalidParameter(e.to_string()))?;
        let phi = normal.inverse_cdf(self.eta);

        let sigma = match self.covariance {
            Covariance::Full => Sigma::Full(DenseMatrix::eye(self.dim)),
            Covariance::Diagonal => Sigma::Diagonal(vec![1.0; self.dim]),
        };

        Ok(Scw {
            dim: self.dim,
            c: self.c,
            eta: self.eta,
            phi,
            mode: self.mode,
            covariance: self.covariance,
            mu: vec![0.0; self.dim],
            sigma,
            n_updates: 0,
        })
    }
}

/// Linear soft confidence-weighted classifier over a fixed dimension
#[derive(Debug, Clone)]
pub struct Scw {
    dim: usize,
    c: f64,
    eta: f64,
    phi: f64,
    mode: ScwMode,
    covariance: Covariance,
    mu: Vec<f64>,
    sigma: Sigma,
    n_updates: usize,
}

impl Scw {
    /// Builder for a model over feature indices `0..dim`, defaulting to
    /// SCW-I with full covariance, `C = 1` and `η = 0.9`
    pub fn builder(dim: usize) -> ScwBuilder {
        ScwBuilder {
            dim,
            c: 1.0,
            eta: 0.9,
            mode: ScwMode::default(),
            covariance: Covariance::default(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// `Φ⁻¹(η)`
    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn mode(&self) -> ScwMode {
        self.mode
    }

    pub fn covariance(&self) -> Covariance {
        self.covariance
    }

    /// Mean weight vector
    pub fn weights(&self) -> &[f64] {
        &self.mu
    }

    /// Number of examples that changed the model
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// `Σ_jj`
    pub fn variance(&self, j: usize) -> f64 {
        match &self.sigma {
            Sigma::Full(m) => m.get(j, j),
            Sigma::Diagonal(d) => d[j],
        }
    }

    /// Step size `α` for margin `m` and confidence `v`
    fn alpha(&self, m: f64, v: f64) -> f64 {
        let phi = self.phi;
        let phi2 = phi * phi;
        match self.mode {
            ScwMode::I => {
                let psi = 1.0 + phi2 / 2.0;
                let zeta = 1.0 + phi2;
                let root = (m * m * phi2 * phi2 / 4.0 + v * phi2 * zeta).sqrt();
                ((-m * psi + root) / (v * zeta)).max(0.0).min(self.c)
            }
            ScwMode::II => {
                let n = v + 1.0 / (2.0 * self.c);
                let gamma = phi * (phi2 * m * m * v * v + 4.0 * n * v * (n + v * phi2)).sqrt();
                ((-(2.0 * m * n + phi2 * m * v) + gamma) / (2.0 * (n * n + n * v * phi2))).max(0.0)
            }
        }
    }
}

impl OnlineLearner for Scw {
    fn update(&mut self, sample: &Sample) -> Result<()> {
        check_binary_label(sample.label)?;
        let x = &sample.features;
        if x.dim() > self.dim {
            return Err(KernelSpaceError::DimensionMismatch {
                expected: self.dim,
                actual: x.dim(),
            });
        }
        let y = sample.label;

        let sx = self.sigma.times(x);
        let v: f64 = x.iter().map(|(j, xj)| xj * sx[j]).sum();
        let m = y * self.score(x);
        if v <= 0.0 || self.phi * v.sqrt() - m <= 0.0 {
            return Ok(());
        }

        let alpha = self.alpha(m, v);
        if alpha <= 0.0 {
            return Ok(());
        }
        let phi = self.phi;
        let u = {
            let t = -alpha * v * phi + (alpha * alpha * v * v * phi * phi + 4.0 * v).sqrt();
            t * t / 4.0
        };
        let beta = alpha * phi / (u.sqrt() + v * alpha * phi);

        for (w, &s) in self.mu.iter_mut().zip(&sx) {
            *w += alpha * y * s;
        }
        self.sigma.shrink(beta, &sx);
        self.n_updates += 1;
        debug!("SCW update {}: alpha={alpha:.4}, beta={beta:.4}", self.n_updates);
        Ok(())
    }

    fn score(&self, x: &SparseVector) -> f64 {
        x.iter()
            .filter(|&(j, _)| j < self.dim)
            .map(|(j, v)| self.mu[j] * v)
            .sum()
    }

    fn n_support_vectors(&self) -> usize {
        0
    }
}
