//! A group of kernel-space points sharing one basis

use crate::core::{KernelSpaceError, Result, SparseVector};
use crate::kernel::KernelTrick;
use crate::kernel_point::budget::{merge_weights, plan_merge, AddOutcome, BudgetConfig, BudgetStrategy};
use crate::linalg::{ExpandableMatrix, MatrixView};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Several vectors in the feature space of one kernel, all expressed over the
/// same basis
///
/// Point `p` stands for `Σ_i alphas[p][i]·φ(basis[i])`. The basis, its
/// acceleration cache and the Gram bookkeeping are owned here and only
/// mutated through this type, so every point always sees the same basis.
/// Adding a vector to several points at once costs a single pass of kernel
/// evaluations and gives exactly the result of adding it to each point in
/// turn.
///
/// Budget parameters must be set before the first vector arrives; afterwards
/// the setters return [`KernelSpaceError::ConfigurationLocked`].
#[derive(Debug, Clone)]
pub struct KernelPoints<K: KernelTrick> {
    kernel: K,
    config: BudgetConfig,
    vecs: Vec<SparseVector>,
    accel: Vec<f64>,
    alphas: Vec<Vec<f64>>,
    /// Gram matrix over the basis (projection only)
    gram: ExpandableMatrix,
    /// Inverse of `gram`, updated one rank-1 step per appended vector
    inv_gram: ExpandableMatrix,
    rng: StdRng,
    locked: bool,
}

impl<K: KernelTrick> KernelPoints<K> {
    /// `n_points` empty points with the default budget configuration
    pub fn new(kernel: K, n_points: usize) -> Self {
        Self {
            kernel,
            config: BudgetConfig::default(),
            vecs: Vec::new(),
            accel: Vec::new(),
            alphas: vec![Vec::new(); n_points],
            gram: ExpandableMatrix::default(),
            inv_gram: ExpandableMatrix::default(),
            rng: StdRng::from_entropy(),
            locked: false,
        }
    }

    /// `n_points` empty points with a validated budget configuration
    pub fn with_config(kernel: K, n_points: usize, config: BudgetConfig) -> Result<Self> {
        let mut points = Self::new(kernel, n_points);
        points.set_config(config)?;
        Ok(points)
    }

    /// Seed the generator used by random eviction
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Replace the whole budget configuration
    pub fn set_config(&mut self, config: BudgetConfig) -> Result<()> {
        self.ensure_unlocked("budget configuration")?;
        config.validate()?;
        if config.strategy == BudgetStrategy::MergeRbf && self.kernel.rbf_gamma().is_none() {
            return Err(KernelSpaceError::UnsupportedKernel(format!(
                "merge budget maintenance needs a Gaussian RBF kernel, got {}",
                self.kernel.name()
            )));
        }
        self.config = config;
        Ok(())
    }

    pub fn set_budget_strategy(&mut self, strategy: BudgetStrategy) -> Result<()> {
        let config = self.config.clone().with_strategy(strategy);
        self.set_config(config)
    }

    pub fn set_error_tolerance(&mut self, error_tolerance: f64) -> Result<()> {
        let config = self.config.clone().with_error_tolerance(error_tolerance);
        self.set_config(config)
    }

    pub fn set_max_budget(&mut self, max_budget: usize) -> Result<()> {
        let config = self.config.clone().with_max_budget(max_budget);
        self.set_config(config)
    }

    fn ensure_unlocked(&self, what: &str) -> Result<()> {
        if self.locked {
            Err(KernelSpaceError::ConfigurationLocked(format!(
                "{what} cannot change after vectors have been added"
            )))
        } else {
            Ok(())
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }

    /// Number of shared basis vectors
    pub fn basis_size(&self) -> usize {
        self.vecs.len()
    }

    pub fn basis(&self) -> &[SparseVector] {
        &self.vecs
    }

    /// Coefficients of point `k` over the basis
    pub fn alpha(&self, k: usize) -> &[f64] {
        &self.alphas[k]
    }

    /// Gram matrix over the basis, kept only under projection
    pub fn gram(&self) -> Option<MatrixView<'_>> {
        self.tracks_gram().then(|| self.gram.view())
    }

    /// Incrementally maintained inverse Gram matrix, kept only under projection
    pub fn inverse_gram(&self) -> Option<MatrixView<'_>> {
        self.tracks_gram().then(|| self.inv_gram.view())
    }

    fn tracks_gram(&self) -> bool {
        self.config.strategy == BudgetStrategy::Projection
    }

    /// Append a new point with zero coefficients over the current basis
    pub fn add_point(&mut self) -> usize {
        self.alphas.push(vec![0.0; self.vecs.len()]);
        self.alphas.len() - 1
    }

    /// Read-only handle on point `k`
    ///
    /// # Panics
    /// Panics if `k >= len()`
    pub fn point(&self, k: usize) -> KernelPointRef<'_, K> {
        assert!(k < self.len(), "Point index {} out of bounds for {}", k, self.len());
        KernelPointRef { owner: self, index: k }
    }

    /// Per-query cache for `x`, reusable across every dot product with it
    pub fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        self.kernel.query_info(x)
    }

    /// `⟨point_k, φ(x)⟩`
    pub fn dot_vec(&self, k: usize, x: &SparseVector, qi: &[f64]) -> f64 {
        self.alphas[k]
            .iter()
            .enumerate()
            .filter(|(_, &a)| a != 0.0)
            .map(|(i, &a)| a * self.kernel.eval_query(i, x, qi, &self.vecs, &self.accel))
            .sum()
    }

    /// `⟨point_k, φ(x)⟩` for every point from a single pass of kernel
    /// evaluations
    pub fn dot_all(&self, x: &SparseVector, qi: &[f64]) -> Vec<f64> {
        let k_vec = self.kernel_column(x, qi);
        self.alphas
            .iter()
            .map(|alpha| alpha.iter().zip(&k_vec).map(|(a, k)| a * k).sum())
            .collect()
    }

    /// `⟨point_a, point_b⟩` for two points of this group
    pub fn dot_pair(&self, a: usize, b: usize) -> f64 {
        let (alpha_a, alpha_b) = (&self.alphas[a], &self.alphas[b]);
        if let Some(gram) = self.gram() {
            return gram.quadratic_form(alpha_a, alpha_b);
        }

        let n = self.vecs.len();
        let mut total = 0.0;
        for i in 0..n {
            if alpha_a[i] == 0.0 {
                continue;
            }
            for j in 0..n {
                if alpha_b[j] == 0.0 {
                    continue;
                }
                total += alpha_a[i]
                    * alpha_b[j]
                    * self.kernel.eval_pair(i, j, &self.vecs, &self.accel);
            }
        }
        total
    }

    /// `‖point_k‖²`
    pub fn norm_squared(&self, k: usize) -> f64 {
        self.dot_pair(k, k).max(0.0)
    }

    /// `‖point_k − φ(x)‖`
    pub fn dist_vec(&self, k: usize, x: &SparseVector, qi: &[f64]) -> f64 {
        let k_xx = self.kernel.eval(x, x);
        (self.norm_squared(k) + k_xx - 2.0 * self.dot_vec(k, x, qi))
            .max(0.0)
            .sqrt()
    }

    /// `‖point_a − point_b‖`
    pub fn dist_pair(&self, a: usize, b: usize) -> f64 {
        (self.norm_squared(a) + self.norm_squared(b) - 2.0 * self.dot_pair(a, b))
            .max(0.0)
            .sqrt()
    }

    /// `point_k ← c·point_k`
    pub fn mutable_multiply(&mut self, k: usize, c: f64) {
        for a in &mut self.alphas[k] {
            *a *= c;
        }
    }

    /// Scale every point by `c`
    pub fn mutable_multiply_all(&mut self, c: f64) {
        for k in 0..self.alphas.len() {
            self.mutable_multiply(k, c);
        }
    }

    /// `point_k ← point_k + c·φ(x)`
    pub fn mutable_add(&mut self, k: usize, c: f64, x: &SparseVector, qi: &[f64]) -> AddOutcome {
        let mut cs = vec![0.0; self.alphas.len()];
        cs[k] = c;
        self.mutable_add_all(&cs, x, qi)
    }

    /// `point_p ← point_p + cs[p]·φ(x)` for every point at once
    ///
    /// # Panics
    /// Panics if `cs.len() != len()`
    pub fn mutable_add_all(&mut self, cs: &[f64], x: &SparseVector, qi: &[f64]) -> AddOutcome {
        assert_eq!(
            cs.len(),
            self.alphas.len(),
            "One coefficient per point is required"
        );
        if cs.iter().all(|&c| c == 0.0) {
            return AddOutcome::Skipped;
        }
        self.locked = true;

        match self.config.strategy {
            BudgetStrategy::Projection => self.add_projection(cs, x, qi),
            BudgetStrategy::Stop => {
                if self.vecs.len() < self.config.max_budget {
                    self.append(cs, x);
                    AddOutcome::Appended
                } else {
                    AddOutcome::Dropped
                }
            }
            BudgetStrategy::Random => {
                let evicted = if self.vecs.len() >= self.config.max_budget {
                    let index = self.rng.gen_range(0..self.vecs.len());
                    self.swap_remove_basis(index);
                    debug!("Evicted basis vector {index} to stay within budget");
                    Some(index)
                } else {
                    None
                };
                self.append(cs, x);
                match evicted {
                    Some(index) => AddOutcome::Evicted { index },
                    None => AddOutcome::Appended,
                }
            }
            BudgetStrategy::MergeRbf => {
                self.append(cs, x);
                if self.vecs.len() > self.config.max_budget {
                    self.merge_once();
                    AddOutcome::Merged
                } else {
                    AddOutcome::Appended
                }
            }
        }
    }

    /// Forget every basis vector and coefficient
    ///
    /// The budget configuration stays locked.
    pub fn clear(&mut self) {
        self.vecs.clear();
        self.accel.clear();
        for alpha in &mut self.alphas {
            alpha.clear();
        }
        self.gram.clear();
        self.inv_gram.clear();
    }

    /// Set point `k` to the zero vector, keeping the shared basis
    pub fn zero_out(&mut self, k: usize) {
        for a in &mut self.alphas[k] {
            *a = 0.0;
        }
    }

    /// `[k(basis_i, x)]_i`
    fn kernel_column(&self, x: &SparseVector, qi: &[f64]) -> Vec<f64> {
        (0..self.vecs.len())
            .map(|i| self.kernel.eval_query(i, x, qi, &self.vecs, &self.accel))
            .collect()
    }

    fn add_projection(&mut self, cs: &[f64], x: &SparseVector, qi: &[f64]) -> AddOutcome {
        let k_xx = self.kernel.eval(x, x);

        if self.vecs.is_empty() {
            if k_xx <= 0.0 {
                // φ(x) is the zero vector
                return AddOutcome::Projected { residual: 0.0 };
            }
            self.gram.grow();
            self.gram.set(0, 0, k_xx);
            self.inv_gram.grow();
            self.inv_gram.set(0, 0, 1.0 / k_xx);
            self.append(cs, x);
            return AddOutcome::Appended;
        }

        let k_vec = self.kernel_column(x, qi);
        let projection = self.inv_gram.multiply(&k_vec);
        let spanned: f64 = k_vec.iter().zip(&projection).map(|(a, b)| a * b).sum();
        let residual = (k_xx - spanned).max(0.0);

        // Strict so an exact duplicate folds even at zero tolerance
        if residual.sqrt() > self.config.error_tolerance
            && self.vecs.len() < self.config.max_budget
        {
            let n = self.vecs.len();

            self.gram.grow();
            for (i, &k) in k_vec.iter().enumerate() {
                self.gram.set(i, n, k);
                self.gram.set(n, i, k);
            }
            self.gram.set(n, n, k_xx);

            // [K k; kᵀ k_xx]⁻¹ = [K⁻¹ 0; 0 0] + (1/δ²)·[d; −1][d; −1]ᵀ
            let mut u = projection;
            u.push(-1.0);
            self.inv_gram.grow();
            self.inv_gram.rank_one_update(1.0 / residual, &u, &u);

            self.append(cs, x);
            debug!(
                "Basis grew to {} vectors (residual {residual:.3e})",
                self.vecs.len()
            );
            AddOutcome::Appended
        } else {
            for (alpha, &c) in self.alphas.iter_mut().zip(cs) {
                if c == 0.0 {
                    continue;
                }
                for (a, &p) in alpha.iter_mut().zip(&projection) {
                    *a += c * p;
                }
            }
            AddOutcome::Projected { residual }
        }
    }

    fn append(&mut self, cs: &[f64], x: &SparseVector) {
        self.vecs.push(x.clone());
        self.kernel.extend_accel_cache(x, &mut self.accel);
        for (alpha, &c) in self.alphas.iter_mut().zip(cs) {
            alpha.push(c);
        }
    }

    fn swap_remove_basis(&mut self, index: usize) {
        self.vecs.swap_remove(index);
        for alpha in &mut self.alphas {
            alpha.swap_remove(index);
        }
        if self.accel.len() == self.vecs.len() + 1 {
            self.accel.swap_remove(index);
        } else {
            self.accel = self.kernel.accel_cache(&self.vecs);
        }
    }

    /// Merge the lightest basis vector into its cheapest partner
    fn merge_once(&mut self) {
        let n_basis = self.vecs.len();
        if n_basis < 2 {
            return;
        }

        let weight = |i: usize| -> f64 { self.alphas.iter().map(|a| a[i] * a[i]).sum() };
        let m = (0..n_basis)
            .min_by(|&i, &j| weight(i).total_cmp(&weight(j)))
            .unwrap_or(0);
        let alpha_m: Vec<f64> = self.alphas.iter().map(|a| a[m]).collect();

        let mut best: Option<(usize, f64, f64, f64)> = None;
        for n in (0..n_basis).filter(|&n| n != m) {
            let k_mn = self.kernel.eval_pair(m, n, &self.vecs, &self.accel);
            let alpha_n: Vec<f64> = self.alphas.iter().map(|a| a[n]).collect();
            let plan = plan_merge(k_mn, &alpha_m, &alpha_n);
            if best.map_or(true, |(_, _, _, loss)| plan.loss < loss) {
                best = Some((n, k_mn, plan.h, plan.loss));
            }
        }

        let Some((n, k_mn, h, loss)) = best else {
            return;
        };
        let (w_m, w_n) = merge_weights(k_mn, h);

        let mut z = self.vecs[m].clone();
        z.scale(h);
        z.add_scaled(1.0 - h, &self.vecs[n]);

        for alpha in &mut self.alphas {
            alpha[m] = alpha[m] * w_m + alpha[n] * w_n;
        }
        self.vecs[m] = z;
        if self.kernel.supports_acceleration() {
            match self.kernel.query_info(&self.vecs[m]).as_slice() {
                [entry] if self.accel.len() == n_basis => self.accel[m] = *entry,
                _ => self.accel = self.kernel.accel_cache(&self.vecs),
            }
        }
        self.swap_remove_basis(n);

        debug!("Merged basis vectors {m} and {n} (h = {h:.4}, loss = {loss:.3e})");
    }

    /// `Σ_i Σ_j α_i·β_j·k(basis_i, basis_j)` with plain kernel evaluations
    ///
    /// Ignores every cache; meant for checking the cached paths.
    pub fn dot_pair_bruteforce(&self, a: usize, b: usize) -> f64 {
        let mut total = 0.0;
        for (i, vi) in self.vecs.iter().enumerate() {
            for (j, vj) in self.vecs.iter().enumerate() {
                total += self.alphas[a][i] * self.alphas[b][j] * self.kernel.eval(vi, vj);
            }
        }
        total
    }
}

/// Borrowed view of one point of a [`KernelPoints`] group
#[derive(Debug)]
pub struct KernelPointRef<'a, K: KernelTrick> {
    owner: &'a KernelPoints<K>,
    index: usize,
}

impl<'a, K: KernelTrick> Clone for KernelPointRef<'a, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K: KernelTrick> Copy for KernelPointRef<'a, K> {}

impl<'a, K: KernelTrick> KernelPointRef<'a, K> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn basis(&self) -> &'a [SparseVector] {
        &self.owner.vecs
    }

    pub fn alpha(&self) -> &'a [f64] {
        &self.owner.alphas[self.index]
    }

    pub fn dot_vec(&self, x: &SparseVector, qi: &[f64]) -> f64 {
        self.owner.dot_vec(self.index, x, qi)
    }

    pub fn norm_squared(&self) -> f64 {
        self.owner.norm_squared(self.index)
    }

    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// `⟨self, other⟩`, using the shared Gram bookkeeping when both views
    /// come from the same group
    pub fn dot_point(&self, other: &KernelPointRef<'_, K>) -> f64 {
        if std::ptr::eq(self.owner, other.owner) {
            return self.owner.dot_pair(self.index, other.index);
        }

        let kernel = &self.owner.kernel;
        let mut total = 0.0;
        for (&a, vi) in self.alpha().iter().zip(self.basis()) {
            if a == 0.0 {
                continue;
            }
            for (&b, vj) in other.alpha().iter().zip(other.basis()) {
                if b != 0.0 {
                    total += a * b * kernel.eval(vi, vj);
                }
            }
        }
        total
    }

    pub fn dist_vec(&self, x: &SparseVector, qi: &[f64]) -> f64 {
        self.owner.dist_vec(self.index, x, qi)
    }

    pub fn dist_point(&self, other: &KernelPointRef<'_, K>) -> f64 {
        (self.norm_squared() + other.norm_squared() - 2.0 * self.dot_point(other))
            .max(0.0)
            .sqrt()
    }
}
