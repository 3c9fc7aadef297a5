//! Core type definitions

use serde::{Deserialize, Serialize};

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Label a decision value; zero goes to the positive class
    pub fn from_decision_value(decision_value: f64) -> Self {
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Self::new(label, decision_value)
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from a dense slice, keeping only non-zero entries
    pub fn from_dense(dense: &[f64]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate over the stored `(index, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// One past the largest stored index
    pub fn dim(&self) -> usize {
        self.indices.last().map_or(0, |&i| i + 1)
    }

    /// Dot product with another sparse vector
    ///
    /// Both index lists are sorted, so this is a single merge pass in
    /// O(nnz(x) + nnz(y)).
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        let mut i = 0;
        let mut j = 0;

        while i < self.indices.len() && j < other.indices.len() {
            let a = self.indices[i];
            let b = other.indices[j];

            if a == b {
                result += self.values[i] * other.values[j];
                i += 1;
                j += 1;
            } else if a < b {
                i += 1;
            } else {
                j += 1;
            }
        }

        result
    }

    /// Squared Euclidean distance to another sparse vector
    pub fn squared_distance(&self, other: &SparseVector) -> f64 {
        let mut distance_sq = 0.0;
        self.for_each_pair(other, |x, y| distance_sq += (x - y) * (x - y));
        distance_sq
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// In-place `self += c * other`
    pub fn add_scaled(&mut self, c: f64, other: &SparseVector) {
        if c == 0.0 || other.is_empty() {
            return;
        }

        let mut indices = Vec::with_capacity(self.nnz() + other.nnz());
        let mut values = Vec::with_capacity(self.nnz() + other.nnz());
        let (mut i, mut j) = (0, 0);

        while i < self.indices.len() || j < other.indices.len() {
            let a = self.indices.get(i).copied().unwrap_or(usize::MAX);
            let b = other.indices.get(j).copied().unwrap_or(usize::MAX);

            if a == b {
                indices.push(a);
                values.push(self.values[i] + c * other.values[j]);
                i += 1;
                j += 1;
            } else if a < b {
                indices.push(a);
                values.push(self.values[i]);
                i += 1;
            } else {
                indices.push(b);
                values.push(c * other.values[j]);
                j += 1;
            }
        }

        self.indices = indices;
        self.values = values;
    }

    /// In-place scaling by a constant
    pub fn scale(&mut self, c: f64) {
        if c == 0.0 {
            self.zero_out();
            return;
        }
        for v in &mut self.values {
            *v *= c;
        }
    }

    /// Remove every stored entry
    pub fn zero_out(&mut self) {
        self.indices.clear();
        self.values.clear();
    }

    /// Call `f(x_i, y_i)` for every index stored in either vector
    pub(crate) fn for_each_pair<F: FnMut(f64, f64)>(&self, other: &SparseVector, mut f: F) {
        let (mut i, mut j) = (0, 0);

        while i < self.indices.len() && j < other.indices.len() {
            let a = self.indices[i];
            let b = other.indices[j];

            if a == b {
                f(self.values[i], other.values[j]);
                i += 1;
                j += 1;
            } else if a < b {
                f(self.values[i], 0.0);
                i += 1;
            } else {
                f(0.0, other.values[j]);
                j += 1;
            }
        }

        for &v in &self.values[i..] {
            f(v, 0.0);
        }
        for &v in &other.values[j..] {
            f(0.0, v);
        }
    }
}

/// Training sample with features and label
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label (+1 or -1 for binary learners, a class index otherwise)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: f64) -> Self {
        Self { features, label }
    }
}
