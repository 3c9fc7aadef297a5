//! Dense matrices and the expandable square view used for Gram matrices

use serde::{Deserialize, Serialize};

/// Row-major dense matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Create a zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Identity matrix of size `n`
    pub fn eye(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    #[inline]
    pub fn increment(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] += value;
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Matrix-vector product `A·x`
    ///
    /// # Panics
    /// Panics if `x.len() != cols`
    pub fn multiply(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.cols, "Vector length must match column count");
        (0..self.rows)
            .map(|i| self.row(i).iter().zip(x).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// In-place `A += c·u·vᵀ`
    pub fn rank_one_update(&mut self, c: f64, u: &[f64], v: &[f64]) {
        assert_eq!(u.len(), self.rows, "u must match row count");
        assert_eq!(v.len(), self.cols, "v must match column count");
        for (i, &ui) in u.iter().enumerate() {
            if ui == 0.0 {
                continue;
            }
            let scale = c * ui;
            let row = &mut self.data[i * self.cols..(i + 1) * self.cols];
            for (a, &vj) in row.iter_mut().zip(v) {
                *a += scale * vj;
            }
        }
    }
}

/// Square matrix whose logical size can grow one row/column at a time
///
/// The logical `size × size` matrix lives in the top-left corner of a larger
/// backing [`DenseMatrix`]. Growing past the backing capacity doubles it and
/// copies the old contents over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandableMatrix {
    backing: DenseMatrix,
    size: usize,
}

impl Default for ExpandableMatrix {
    fn default() -> Self {
        Self::with_capacity(16)
    }
}

impl ExpandableMatrix {
    /// Empty matrix with room for `capacity` rows/columns before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            backing: DenseMatrix::zeros(capacity, capacity),
            size: 0,
        }
    }

    /// Logical dimension
    pub fn size(&self) -> usize {
        self.size
    }

    /// Backing dimension
    pub fn capacity(&self) -> usize {
        self.backing.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.size && j < self.size);
        self.backing.get(i, j)
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.size && j < self.size);
        self.backing.set(i, j, value);
    }

    /// Read-only window over the logical matrix
    pub fn view(&self) -> MatrixView<'_> {
        MatrixView {
            backing: &self.backing,
            size: self.size,
        }
    }

    /// Add one zeroed row and column to the logical matrix
    pub fn grow(&mut self) {
        if self.size == self.capacity() {
            let new_capacity = self.capacity() * 2;
            let mut backing = DenseMatrix::zeros(new_capacity, new_capacity);
            for i in 0..self.size {
                for j in 0..self.size {
                    backing.set(i, j, self.backing.get(i, j));
                }
            }
            self.backing = backing;
        }

        let n = self.size;
        for k in 0..=n {
            self.backing.set(n, k, 0.0);
            self.backing.set(k, n, 0.0);
        }
        self.size += 1;
    }

    /// Move the last row/column into position `i` and shrink by one
    pub fn swap_remove(&mut self, i: usize) {
        assert!(i < self.size, "Index {} out of bounds for size {}", i, self.size);
        let last = self.size - 1;
        if i != last {
            for k in 0..self.size {
                let v = self.backing.get(last, k);
                self.backing.set(i, k, v);
            }
            for k in 0..self.size {
                let v = self.backing.get(k, last);
                self.backing.set(k, i, v);
            }
            let corner = self.backing.get(last, last);
            self.backing.set(i, i, corner);
        }
        self.size = last;
    }

    /// Logical matrix-vector product
    pub fn multiply(&self, x: &[f64]) -> Vec<f64> {
        self.view().multiply(x)
    }

    /// In-place `A += c·u·vᵀ` over the logical matrix
    pub fn rank_one_update(&mut self, c: f64, u: &[f64], v: &[f64]) {
        assert_eq!(u.len(), self.size, "u must match logical size");
        assert_eq!(v.len(), self.size, "v must match logical size");
        for (i, &ui) in u.iter().enumerate() {
            if ui == 0.0 {
                continue;
            }
            for (j, &vj) in v.iter().enumerate() {
                self.backing.increment(i, j, c * ui * vj);
            }
        }
    }

    /// Drop every row and column, keeping the backing allocation
    pub fn clear(&mut self) {
        self.size = 0;
    }

    /// Copy the logical matrix out into a standalone [`DenseMatrix`]
    pub fn to_dense(&self) -> DenseMatrix {
        let mut m = DenseMatrix::zeros(self.size, self.size);
        for i in 0..self.size {
            for j in 0..self.size {
                m.set(i, j, self.backing.get(i, j));
            }
        }
        m
    }
}

/// Bounded view into the top-left `size × size` block of a backing matrix
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    backing: &'a DenseMatrix,
    size: usize,
}

impl<'a> MatrixView<'a> {
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.size && j < self.size);
        self.backing.get(i, j)
    }

    /// Row `i` restricted to the logical columns
    pub fn row(&self, i: usize) -> &'a [f64] {
        &self.backing.row(i)[..self.size]
    }

    pub fn multiply(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.size, "Vector length must match view size");
        (0..self.size)
            .map(|i| self.row(i).iter().zip(x).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// Quadratic form `xᵀ·A·y`
    pub fn quadratic_form(&self, x: &[f64], y: &[f64]) -> f64 {
        x.iter()
            .zip(self.multiply(y))
            .map(|(a, b)| a * b)
            .sum()
    }
}
