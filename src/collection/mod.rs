//! Nearest-neighbor collections over a fixed set of vectors

pub mod brute_force;
pub mod neighbor;

pub use self::brute_force::*;
pub use self::neighbor::*;

use crate::core::{Result, SparseVector};

/// A searchable, immutable set of vectors
///
/// Results are ordered by ascending distance, ties going to the smaller
/// index, and carry each vector's position in the original input.
pub trait VectorCollection: Send + Sync {
    /// Number of stored vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored vector by original index
    fn get(&self, index: usize) -> &SparseVector;

    /// The `k` vectors closest to `query`
    fn search_knn(&self, query: &SparseVector, k: usize) -> Vec<Neighbor>;

    /// Every vector within `range` of `query`
    ///
    /// Fails with [`KernelSpaceError::InvalidRange`] unless `range > 0`.
    ///
    /// [`KernelSpaceError::InvalidRange`]: crate::core::KernelSpaceError::InvalidRange
    fn search_range(&self, query: &SparseVector, range: f64) -> Result<Vec<Neighbor>>;
}

pub(crate) fn check_range(range: f64) -> Result<()> {
    if range > 0.0 {
        Ok(())
    } else {
        Err(crate::core::KernelSpaceError::InvalidRange(range))
    }
}
