//! Lp distances other than L2

use crate::core::{KernelSpaceError, Result, SparseVector};
use crate::metric::DistanceMetric;

/// L1 (taxicab) distance
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanDistance;

impl DistanceMetric for ManhattanDistance {
    fn dist(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        let mut total = 0.0;
        a.for_each_pair(b, |x, y| total += (x - y).abs());
        total
    }

    fn is_subadditive(&self) -> bool {
        true
    }

    fn name(&self) -> String {
        "manhattan".to_string()
    }
}

/// L∞ distance
#[derive(Debug, Clone, Copy, Default)]
pub struct ChebyshevDistance;

impl DistanceMetric for ChebyshevDistance {
    fn dist(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        let mut max = 0.0_f64;
        a.for_each_pair(b, |x, y| max = max.max((x - y).abs()));
        max
    }

    fn is_subadditive(&self) -> bool {
        true
    }

    fn name(&self) -> String {
        "chebyshev".to_string()
    }
}

/// General Lp distance `(Σ|a_i − b_i|^p)^{1/p}`
///
/// A true metric only for `p >= 1`; for `0 < p < 1` it is still a usable
/// dissimilarity but reports itself as not subadditive.
#[derive(Debug, Clone, Copy)]
pub struct MinkowskiDistance {
    p: f64,
}

impl MinkowskiDistance {
    pub fn new(p: f64) -> Result<Self> {
        if !(p > 0.0 && p.is_finite()) {
            return Err(KernelSpaceError::InvalidParameter(format!(
                "Minkowski p must be positive and finite, got {p}"
            )));
        }
        Ok(Self { p })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl DistanceMetric for MinkowskiDistance {
    fn dist(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        let mut total = 0.0;
        a.for_each_pair(b, |x, y| total += (x - y).abs().powf(self.p));
        total.powf(1.0 / self.p)
    }

    fn is_subadditive(&self) -> bool {
        self.p >= 1.0
    }

    fn name(&self) -> String {
        format!("minkowski(p={})", self.p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair() -> (SparseVector, SparseVector) {
        (
            SparseVector::new(vec![0, 2], vec![1.0, -2.0]),
            SparseVector::new(vec![1, 2], vec![3.0, 1.0]),
        )
    }

    #[test]
    fn test_manhattan_and_chebyshev() {
        let (a, b) = pair();
        // |1| + |−3| + |−3|
        assert_relative_eq!(ManhattanDistance.dist(&a, &b), 7.0);
        assert_relative_eq!(ChebyshevDistance.dist(&a, &b), 3.0);
    }

    #[test]
    fn test_minkowski_matches_special_cases() {
        let (a, b) = pair();
        let l1 = MinkowskiDistance::new(1.0).expect("valid p");
        let l2 = MinkowskiDistance::new(2.0).expect("valid p");
        assert_relative_eq!(l1.dist(&a, &b), 7.0, epsilon = 1e-12);
        assert_relative_eq!(l2.dist(&a, &b), 19.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_minkowski_subadditivity() {
        assert!(MinkowskiDistance::new(1.5).expect("valid p").is_subadditive());
        assert!(!MinkowskiDistance::new(0.5).expect("valid p").is_subadditive());
        assert!(MinkowskiDistance::new(0.0).is_err());
        assert!(MinkowskiDistance::new(f64::NAN).is_err());
    }
}
