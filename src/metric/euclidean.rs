//! Euclidean distances

use crate::core::SparseVector;
use crate::metric::DistanceMetric;

/// L2 distance, accelerated with cached squared norms
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl EuclideanDistance {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn from_norms(a_norm_sq: f64, b_norm_sq: f64, dot: f64) -> f64 {
        (a_norm_sq + b_norm_sq - 2.0 * dot).max(0.0).sqrt()
    }
}

impl DistanceMetric for EuclideanDistance {
    fn dist(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        a.squared_distance(b).sqrt()
    }

    fn is_subadditive(&self) -> bool {
        true
    }

    fn supports_acceleration(&self) -> bool {
        true
    }

    fn query_info(&self, x: &SparseVector) -> Vec<f64> {
        vec![x.norm_squared()]
    }

    fn dist_pair(&self, i: usize, j: usize, vecs: &[SparseVector], cache: &[f64]) -> f64 {
        match (cache.get(i), cache.get(j)) {
            (Some(&a), Some(&b)) => Self::from_norms(a, b, vecs[i].dot(&vecs[j])),
            _ => self.dist(&vecs[i], &vecs[j]),
        }
    }

    fn dist_query(
        &self,
        i: usize,
        q: &SparseVector,
        qi: &[f64],
        vecs: &[SparseVector],
        cache: &[f64],
    ) -> f64 {
        match (cache.get(i), qi.first()) {
            (Some(&a), Some(&b)) => Self::from_norms(a, b, vecs[i].dot(q)),
            _ => self.dist(&vecs[i], q),
        }
    }

    fn name(&self) -> String {
        "euclidean".to_string()
    }
}

/// Squared L2 distance
///
/// Useful as a ranking function but it violates the triangle inequality
/// (`d(0,2) = 4 > d(0,1) + d(1,2) = 2`), so metric trees reject it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclideanDistance;

impl DistanceMetric for SquaredEuclideanDistance {
    fn dist(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        a.squared_distance(b)
    }

    fn is_subadditive(&self) -> bool {
        false
    }

    fn name(&self) -> String {
        "squared-euclidean".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_euclidean_distance() {
        let a = SparseVector::new(vec![0, 1], vec![0.0, 0.0]);
        let b = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        assert_relative_eq!(EuclideanDistance.dist(&a, &b), 5.0);
        assert_relative_eq!(SquaredEuclideanDistance.dist(&a, &b), 25.0);
    }

    #[test]
    fn test_cached_paths_agree() {
        let metric = EuclideanDistance::new();
        let vecs = vec![
            SparseVector::new(vec![0], vec![1.0]),
            SparseVector::new(vec![0, 3], vec![-2.0, 2.0]),
            SparseVector::empty(),
        ];
        let cache = metric.accel_cache(&vecs);
        assert_eq!(cache.len(), 3);

        let q = SparseVector::new(vec![3], vec![1.0]);
        let qi = metric.query_info(&q);
        for i in 0..vecs.len() {
            assert_relative_eq!(
                metric.dist_query(i, &q, &qi, &vecs, &cache),
                metric.dist(&vecs[i], &q),
                epsilon = 1e-12
            );
            for j in 0..vecs.len() {
                assert_relative_eq!(
                    metric.dist_pair(i, j, &vecs, &cache),
                    metric.dist(&vecs[i], &vecs[j]),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_subadditivity_flags() {
        assert!(EuclideanDistance.is_subadditive());
        assert!(!SquaredEuclideanDistance.is_subadditive());
    }
}
