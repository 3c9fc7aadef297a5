//! Linear-scan collection

use crate::collection::{check_range, BoundedNeighborList, Neighbor, VectorCollection};
use crate::core::{Result, SparseVector};
use crate::metric::DistanceMetric;
use std::sync::Arc;

/// Exhaustive search over every stored vector
///
/// Accepts any metric, subadditive or not, and serves as the reference the
/// tree-based collections are checked against.
pub struct BruteForceCollection<M: DistanceMetric> {
    metric: Arc<M>,
    points: Arc<Vec<SparseVector>>,
    cache: Vec<f64>,
}

impl<M: DistanceMetric> BruteForceCollection<M> {
    pub fn new(points: Vec<SparseVector>, metric: M) -> Self {
        let cache = metric.accel_cache(&points);
        Self {
            metric: Arc::new(metric),
            points: Arc::new(points),
            cache,
        }
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    fn distances<'a>(
        &'a self,
        query: &'a SparseVector,
    ) -> impl Iterator<Item = Neighbor> + 'a {
        let qi = self.metric.query_info(query);
        (0..self.points.len()).map(move |i| {
            Neighbor::new(
                i,
                self.metric
                    .dist_query(i, query, &qi, &self.points, &self.cache),
            )
        })
    }
}

impl<M: DistanceMetric> VectorCollection for BruteForceCollection<M> {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn get(&self, index: usize) -> &SparseVector {
        &self.points[index]
    }

    fn search_knn(&self, query: &SparseVector, k: usize) -> Vec<Neighbor> {
        let mut list = BoundedNeighborList::new(k);
        for neighbor in self.distances(query) {
            list.push(neighbor);
        }
        list.into_vec()
    }

    fn search_range(&self, query: &SparseVector, range: f64) -> Result<Vec<Neighbor>> {
        check_range(range)?;
        let mut hits: Vec<Neighbor> = self
            .distances(query)
            .filter(|n| n.distance <= range)
            .collect();
        hits.sort_by(|a, b| a.rank(b));
        Ok(hits)
    }
}
