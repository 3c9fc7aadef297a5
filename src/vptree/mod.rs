//! Vantage-point tree
//!
//! A metric tree over a fixed set of sparse vectors. Each internal node picks
//! a vantage point and splits the remaining points at the median of their
//! distances to it; searches skip every subtree whose distance band cannot
//! hold a closer point than the current candidates. Pruning relies on the
//! triangle inequality, so only subadditive metrics are accepted.

mod build;
mod node;

pub use self::build::{VPTreeBuilder, VantageSelection, MIN_LEAF_SIZE};

use crate::collection::{check_range, BoundedNeighborList, Neighbor, VectorCollection};
use crate::core::{Result, SparseVector};
use crate::metric::DistanceMetric;
use self::node::Node;
use std::sync::Arc;

/// Absolute slack on pruning comparisons so cached and direct distance
/// evaluations that differ in the last bits never drop a true neighbor
const PRUNE_SLACK: f64 = 1e-9;

/// Immutable vantage-point tree
pub struct VPTree<M: DistanceMetric> {
    metric: Arc<M>,
    points: Arc<Vec<SparseVector>>,
    cache: Arc<Vec<f64>>,
    root: Option<Box<Node>>,
    max_leaf_size: usize,
}

impl<M: DistanceMetric> VPTree<M> {
    /// Builder with the default options
    pub fn builder(metric: M) -> VPTreeBuilder<M> {
        VPTreeBuilder::new(metric)
    }

    /// Build with the default options
    pub fn new(points: Vec<SparseVector>, metric: M) -> Result<Self> {
        VPTreeBuilder::new(metric).build(points)
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn max_leaf_size(&self) -> usize {
        self.max_leaf_size
    }

    /// The stored vectors in input order
    pub fn points(&self) -> &[SparseVector] {
        &self.points
    }

    /// Number of levels, 0 for an empty tree
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.depth())
    }

    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.node_count())
    }

    /// Number of points in each leaf, left to right
    pub fn leaf_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::new();
        if let Some(root) = &self.root {
            root.collect_leaf_sizes(&mut sizes);
        }
        sizes
    }

    /// Check the structural invariants by recomputing every distance
    ///
    /// Every point appears exactly once, subtree points lie inside their
    /// node's distance bands, leaves respect the size limit and their stored
    /// bounds match the parent's vantage distances.
    pub fn invariants_hold(&self) -> bool {
        let Some(root) = &self.root else {
            return self.points.is_empty();
        };

        let mut seen = Vec::new();
        root.collect_points(&mut seen);
        seen.sort_unstable();
        if seen.len() != self.points.len() || seen.iter().enumerate().any(|(i, &p)| i != p) {
            return false;
        }

        self.node_holds(root, None)
    }

    fn node_holds(&self, node: &Node, parent: Option<usize>) -> bool {
        let within = |vp: usize, p: usize, low: f64, high: f64| {
            let d = self.distance_between(vp, p);
            d >= low - PRUNE_SLACK && d <= high + PRUNE_SLACK
        };

        match node {
            Node::Leaf { points, bounds } => {
                if points.len() > self.max_leaf_size || points.len() != bounds.len() {
                    return false;
                }
                match parent {
                    Some(vp) => points
                        .iter()
                        .zip(bounds)
                        .all(|(&p, &b)| within(vp, p, b, b)),
                    None => true,
                }
            }
            Node::Internal {
                vantage,
                left_low,
                left_high,
                right_low,
                right_high,
                left,
                right,
            } => {
                if left_low > left_high || right_low > right_high || left_high > right_low {
                    return false;
                }
                let band_ok = |child: &Option<Box<Node>>, low: f64, high: f64| {
                    child.as_ref().map_or(true, |c| {
                        let mut below = Vec::new();
                        c.collect_points(&mut below);
                        below.iter().all(|&p| within(*vantage, p, low, high))
                            && self.node_holds(c, Some(*vantage))
                    })
                };
                band_ok(left, *left_low, *left_high) && band_ok(right, *right_low, *right_high)
            }
        }
    }

    fn distance_between(&self, i: usize, j: usize) -> f64 {
        self.metric.dist_pair(i, j, &self.points, &self.cache)
    }

    /// Walk the tree, offering every unpruned point to `visit`
    ///
    /// `visit` receives a candidate and returns the current search radius.
    fn search<F>(&self, query: &SparseVector, tau: f64, visit: &mut F)
    where
        F: FnMut(Neighbor) -> f64,
    {
        let qi = self.metric.query_info(query);
        if let Some(root) = &self.root {
            let mut search = Search {
                tree: self,
                query,
                qi: &qi,
                tau,
            };
            search.visit_node(root, None, visit);
        }
    }
}

struct Search<'a, M: DistanceMetric> {
    tree: &'a VPTree<M>,
    query: &'a SparseVector,
    qi: &'a [f64],
    tau: f64,
}

impl<'a, M: DistanceMetric> Search<'a, M> {
    fn distance_to(&self, index: usize) -> f64 {
        self.tree
            .metric
            .dist_query(index, self.query, self.qi, &self.tree.points, &self.tree.cache)
    }

    fn offer<F: FnMut(Neighbor) -> f64>(&mut self, neighbor: Neighbor, visit: &mut F) {
        self.tau = visit(neighbor);
    }

    fn visit_node<F>(&mut self, node: &Node, parent_x: Option<f64>, visit: &mut F)
    where
        F: FnMut(Neighbor) -> f64,
    {
        match node {
            Node::Leaf { points, bounds } => {
                for (&p, &bound) in points.iter().zip(bounds) {
                    if let Some(x) = parent_x {
                        if (x - bound).abs() > self.tau + PRUNE_SLACK {
                            continue;
                        }
                    }
                    let d = self.distance_to(p);
                    self.offer(Neighbor::new(p, d), visit);
                }
            }
            Node::Internal {
                vantage,
                left_low,
                left_high,
                right_low,
                right_high,
                left,
                right,
            } => {
                let x = self.distance_to(*vantage);
                self.offer(Neighbor::new(*vantage, x), visit);

                let near_left = x < 0.5 * (left_high + right_low);
                let sides = [
                    (left, *left_low, *left_high),
                    (right, *right_low, *right_high),
                ];
                let order = if near_left { [0, 1] } else { [1, 0] };

                for side in order {
                    let (child, low, high) = sides[side];
                    let Some(child) = child else { continue };
                    let slack = self.tau + PRUNE_SLACK;
                    if low - slack <= x && x <= high + slack {
                        self.visit_node(child, Some(x), visit);
                    }
                }
            }
        }
    }
}

impl<M: DistanceMetric> Clone for VPTree<M> {
    fn clone(&self) -> Self {
        Self {
            metric: Arc::clone(&self.metric),
            points: Arc::clone(&self.points),
            cache: Arc::clone(&self.cache),
            root: self.root.clone(),
            max_leaf_size: self.max_leaf_size,
        }
    }
}

impl<M: DistanceMetric> std::fmt::Debug for VPTree<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VPTree")
            .field("metric", &self.metric.name())
            .field("points", &self.points.len())
            .field("max_leaf_size", &self.max_leaf_size)
            .field("depth", &self.depth())
            .finish()
    }
}

impl<M: DistanceMetric> VectorCollection for VPTree<M> {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn get(&self, index: usize) -> &SparseVector {
        &self.points[index]
    }

    fn search_knn(&self, query: &SparseVector, k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let mut list = BoundedNeighborList::new(k);
        self.search(query, f64::INFINITY, &mut |candidate| {
            list.push(candidate);
            list.worst_distance()
        });
        list.into_vec()
    }

    fn search_range(&self, query: &SparseVector, range: f64) -> Result<Vec<Neighbor>> {
        check_range(range)?;
        let mut hits = Vec::new();
        self.search(query, range, &mut |candidate| {
            if candidate.distance <= range {
                hits.push(candidate);
            }
            range
        });
        hits.sort_by(|a, b| a.rank(b));
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::BruteForceCollection;
    use crate::core::KernelSpaceError;
    use crate::metric::{EuclideanDistance, ManhattanDistance, SquaredEuclideanDistance};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, dim: usize, seed: u64) -> Vec<SparseVector> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let values: Vec<f64> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
                SparseVector::from_dense(&values)
            })
            .collect()
    }

    #[test]
    fn test_rejects_non_subadditive_metric() {
        let result = VPTree::new(random_points(10, 2, 1), SquaredEuclideanDistance);
        assert!(matches!(
            result,
            Err(KernelSpaceError::NonSubadditiveMetric(_))
        ));
    }

    #[test]
    fn test_empty_tree() {
        let tree = VPTree::new(Vec::new(), EuclideanDistance).unwrap();
        let q = SparseVector::new(vec![0], vec![1.0]);
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.search_knn(&q, 3).is_empty());
        assert!(tree.search_range(&q, 1.0).unwrap().is_empty());
        assert!(tree.invariants_hold());
    }

    #[test]
    fn test_small_input_is_single_leaf() {
        let tree = VPTree::new(random_points(4, 3, 2), EuclideanDistance).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_sizes(), vec![4]);
    }

    #[test]
    fn test_knn_matches_brute_force() {
        let points = random_points(300, 4, 3);
        let brute = BruteForceCollection::new(points.clone(), EuclideanDistance);
        let tree = VPTree::builder(EuclideanDistance)
            .with_seed(11)
            .build(points)
            .unwrap();
        assert!(tree.invariants_hold());

        for q in random_points(20, 4, 4) {
            for k in [1, 7, 150, 300, 400] {
                let expected: Vec<usize> = brute.search_knn(&q, k).iter().map(|n| n.index).collect();
                let got: Vec<usize> = tree.search_knn(&q, k).iter().map(|n| n.index).collect();
                assert_eq!(got, expected);
            }
        }
    }

    #[test]
    fn test_range_matches_brute_force() {
        let points = random_points(250, 3, 5);
        let brute = BruteForceCollection::new(points.clone(), ManhattanDistance);
        let tree = VPTree::builder(ManhattanDistance)
            .with_selection(VantageSelection::Random)
            .with_seed(3)
            .build(points)
            .unwrap();

        for q in random_points(10, 3, 6) {
            for range in [0.1, 0.5, 1.5] {
                assert_eq!(
                    tree.search_range(&q, range).unwrap(),
                    brute.search_range(&q, range).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_range_must_be_positive() {
        let tree = VPTree::new(random_points(20, 2, 7), EuclideanDistance).unwrap();
        let q = SparseVector::new(vec![0], vec![0.0]);
        assert!(matches!(
            tree.search_range(&q, 0.0),
            Err(KernelSpaceError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_clone_answers_identically() {
        let tree = VPTree::builder(EuclideanDistance)
            .with_seed(9)
            .build(random_points(120, 3, 8))
            .unwrap();
        let copy = tree.clone();
        assert_eq!(copy.node_count(), tree.node_count());
        assert_eq!(copy.leaf_sizes(), tree.leaf_sizes());
        for q in random_points(5, 3, 10) {
            assert_eq!(copy.search_knn(&q, 10), tree.search_knn(&q, 10));
        }
    }
}
