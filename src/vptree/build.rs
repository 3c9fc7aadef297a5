//! Tree construction

use crate::core::{KernelSpaceError, Result, SparseVector};
use crate::metric::DistanceMetric;
use crate::vptree::node::Node;
use crate::vptree::VPTree;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Smallest leaf size a tree is built with; smaller requests are raised to it
pub const MIN_LEAF_SIZE: usize = 5;

/// Subsets smaller than this are built on the current thread even in
/// parallel mode
const PARALLEL_CUTOFF: usize = 512;

/// How the vantage point of each node is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VantageSelection {
    /// Uniformly random point of the subset
    Random,
    /// Random candidates scored on a random sample; the candidate whose
    /// distances spread furthest around their median wins
    #[default]
    Sampling,
}

/// Configures and builds a [`VPTree`]
///
/// # Examples
/// ```
/// use kernelspace::metric::EuclideanDistance;
/// use kernelspace::vptree::{VPTree, VantageSelection};
/// use kernelspace::{SparseVector, VectorCollection};
///
/// let points: Vec<SparseVector> = (0..100)
///     .map(|i| SparseVector::new(vec![0], vec![i as f64]))
///     .collect();
/// let tree = VPTree::builder(EuclideanDistance)
///     .with_selection(VantageSelection::Random)
///     .with_seed(7)
///     .build(points)
///     .unwrap();
///
/// let query = SparseVector::new(vec![0], vec![41.9]);
/// assert_eq!(tree.search_knn(&query, 1)[0].index, 42);
/// ```
#[derive(Debug, Clone)]
pub struct VPTreeBuilder<M: DistanceMetric> {
    metric: M,
    max_leaf_size: usize,
    selection: VantageSelection,
    sample_size: usize,
    search_iterations: usize,
    seed: Option<u64>,
    parallel: bool,
    num_threads: Option<usize>,
}

impl<M: DistanceMetric> VPTreeBuilder<M> {
    pub fn new(metric: M) -> Self {
        Self {
            metric,
            max_leaf_size: MIN_LEAF_SIZE,
            selection: VantageSelection::default(),
            sample_size: 80,
            search_iterations: 40,
            seed: None,
            parallel: false,
            num_threads: None,
        }
    }

    /// Largest number of points a leaf may hold, raised to at least 5
    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size.max(MIN_LEAF_SIZE);
        self
    }

    pub fn with_selection(mut self, selection: VantageSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Points scored per candidate under [`VantageSelection::Sampling`]
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Candidates tried per node under [`VantageSelection::Sampling`]
    pub fn with_search_iterations(mut self, search_iterations: usize) -> Self {
        self.search_iterations = search_iterations;
        self
    }

    /// Fix the random choices so builds are reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build subtrees on a worker pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Worker count for parallel builds (rayon's default when unset)
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn max_leaf_size(&self) -> usize {
        self.max_leaf_size
    }

    /// Build the tree over `points`
    ///
    /// Fails before touching the points when the metric does not satisfy the
    /// triangle inequality.
    pub fn build(self, points: Vec<SparseVector>) -> Result<VPTree<M>> {
        if !self.metric.is_subadditive() {
            return Err(KernelSpaceError::NonSubadditiveMetric(self.metric.name()));
        }
        if self.selection == VantageSelection::Sampling
            && (self.sample_size == 0 || self.search_iterations == 0)
        {
            return Err(KernelSpaceError::InvalidParameter(
                "Sample size and search iterations must both be positive".to_string(),
            ));
        }

        let cache = self.metric.accel_cache(&points);
        let seed = self.seed.unwrap_or_else(rand::random);

        let root = {
            let ctx = BuildContext {
                metric: &self.metric,
                points: &points,
                cache: &cache,
                max_leaf_size: self.max_leaf_size,
                selection: self.selection,
                sample_size: self.sample_size,
                search_iterations: self.search_iterations,
            };
            if self.parallel {
                ctx.build_parallel(seed, self.num_threads)
            } else {
                ctx.build_sequential(seed)
            }
        };

        let tree = VPTree {
            metric: Arc::new(self.metric),
            points: Arc::new(points),
            cache: Arc::new(cache),
            root,
            max_leaf_size: self.max_leaf_size,
        };
        debug!(
            "Built VP-tree over {} points: {} nodes, depth {}",
            tree.points.len(),
            tree.node_count(),
            tree.depth()
        );
        Ok(tree)
    }
}

/// Working entry: distance to the parent's vantage point, point index
type Item = (f64, usize);

struct BuildContext<'a, M: DistanceMetric> {
    metric: &'a M,
    points: &'a [SparseVector],
    cache: &'a [f64],
    max_leaf_size: usize,
    selection: VantageSelection,
    sample_size: usize,
    search_iterations: usize,
}

impl<'a, M: DistanceMetric> BuildContext<'a, M> {
    fn initial_items(&self) -> Vec<Item> {
        (0..self.points.len()).map(|i| (0.0, i)).collect()
    }

    fn build_sequential(&self, seed: u64) -> Option<Box<Node>> {
        let mut items = self.initial_items();
        self.build_node(&mut items, seed, false)
    }

    fn build_parallel(&self, seed: u64, num_threads: Option<usize>) -> Option<Box<Node>> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("vptree-build-{i}"));
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }

        match builder.build() {
            Ok(pool) => {
                let mut items = self.initial_items();
                let built = panic::catch_unwind(AssertUnwindSafe(|| {
                    pool.install(|| self.build_node(&mut items, seed, true))
                }));
                match built {
                    Ok(root) => return root,
                    Err(_) => {
                        warn!("Parallel VP-tree construction was interrupted; rebuilding sequentially")
                    }
                }
            }
            Err(e) => warn!("Could not start VP-tree worker pool ({e}); building sequentially"),
        }

        self.build_sequential(seed)
    }

    fn build_node(&self, items: &mut [Item], seed: u64, parallel: bool) -> Option<Box<Node>> {
        if items.is_empty() {
            return None;
        }
        if items.len() <= self.max_leaf_size {
            return Some(Box::new(Node::Leaf {
                points: items.iter().map(|&(_, i)| i).collect(),
                bounds: items.iter().map(|&(d, _)| d).collect(),
            }));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let vp_pos = self.select_vantage(items, &mut rng);
        items.swap(0, vp_pos);
        let vantage = items[0].1;

        let rest = &mut items[1..];
        for item in rest.iter_mut() {
            item.0 = self
                .metric
                .dist_pair(vantage, item.1, self.points, self.cache);
        }
        rest.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mid = rest.len() / 2;
        let (left, right) = rest.split_at_mut(mid);
        let (left_low, left_high) = (left[0].0, left[left.len() - 1].0);
        let (right_low, right_high) = (right[0].0, right[right.len() - 1].0);

        let left_seed: u64 = rng.gen();
        let right_seed: u64 = rng.gen();
        let (left, right) = if parallel && left.len() + right.len() >= PARALLEL_CUTOFF {
            rayon::join(
                || self.build_node(left, left_seed, true),
                || self.build_node(right, right_seed, true),
            )
        } else {
            (
                self.build_node(left, left_seed, parallel),
                self.build_node(right, right_seed, parallel),
            )
        };

        Some(Box::new(Node::Internal {
            vantage,
            left_low,
            left_high,
            right_low,
            right_high,
            left,
            right,
        }))
    }

    /// Position within `items` of the chosen vantage point
    fn select_vantage(&self, items: &[Item], rng: &mut StdRng) -> usize {
        match self.selection {
            VantageSelection::Random => rng.gen_range(0..items.len()),
            VantageSelection::Sampling => self.sample_vantage(items, rng),
        }
    }

    fn sample_vantage(&self, items: &[Item], rng: &mut StdRng) -> usize {
        let n = items.len();
        let sample_positions: Vec<usize> = if n < self.sample_size {
            (0..self.sample_size).map(|_| rng.gen_range(0..n)).collect()
        } else {
            sample(rng, n, self.sample_size).into_vec()
        };

        let mut best_pos = 0;
        let mut best_spread = f64::NEG_INFINITY;
        let mut distances = Vec::with_capacity(sample_positions.len());

        for _ in 0..self.search_iterations {
            let candidate = rng.gen_range(0..n);
            let vp = items[candidate].1;

            distances.clear();
            distances.extend(sample_positions.iter().map(|&s| {
                self.metric
                    .dist_pair(vp, items[s].1, self.points, self.cache)
            }));

            let median = median(&mut distances);
            let spread: f64 = distances.iter().map(|d| (d - median).abs()).sum();
            if spread > best_spread {
                best_spread = spread;
                best_pos = candidate;
            }
        }

        best_pos
    }
}

/// Median of a non-empty slice; reorders it
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_leaf_size_is_clamped() {
        let builder = VPTreeBuilder::new(crate::metric::EuclideanDistance).with_max_leaf_size(2);
        assert_eq!(builder.max_leaf_size(), MIN_LEAF_SIZE);
        let builder = VPTreeBuilder::new(crate::metric::EuclideanDistance).with_max_leaf_size(9);
        assert_eq!(builder.max_leaf_size(), 9);
    }

    #[test]
    fn test_sampling_parameters_validated() {
        let result = VPTreeBuilder::new(crate::metric::EuclideanDistance)
            .with_sample_size(0)
            .build(Vec::new());
        assert!(matches!(result, Err(KernelSpaceError::InvalidParameter(_))));
    }
}
