//! Tree nodes

/// A vantage-point tree node
///
/// Internal nodes split the points below them by their distance to
/// `vantage`: every point in the left subtree lies within
/// `[left_low, left_high]` of it and every point in the right subtree within
/// `[right_low, right_high]`. Leaves keep each point's distance to the
/// parent's vantage point for cheap pruning.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Internal {
        vantage: usize,
        left_low: f64,
        left_high: f64,
        right_low: f64,
        right_high: f64,
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
    },
    Leaf {
        points: Vec<usize>,
        /// Distance from each point to the parent's vantage point
        bounds: Vec<f64>,
    },
}

impl Node {
    pub(crate) fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => {
                let l = left.as_ref().map_or(0, |n| n.depth());
                let r = right.as_ref().map_or(0, |n| n.depth());
                1 + l.max(r)
            }
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => {
                1 + left.as_ref().map_or(0, |n| n.node_count())
                    + right.as_ref().map_or(0, |n| n.node_count())
            }
        }
    }

    pub(crate) fn collect_leaf_sizes(&self, out: &mut Vec<usize>) {
        match self {
            Node::Leaf { points, .. } => out.push(points.len()),
            Node::Internal { left, right, .. } => {
                for child in [left, right].into_iter().flatten() {
                    child.collect_leaf_sizes(out);
                }
            }
        }
    }

    /// Every point index stored at or below this node
    pub(crate) fn collect_points(&self, out: &mut Vec<usize>) {
        match self {
            Node::Leaf { points, .. } => out.extend_from_slice(points),
            Node::Internal {
                vantage,
                left,
                right,
                ..
            } => {
                out.push(*vantage);
                for child in [left, right].into_iter().flatten() {
                    child.collect_points(out);
                }
            }
        }
    }
}
