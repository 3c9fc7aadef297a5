//! Search results and the bounded candidate list used while searching

use std::cmp::Ordering;

/// One search hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the vector in the collection's input
    pub index: usize,
    /// Distance from the query
    pub distance: f64,
}

impl Neighbor {
    pub fn new(index: usize, distance: f64) -> Self {
        Self { index, distance }
    }

    /// Distance first, then index, so equal distances order deterministically
    pub fn rank(&self, other: &Neighbor) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// Sorted list holding at most `capacity` best-ranked neighbors
#[derive(Debug, Clone)]
pub struct BoundedNeighborList {
    capacity: usize,
    items: Vec<Neighbor>,
}

impl BoundedNeighborList {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity.min(1024)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Distance of the current worst candidate, or infinity while not full
    pub fn worst_distance(&self) -> f64 {
        if self.is_full() {
            self.items.last().map_or(f64::INFINITY, |n| n.distance)
        } else {
            f64::INFINITY
        }
    }

    /// Insert `candidate` if it ranks among the best `capacity`
    pub fn push(&mut self, candidate: Neighbor) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.is_full() {
            match self.items.last() {
                Some(worst) if candidate.rank(worst) == Ordering::Less => {
                    self.items.pop();
                }
                _ => return false,
            }
        }
        let pos = self
            .items
            .partition_point(|n| n.rank(&candidate) == Ordering::Less);
        self.items.insert(pos, candidate);
        true
    }

    pub fn as_slice(&self) -> &[Neighbor] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Neighbor> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_best_k_sorted() {
        let mut list = BoundedNeighborList::new(3);
        for (i, d) in [5.0, 1.0, 4.0, 2.0, 3.0].iter().enumerate() {
            list.push(Neighbor::new(i, *d));
        }
        let distances: Vec<f64> = list.as_slice().iter().map(|n| n.distance).collect();
        assert_eq!(distances, vec![1.0, 2.0, 3.0]);
        assert_eq!(list.worst_distance(), 3.0);
    }

    #[test]
    fn test_ties_prefer_smaller_index() {
        let mut list = BoundedNeighborList::new(2);
        list.push(Neighbor::new(7, 1.0));
        list.push(Neighbor::new(3, 1.0));
        list.push(Neighbor::new(5, 1.0));
        let indices: Vec<usize> = list.into_vec().iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![3, 5]);
    }

    #[test]
    fn test_worst_is_infinite_until_full() {
        let mut list = BoundedNeighborList::new(2);
        list.push(Neighbor::new(0, 1.0));
        assert!(list.worst_distance().is_infinite());
        list.push(Neighbor::new(1, 2.0));
        assert_eq!(list.worst_distance(), 2.0);
    }

    #[test]
    fn test_zero_capacity_accepts_nothing() {
        let mut list = BoundedNeighborList::new(0);
        assert!(!list.push(Neighbor::new(0, 0.0)));
        assert!(list.is_empty());
    }
}
