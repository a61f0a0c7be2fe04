use std::cmp::Ordering;

/// Frontier entry. `seq` is the push order and breaks cost ties, so equal
/// inputs always settle vertices in the same order.
#[derive(Copy, Clone, Debug)]
pub(super) struct State {
    pub(super) cost: f64,
    pub(super) seq: u64,
    pub(super) vertex: usize,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost, then by insertion (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    #[test]
    fn pops_cheapest_then_earliest() {
        let mut heap = BinaryHeap::new();
        heap.push(State {
            cost: 2.0,
            seq: 0,
            vertex: 0,
        });
        heap.push(State {
            cost: 1.0,
            seq: 1,
            vertex: 1,
        });
        heap.push(State {
            cost: 1.0,
            seq: 2,
            vertex: 2,
        });
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|s| s.vertex)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
