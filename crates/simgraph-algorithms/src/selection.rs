//! Bounded top-n selection
//!
//! Keeps the `n` greatest items of a stream in O(E log n) time and O(n) space.
//! Callers encode their ranking (including tie-breaks) in the item's `Ord`
//! so that "greater" means "ranks higher".

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Fixed-capacity selector for the `limit` greatest items.
#[derive(Debug, Clone)]
pub struct TopN<T: Ord> {
    limit: usize,
    // Min-heap: the weakest retained item sits on top and is evicted first
    heap: BinaryHeap<Reverse<T>>,
}

impl<T: Ord> TopN<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            heap: BinaryHeap::with_capacity(limit.min(1024) + 1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offer an item; it is kept only if it ranks among the best `limit` seen so far.
    pub fn push(&mut self, item: T) {
        if self.limit == 0 {
            return;
        }
        if self.heap.len() < self.limit {
            self.heap.push(Reverse(item));
            return;
        }
        if let Some(Reverse(weakest)) = self.heap.peek() {
            if item > *weakest {
                self.heap.pop();
                self.heap.push(Reverse(item));
            }
        }
    }

    /// Fold another selector into this one (used to combine per-worker partials).
    pub fn merge(mut self, other: TopN<T>) -> Self {
        for Reverse(item) in other.heap {
            self.push(item);
        }
        self
    }

    /// Retained items, best first
    pub fn into_sorted_vec(self) -> Vec<T> {
        // BinaryHeap<Reverse<T>>::into_sorted_vec is ascending in Reverse order,
        // i.e. descending in T
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(item)| item)
            .collect()
    }
}

impl<T: Ord> Extend<T> for TopN<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}
