//! Grow-only counter.
//!
//! Each node owns one monotonically non-decreasing total. Join takes the
//! per-node maximum rather than the sum: a node's own total already folds
//! in all of its increments, so max recovers the latest known value and
//! duplicated or reordered merges cannot double-count.

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowOnlyCounter {
    counts: BTreeMap<String, u64>,
}

impl GrowOnlyCounter {
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Raise `node_id`'s total by `delta`, producing a new instance.
    /// Only non-negative increments exist; the type makes that structural.
    pub fn incremented(&self, node_id: &str, delta: u64) -> Self {
        let mut counts = self.counts.clone();
        let entry = counts.entry(node_id.to_string()).or_insert(0);
        *entry = entry.saturating_add(delta);
        Self { counts }
    }

    /// Sum of every node's contribution.
    pub fn value(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The total contributed by one node.
    pub fn count_for(&self, node_id: &str) -> u64 {
        self.counts.get(node_id).copied().unwrap_or(0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

impl Lattice for GrowOnlyCounter {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        let mut counts = self.counts.clone();
        for (node, total) in &other.counts {
            counts
                .entry(node.clone())
                .and_modify(|e| *e = (*e).max(*total))
                .or_insert(*total);
        }
        Self { counts }
    }
}
