//! Last-Writer-Wins set.
//!
//! Each element carries one timestamped entry recording whether its most
//! recent operation was an add or a remove. Join keeps, per element, the
//! entry with the greater timestamp; on an exact tie the remove wins.
//!
//! Weaker than the OR-Set by design: a remove with a later timestamp
//! permanently suppresses an older re-add of the same element. That trade
//! buys much smaller state (one entry per element, no tags).

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Op {
    Add,
    Remove,
}

/// The latest known operation on one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub timestamp: i64,
    pub op: Op,
}

impl Entry {
    /// The winning entry of two. Greater timestamp wins; on a tie the
    /// remove wins, so every replica resolves ties identically.
    fn prefer(self, other: Entry) -> Entry {
        match self.timestamp.cmp(&other.timestamp) {
            std::cmp::Ordering::Greater => self,
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Equal => {
                if self.op == Op::Remove {
                    self
                } else {
                    other
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwSet<T: Ord + Clone> {
    entries: BTreeMap<T, Entry>,
}

impl<T: Ord + Clone> LwwSet<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A fresh set with `elements` all added at `timestamp`.
    pub fn with_elements(timestamp: i64, elements: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        for e in elements {
            set = set.added(e, timestamp);
        }
        set
    }

    /// Record an add at `timestamp`, producing a new instance. An existing
    /// entry only changes if the add wins under the join rule.
    pub fn added(&self, value: T, timestamp: i64) -> Self {
        self.applied(value, Entry { timestamp, op: Op::Add })
    }

    /// Record a remove at `timestamp`, producing a new instance.
    pub fn removed(&self, value: T, timestamp: i64) -> Self {
        self.applied(value, Entry { timestamp, op: Op::Remove })
    }

    fn applied(&self, value: T, incoming: Entry) -> Self {
        let mut entries = self.entries.clone();
        entries
            .entry(value)
            .and_modify(|e| *e = e.prefer(incoming))
            .or_insert(incoming);
        Self { entries }
    }

    /// Elements whose winning operation is an add.
    pub fn value(&self) -> BTreeSet<T> {
        self.entries
            .iter()
            .filter(|(_, e)| e.op == Op::Add)
            .map(|(v, _)| v.clone())
            .collect()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.get(value).is_some_and(|e| e.op == Op::Add)
    }

    pub fn entry(&self, value: &T) -> Option<&Entry> {
        self.entries.get(value)
    }
}

impl<T: Ord + Clone> Lattice for LwwSet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (value, incoming) in &other.entries {
            entries
                .entry(value.clone())
                .and_modify(|e| *e = e.prefer(*incoming))
                .or_insert(*incoming);
        }
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_remove_suppresses_add() {
        let a = LwwSet::with_elements(100, ["x"]);
        let b = LwwSet::new().removed("x", 200);

        assert!(!a.join(&b).contains(&"x"));
        assert!(!b.join(&a).contains(&"x"));
    }

    #[test]
    fn later_add_revives_element() {
        let removed = LwwSet::new().removed("x", 100);
        let readded = removed.added("x", 200);

        assert!(readded.contains(&"x"));
    }

    #[test]
    fn remove_wins_timestamp_tie() {
        let added = LwwSet::new().added("x", 100);
        let removed = LwwSet::new().removed("x", 100);

        assert!(!added.join(&removed).contains(&"x"));
        assert!(!removed.join(&added).contains(&"x"));
    }

    #[test]
    fn older_readd_stays_suppressed() {
        // The accepted LWW trade-off: a re-add stamped before the remove
        // never comes back, no matter the merge order.
        let removed = LwwSet::new().removed("x", 300);
        let stale_readd = LwwSet::new().added("x", 200);

        assert!(!removed.join(&stale_readd).contains(&"x"));
        assert!(!stale_readd.join(&removed).contains(&"x"));
    }

    #[test]
    fn disjoint_adds_union() {
        let a = LwwSet::with_elements(1, ["1", "2"]);
        let b = LwwSet::with_elements(1, ["3", "4"]);

        let merged = a.join(&b);
        assert_eq!(merged.value().len(), 4);
    }
}
