//! Observed-Remove Set (OR-Set, add-wins).
//!
//! Every add mints a unique tag; a remove tombstones only the tags it has
//! observed. A concurrent re-add of the same element carries a fresh tag,
//! so it survives a remove issued against the older tags. Add-tag sets are
//! kept verbatim through joins and tombstones are excluded at read time,
//! so a join never discards information.

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ulid::Ulid;

/// A unique tag identifying one specific add operation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// The node that performed the add.
    pub node_id: String,
    /// Unique identifier for this specific add.
    pub id: Ulid,
}

impl Tag {
    pub fn mint(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            id: Ulid::new(),
        }
    }
}

/// A delta against a known OR-Set base: elements to add and elements whose
/// currently observed tags should be retracted. Carries the acting node
/// identity explicitly; there is no ambient replica context.
#[derive(Clone, Debug, Default)]
pub struct OrSetDelta<T: Ord + Clone> {
    additions: Vec<T>,
    removals: Vec<T>,
}

impl<T: Ord + Clone> OrSetDelta<T> {
    pub fn new() -> Self {
        Self {
            additions: Vec::new(),
            removals: Vec::new(),
        }
    }

    pub fn add(mut self, value: T) -> Self {
        self.additions.push(value);
        self
    }

    pub fn remove(mut self, value: T) -> Self {
        self.removals.push(value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrSet<T: Ord + Clone> {
    /// Every add-tag ever observed, per element. Never trimmed.
    adds: BTreeMap<T, BTreeSet<Tag>>,
    /// Tombstones: tags whose adds have been retracted.
    removes: BTreeSet<Tag>,
}

impl<T: Ord + Clone> OrSet<T> {
    pub fn new() -> Self {
        Self {
            adds: BTreeMap::new(),
            removes: BTreeSet::new(),
        }
    }

    /// A fresh set holding `elements`, each under a tag minted for `node_id`.
    pub fn with_elements(node_id: &str, elements: impl IntoIterator<Item = T>) -> Self {
        let delta = elements
            .into_iter()
            .fold(OrSetDelta::new(), |d, e| d.add(e));
        Self::new().updated(node_id, &delta)
    }

    /// Apply a delta on behalf of `node_id`, producing a new instance.
    ///
    /// Adds mint fresh tags; removes tombstone exactly the tags currently
    /// visible in `self` for the element. Tags added concurrently elsewhere
    /// are untouched, which is what makes the set add-wins.
    pub fn updated(&self, node_id: &str, delta: &OrSetDelta<T>) -> Self {
        let mut next = self.clone();
        for value in &delta.removals {
            if let Some(tags) = next.adds.get(value) {
                let observed: Vec<Tag> = tags
                    .iter()
                    .filter(|t| !next.removes.contains(*t))
                    .cloned()
                    .collect();
                next.removes.extend(observed);
            }
        }
        for value in &delta.additions {
            next.adds
                .entry(value.clone())
                .or_default()
                .insert(Tag::mint(node_id));
        }
        next
    }

    /// Elements with at least one add-tag not covered by a tombstone.
    pub fn value(&self) -> BTreeSet<T> {
        self.adds
            .iter()
            .filter(|(_, tags)| tags.iter().any(|t| !self.removes.contains(t)))
            .map(|(value, _)| value.clone())
            .collect()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.adds
            .get(value)
            .is_some_and(|tags| tags.iter().any(|t| !self.removes.contains(t)))
    }

    pub fn len(&self) -> usize {
        self.adds
            .iter()
            .filter(|(_, tags)| tags.iter().any(|t| !self.removes.contains(t)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Ord + Clone> Default for OrSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Lattice for OrSet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    /// Element-wise union of add-tags plus union of tombstones.
    fn join(&self, other: &Self) -> Self {
        let mut adds = self.adds.clone();
        for (value, tags) in &other.adds {
            adds.entry(value.clone()).or_default().extend(tags.iter().cloned());
        }

        Self {
            adds,
            removes: self.removes.union(&other.removes).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove() {
        let set = OrSet::with_elements("n1", ["a", "b"]);
        assert!(set.contains(&"a"));

        let set = set.updated("n1", &OrSetDelta::new().remove("a"));
        assert!(!set.contains(&"a"));
        assert!(set.contains(&"b"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn concurrent_readd_survives_remove() {
        let base = OrSet::with_elements("n1", ["3"]);

        // n2 re-adds "3" under its own tag while n1 removes the observed one.
        let readded = base.updated("n2", &OrSetDelta::new().add("3"));
        let removed = base.updated("n1", &OrSetDelta::new().remove("3"));

        let merged = removed.join(&readded);
        assert!(merged.contains(&"3"));
        assert_eq!(merged.join(&readded), readded.join(&removed));
    }

    #[test]
    fn remove_covers_all_observed_tags() {
        let a = OrSet::with_elements("n1", ["x"]);
        let b = a.updated("n2", &OrSetDelta::new().add("x"));

        // Removing after observing both tags retracts both.
        let removed = b.updated("n1", &OrSetDelta::new().remove("x"));
        assert!(!removed.contains(&"x"));
        assert!(!removed.join(&a).contains(&"x"));
    }

    #[test]
    fn tombstones_survive_join() {
        let a = OrSet::with_elements("n1", ["v"]);
        let removed = a.updated("n1", &OrSetDelta::new().remove("v"));

        // Joining the pre-remove state back in must not resurrect "v".
        let merged = removed.join(&a);
        assert!(!merged.contains(&"v"));
    }
}
