//! Grow-only set: elements can be added but never removed.
//! Join is plain set union, which is a semilattice for free.

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowOnlySet<T: Ord + Clone> {
    elements: BTreeSet<T>,
}

impl<T: Ord + Clone> GrowOnlySet<T> {
    pub fn new() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    /// A new set containing self plus `value`. The only mutation allowed.
    pub fn inserted(&self, value: T) -> Self {
        let mut elements = self.elements.clone();
        elements.insert(value);
        Self { elements }
    }

    /// Materialized view of the set contents.
    pub fn value(&self) -> &BTreeSet<T> {
        &self.elements
    }

    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: Ord + Clone> FromIterator<T> for GrowOnlySet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<T: Ord + Clone> Lattice for GrowOnlySet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            elements: self.elements.union(&other.elements).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_monotonic() {
        let a: GrowOnlySet<&str> = GrowOnlySet::new();
        let b = a.inserted("x");
        let c = b.inserted("y");

        assert!(a.leq(&b));
        assert!(b.leq(&c));
        assert_eq!(c.len(), 2);
        assert!(a.is_empty());
    }

    #[test]
    fn join_is_union() {
        let a: GrowOnlySet<i32> = [1, 2].into_iter().collect();
        let b: GrowOnlySet<i32> = [2, 3].into_iter().collect();

        let joined = a.join(&b);
        assert_eq!(joined.value().iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn join_never_loses_elements() {
        let a: GrowOnlySet<i32> = [1, 2, 3].into_iter().collect();
        let joined = a.join(&GrowOnlySet::bottom());

        for e in a.iter() {
            assert!(joined.contains(e));
        }
    }
}
