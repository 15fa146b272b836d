//! Positive-Negative counter.
//!
//! Two grow-only counters: P accumulates increments, N accumulates the
//! magnitudes of decrements. Both only grow, so joining component-wise and
//! reading P − N stays convergent under any merge order or duplication.

use crate::gcounter::GrowOnlyCounter;
use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnCounter {
    p: GrowOnlyCounter,
    n: GrowOnlyCounter,
}

impl PnCounter {
    pub fn new() -> Self {
        Self {
            p: GrowOnlyCounter::new(),
            n: GrowOnlyCounter::new(),
        }
    }

    /// Apply a signed delta on behalf of `node_id`, producing a new
    /// instance. Positive deltas raise P, negative ones raise N.
    pub fn incremented(&self, node_id: &str, delta: i64) -> Self {
        if delta >= 0 {
            Self {
                p: self.p.incremented(node_id, delta as u64),
                n: self.n.clone(),
            }
        } else {
            Self {
                p: self.p.clone(),
                n: self.n.incremented(node_id, delta.unsigned_abs()),
            }
        }
    }

    pub fn value(&self) -> i64 {
        (self.p.value() as i64).saturating_sub(self.n.value() as i64)
    }

    pub fn increments(&self) -> &GrowOnlyCounter {
        &self.p
    }

    pub fn decrements(&self) -> &GrowOnlyCounter {
        &self.n
    }
}

impl Lattice for PnCounter {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            p: self.p.join(&other.p),
            n: self.n.join(&other.n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_deltas_route_to_halves() {
        let c = PnCounter::new()
            .incremented("n1", 5)
            .incremented("n1", -2);

        assert_eq!(c.increments().value(), 5);
        assert_eq!(c.decrements().value(), 2);
        assert_eq!(c.value(), 3);
    }

    #[test]
    fn counter_can_go_negative() {
        let c = PnCounter::new().incremented("n1", -4).incremented("n2", 1);
        assert_eq!(c.value(), -3);
    }

    #[test]
    fn join_converges_regardless_of_order() {
        let a = PnCounter::new().incremented("a", 2);
        let b = PnCounter::new().incremented("b", 3);

        let ab = a.join(&b);
        let ba = b.join(&a);
        assert_eq!(ab, ba);
        assert_eq!(ab.value(), 5);
    }

    #[test]
    fn duplicate_merge_is_idempotent() {
        let a = PnCounter::new().incremented("a", 2).incremented("a", -7);
        let merged = a.join(&a).join(&a);
        assert_eq!(merged.value(), a.value());
        assert_eq!(merged.value(), -5);
    }
}
