//! Join-semilattice trait shared by every replicated type in this crate.
//!
//! A join-semilattice (S, ⊔) satisfies:
//! - Commutativity: a ⊔ b = b ⊔ a
//! - Associativity: (a ⊔ b) ⊔ c = a ⊔ (b ⊔ c)
//! - Idempotence:   a ⊔ a = a
//!
//! Any replica set whose state merges through such a join converges to the
//! same value no matter how gossip messages are reordered, duplicated, or
//! partially delivered.

/// The merge seam of every state-based CRDT in the gossip engine.
pub trait Lattice: Clone + PartialEq {
    /// The bottom element (identity for join).
    fn bottom() -> Self;

    /// Least upper bound of two states.
    /// Must be commutative, associative, and idempotent.
    fn join(&self, other: &Self) -> Self;

    /// a ≤ b in the order induced by join: joining a into b adds nothing.
    fn leq(&self, other: &Self) -> bool {
        &self.join(other) == other
    }
}
