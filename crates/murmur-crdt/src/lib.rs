//! State-based CRDTs for the murmur gossip engine.
//!
//! Five replicated types behind the [`Lattice`] join-semilattice trait.
//! Instances are immutable: every update and every merge produces a new
//! value, which is what lets the enclosing stores swap them atomically.

pub mod gcounter;
pub mod gset;
pub mod lattice;
pub mod lwwset;
pub mod orset;
pub mod pncounter;

pub use gcounter::GrowOnlyCounter;
pub use gset::GrowOnlySet;
pub use lattice::Lattice;
pub use lwwset::LwwSet;
pub use orset::{OrSet, OrSetDelta, Tag};
pub use pncounter::PnCounter;
