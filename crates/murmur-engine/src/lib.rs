//! # murmur-engine
//!
//! The merge engine of the murmur gossip system: per-node and shared data
//! stores, the membership tracker, and the dispatcher the transport layer
//! feeds every deserialized message into.
//!
//! The engine is fully synchronous. Transport, peer selection, and
//! persistence live outside; their whole contract with this crate is
//! `GossipManager::dispatch` on the write side and the `find_*` /
//! `live_members` calls on the read side.

pub mod config;
pub mod error;
pub mod manager;
pub mod membership;
pub mod message;
pub mod per_node;
pub mod shared;
pub mod sim;

pub use config::{GossipConfig, GossipConfigBuilder};
pub use error::{GossipError, Result};
pub use manager::{GossipManager, GossipMessage};
pub use membership::{Member, MemberState, MembershipTracker};
pub use message::{
    now_millis, PerNodeDataMessage, SharedDataMessage, SharedPayload, NEVER_EXPIRES,
};
pub use per_node::PerNodeDataStore;
pub use shared::SharedDataStore;
pub use sim::{ClusterSim, SimConfig};
