//! The gossip manager: one node's view of the cluster, and the single
//! entry point the transport calls for every message it delivers.
//!
//! Locally originated updates and network-received ones flow through the
//! same `dispatch`, so merge semantics cannot diverge between the two
//! paths. No call here blocks on I/O; a dispatch either completes or
//! fails immediately, never leaving a partial merge behind.

use crate::config::GossipConfig;
use crate::error::{GossipError, Result};
use crate::membership::{Member, MembershipTracker};
use crate::message::{now_millis, PerNodeDataMessage, SharedDataMessage, SharedPayload};
use crate::per_node::PerNodeDataStore;
use crate::shared::SharedDataStore;
use tracing::debug;

/// Everything that travels in a gossip exchange, as handed to `dispatch`
/// by the (out-of-scope) transport after deserialization.
#[derive(Clone, Debug, PartialEq)]
pub enum GossipMessage {
    /// Liveness signal from a peer.
    Heartbeat { node_id: String, address: String },
    /// A record owned by `owner`, resolved last-writer-wins.
    PerNode {
        owner: String,
        message: PerNodeDataMessage,
    },
    /// A cluster-wide record, resolved by CRDT join.
    Shared(SharedDataMessage),
}

pub struct GossipManager {
    config: GossipConfig,
    members: MembershipTracker,
    per_node: PerNodeDataStore,
    shared: SharedDataStore,
}

impl GossipManager {
    pub fn new(config: GossipConfig) -> Self {
        let members = MembershipTracker::new(config.cluster_id.clone());
        Self {
            config,
            members,
            per_node: PerNodeDataStore::new(),
            shared: SharedDataStore::new(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    pub fn cluster_id(&self) -> &str {
        &self.config.cluster_id
    }

    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Merge entry points
    // ------------------------------------------------------------------

    /// Route one inbound or locally-originated message to its store.
    pub fn dispatch(&self, message: GossipMessage) -> Result<()> {
        match message {
            GossipMessage::Heartbeat { node_id, address } => {
                self.members.heartbeat(&node_id, &address, now_millis());
                Ok(())
            }
            GossipMessage::PerNode { owner, message } => {
                self.merge_per_node_data(&owner, message)
            }
            GossipMessage::Shared(message) => self.merge_shared_data(message),
        }
    }

    /// Merge a per-node record owned by `owner`. Stale updates are
    /// discarded silently; duplication is expected under gossip.
    pub fn merge_per_node_data(&self, owner: &str, message: PerNodeDataMessage) -> Result<()> {
        if message.key.is_empty() {
            return Err(GossipError::EmptyKey);
        }
        self.per_node.put(owner, message);
        Ok(())
    }

    /// Merge a shared record. Joins same-variant CRDT payloads; rejects
    /// cross-variant merges without touching the stored entry.
    pub fn merge_shared_data(&self, message: SharedDataMessage) -> Result<()> {
        if message.key.is_empty() {
            return Err(GossipError::EmptyKey);
        }
        self.shared.merge(message)
    }

    // ------------------------------------------------------------------
    // Local origination
    // ------------------------------------------------------------------

    /// Publish a record under this node's own id, stamped with the
    /// current time, through the same merge path gossip uses.
    pub fn gossip_per_node_data(
        &self,
        key: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<()> {
        let message = PerNodeDataMessage::new(key, payload, now_millis());
        self.merge_per_node_data(&self.config.node_id, message)
    }

    /// Publish a shared record stamped with the current time.
    pub fn gossip_shared_data(
        &self,
        key: impl Into<String>,
        payload: SharedPayload,
    ) -> Result<()> {
        self.merge_shared_data(SharedDataMessage::new(key, payload, now_millis()))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn find_per_node_gossip_data(&self, node_id: &str, key: &str) -> Option<PerNodeDataMessage> {
        self.per_node.get(node_id, key, now_millis())
    }

    pub fn find_shared_gossip_data(&self, key: &str) -> Option<SharedDataMessage> {
        self.shared.get(key, now_millis())
    }

    /// The live, merged CRDT under `key`, if the key holds one.
    pub fn find_crdt(&self, key: &str) -> Option<SharedPayload> {
        self.shared.find_crdt(key, now_millis())
    }

    pub fn live_members(&self) -> Vec<Member> {
        self.members.live_members()
    }

    pub fn membership(&self) -> &MembershipTracker {
        &self.members
    }

    // ------------------------------------------------------------------
    // Gossip round support
    // ------------------------------------------------------------------

    /// Snapshot this node's state as the messages one gossip round would
    /// send: a heartbeat plus every live record from both stores.
    pub fn digest(&self) -> Vec<GossipMessage> {
        let now = now_millis();
        let mut out = vec![GossipMessage::Heartbeat {
            node_id: self.config.node_id.clone(),
            address: self.config.address.clone(),
        }];
        out.extend(
            self.per_node
                .snapshot(now)
                .into_iter()
                .map(|(owner, message)| GossipMessage::PerNode { owner, message }),
        );
        out.extend(self.shared.snapshot(now).into_iter().map(GossipMessage::Shared));
        debug!(node_id = %self.config.node_id, messages = out.len(), "built gossip digest");
        out
    }

    /// Run the failure-detector sweep and lazy expiry purge for one round.
    pub fn housekeeping(&self) {
        let now = now_millis();
        self.members.sweep(
            now,
            self.config.suspect_timeout.as_millis() as i64,
            self.config.dead_timeout.as_millis() as i64,
        );
        self.per_node.purge_expired(now);
        self.shared.purge_expired(now);
    }
}
