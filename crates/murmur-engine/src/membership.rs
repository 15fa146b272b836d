//! Membership tracker: the live-member view derived from heartbeats.
//!
//! Transitions are monotonic within one tracker: Alive → Suspect → Dead,
//! with Suspect returning to Alive on a fresh heartbeat. A Dead member
//! never resurrects through heartbeats; only an explicit re-join installs
//! a brand-new record. Failure-detector timing (when to suspect, when to
//! declare dead) belongs to the caller; the tracker only enforces the
//! state machine and hands out consistent snapshots.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberState {
    Alive,
    Suspect,
    Dead,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub cluster_id: String,
    pub node_id: String,
    pub address: String,
    pub state: MemberState,
    /// Epoch millis of the most recent heartbeat.
    pub last_heartbeat: i64,
}

#[derive(Debug)]
pub struct MembershipTracker {
    cluster_id: String,
    members: RwLock<HashMap<String, Member>>,
}

impl MembershipTracker {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Record a heartbeat from `node_id`. Creates the member on first
    /// contact, revives a Suspect, and is a no-op for a Dead member.
    pub fn heartbeat(&self, node_id: &str, address: &str, now: i64) {
        let mut members = self.members.write();
        match members.get_mut(node_id) {
            Some(member) if member.state == MemberState::Dead => {}
            Some(member) => {
                if member.state == MemberState::Suspect {
                    info!(node_id, "suspect member revived by heartbeat");
                }
                member.state = MemberState::Alive;
                member.last_heartbeat = now;
            }
            None => {
                info!(node_id, address, "member joined on first heartbeat");
                members.insert(
                    node_id.to_string(),
                    Member {
                        cluster_id: self.cluster_id.clone(),
                        node_id: node_id.to_string(),
                        address: address.to_string(),
                        state: MemberState::Alive,
                        last_heartbeat: now,
                    },
                );
            }
        }
    }

    /// Explicit join: installs a fresh Alive record even over a Dead one.
    pub fn join(&self, node_id: &str, address: &str, now: i64) {
        info!(node_id, address, "member joined explicitly");
        self.members.write().insert(
            node_id.to_string(),
            Member {
                cluster_id: self.cluster_id.clone(),
                node_id: node_id.to_string(),
                address: address.to_string(),
                state: MemberState::Alive,
                last_heartbeat: now,
            },
        );
    }

    /// Alive → Suspect. Driven by the failure-detector policy.
    pub fn mark_suspect(&self, node_id: &str) {
        if let Some(member) = self.members.write().get_mut(node_id) {
            if member.state == MemberState::Alive {
                info!(node_id, "member suspected");
                member.state = MemberState::Suspect;
            }
        }
    }

    /// Alive or Suspect → Dead.
    pub fn mark_dead(&self, node_id: &str) {
        if let Some(member) = self.members.write().get_mut(node_id) {
            if member.state != MemberState::Dead {
                info!(node_id, "member declared dead");
                member.state = MemberState::Dead;
            }
        }
    }

    /// Apply failure-detector timeouts in one pass: members silent longer
    /// than `suspect_after_ms` become Suspect, longer than `dead_after_ms`
    /// become Dead. The caller supplies the policy thresholds.
    pub fn sweep(&self, now: i64, suspect_after_ms: i64, dead_after_ms: i64) {
        let mut members = self.members.write();
        for member in members.values_mut() {
            let silence = now.saturating_sub(member.last_heartbeat);
            match member.state {
                MemberState::Alive if silence > dead_after_ms => {
                    info!(node_id = %member.node_id, silence, "member declared dead");
                    member.state = MemberState::Dead;
                }
                MemberState::Alive if silence > suspect_after_ms => {
                    info!(node_id = %member.node_id, silence, "member suspected");
                    member.state = MemberState::Suspect;
                }
                MemberState::Suspect if silence > dead_after_ms => {
                    info!(node_id = %member.node_id, silence, "member declared dead");
                    member.state = MemberState::Dead;
                }
                _ => {}
            }
        }
    }

    /// Remove Dead members entirely. The end of the lifecycle.
    pub fn purge_dead(&self) {
        self.members
            .write()
            .retain(|_, m| m.state != MemberState::Dead);
    }

    /// Consistent snapshot of all Alive members.
    pub fn live_members(&self) -> Vec<Member> {
        self.members
            .read()
            .values()
            .filter(|m| m.state == MemberState::Alive)
            .cloned()
            .collect()
    }

    pub fn state_of(&self, node_id: &str) -> Option<MemberState> {
        self.members.read().get(node_id).map(|m| m.state)
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }
}
