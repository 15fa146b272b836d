//! Gossip message model.
//!
//! Two kinds of replicated data travel between peers: per-node records
//! (owned by exactly one node, resolved last-writer-wins) and shared
//! records (resolved by CRDT join, or timestamp replacement for raw
//! values). Timestamps are epoch millis; `expire_at == i64::MAX` means the
//! record never expires.

use crate::error::Result;
use murmur_crdt::{GrowOnlyCounter, GrowOnlySet, LwwSet, OrSet, PnCounter};
use serde::{Deserialize, Serialize};

/// Sentinel for records that never expire.
pub const NEVER_EXPIRES: i64 = i64::MAX;

/// Current wall-clock time in epoch millis, the timestamp domain of every
/// message in the system.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A scoped key/value record owned by a single node. The owner node id is
/// implicit in the message's position in the per-node store, supplied by
/// the caller at merge time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerNodeDataMessage {
    pub key: String,
    pub payload: serde_json::Value,
    pub timestamp: i64,
    pub expire_at: i64,
}

impl PerNodeDataMessage {
    pub fn new(key: impl Into<String>, payload: serde_json::Value, timestamp: i64) -> Self {
        Self {
            key: key.into(),
            payload,
            timestamp,
            expire_at: NEVER_EXPIRES,
        }
    }

    pub fn with_expiry(mut self, expire_at: i64) -> Self {
        self.expire_at = expire_at;
        self
    }

    pub fn is_live(&self, now: i64) -> bool {
        now <= self.expire_at
    }
}

/// Closed sum over every payload a shared record may carry.
///
/// The five CRDT variants merge by join; `Raw` carries an opaque value that
/// merges by timestamp replacement. Keeping the enum closed lets the
/// dispatcher match exhaustively, so there is no unnoticed
/// unsupported-variant path inside the typed API. Unknown tags can only
/// appear at decode time and surface as `GossipError::UnsupportedVariant`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SharedPayload {
    GrowOnlySet(GrowOnlySet<String>),
    OrSet(OrSet<String>),
    LwwSet(LwwSet<String>),
    GrowOnlyCounter(GrowOnlyCounter),
    PnCounter(PnCounter),
    Raw(serde_json::Value),
}

impl SharedPayload {
    pub fn variant_name(&self) -> &'static str {
        match self {
            SharedPayload::GrowOnlySet(_) => "GrowOnlySet",
            SharedPayload::OrSet(_) => "OrSet",
            SharedPayload::LwwSet(_) => "LwwSet",
            SharedPayload::GrowOnlyCounter(_) => "GrowOnlyCounter",
            SharedPayload::PnCounter(_) => "PnCounter",
            SharedPayload::Raw(_) => "Raw",
        }
    }

    /// Whether this payload is a replicated type (as opposed to a raw
    /// value that merges by timestamp).
    pub fn is_crdt(&self) -> bool {
        !matches!(self, SharedPayload::Raw(_))
    }
}

/// A record replicated cluster-wide under a single key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedDataMessage {
    pub key: String,
    pub payload: SharedPayload,
    pub timestamp: i64,
    pub expire_at: i64,
}

impl SharedDataMessage {
    pub fn new(key: impl Into<String>, payload: SharedPayload, timestamp: i64) -> Self {
        Self {
            key: key.into(),
            payload,
            timestamp,
            expire_at: NEVER_EXPIRES,
        }
    }

    pub fn with_expiry(mut self, expire_at: i64) -> Self {
        self.expire_at = expire_at;
        self
    }

    pub fn is_live(&self, now: i64) -> bool {
        now <= self.expire_at
    }

    /// Decode a message from its wire form. Unknown payload tags map to
    /// `GossipError::UnsupportedVariant`.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GossipError;

    #[test]
    fn expiry_sentinel_never_passes() {
        let msg = PerNodeDataMessage::new("k", serde_json::json!("v"), 10);
        assert!(msg.is_live(i64::MAX));

        let msg = msg.with_expiry(100);
        assert!(msg.is_live(100));
        assert!(!msg.is_live(101));
    }

    #[test]
    fn shared_message_roundtrips() {
        let msg = SharedDataMessage::new(
            "counter",
            SharedPayload::GrowOnlyCounter(GrowOnlyCounter::new().incremented("n1", 3)),
            42,
        );
        let encoded = msg.to_json().unwrap();
        let decoded = SharedDataMessage::from_json(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn unknown_payload_tag_is_rejected() {
        let raw = r#"{"key":"k","payload":{"TwoPhaseSet":[]},"timestamp":1,"expire_at":2}"#;
        match SharedDataMessage::from_json(raw) {
            Err(GossipError::UnsupportedVariant(_)) => {}
            other => panic!("expected UnsupportedVariant, got {other:?}"),
        }
    }
}
