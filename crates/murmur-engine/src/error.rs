//! Error types for the merge engine.
//!
//! Stale per-node updates and expired reads are not errors: the first is
//! silently discarded, the second reads as absent. Only conditions that
//! indicate a programming or configuration mistake surface here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GossipError {
    /// A shared key already holds a different CRDT variant than the
    /// incoming payload. The stored entry is left untouched.
    #[error("type mismatch for shared key {key:?}: stored {stored}, incoming {incoming}")]
    TypeMismatch {
        key: String,
        stored: &'static str,
        incoming: &'static str,
    },

    /// A payload tag the dispatcher does not recognize.
    #[error("unsupported payload variant: {0}")]
    UnsupportedVariant(String),

    /// Record keys must be non-empty strings.
    #[error("empty record key")]
    EmptyKey,

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GossipError {
    fn from(err: serde_json::Error) -> Self {
        let msg = err.to_string();
        if msg.contains("unknown variant") {
            GossipError::UnsupportedVariant(msg)
        } else {
            GossipError::Serialization(msg)
        }
    }
}

pub type Result<T> = std::result::Result<T, GossipError>;
