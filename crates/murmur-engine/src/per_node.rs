//! Per-node data store: owner node id → key → timestamped record.
//!
//! Resolution is last-writer-wins per (owner, key): an incoming message
//! replaces the stored record only when its timestamp is strictly newer.
//! Ties and older timestamps are discarded silently; duplication is the
//! normal case under gossip, not a fault. Expired records read as absent
//! and are physically purged lazily.

use crate::message::PerNodeDataMessage;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PerNodeDataStore {
    entries: RwLock<HashMap<String, HashMap<String, PerNodeDataMessage>>>,
}

impl PerNodeDataStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Merge a record owned by `owner`. Returns whether it was applied.
    /// The write lock spans the read-compare-replace, so two concurrent
    /// merges for the same key cannot interleave to a torn state.
    pub fn put(&self, owner: &str, message: PerNodeDataMessage) -> bool {
        let mut entries = self.entries.write();
        let slot = entries.entry(owner.to_string()).or_default();
        match slot.get(&message.key) {
            Some(existing) if existing.timestamp >= message.timestamp => {
                debug!(
                    owner,
                    key = %message.key,
                    stored = existing.timestamp,
                    incoming = message.timestamp,
                    "discarding stale per-node update"
                );
                false
            }
            _ => {
                slot.insert(message.key.clone(), message);
                true
            }
        }
    }

    /// Read the record for `(owner, key)`; expired records read as absent.
    pub fn get(&self, owner: &str, key: &str, now: i64) -> Option<PerNodeDataMessage> {
        self.entries
            .read()
            .get(owner)?
            .get(key)
            .filter(|m| m.is_live(now))
            .cloned()
    }

    /// Snapshot every live record, with its owner, for an outgoing digest.
    pub fn snapshot(&self, now: i64) -> Vec<(String, PerNodeDataMessage)> {
        self.entries
            .read()
            .iter()
            .flat_map(|(owner, records)| {
                records
                    .values()
                    .filter(|m| m.is_live(now))
                    .map(|m| (owner.clone(), m.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Drop records whose expiry has passed.
    pub fn purge_expired(&self, now: i64) {
        let mut entries = self.entries.write();
        for records in entries.values_mut() {
            records.retain(|_, m| m.is_live(now));
        }
        entries.retain(|_, records| !records.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(key: &str, payload: &str, ts: i64) -> PerNodeDataMessage {
        PerNodeDataMessage::new(key, json!(payload), ts)
    }

    #[test]
    fn newer_timestamp_replaces() {
        let store = PerNodeDataStore::new();
        assert!(store.put("n1", msg("a", "old", 100)));
        assert!(store.put("n1", msg("a", "new", 200)));

        let stored = store.get("n1", "a", 0).unwrap();
        assert_eq!(stored.payload, json!("new"));
    }

    #[test]
    fn stale_and_tied_updates_are_discarded() {
        let store = PerNodeDataStore::new();
        store.put("n1", msg("a", "first", 100));

        // Older loses; exact tie keeps the first writer by arrival order.
        assert!(!store.put("n1", msg("a", "older", 50)));
        assert!(!store.put("n1", msg("a", "tied", 100)));
        assert_eq!(store.get("n1", "a", 0).unwrap().payload, json!("first"));
    }

    #[test]
    fn owners_are_isolated() {
        let store = PerNodeDataStore::new();
        store.put("n1", msg("a", "one", 100));
        store.put("n2", msg("a", "two", 100));

        assert_eq!(store.get("n1", "a", 0).unwrap().payload, json!("one"));
        assert_eq!(store.get("n2", "a", 0).unwrap().payload, json!("two"));
    }

    #[test]
    fn expired_records_read_absent_and_purge() {
        let store = PerNodeDataStore::new();
        store.put("n1", msg("a", "v", 100).with_expiry(500));

        assert!(store.get("n1", "a", 500).is_some());
        assert!(store.get("n1", "a", 501).is_none());

        store.purge_expired(501);
        assert!(store.snapshot(0).is_empty());
    }
}
