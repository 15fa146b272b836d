//! Shared data store: key → CRDT-typed (or raw) record, cluster-wide.
//!
//! CRDT payloads merge by join; raw payloads merge by keeping the newer
//! timestamp. Mixing variants under one key is a configuration error and
//! is rejected without touching the stored entry.

use crate::error::{GossipError, Result};
use crate::message::{SharedDataMessage, SharedPayload};
use murmur_crdt::Lattice;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Default)]
pub struct SharedDataStore {
    entries: RwLock<HashMap<String, SharedDataMessage>>,
}

impl SharedDataStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Merge an incoming shared record. First write for a key stores the
    /// message verbatim; later writes join payloads of the same variant.
    /// The write lock spans lookup and replacement, so concurrent merges
    /// for one key serialize; joins commute, so their order is irrelevant.
    pub fn merge(&self, message: SharedDataMessage) -> Result<()> {
        let mut entries = self.entries.write();
        let Some(existing) = entries.get(&message.key) else {
            entries.insert(message.key.clone(), message);
            return Ok(());
        };

        let payload = join_payloads(existing, &message).map_err(|err| {
            warn!(key = %message.key, %err, "rejecting shared merge");
            err
        })?;

        // Expiry follows the newer write; a timestamp tie takes the later
        // expiry so replicas agree regardless of arrival order.
        let expire_at = match message.timestamp.cmp(&existing.timestamp) {
            Ordering::Greater => message.expire_at,
            Ordering::Less => existing.expire_at,
            Ordering::Equal => existing.expire_at.max(message.expire_at),
        };
        let merged = SharedDataMessage {
            key: message.key.clone(),
            payload,
            timestamp: existing.timestamp.max(message.timestamp),
            expire_at,
        };
        entries.insert(message.key, merged);
        Ok(())
    }

    /// Read the full record for `key`; expired records read as absent.
    pub fn get(&self, key: &str, now: i64) -> Option<SharedDataMessage> {
        self.entries
            .read()
            .get(key)
            .filter(|m| m.is_live(now))
            .cloned()
    }

    /// Read the live, merged CRDT under `key`. Raw payloads yield None.
    pub fn find_crdt(&self, key: &str, now: i64) -> Option<SharedPayload> {
        self.get(key, now)
            .map(|m| m.payload)
            .filter(SharedPayload::is_crdt)
    }

    /// Snapshot every live record for an outgoing digest.
    pub fn snapshot(&self, now: i64) -> Vec<SharedDataMessage> {
        self.entries
            .read()
            .values()
            .filter(|m| m.is_live(now))
            .cloned()
            .collect()
    }

    /// Drop records whose expiry has passed.
    pub fn purge_expired(&self, now: i64) {
        self.entries.write().retain(|_, m| m.is_live(now));
    }
}

/// Join two payloads under the same key. Exhaustive over the closed
/// variant set; a cross-variant pair is a type mismatch.
fn join_payloads(existing: &SharedDataMessage, incoming: &SharedDataMessage) -> Result<SharedPayload> {
    use SharedPayload::*;

    match (&existing.payload, &incoming.payload) {
        (GrowOnlySet(a), GrowOnlySet(b)) => Ok(GrowOnlySet(a.join(b))),
        (OrSet(a), OrSet(b)) => Ok(OrSet(a.join(b))),
        (LwwSet(a), LwwSet(b)) => Ok(LwwSet(a.join(b))),
        (GrowOnlyCounter(a), GrowOnlyCounter(b)) => Ok(GrowOnlyCounter(a.join(b))),
        (PnCounter(a), PnCounter(b)) => Ok(PnCounter(a.join(b))),
        // Raw values carry no merge structure: the newer write wins, and
        // on a timestamp tie the stored value is kept.
        (Raw(a), Raw(b)) => {
            if incoming.timestamp > existing.timestamp {
                Ok(Raw(b.clone()))
            } else {
                Ok(Raw(a.clone()))
            }
        }
        (stored, payload) => Err(GossipError::TypeMismatch {
            key: existing.key.clone(),
            stored: stored.variant_name(),
            incoming: payload.variant_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_crdt::{GrowOnlySet, OrSet};
    use serde_json::json;

    fn shared(key: &str, payload: SharedPayload, ts: i64) -> SharedDataMessage {
        SharedDataMessage::new(key, payload, ts)
    }

    #[test]
    fn first_write_stores_verbatim() {
        let store = SharedDataStore::new();
        let set: GrowOnlySet<String> = ["a".to_string()].into_iter().collect();
        store
            .merge(shared("k", SharedPayload::GrowOnlySet(set.clone()), 1))
            .unwrap();

        assert_eq!(
            store.find_crdt("k", 0),
            Some(SharedPayload::GrowOnlySet(set))
        );
    }

    #[test]
    fn same_variant_joins() {
        let store = SharedDataStore::new();
        let a: GrowOnlySet<String> = ["1".to_string()].into_iter().collect();
        let b: GrowOnlySet<String> = ["2".to_string()].into_iter().collect();

        store.merge(shared("k", SharedPayload::GrowOnlySet(a), 1)).unwrap();
        store.merge(shared("k", SharedPayload::GrowOnlySet(b), 2)).unwrap();

        match store.find_crdt("k", 0) {
            Some(SharedPayload::GrowOnlySet(merged)) => assert_eq!(merged.len(), 2),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn variant_mismatch_leaves_store_untouched() {
        let store = SharedDataStore::new();
        let orset = OrSet::with_elements("n1", ["x".to_string()]);
        store
            .merge(shared("k", SharedPayload::OrSet(orset.clone()), 1))
            .unwrap();

        let gset: GrowOnlySet<String> = ["y".to_string()].into_iter().collect();
        let err = store
            .merge(shared("k", SharedPayload::GrowOnlySet(gset), 2))
            .unwrap_err();
        assert!(matches!(err, GossipError::TypeMismatch { .. }));

        // Stored OR-Set is intact, metadata included.
        let record = store.get("k", 0).unwrap();
        assert_eq!(record.payload, SharedPayload::OrSet(orset));
        assert_eq!(record.timestamp, 1);
    }

    #[test]
    fn raw_values_resolve_by_timestamp() {
        let store = SharedDataStore::new();
        store.merge(shared("k", SharedPayload::Raw(json!("old")), 100)).unwrap();
        store.merge(shared("k", SharedPayload::Raw(json!("new")), 200)).unwrap();
        store.merge(shared("k", SharedPayload::Raw(json!("stale")), 150)).unwrap();

        assert_eq!(store.get("k", 0).unwrap().payload, SharedPayload::Raw(json!("new")));
        assert_eq!(store.get("k", 0).unwrap().timestamp, 200);
        // Raw payloads are not CRDTs.
        assert!(store.find_crdt("k", 0).is_none());
    }

    #[test]
    fn tied_timestamps_agree_on_expiry_either_merge_order() {
        let a = shared(
            "k",
            SharedPayload::GrowOnlySet(["1".to_string()].into_iter().collect()),
            100,
        )
        .with_expiry(500);
        let b = shared(
            "k",
            SharedPayload::GrowOnlySet(["2".to_string()].into_iter().collect()),
            100,
        )
        .with_expiry(900);

        let forward = SharedDataStore::new();
        forward.merge(a.clone()).unwrap();
        forward.merge(b.clone()).unwrap();

        let reverse = SharedDataStore::new();
        reverse.merge(b).unwrap();
        reverse.merge(a).unwrap();

        let left = forward.get("k", 0).unwrap();
        let right = reverse.get("k", 0).unwrap();
        assert_eq!(left.expire_at, 900);
        assert_eq!(left.expire_at, right.expire_at);
        assert_eq!(left.payload, right.payload);
    }

    #[test]
    fn merge_refreshes_expiry_from_newer_message() {
        let store = SharedDataStore::new();
        let a: GrowOnlySet<String> = ["1".to_string()].into_iter().collect();
        let b: GrowOnlySet<String> = ["2".to_string()].into_iter().collect();

        store
            .merge(shared("k", SharedPayload::GrowOnlySet(a), 100).with_expiry(500))
            .unwrap();
        store
            .merge(shared("k", SharedPayload::GrowOnlySet(b), 200).with_expiry(900))
            .unwrap();

        let record = store.get("k", 0).unwrap();
        assert_eq!(record.timestamp, 200);
        assert_eq!(record.expire_at, 900);

        assert!(store.get("k", 901).is_none());
        store.purge_expired(901);
        assert!(store.snapshot(0).is_empty());
    }
}
