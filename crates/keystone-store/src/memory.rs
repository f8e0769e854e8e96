//! In-memory key store.
//!
//! Thread-safe via an internal RwLock. Used by tests and demos; the fetch
//! counters let callers assert how many underlying batch calls a resolution
//! pass actually issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

use keystone_types::{EntityData, Key};

use crate::store::{FetchedEntity, KeyStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: RwLock<HashMap<String, FetchedEntity>>,
    fetch_calls: AtomicUsize,
    keys_requested: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entity under its key.
    pub fn insert(&self, key: Key, data: EntityData) {
        let identity = key.identity();
        self.entities
            .write()
            .insert(identity, FetchedEntity::new(key, data));
    }

    pub fn remove(&self, key: &Key) -> Option<FetchedEntity> {
        self.entities.write().remove(&key.identity())
    }

    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    /// Number of `get` calls issued so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    /// Total number of keys requested across all `get` calls.
    pub fn keys_requested(&self) -> usize {
        self.keys_requested.load(Ordering::Relaxed)
    }

    pub fn reset_counters(&self) {
        self.fetch_calls.store(0, Ordering::Relaxed);
        self.keys_requested.store(0, Ordering::Relaxed);
    }
}

#[async_trait]
impl KeyStore for MemoryStore {
    async fn get(&self, keys: &[Key]) -> Result<Vec<FetchedEntity>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        self.keys_requested.fetch_add(keys.len(), Ordering::Relaxed);

        let entities = self.entities.read();
        let mut found: Vec<FetchedEntity> = keys
            .iter()
            .filter_map(|key| entities.get(&key.identity()).cloned())
            .collect();
        // Deliberately not request order: callers must re-key by identity.
        found.sort_by(|a, b| a.key.identity().cmp(&b.key.identity()));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use keystone_types::PropertyValue;

    fn user(id: &str, name: &str) -> (Key, EntityData) {
        let mut data = EntityData::new();
        data.insert("name".into(), PropertyValue::Scalar(json!(name)));
        (Key::new("User", id), data)
    }

    #[tokio::test]
    async fn test_get_returns_only_found() {
        let store = MemoryStore::new();
        let (key, data) = user("u1", "Ann");
        store.insert(key.clone(), data);

        let found = store
            .get(&[key.clone(), Key::new("User", "missing")])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, key);
    }

    #[tokio::test]
    async fn test_counters_track_batch_calls() {
        let store = MemoryStore::new();
        let (k1, d1) = user("u1", "Ann");
        let (k2, d2) = user("u2", "Bo");
        store.insert(k1.clone(), d1);
        store.insert(k2.clone(), d2);

        store.get(&[k1, k2]).await.unwrap();
        assert_eq!(store.fetch_calls(), 1);
        assert_eq!(store.keys_requested(), 2);

        store.reset_counters();
        assert_eq!(store.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_order_is_identity_sorted_not_request_order() {
        let store = MemoryStore::new();
        let (k1, d1) = user("b", "B");
        let (k2, d2) = user("a", "A");
        store.insert(k1.clone(), d1);
        store.insert(k2.clone(), d2);

        let found = store.get(&[k1, k2.clone()]).await.unwrap();
        assert_eq!(found[0].key, k2);
    }
}
