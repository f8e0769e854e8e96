//! In-memory reference cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

use keystone_types::EntityData;

use crate::ReferenceCache;

/// Thread-safe in-memory cache keyed by canonical key identity.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, EntityData>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.read().contains_key(identity)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReferenceCache for MemoryCache {
    async fn get_many(&self, identities: &[String]) -> Result<Vec<Option<EntityData>>> {
        let entries = self.entries.read();
        Ok(identities
            .iter()
            .map(|identity| {
                let found = entries.get(identity).cloned();
                match found {
                    Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
                    None => self.misses.fetch_add(1, Ordering::Relaxed),
                };
                found
            })
            .collect())
    }

    async fn set_many(&self, new_entries: Vec<(String, EntityData)>) -> Result<()> {
        let mut entries = self.entries.write();
        for (identity, data) in new_entries {
            entries.insert(identity, data);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use keystone_types::PropertyValue;

    fn data(name: &str) -> EntityData {
        let mut data = EntityData::new();
        data.insert("name".into(), PropertyValue::Scalar(json!(name)));
        data
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = MemoryCache::new();
        let id = "\"User\":\"u1\"".to_string();

        let out = cache.get_many(std::slice::from_ref(&id)).await.unwrap();
        assert_eq!(out, vec![None]);
        assert_eq!(cache.misses(), 1);

        cache.set_many(vec![(id.clone(), data("Ann"))]).await.unwrap();
        let out = cache.get_many(&[id]).await.unwrap();
        assert!(out[0].is_some());
        assert_eq!(cache.hits(), 1);
    }

    #[tokio::test]
    async fn test_get_many_preserves_slot_order() {
        let cache = MemoryCache::new();
        cache
            .set_many(vec![("b".to_string(), data("B"))])
            .await
            .unwrap();

        let out = cache
            .get_many(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert!(out[0].is_none());
        assert!(out[1].is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new();
        cache
            .set_many(vec![("a".to_string(), data("A"))])
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
