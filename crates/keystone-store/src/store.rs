//! The batched fetch contract.

use anyhow::Result;
use async_trait::async_trait;

use keystone_types::{EntityData, Key};

/// One entity as returned by the underlying store.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedEntity {
    pub key: Key,
    pub data: EntityData,
}

impl FetchedEntity {
    pub fn new(key: Key, data: EntityData) -> Self {
        Self { key, data }
    }
}

/// Batched "get by keys" against the underlying key/value database.
///
/// The response carries only the entities that exist, in arbitrary order;
/// callers re-key by [`Key::identity`]. A failed fetch fails the whole call;
/// there is no partial success at this layer.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn get(&self, keys: &[Key]) -> Result<Vec<FetchedEntity>>;
}
