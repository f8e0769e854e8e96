//! Read-aside cache for resolved references.
//!
//! The cache sits in front of the key store during reference population:
//! hits leave the fetch set, misses fall through, and freshly fetched
//! entities are primed back in best-effort (a failed prime never fails the
//! read that produced it).
//!
//! Keys are canonical identity strings, shared with the loader's dedup map.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use keystone_types::EntityData;

pub use memory::MemoryCache;

/// Cache collaborator contract.
///
/// Eventually consistent by design: a miss always falls through to the
/// store, and `set_many` failures are the caller's to swallow.
#[async_trait]
pub trait ReferenceCache: Send + Sync {
    /// Look up entities by identity; one slot per input, `None` on miss.
    async fn get_many(&self, identities: &[String]) -> Result<Vec<Option<EntityData>>>;

    /// Prime the cache with freshly fetched entities.
    async fn set_many(&self, entries: Vec<(String, EntityData)>) -> Result<()>;
}
