//! keystone: entity mapping over a key/value cloud database.
//!
//! Entities are schema-described records identified by hierarchical keys;
//! properties may reference other entities. The heart of the crate is the
//! reference-population engine: it replaces reference slots with the
//! referenced entities' data, resolving one dotted-path depth level at a
//! time, batching and deduplicating every fetch a level needs into a single
//! store call, reading through an optional cache, and projecting only the
//! fields the caller selected.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keystone::{Populator, MemoryStore, SchemaRegistry};
//!
//! let populator = Populator::new(store, schema);
//! let resolved = populator
//!     .populate(posts)
//!     .path("user")
//!     .path("user.company")
//!     .resolve()
//!     .await?;
//! ```

pub use keystone_cache as cache;
pub use keystone_populate as populate;
pub use keystone_store as store;
pub use keystone_types as types;

pub use keystone_cache::{MemoryCache, ReferenceCache};
pub use keystone_populate::{
    Container, LoadStats, Page, PathNode, PopulateBuilder, PopulateError, PopulateTree, Populator,
    ReferenceLoader, WILDCARD,
};
pub use keystone_store::{FetchedEntity, KeyStore, MemoryStore};
pub use keystone_types::{
    data_to_json, set_value_at_path, value_at_path, Entity, EntityData, EntitySchema, Key, KeyId,
    PathElement, PropertyValue, SchemaRegistry, ID_PROPERTY,
};
