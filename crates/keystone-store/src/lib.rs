//! Storage seam for the keystone workspace.
//!
//! The population engine reaches the underlying database exclusively through
//! [`KeyStore::get`]: one batched fetch by keys, returning whatever was found
//! in whatever order the backend produces. Everything else about storage
//! (indexing, serialization, transactions) lives behind this trait.

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{FetchedEntity, KeyStore};
