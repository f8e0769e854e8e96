//! Reference population for keystone entities.
//!
//! This crate is the core of the entity-mapping layer: it takes entities
//! whose property slots hold unresolved [`keystone_types::Key`] references
//! and replaces them, level by level, with the referenced entities' data.
//!
//! # Example
//!
//! ```ignore
//! use keystone_populate::Populator;
//!
//! let populator = Populator::new(store, schema).with_cache(cache);
//! let resolved = populator
//!     .populate(post)
//!     .path("user")
//!     .path("user.company")
//!     .resolve()
//!     .await?;
//! ```
//!
//! Resolution is breadth-first over dotted-path depth levels: every
//! reference needed at one level, across all entities being processed, is
//! fetched in a single batched, deduplicated store call before the next
//! level starts.

pub mod error;
pub mod loader;
pub mod path;
pub mod populate;
pub mod project;

pub use error::PopulateError;
pub use loader::{LoadStats, ReferenceLoader};
pub use path::{PathNode, PopulateTree, WILDCARD};
pub use populate::{Container, Page, PopulateBuilder, Populator};
pub use project::project;
