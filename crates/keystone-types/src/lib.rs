//! Shared types for the keystone workspace.
//!
//! - [`Key`]: hierarchical entity identifier (kind, id, ancestors, namespace)
//!   with a canonical string identity used for deduplication and cache keying
//! - [`PropertyValue`]: tagged union for entity property slots
//!   (`Scalar | Reference | Embedded`)
//! - [`Entity`]: a key plus its property map
//! - [`SchemaRegistry`]: per-kind reference/excluded property declarations and
//!   the externally-visible representation

pub mod key;
pub mod schema;
pub mod value;

pub use key::{Key, KeyId, PathElement};
pub use schema::{EntitySchema, SchemaRegistry, ID_PROPERTY};
pub use value::{data_to_json, set_value_at_path, value_at_path, Entity, EntityData, PropertyValue};
