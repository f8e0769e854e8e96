//! Entity property values and dotted-path access.
//!
//! Property slots are a tagged union decided at schema-compile time rather
//! than probed at runtime: a slot is a plain scalar, an unresolved reference
//! to another entity, or an embedded object produced by a previous
//! resolution. Embedded objects are themselves property maps, so they can
//! carry deeper unresolved references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::schema::SchemaRegistry;

/// An entity's property map. Ordered so external representations are stable.
pub type EntityData = BTreeMap<String, PropertyValue>;

/// One property slot of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// A plain JSON value (including JSON null).
    Scalar(serde_json::Value),
    /// An unresolved reference to another entity.
    Reference(Key),
    /// A resolved (or nested) object.
    Embedded(EntityData),
}

impl PropertyValue {
    /// The explicit "no value" marker written for absent or unresolvable
    /// references.
    pub fn null() -> Self {
        Self::Scalar(serde_json::Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(serde_json::Value::Null))
    }

    pub fn as_reference(&self) -> Option<&Key> {
        match self {
            Self::Reference(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_embedded(&self) -> Option<&EntityData> {
        match self {
            Self::Embedded(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Plain JSON rendering. Unresolved references render as their canonical
    /// key string.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::Reference(key) => serde_json::Value::String(key.identity()),
            Self::Embedded(data) => data_to_json(data),
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<Key> for PropertyValue {
    fn from(key: Key) -> Self {
        Self::Reference(key)
    }
}

/// Render a property map as plain JSON.
pub fn data_to_json(data: &EntityData) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = data
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();
    serde_json::Value::Object(map)
}

/// Read the value at a dotted path, descending through embedded objects.
///
/// Returns `None` when any segment is missing or when an intermediate
/// segment holds something other than an embedded object.
pub fn value_at_path<'a>(data: &'a EntityData, path: &str) -> Option<&'a PropertyValue> {
    let mut current = data;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;
        if segments.peek().is_none() {
            return Some(value);
        }
        current = value.as_embedded()?;
    }
    None
}

/// Write a value at a dotted path, descending through embedded objects.
///
/// The final segment is inserted whether or not it already exists. Returns
/// `false` without writing when an intermediate segment is missing or is not
/// an embedded object: a deeper path under a reference that resolved to
/// null stays effectively absent rather than erroring.
pub fn set_value_at_path(data: &mut EntityData, path: &str, value: PropertyValue) -> bool {
    let mut current = data;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return true;
        }
        match current.get_mut(segment) {
            Some(PropertyValue::Embedded(next)) => current = next,
            _ => return false,
        }
    }
    false
}

/// A schema-described record: a key plus its property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    key: Key,
    data: EntityData,
}

impl Entity {
    pub fn new(key: Key, data: EntityData) -> Self {
        Self { key, data }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn kind(&self) -> &str {
        self.key.kind()
    }

    pub fn data(&self) -> &EntityData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut EntityData {
        &mut self.data
    }

    pub fn into_data(self) -> EntityData {
        self.data
    }

    /// The externally-visible JSON shape of this entity: excluded properties
    /// removed, derived id attached.
    pub fn to_json(&self, schema: &SchemaRegistry) -> serde_json::Value {
        data_to_json(&schema.external_data(&self.data, &self.key))
    }
}
