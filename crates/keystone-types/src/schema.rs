//! Per-kind schema declarations and the externally-visible representation.
//!
//! The registry answers exactly two questions for the population engine:
//! which properties of a kind are references (used when the caller asks to
//! populate everything), and which properties are excluded from the
//! external representation of that kind.

use std::collections::{BTreeSet, HashMap};

use crate::key::Key;
use crate::value::{EntityData, PropertyValue};

/// The derived id property attached to every externalized entity.
pub const ID_PROPERTY: &str = "id";

/// Reference and visibility declarations for one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySchema {
    reference_properties: BTreeSet<String>,
    excluded_properties: BTreeSet<String>,
}

impl EntitySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property as holding a reference to another entity.
    pub fn with_reference(mut self, name: impl Into<String>) -> Self {
        self.reference_properties.insert(name.into());
        self
    }

    /// Exclude a property from the external representation.
    pub fn with_excluded(mut self, name: impl Into<String>) -> Self {
        self.excluded_properties.insert(name.into());
        self
    }

    pub fn reference_properties(&self) -> impl Iterator<Item = &str> {
        self.reference_properties.iter().map(String::as_str)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_properties.contains(name)
    }

    /// The externally-visible shape of one entity's data: excluded
    /// properties removed, derived id attached.
    pub fn external_data(&self, data: &EntityData, key: &Key) -> EntityData {
        let mut out: EntityData = data
            .iter()
            .filter(|(name, _)| !self.is_excluded(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        out.insert(
            ID_PROPERTY.to_string(),
            PropertyValue::Scalar(key.id_json()),
        );
        out
    }
}

/// Kind name to schema lookup.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    kinds: HashMap<String, EntitySchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, schema: EntitySchema) {
        self.kinds.insert(kind.into(), schema);
    }

    pub fn get(&self, kind: &str) -> Option<&EntitySchema> {
        self.kinds.get(kind)
    }

    /// Reference property names declared for a kind; empty when the kind is
    /// unknown.
    pub fn reference_properties(&self, kind: &str) -> Vec<String> {
        self.kinds
            .get(kind)
            .map(|schema| schema.reference_properties().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Externalize entity data for the kind named by `key`. Kinds without a
    /// registered schema keep all properties and still get the derived id.
    pub fn external_data(&self, data: &EntityData, key: &Key) -> EntityData {
        match self.kinds.get(key.kind()) {
            Some(schema) => schema.external_data(data, key),
            None => EntitySchema::default().external_data(data, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_external_data_drops_excluded_and_attaches_id() {
        let schema = EntitySchema::new().with_excluded("secret");
        let mut data = EntityData::new();
        data.insert("name".into(), PropertyValue::Scalar(json!("Ann")));
        data.insert("secret".into(), PropertyValue::Scalar(json!("s")));

        let out = schema.external_data(&data, &Key::new("User", "u1"));
        assert!(out.contains_key("name"));
        assert!(!out.contains_key("secret"));
        assert_eq!(
            out.get(ID_PROPERTY),
            Some(&PropertyValue::Scalar(json!("u1")))
        );
    }

    #[test]
    fn test_registry_unknown_kind_keeps_everything() {
        let registry = SchemaRegistry::new();
        let mut data = EntityData::new();
        data.insert("anything".into(), PropertyValue::Scalar(json!(1)));

        let out = registry.external_data(&data, &Key::new("Mystery", 9));
        assert!(out.contains_key("anything"));
        assert_eq!(out.get(ID_PROPERTY), Some(&PropertyValue::Scalar(json!(9))));
    }

    #[test]
    fn test_reference_properties_lookup() {
        let mut registry = SchemaRegistry::new();
        registry.register(
            "Post",
            EntitySchema::new().with_reference("user").with_reference("publication"),
        );
        assert_eq!(
            registry.reference_properties("Post"),
            vec!["publication".to_string(), "user".to_string()]
        );
        assert!(registry.reference_properties("Nope").is_empty());
    }
}
