//! Shared fixtures for the integration suite.
//!
//! Users reference companies; posts reference users and publications.
//! `secret` is excluded from User's external representation.

// Each test binary pulls in the subset of fixtures it needs.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;

use keystone::{
    value_at_path, Entity, EntityData, EntitySchema, Key, MemoryStore, PropertyValue,
    SchemaRegistry,
};

pub fn scalar(value: serde_json::Value) -> PropertyValue {
    PropertyValue::Scalar(value)
}

pub fn reference(kind: &str, id: &str) -> PropertyValue {
    PropertyValue::Reference(Key::new(kind, id))
}

pub fn schema() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register(
        "Post",
        EntitySchema::new()
            .with_reference("user")
            .with_reference("publication"),
    );
    registry.register(
        "User",
        EntitySchema::new()
            .with_reference("company")
            .with_excluded("secret"),
    );
    registry.register("Company", EntitySchema::new());
    Arc::new(registry)
}

pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());

    let mut ann = EntityData::new();
    ann.insert("name".into(), scalar(json!("Ann")));
    ann.insert("secret".into(), scalar(json!("s")));
    ann.insert("company".into(), reference("Company", "c1"));
    store.insert(Key::new("User", "u1"), ann);

    let mut bo = EntityData::new();
    bo.insert("name".into(), scalar(json!("Bo")));
    bo.insert("company".into(), reference("Company", "c1"));
    store.insert(Key::new("User", "u2"), bo);

    let mut acme = EntityData::new();
    acme.insert("name".into(), scalar(json!("Acme")));
    store.insert(Key::new("Company", "c1"), acme);

    store
}

pub fn post(id: i64, user_id: &str) -> Entity {
    let mut data = EntityData::new();
    data.insert("title".into(), scalar(json!(format!("post-{id}"))));
    data.insert("user".into(), reference("User", user_id));
    Entity::new(Key::new("Post", id), data)
}

pub fn embedded<'a>(entity: &'a Entity, path: &str) -> &'a EntityData {
    value_at_path(entity.data(), path)
        .unwrap_or_else(|| panic!("no value at {path}"))
        .as_embedded()
        .unwrap_or_else(|| panic!("value at {path} is not embedded"))
}
