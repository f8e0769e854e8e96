//! Embedded-value projection.
//!
//! Decides what a resolved reference looks like inside its owning entity:
//! nothing fetched projects to null, a wildcard select projects the full
//! externally-visible representation, and an explicit select keeps only the
//! requested fields. The derived id of the referenced key is attached in
//! every non-null case.

use keystone_types::{EntityData, Key, PropertyValue, SchemaRegistry, ID_PROPERTY};

use crate::path::WILDCARD;

fn selects_all(select: &[String]) -> bool {
    select.is_empty() || select.iter().any(|field| field == WILDCARD)
}

/// Project fetched reference data for write-back at the owning path.
///
/// Requested fields missing from the fetched data fill with null rather
/// than erroring. An explicit select bypasses the schema's exclusions;
/// exclusion shapes the full representation only.
pub fn project(
    fetched: Option<EntityData>,
    key: &Key,
    select: &[String],
    schema: &SchemaRegistry,
) -> PropertyValue {
    let Some(data) = fetched else {
        return PropertyValue::null();
    };

    if selects_all(select) {
        return PropertyValue::Embedded(schema.external_data(&data, key));
    }

    let mut out = EntityData::new();
    for field in select {
        let value = data.get(field).cloned().unwrap_or_else(PropertyValue::null);
        out.insert(field.clone(), value);
    }
    out.insert(
        ID_PROPERTY.to_string(),
        PropertyValue::Scalar(key.id_json()),
    );
    PropertyValue::Embedded(out)
}
