//! Hierarchical entity keys.
//!
//! A key names exactly one entity: a kind, an id (string name or integer),
//! an optional ordered ancestor chain, and an optional namespace. Keys are
//! immutable once constructed; the builder methods consume and return.
//!
//! The canonical [`Key::identity`] string is the only form the rest of the
//! system compares: it is the dedup key for batched loads and the cache key
//! when a cache is configured.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The id half of a key path element: a string name or an integer id.
///
/// `Name("1")` and `Id(1)` are distinct keys and must never collide in the
/// canonical identity form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyId {
    Name(String),
    Id(i64),
}

impl KeyId {
    /// The externally-visible id: JSON string for names, JSON number for ids.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Name(name) => serde_json::Value::String(name.clone()),
            Self::Id(id) => serde_json::Value::Number((*id).into()),
        }
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            // JSON string quoting keeps names unambiguous against integers
            // and against the identity separators.
            Self::Name(name) => out.push_str(&serde_json::Value::String(name.clone()).to_string()),
            Self::Id(id) => out.push_str(&id.to_string()),
        }
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for KeyId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i64> for KeyId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

/// One (kind, id) pair in a key's ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathElement {
    pub kind: String,
    pub id: KeyId,
}

impl PathElement {
    pub fn new(kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    fn write_canonical(&self, out: &mut String) {
        out.push_str(&serde_json::Value::String(self.kind.clone()).to_string());
        out.push(':');
        self.id.write_canonical(out);
    }
}

/// Hierarchical identifier naming one entity.
///
/// Two keys are equal iff their canonical identity strings match; the derived
/// `Eq`/`Hash` agree with that because the identity is a pure function of the
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    namespace: Option<String>,
    ancestors: Vec<PathElement>,
    kind: String,
    id: KeyId,
}

impl Key {
    pub fn new(kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            namespace: None,
            ancestors: Vec::new(),
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_ancestors(mut self, ancestors: Vec<PathElement>) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// A key one level below this one: this key's path becomes the ancestor
    /// chain of the child.
    pub fn child(&self, kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(PathElement {
            kind: self.kind.clone(),
            id: self.id.clone(),
        });
        Self {
            namespace: self.namespace.clone(),
            ancestors,
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// The key named by the last ancestor element, if any.
    pub fn parent(&self) -> Option<Self> {
        let mut ancestors = self.ancestors.clone();
        let last = ancestors.pop()?;
        Some(Self {
            namespace: self.namespace.clone(),
            ancestors,
            kind: last.kind,
            id: last.id,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn ancestors(&self) -> &[PathElement] {
        &self.ancestors
    }

    /// The externally-visible id of the entity this key names.
    pub fn id_json(&self) -> serde_json::Value {
        self.id.to_json()
    }

    /// Canonical string form of this key.
    ///
    /// Total, deterministic, and collision-free: kinds, names, and the
    /// namespace are JSON-quoted, so the separators (`|`, `/`, `:`) only
    /// carry structure outside string literals. Integer ids render bare,
    /// which keeps `Name("1")` and `Id(1)` distinct.
    pub fn identity(&self) -> String {
        let mut out = String::new();
        if let Some(ns) = &self.namespace {
            out.push_str(&serde_json::Value::String(ns.clone()).to_string());
            out.push('|');
        }
        for ancestor in &self.ancestors {
            ancestor.write_canonical(&mut out);
            out.push('/');
        }
        out.push_str(&serde_json::Value::String(self.kind.clone()).to_string());
        out.push(':');
        self.id.write_canonical(&mut out);
        out
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_simple() {
        let key = Key::new("User", "u1");
        assert_eq!(key.identity(), r#""User":"u1""#);
    }

    #[test]
    fn test_identity_numeric_id() {
        let key = Key::new("Post", 42);
        assert_eq!(key.identity(), r#""Post":42"#);
    }

    #[test]
    fn test_name_and_numeric_ids_never_collide() {
        let named = Key::new("Post", "42");
        let numeric = Key::new("Post", 42);
        assert_ne!(named.identity(), numeric.identity());
        assert_ne!(named, numeric);
    }

    #[test]
    fn test_identity_with_namespace_and_ancestors() {
        let key = Key::new("User", "u1")
            .with_namespace("tenant-a")
            .with_ancestors(vec![PathElement::new("Company", 7)]);
        assert_eq!(key.identity(), r#""tenant-a"|"Company":7/"User":"u1""#);
    }

    #[test]
    fn test_identity_is_deterministic() {
        let a = Key::new("User", "u1").with_namespace("ns");
        let b = Key::new("User", "u1").with_namespace("ns");
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_escapes_separators_in_names() {
        // A kind containing separators must not be confusable with structure.
        let tricky = Key::new(r#"A":7/"B"#, 1);
        let plain = Key::new("B", 1).with_ancestors(vec![PathElement::new("A", 7)]);
        assert_ne!(tricky.identity(), plain.identity());
    }

    #[test]
    fn test_child_and_parent_round_trip() {
        let company = Key::new("Company", 7).with_namespace("ns");
        let user = company.child("User", "u1");
        assert_eq!(user.ancestors().len(), 1);
        assert_eq!(user.namespace(), Some("ns"));
        assert_eq!(user.parent(), Some(company));
    }

    #[test]
    fn test_parent_of_root_key() {
        assert_eq!(Key::new("User", "u1").parent(), None);
    }

    #[test]
    fn test_id_json() {
        assert_eq!(Key::new("User", "u1").id_json(), serde_json::json!("u1"));
        assert_eq!(Key::new("Post", 42).id_json(), serde_json::json!(42));
    }
}
