//! Level-order reference resolution.
//!
//! [`Populator`] is the engine: it owns the store, the optional cache, and
//! the schema registry. [`Populator::populate`] starts a [`PopulateBuilder`]
//! over a container of entities; chained `path` calls accumulate into one
//! [`PopulateTree`], and the terminal [`PopulateBuilder::resolve`] executes
//! the whole accumulated request in one pass.
//!
//! Resolution drains the tree strictly level by level. Within a level, every
//! reference across every entity being processed lands in one batched
//! loader call, so populating N entities at depth L costs one fetch, not N.
//! Deeper levels read the embedded data the previous level just wrote, so
//! levels never overlap.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use keystone_cache::ReferenceCache;
use keystone_store::KeyStore;
use keystone_types::{
    set_value_at_path, value_at_path, Entity, Key, PropertyValue, SchemaRegistry,
};

use crate::error::PopulateError;
use crate::loader::ReferenceLoader;
use crate::path::PopulateTree;
use crate::project::project;

/// One page of a query result: entities plus the continuation cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entities: Vec<Entity>,
    pub cursor: Option<String>,
}

/// The shape the caller handed in, and the shape they get back.
///
/// Shape preservation is a contract, not an implementation detail: callers
/// branch on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    One(Entity),
    Many(Vec<Entity>),
    Page(Page),
}

impl Container {
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(entities) => entities.len(),
            Self::Page(page) => page.entities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entities(&self) -> &[Entity] {
        match self {
            Self::One(entity) => std::slice::from_ref(entity),
            Self::Many(entities) => entities,
            Self::Page(page) => &page.entities,
        }
    }

    fn entities_mut(&mut self) -> &mut [Entity] {
        match self {
            Self::One(entity) => std::slice::from_mut(entity),
            Self::Many(entities) => entities,
            Self::Page(page) => &mut page.entities,
        }
    }

    pub fn into_one(self) -> Option<Entity> {
        match self {
            Self::One(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn into_many(self) -> Vec<Entity> {
        match self {
            Self::One(entity) => vec![entity],
            Self::Many(entities) => entities,
            Self::Page(page) => page.entities,
        }
    }
}

impl From<Entity> for Container {
    fn from(entity: Entity) -> Self {
        Self::One(entity)
    }
}

impl From<Vec<Entity>> for Container {
    fn from(entities: Vec<Entity>) -> Self {
        Self::Many(entities)
    }
}

impl From<Page> for Container {
    fn from(page: Page) -> Self {
        Self::Page(page)
    }
}

/// The reference-population engine.
pub struct Populator {
    store: Arc<dyn KeyStore>,
    cache: Option<Arc<dyn ReferenceCache>>,
    schema: Arc<SchemaRegistry>,
}

impl Populator {
    pub fn new(store: Arc<dyn KeyStore>, schema: Arc<SchemaRegistry>) -> Self {
        Self {
            store,
            cache: None,
            schema,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ReferenceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// A fresh loader bound to this engine's store and cache. One resolution
    /// pass owns one loader; hand the same instance to several builders to
    /// batch across passes on purpose.
    pub fn loader(&self) -> ReferenceLoader {
        let loader = ReferenceLoader::new(Arc::clone(&self.store));
        match &self.cache {
            Some(cache) => loader.with_cache(Arc::clone(cache)),
            None => loader,
        }
    }

    /// Start a populate request over a single entity, a vec, or a page.
    pub fn populate<C: Into<Container>>(&self, target: C) -> PopulateBuilder<'_> {
        PopulateBuilder {
            populator: self,
            container: target.into(),
            tree: PopulateTree::new(),
            populate_all: false,
            use_cache: true,
            loader: None,
            error: None,
        }
    }
}

/// Accumulates populate paths; nothing touches the store until
/// [`resolve`](Self::resolve).
pub struct PopulateBuilder<'a> {
    populator: &'a Populator,
    container: Container,
    tree: PopulateTree,
    populate_all: bool,
    use_cache: bool,
    loader: Option<Arc<ReferenceLoader>>,
    error: Option<PopulateError>,
}

impl PopulateBuilder<'_> {
    /// Populate one dotted path, keeping all fields of the resolved target.
    pub fn path(mut self, path: &str) -> Self {
        self.tree.add_path(path, &[]);
        self
    }

    /// Populate one dotted path, keeping only `fields` of the resolved
    /// target.
    pub fn path_select(mut self, path: &str, fields: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|field| field.to_string()).collect();
        self.tree.add_path(path, &fields);
        self
    }

    /// Populate several paths, all with full projection.
    pub fn paths(mut self, paths: &[&str]) -> Self {
        for path in paths {
            self.tree.add_path(path, &[]);
        }
        self
    }

    /// Populate several paths with a field selection.
    ///
    /// A selection is only well-defined for a single path: more than one
    /// path combined with fields latches [`PopulateError::InvalidSelection`],
    /// which [`resolve`](Self::resolve) reports before any I/O.
    pub fn paths_select(mut self, paths: &[&str], fields: &[&str]) -> Self {
        if paths.len() > 1 && !fields.is_empty() {
            if self.error.is_none() {
                self.error = Some(PopulateError::InvalidSelection);
            }
            return self;
        }
        match paths {
            [path] => self.path_select(path, fields),
            _ => self.paths(paths),
        }
    }

    /// Populate every reference property declared on the processed entities'
    /// schemas, each with full projection.
    pub fn all(mut self) -> Self {
        self.populate_all = true;
        self
    }

    /// Bypass the cache collaborator for this resolution pass.
    pub fn skip_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Use a caller-owned loader instead of a fresh one, sharing its dedup
    /// state across resolution passes.
    pub fn with_loader(mut self, loader: Arc<ReferenceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Execute the accumulated request and return the container in its
    /// original shape, reference slots replaced in place.
    pub async fn resolve(self) -> Result<Container, PopulateError> {
        let Self {
            populator,
            mut container,
            mut tree,
            populate_all,
            use_cache,
            loader,
            error,
        } = self;

        if let Some(error) = error {
            return Err(error);
        }
        if container.is_empty() {
            return Ok(container);
        }

        if populate_all {
            let kinds: BTreeSet<String> = container
                .entities()
                .iter()
                .map(|entity| entity.kind().to_string())
                .collect();
            for kind in &kinds {
                for property in populator.schema.reference_properties(kind) {
                    tree.add_path(&property, &[]);
                }
            }
        }
        if tree.is_empty() {
            return Ok(container);
        }

        let loader = match loader {
            Some(shared) => shared,
            None => Arc::new(populator.loader()),
        };

        let entities = container.entities_mut();
        for (depth, nodes) in tree.levels().iter().enumerate() {
            if nodes.is_empty() {
                continue;
            }

            // One flat batch for the whole level, across all entities.
            let mut batch_keys: Vec<Key> = Vec::new();
            let mut slots: Vec<(usize, usize)> = Vec::new();
            for (entity_index, entity) in entities.iter_mut().enumerate() {
                for (node_index, node) in nodes.iter().enumerate() {
                    let action = match value_at_path(entity.data(), &node.path) {
                        None => SlotAction::WriteNull,
                        Some(value) if value.is_null() => SlotAction::Leave,
                        Some(PropertyValue::Reference(key)) => SlotAction::Collect(key.clone()),
                        Some(_) => {
                            return Err(PopulateError::NonReference {
                                path: node.path.clone(),
                            })
                        }
                    };
                    match action {
                        SlotAction::WriteNull => {
                            // Unknown path: explicit null marker. Writes under
                            // a parent that resolved to null are skipped.
                            set_value_at_path(entity.data_mut(), &node.path, PropertyValue::null());
                        }
                        SlotAction::Leave => {}
                        SlotAction::Collect(key) => {
                            batch_keys.push(key);
                            slots.push((entity_index, node_index));
                        }
                    }
                }
            }

            debug!(
                level = depth,
                nodes = nodes.len(),
                references = batch_keys.len(),
                "resolving populate level"
            );
            if batch_keys.is_empty() {
                continue;
            }

            let results = loader.load_with_options(&batch_keys, use_cache).await?;
            for (((entity_index, node_index), key), fetched) in
                slots.iter().zip(&batch_keys).zip(results)
            {
                let node = &nodes[*node_index];
                let projected = project(fetched, key, &node.select, &populator.schema);
                set_value_at_path(entities[*entity_index].data_mut(), &node.path, projected);
            }
        }

        Ok(container)
    }
}

enum SlotAction {
    WriteNull,
    Leave,
    Collect(Key),
}
