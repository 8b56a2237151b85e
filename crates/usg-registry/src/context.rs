//! Run-scoped collection arena.

use std::collections::BTreeMap;

use crate::collection::CollectionKind;
use crate::loader::LoadedCollection;

/// Every collection loaded so far in a run.
///
/// Passed by reference into each validation step; reference checks only
/// ever see collections that were inserted before them.
#[derive(Debug, Default)]
pub struct RegistryContext {
    collections: BTreeMap<CollectionKind, LoadedCollection>,
}

impl RegistryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a loaded collection, replacing any earlier one of the same kind.
    pub fn insert(&mut self, collection: LoadedCollection) {
        self.collections.insert(collection.kind(), collection);
    }

    pub fn get(&self, kind: CollectionKind) -> Option<&LoadedCollection> {
        self.collections.get(&kind)
    }

    pub fn get_mut(&mut self, kind: CollectionKind) -> Option<&mut LoadedCollection> {
        self.collections.get_mut(&kind)
    }

    /// Whether `id` is an accepted identifier in `kind`.
    ///
    /// Always false for a collection that has not been loaded.
    pub fn contains(&self, kind: CollectionKind, id: &str) -> bool {
        self.get(kind).is_some_and(|c| c.contains(id))
    }

    /// Loaded collections in [`CollectionKind`] order.
    pub fn collections(&self) -> impl Iterator<Item = &LoadedCollection> {
        self.collections.values()
    }
}
