//! Generic synchronized entity cache

use parking_lot::RwLock;

use crate::error::CacheResult;
use crate::index::{CacheEntity, Index};

/// Thread-safe cache of entities addressable by name and by id.
///
/// Lookups return clones; every mutation updates both indices under one
/// write lock.
#[derive(Debug)]
pub struct EntityCache<T> {
    pub(crate) inner: RwLock<Index<T>>,
}

impl<T: CacheEntity> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Index::default()),
        }
    }
}

impl<T: CacheEntity> EntityCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from an initial set of entities
    pub fn from_entities(entities: impl IntoIterator<Item = T>) -> CacheResult<Self> {
        let mut index = Index::default();
        for entity in entities {
            index.add(entity)?;
        }
        Ok(Self {
            inner: RwLock::new(index),
        })
    }

    pub fn for_name(&self, name: &str) -> Option<T> {
        self.inner.read().for_name(name).cloned()
    }

    pub fn for_id(&self, id: &str) -> Option<T> {
        self.inner.read().for_id(id).cloned()
    }

    /// Snapshot of every entity, in no particular order
    pub fn all(&self) -> Vec<T> {
        self.inner.read().all()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add(&self, entity: T) -> CacheResult<()> {
        tracing::debug!(kind = T::KIND, name = entity.name(), "Adding to cache");
        self.inner.write().add(entity)
    }

    /// Replace the entity with the same id; returns the previous value
    pub fn update(&self, entity: T) -> CacheResult<T> {
        tracing::debug!(kind = T::KIND, id = entity.id(), "Updating cache entry");
        self.inner.write().update(entity)
    }

    pub fn remove(&self, id: &str) -> CacheResult<T> {
        tracing::debug!(kind = T::KIND, id, "Removing from cache");
        self.inner.write().remove(id)
    }

    pub fn remove_by_name(&self, name: &str) -> CacheResult<T> {
        tracing::debug!(kind = T::KIND, name, "Removing from cache");
        self.inner.write().remove_by_name(name)
    }
}
