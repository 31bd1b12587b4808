//! Name-keyed entity index with a secondary id index

use std::collections::HashMap;

use devsvc_core::{Device, DeviceProfile, ValueDescriptor};

use crate::error::{CacheError, CacheResult};

/// An entity that can be held in a cache
pub trait CacheEntity: Clone + Send + Sync + 'static {
    /// Human-readable kind, used in error messages
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl CacheEntity for Device {
    const KIND: &'static str = "device";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl CacheEntity for DeviceProfile {
    const KIND: &'static str = "device profile";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl CacheEntity for ValueDescriptor {
    const KIND: &'static str = "value descriptor";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Primary name → entity map plus id → name map.
///
/// Not synchronized; owners wrap it in a lock.
#[derive(Debug, Clone)]
pub(crate) struct Index<T> {
    by_name: HashMap<String, T>,
    id_to_name: HashMap<String, String>,
}

impl<T> Default for Index<T> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
            id_to_name: HashMap::new(),
        }
    }
}

impl<T: CacheEntity> Index<T> {
    pub fn for_name(&self, name: &str) -> Option<&T> {
        self.by_name.get(name)
    }

    pub fn for_id(&self, id: &str) -> Option<&T> {
        self.id_to_name
            .get(id)
            .and_then(|name| self.by_name.get(name))
    }

    pub fn all(&self) -> Vec<T> {
        self.by_name.values().cloned().collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn add(&mut self, entity: T) -> CacheResult<()> {
        if self.by_name.contains_key(entity.name()) {
            return Err(CacheError::already_exists(T::KIND, entity.name()));
        }
        if self.id_to_name.contains_key(entity.id()) {
            return Err(CacheError::already_exists(T::KIND, entity.id()));
        }
        self.id_to_name
            .insert(entity.id().to_string(), entity.name().to_string());
        self.by_name.insert(entity.name().to_string(), entity);
        Ok(())
    }

    /// Replace the entity with the same id; returns the previous value.
    ///
    /// The name may change, but not to one held by another entity.
    pub fn update(&mut self, entity: T) -> CacheResult<T> {
        let old_name = self
            .id_to_name
            .get(entity.id())
            .cloned()
            .ok_or_else(|| CacheError::not_found(T::KIND, entity.id()))?;

        if old_name != entity.name() && self.by_name.contains_key(entity.name()) {
            return Err(CacheError::already_exists(T::KIND, entity.name()));
        }

        let previous = self
            .by_name
            .remove(&old_name)
            .ok_or_else(|| CacheError::not_found(T::KIND, old_name.clone()))?;
        self.id_to_name
            .insert(entity.id().to_string(), entity.name().to_string());
        self.by_name.insert(entity.name().to_string(), entity);
        Ok(previous)
    }

    pub fn remove(&mut self, id: &str) -> CacheResult<T> {
        let name = self
            .id_to_name
            .get(id)
            .cloned()
            .ok_or_else(|| CacheError::not_found(T::KIND, id))?;
        self.remove_by_name(&name)
    }

    pub fn remove_by_name(&mut self, name: &str) -> CacheResult<T> {
        let entity = self
            .by_name
            .remove(name)
            .ok_or_else(|| CacheError::not_found(T::KIND, name))?;
        self.id_to_name.remove(entity.id());
        Ok(entity)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.by_name.get_mut(name)
    }

    pub fn name_for_id(&self, id: &str) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }
}
