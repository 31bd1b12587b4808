//! Profile cache with derived device-object and resource-operation indices

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use devsvc_core::{DeviceObject, DeviceProfile, Direction, ResourceOperation};

use crate::error::{CacheError, CacheResult};
use crate::index::{CacheEntity, Index};

type OpsByCommand = HashMap<String, Vec<ResourceOperation>>;

/// Profiles plus the lookup tables derived from them.
///
/// Derived tables are keyed by profile name and rebuilt wholesale for a
/// profile whenever it is added or updated.
#[derive(Debug, Default)]
struct ProfileIndex {
    profiles: Index<DeviceProfile>,
    objects: HashMap<String, HashMap<String, DeviceObject>>,
    get_ops: HashMap<String, OpsByCommand>,
    set_ops: HashMap<String, OpsByCommand>,
    commands: HashMap<String, HashSet<String>>,
}

impl ProfileIndex {
    fn derive(&mut self, profile: &DeviceProfile) {
        let name = profile.name.clone();
        self.objects.insert(
            name.clone(),
            profile
                .device_resources
                .iter()
                .map(|o| (o.name.clone(), o.clone()))
                .collect(),
        );

        let mut get = OpsByCommand::new();
        let mut set = OpsByCommand::new();
        for resource in &profile.resources {
            get.insert(resource.name.clone(), resource.get.clone());
            set.insert(resource.name.clone(), resource.set.clone());
        }
        self.get_ops.insert(name.clone(), get);
        self.set_ops.insert(name.clone(), set);

        self.commands.insert(
            name,
            profile.commands.iter().map(|c| c.name.clone()).collect(),
        );
    }

    fn forget(&mut self, name: &str) {
        self.objects.remove(name);
        self.get_ops.remove(name);
        self.set_ops.remove(name);
        self.commands.remove(name);
    }

    fn ops(&self, profile: &str, direction: Direction) -> CacheResult<&OpsByCommand> {
        let table = match direction {
            Direction::Get => &self.get_ops,
            Direction::Set => &self.set_ops,
        };
        table
            .get(profile)
            .ok_or_else(|| CacheError::not_found(DeviceProfile::KIND, profile))
    }
}

/// Thread-safe cache of device profiles.
///
/// A profile and all of its derived entries are replaced under one write
/// lock, so readers never see a partially indexed profile.
#[derive(Debug, Default)]
pub struct ProfileCache {
    inner: RwLock<ProfileIndex>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(profiles: impl IntoIterator<Item = DeviceProfile>) -> CacheResult<Self> {
        let mut index = ProfileIndex::default();
        for profile in profiles {
            index.derive(&profile);
            index.profiles.add(profile)?;
        }
        Ok(Self {
            inner: RwLock::new(index),
        })
    }

    pub fn for_name(&self, name: &str) -> Option<DeviceProfile> {
        self.inner.read().profiles.for_name(name).cloned()
    }

    pub fn for_id(&self, id: &str) -> Option<DeviceProfile> {
        self.inner.read().profiles.for_id(id).cloned()
    }

    pub fn all(&self) -> Vec<DeviceProfile> {
        self.inner.read().profiles.all()
    }

    pub fn len(&self) -> usize {
        self.inner.read().profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add(&self, profile: DeviceProfile) -> CacheResult<()> {
        tracing::debug!(profile = %profile.name, "Adding profile to cache");
        let mut index = self.inner.write();
        let derived = profile.clone();
        index.profiles.add(profile)?;
        index.derive(&derived);
        Ok(())
    }

    /// Replace the profile with the same id; returns the previous value
    pub fn update(&self, profile: DeviceProfile) -> CacheResult<DeviceProfile> {
        tracing::debug!(profile = %profile.name, "Updating profile in cache");
        let mut index = self.inner.write();
        let derived = profile.clone();
        let previous = index.profiles.update(profile)?;
        index.forget(&previous.name);
        index.derive(&derived);
        Ok(previous)
    }

    pub fn remove(&self, id: &str) -> CacheResult<DeviceProfile> {
        let mut index = self.inner.write();
        let removed = index.profiles.remove(id)?;
        index.forget(&removed.name);
        Ok(removed)
    }

    pub fn remove_by_name(&self, name: &str) -> CacheResult<DeviceProfile> {
        let mut index = self.inner.write();
        let removed = index.profiles.remove_by_name(name)?;
        index.forget(&removed.name);
        Ok(removed)
    }

    /// Device object `object` of profile `profile`
    pub fn device_object(&self, profile: &str, object: &str) -> Option<DeviceObject> {
        self.inner
            .read()
            .objects
            .get(profile)
            .and_then(|objects| objects.get(object))
            .cloned()
    }

    /// Ordered resource operations bound to `command` in `direction`.
    ///
    /// A command with no operations in `direction` is not found.
    pub fn resource_operations(
        &self,
        profile: &str,
        command: &str,
        direction: Direction,
    ) -> CacheResult<Vec<ResourceOperation>> {
        let index = self.inner.read();
        index
            .ops(profile, direction)?
            .get(command)
            .filter(|ops| !ops.is_empty())
            .cloned()
            .ok_or_else(|| CacheError::not_found("command", command))
    }

    /// First resource operation in `direction` that references `object`,
    /// scanning resources in declaration order.
    ///
    /// When several commands reference the same object only the first
    /// declared one is ever returned; callers holding the operation a value
    /// was produced for should use that instead.
    pub fn resource_operation(
        &self,
        profile: &str,
        object: &str,
        direction: Direction,
    ) -> CacheResult<ResourceOperation> {
        let index = self.inner.read();
        let declared = index
            .profiles
            .for_name(profile)
            .ok_or_else(|| CacheError::not_found(DeviceProfile::KIND, profile))?;
        declared
            .resources
            .iter()
            .flat_map(|resource| match direction {
                Direction::Get => &resource.get,
                Direction::Set => &resource.set,
            })
            .find(|ro| ro.object == object)
            .cloned()
            .ok_or_else(|| CacheError::not_found("resource operation for object", object))
    }

    /// Whether `command` is declared by `profile`; errors only for an unknown profile
    pub fn command_exists(&self, profile: &str, command: &str) -> CacheResult<bool> {
        let index = self.inner.read();
        index
            .commands
            .get(profile)
            .map(|commands| commands.contains(command))
            .ok_or_else(|| CacheError::not_found(DeviceProfile::KIND, profile))
    }
}
