//! Device cache with state updates

use devsvc_core::{AdminState, Device, OperatingState};

use crate::entity::EntityCache;
use crate::error::{CacheError, CacheResult};
use crate::index::CacheEntity;

pub type DeviceCache = EntityCache<Device>;

impl EntityCache<Device> {
    /// Set the admin state of the device with `id`
    pub fn update_admin_state(&self, id: &str, state: AdminState) -> CacheResult<()> {
        let mut index = self.inner.write();
        let name = index
            .name_for_id(id)
            .map(str::to_string)
            .ok_or_else(|| CacheError::not_found(Device::KIND, id))?;
        let device = index
            .get_mut(&name)
            .ok_or_else(|| CacheError::not_found(Device::KIND, name.clone()))?;
        device.admin_state = state;
        tracing::info!(device = %name, ?state, "Admin state updated");
        Ok(())
    }

    /// Set the operating state of the device named `name`.
    ///
    /// Returns the previous state.
    pub fn update_operating_state(
        &self,
        name: &str,
        state: OperatingState,
    ) -> CacheResult<OperatingState> {
        let mut index = self.inner.write();
        let device = index
            .get_mut(name)
            .ok_or_else(|| CacheError::not_found(Device::KIND, name))?;
        let previous = std::mem::replace(&mut device.operating_state, state);
        tracing::info!(device = %name, %state, "Operating state updated");
        Ok(previous)
    }

    /// Devices that are neither locked nor disabled
    pub fn operational(&self) -> Vec<Device> {
        self.inner
            .read()
            .values()
            .filter(|d| d.is_operational())
            .cloned()
            .collect()
    }

    /// Device whose addressable carries `name`
    pub fn for_addressable(&self, name: &str) -> Option<Device> {
        if name.is_empty() {
            return None;
        }
        self.inner
            .read()
            .values()
            .find(|d| d.addressable.name == name)
            .cloned()
    }

    /// Whether any device is bound to the named profile
    pub fn references_profile(&self, profile: &str) -> bool {
        self.inner.read().values().any(|d| d.profile == profile)
    }
}
