//! The cache bundle and its provisioning snapshot

use serde::{Deserialize, Serialize};

use devsvc_core::{Device, DeviceProfile, ValueDescriptor};

use crate::descriptor::ValueDescriptorCache;
use crate::device::DeviceCache;
use crate::error::{CacheError, CacheResult};
use crate::profile::ProfileCache;

/// Everything needed to populate the caches at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionSnapshot {
    #[serde(default)]
    pub profiles: Vec<DeviceProfile>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub value_descriptors: Vec<ValueDescriptor>,
}

/// The device, profile and value descriptor caches owned by one service
#[derive(Debug, Default)]
pub struct EntityCaches {
    pub devices: DeviceCache,
    pub profiles: ProfileCache,
    pub value_descriptors: ValueDescriptorCache,
}

impl EntityCaches {
    /// Build all three caches from a snapshot.
    ///
    /// Rejects duplicate names or ids, profiles whose operations reference
    /// undeclared device objects, and devices bound to unknown profiles.
    pub fn from_snapshot(snapshot: ProvisionSnapshot) -> CacheResult<Self> {
        for profile in &snapshot.profiles {
            profile.validate().map_err(|e| CacheError::Invalid {
                kind: "device profile",
                reason: e.to_string(),
            })?;
        }
        let profiles = ProfileCache::from_entities(snapshot.profiles)?;

        for device in &snapshot.devices {
            if profiles.for_name(&device.profile).is_none() {
                return Err(CacheError::Invalid {
                    kind: "device",
                    reason: format!(
                        "device {} references unknown profile {}",
                        device.name, device.profile
                    ),
                });
            }
        }
        let devices = DeviceCache::from_entities(snapshot.devices)?;
        let value_descriptors = ValueDescriptorCache::from_entities(snapshot.value_descriptors)?;

        tracing::info!(
            devices = devices.len(),
            profiles = profiles.len(),
            value_descriptors = value_descriptors.len(),
            "Caches initialized"
        );

        Ok(Self {
            devices,
            profiles,
            value_descriptors,
        })
    }
}
