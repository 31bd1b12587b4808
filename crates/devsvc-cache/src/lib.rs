//! devsvc-cache - In-memory entity caches for the device service
//!
//! Three caches share one contract: lookup by name or id, snapshot of all
//! entries, and add / update / remove that keep every index consistent.
//! The profile cache additionally keeps derived lookup tables for device
//! objects, resource operations and declared commands.
//!
//! # Example
//!
//! ```
//! use devsvc_cache::{EntityCaches, ProvisionSnapshot};
//! use devsvc_core::{Device, DeviceProfile};
//!
//! let snapshot = ProvisionSnapshot {
//!     profiles: vec![DeviceProfile::new("p1", "hvac")],
//!     devices: vec![Device::new("d1", "thermostat", "hvac")],
//!     value_descriptors: vec![],
//! };
//! let caches = EntityCaches::from_snapshot(snapshot).unwrap();
//! assert!(caches.devices.for_name("thermostat").is_some());
//! ```

mod caches;
mod descriptor;
mod device;
mod entity;
mod error;
mod index;
mod profile;

pub use caches::{EntityCaches, ProvisionSnapshot};
pub use descriptor::ValueDescriptorCache;
pub use device::DeviceCache;
pub use entity::EntityCache;
pub use error::{CacheError, CacheResult};
pub use index::CacheEntity;
pub use profile::ProfileCache;
