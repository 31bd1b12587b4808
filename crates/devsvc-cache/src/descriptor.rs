//! Value descriptor cache

use devsvc_core::{DeviceProfile, ValueDescriptor};

use crate::entity::EntityCache;

pub type ValueDescriptorCache = EntityCache<ValueDescriptor>;

impl EntityCache<ValueDescriptor> {
    /// Register a descriptor for every device object of `profile` that has none.
    ///
    /// `next_id` supplies ids for new descriptors. Returns the names added.
    pub fn register_profile_objects(
        &self,
        profile: &DeviceProfile,
        mut next_id: impl FnMut() -> String,
    ) -> Vec<String> {
        let mut index = self.inner.write();
        let mut added = Vec::new();
        for object in &profile.device_resources {
            if index.for_name(&object.name).is_some() {
                continue;
            }
            let descriptor = ValueDescriptor::from_device_object(next_id(), object);
            match index.add(descriptor) {
                Ok(()) => added.push(object.name.clone()),
                Err(err) => {
                    tracing::warn!(object = %object.name, error = %err, "Skipping value descriptor")
                }
            }
        }
        if !added.is_empty() {
            tracing::debug!(profile = %profile.name, count = added.len(), "Registered value descriptors");
        }
        added
    }
}
