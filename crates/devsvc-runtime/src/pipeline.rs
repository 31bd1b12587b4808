//! Per-value read pipeline shared by command reads and async ingestion:
//! transform, assertion check, mapping, conversion to a reading.

use std::sync::Arc;

use tracing::{error, warn};

use devsvc_cache::EntityCaches;
use devsvc_conv::{check_assertion, map_value, transform_read};
use devsvc_core::{
    now_millis, CommandValue, Device, DeviceObject, MetadataClient, OperatingState, Reading,
    ResourceOperation,
};

use crate::settings::ServiceSettings;

/// Reading produced for one value plus any non-fatal failure it hit
#[derive(Debug)]
pub(crate) struct Processed {
    pub reading: Reading,
    pub failures: Vec<String>,
}

#[derive(Clone)]
pub(crate) struct ValuePipeline {
    caches: Arc<EntityCaches>,
    settings: Arc<ServiceSettings>,
    metadata: Arc<dyn MetadataClient>,
}

impl ValuePipeline {
    pub fn new(
        caches: Arc<EntityCaches>,
        settings: Arc<ServiceSettings>,
        metadata: Arc<dyn MetadataClient>,
    ) -> Self {
        Self {
            caches,
            settings,
            metadata,
        }
    }

    /// Run one driver value through the read pipeline.
    ///
    /// `ro` is used for mapping only when the value carries no operation of
    /// its own. Transform and assertion failures are recorded but never drop
    /// the reading.
    pub fn process(
        &self,
        device: &Device,
        object: &DeviceObject,
        ro: Option<&ResourceOperation>,
        mut cv: CommandValue,
    ) -> Processed {
        let mut failures = Vec::new();

        if self.settings.data_transform() {
            if let Err(e) = transform_read(&mut cv, &object.properties) {
                error!(device = %device.name, object = %object.name, error = %e, "Transform failed");
                failures.push(format!("{}: {}", object.name, e));
            }
        }

        if let Err(e) = check_assertion(&cv, object.properties.assertion()) {
            error!(device = %device.name, object = %object.name, error = %e, "Assertion failed");
            self.disable_device(&device.name);
            failures.push(format!("{}: {}", object.name, e));
        }

        if let Some(mapped) = map_value(&cv, ro) {
            cv = mapped;
        }

        let value = match cv.value_to_string() {
            Ok(v) => v,
            Err(e) => {
                failures.push(format!("{}: {}", object.name, e));
                String::new()
            }
        };

        Processed {
            reading: Reading {
                device: device.name.clone(),
                name: cv.ro,
                value,
                origin: if cv.origin != 0 { cv.origin } else { now_millis() },
            },
            failures,
        }
    }

    /// Mark the device disabled in the cache and tell metadata, without waiting
    fn disable_device(&self, name: &str) {
        if let Err(e) = self
            .caches
            .devices
            .update_operating_state(name, OperatingState::Disabled)
        {
            warn!(device = %name, error = %e, "Could not disable device");
            return;
        }

        let metadata = Arc::clone(&self.metadata);
        let name = name.to_string();
        tokio::spawn(async move {
            if let Err(e) = metadata
                .notify_operating_state(&name, OperatingState::Disabled)
                .await
            {
                warn!(device = %name, error = %e, "Operating state notification failed");
            }
        });
    }
}
