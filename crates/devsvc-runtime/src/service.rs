//! DeviceService - owns the caches, driver and collaborators and exposes the
//! command surface and lifecycle callbacks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn};

use devsvc_cache::EntityCaches;
use devsvc_core::{
    Device, DeviceProfile, Direction, Event, EventSink, MetadataClient, ProtocolDriver,
    ServiceError, ServiceResult,
};

use crate::dispatcher::{CommandDispatcher, CommandOutcome};
use crate::fanout::FanoutExecutor;
use crate::ingest::AsyncIngestor;
use crate::pipeline::ValuePipeline;
use crate::settings::ServiceSettings;

/// The device service runtime.
///
/// Construct it once the caches are provisioned, call [`start`](Self::start)
/// to initialize the driver, and [`stop`](Self::stop) on shutdown.
pub struct DeviceService {
    name: String,
    caches: Arc<EntityCaches>,
    driver: Arc<dyn ProtocolDriver>,
    sink: Arc<dyn EventSink>,
    settings: Arc<ServiceSettings>,
    pipeline: ValuePipeline,
    dispatcher: CommandDispatcher,
    fanout: FanoutExecutor,
    stop_tx: watch::Sender<bool>,
    ingestor: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
    /// Serializes lifecycle callbacks so check-then-mutate sequences are atomic
    lifecycle: Mutex<()>,
}

impl DeviceService {
    pub fn new(
        name: impl Into<String>,
        caches: EntityCaches,
        driver: Arc<dyn ProtocolDriver>,
        sink: Arc<dyn EventSink>,
        metadata: Arc<dyn MetadataClient>,
        settings: ServiceSettings,
    ) -> Self {
        let caches = Arc::new(caches);
        let settings = Arc::new(settings);
        let pipeline = ValuePipeline::new(Arc::clone(&caches), Arc::clone(&settings), metadata);
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&caches),
            Arc::clone(&driver),
            Arc::clone(&sink),
            Arc::clone(&settings),
            pipeline.clone(),
        );
        let fanout = FanoutExecutor::new(
            Arc::clone(&caches),
            dispatcher.clone(),
            settings.max_concurrent_devices,
        );
        let (stop_tx, _) = watch::channel(false);

        Self {
            name: name.into(),
            caches,
            driver,
            sink,
            settings,
            pipeline,
            dispatcher,
            fanout,
            stop_tx,
            ingestor: Mutex::new(None),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn caches(&self) -> &EntityCaches {
        &self.caches
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Start the async ingestor (when enabled) and initialize the driver
    pub async fn start(&self) -> ServiceResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::ServerError(format!(
                "service {} already started",
                self.name
            )));
        }

        let async_tx = if self.settings.enable_async_readings {
            let (tx, rx) = mpsc::channel(self.settings.async_buffer_size.max(1));
            let ingestor = AsyncIngestor::new(
                Arc::clone(&self.caches),
                self.pipeline.clone(),
                Arc::clone(&self.sink),
                rx,
                self.stop_tx.subscribe(),
            );
            *self.ingestor.lock() = Some(tokio::spawn(ingestor.run()));
            Some(tx)
        } else {
            None
        };

        let span = info_span!("driver", service = %self.name);
        self.driver
            .initialize(span, async_tx)
            .await
            .map_err(|e| ServiceError::ServerError(format!("Driver.Initialize failure: {e}")))?;

        info!(
            service = %self.name,
            devices = self.caches.devices.len(),
            profiles = self.caches.profiles.len(),
            async_readings = self.settings.enable_async_readings,
            "Device service started"
        );
        Ok(())
    }

    /// Run a command on one device
    pub async fn dispatch(
        &self,
        device_id: &str,
        command: &str,
        direction: Direction,
        body: &str,
    ) -> ServiceResult<Option<CommandOutcome>> {
        self.dispatcher
            .dispatch(device_id, command, direction, body)
            .await
    }

    /// Run a command on every operational device
    pub async fn dispatch_all(
        &self,
        command: &str,
        direction: Direction,
        body: &str,
    ) -> ServiceResult<Vec<Event>> {
        self.fanout.run(command, direction, body).await
    }

    pub fn set_data_transform(&self, enabled: bool) {
        info!(enabled, "Data transform toggled");
        self.settings.set_data_transform(enabled);
    }

    // =========================================================================
    // Lifecycle callbacks
    // =========================================================================

    pub fn add_device(&self, mut device: Device) -> ServiceResult<Device> {
        let _guard = self.lifecycle.lock();
        self.require_profile(&device)?;
        if device.id.is_empty() {
            device.id = uuid::Uuid::new_v4().to_string();
        }
        if device.addressable.name.is_empty() {
            device.addressable.name = device.name.clone();
        }
        self.caches.devices.add(device.clone())?;
        info!(device = %device.name, "Device added");
        Ok(device)
    }

    pub fn update_device(&self, device: Device) -> ServiceResult<()> {
        let _guard = self.lifecycle.lock();
        self.require_profile(&device)?;
        self.caches.devices.update(device)?;
        Ok(())
    }

    /// Remove a device and ask the driver to drop its connection
    pub async fn remove_device(&self, id: &str) -> ServiceResult<Device> {
        let removed = {
            let _guard = self.lifecycle.lock();
            self.caches.devices.remove(id)?
        };
        if let Err(e) = self.driver.disconnect_device(&removed.addressable).await {
            warn!(device = %removed.name, error = %e, "Driver failed to disconnect device");
        }
        info!(device = %removed.name, "Device removed");
        Ok(removed)
    }

    pub fn add_profile(&self, mut profile: DeviceProfile) -> ServiceResult<DeviceProfile> {
        let _guard = self.lifecycle.lock();
        profile
            .validate()
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        if profile.id.is_empty() {
            profile.id = uuid::Uuid::new_v4().to_string();
        }
        self.caches.profiles.add(profile.clone())?;
        self.register_value_descriptors(&profile);
        info!(profile = %profile.name, "Profile added");
        Ok(profile)
    }

    /// Replace a profile; renaming is refused while devices still use the old name
    pub fn update_profile(&self, profile: DeviceProfile) -> ServiceResult<()> {
        let _guard = self.lifecycle.lock();
        profile
            .validate()
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        let current = self.caches.profiles.for_id(&profile.id).ok_or_else(|| {
            ServiceError::NotFound(format!("device profile {} does not exist", profile.id))
        })?;
        if current.name != profile.name && self.caches.devices.references_profile(&current.name) {
            return Err(ServiceError::BadRequest(format!(
                "device profile {} is in use and cannot be renamed",
                current.name
            )));
        }
        self.caches.profiles.update(profile.clone())?;
        self.register_value_descriptors(&profile);
        Ok(())
    }

    /// Remove a profile that no device references
    pub fn remove_profile(&self, id: &str) -> ServiceResult<DeviceProfile> {
        let _guard = self.lifecycle.lock();
        let profile = self.caches.profiles.for_id(id).ok_or_else(|| {
            ServiceError::NotFound(format!("device profile {id} does not exist"))
        })?;
        if self.caches.devices.references_profile(&profile.name) {
            return Err(ServiceError::BadRequest(format!(
                "device profile {} is in use",
                profile.name
            )));
        }
        Ok(self.caches.profiles.remove(id)?)
    }

    fn require_profile(&self, device: &Device) -> ServiceResult<()> {
        if self.caches.profiles.for_name(&device.profile).is_none() {
            return Err(ServiceError::BadRequest(format!(
                "device {} references unknown profile {}",
                device.name, device.profile
            )));
        }
        Ok(())
    }

    fn register_value_descriptors(&self, profile: &DeviceProfile) {
        self.caches
            .value_descriptors
            .register_profile_objects(profile, || uuid::Uuid::new_v4().to_string());
    }

    /// Raise the stop flag, stop the driver and wait for the ingestor.
    ///
    /// Calling it more than once is a no-op.
    pub async fn stop(&self, force: bool) -> ServiceResult<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(service = %self.name, force, "Stopping device service");

        self.stop_tx.send_replace(true);
        let driver_result = self.driver.stop(force).await;

        let handle = self.ingestor.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Async ingestor ended abnormally");
            }
        }

        driver_result.map_err(|e| ServiceError::ServerError(format!("Driver.Stop failure: {e}")))
    }
}
