//! Single-device command dispatch

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use devsvc_cache::EntityCaches;
use devsvc_conv::{map_value, parse_param, transform_write};
use devsvc_core::{
    now_millis, CommandRequest, CommandValue, Device, Direction, Event, EventSink,
    ProtocolDriver, ResourceOperation, ServiceError, ServiceResult,
};

use crate::pipeline::ValuePipeline;
use crate::settings::ServiceSettings;
use crate::sink::publish;

/// Result of a read command.
///
/// `failure` is set when some values failed transformation or assertion;
/// the event still carries a reading for every value.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub event: Event,
    pub failure: Option<ServiceError>,
}

/// Validates and executes read and write commands against one device
#[derive(Clone)]
pub struct CommandDispatcher {
    caches: Arc<EntityCaches>,
    driver: Arc<dyn ProtocolDriver>,
    sink: Arc<dyn EventSink>,
    settings: Arc<ServiceSettings>,
    pipeline: ValuePipeline,
}

impl CommandDispatcher {
    pub(crate) fn new(
        caches: Arc<EntityCaches>,
        driver: Arc<dyn ProtocolDriver>,
        sink: Arc<dyn EventSink>,
        settings: Arc<ServiceSettings>,
        pipeline: ValuePipeline,
    ) -> Self {
        Self {
            caches,
            driver,
            sink,
            settings,
            pipeline,
        }
    }

    /// Run `command` on the device with `device_id`.
    ///
    /// Reads return `Some(outcome)`; writes return `None`.
    pub async fn dispatch(
        &self,
        device_id: &str,
        command: &str,
        direction: Direction,
        body: &str,
    ) -> ServiceResult<Option<CommandOutcome>> {
        let device = self.caches.devices.for_id(device_id).ok_or_else(|| {
            let msg = format!("Device: {device_id} not found; {direction}");
            error!("{msg}");
            ServiceError::NotFound(msg)
        })?;

        if device.is_locked() {
            let msg = format!("{} is locked; {direction}", device.name);
            error!("{msg}");
            return Err(ServiceError::Locked(msg));
        }

        self.execute(&device, command, direction, body).await
    }

    /// Run `command` on an already resolved, unlocked device
    pub(crate) async fn execute(
        &self,
        device: &Device,
        command: &str,
        direction: Direction,
        body: &str,
    ) -> ServiceResult<Option<CommandOutcome>> {
        let exists = self
            .caches
            .profiles
            .command_exists(&device.profile, command)
            .map_err(|e| {
                let msg = format!(
                    "internal error; Device: {} searching {command} in cache failed: {e}",
                    device.name
                );
                error!("{msg}");
                ServiceError::ServerError(msg)
            })?;
        if !exists {
            let msg = format!("{command} for Device: {} not found; {direction}", device.name);
            error!("{msg}");
            return Err(ServiceError::NotFound(msg));
        }

        match direction {
            Direction::Get => self.read(device, command).await.map(Some),
            Direction::Set => self.write(device, command, body).await.map(|()| None),
        }
    }

    fn resource_operations(
        &self,
        device: &Device,
        command: &str,
        direction: Direction,
    ) -> ServiceResult<Vec<ResourceOperation>> {
        let ops = self
            .caches
            .profiles
            .resource_operations(&device.profile, command, direction)
            .map_err(|e| {
                error!(device = %device.name, command, error = %e, "No resource operations");
                ServiceError::NotFound(e.to_string())
            })?;

        if ops.len() > self.settings.max_cmd_ops {
            let msg = format!(
                "MaxCmdOps ({}) exceeded for dev: {} cmd: {command} method: {direction}",
                self.settings.max_cmd_ops, device.name
            );
            error!("{msg}");
            return Err(ServiceError::ServerError(msg));
        }
        Ok(ops)
    }

    fn request_for(&self, device: &Device, ro: ResourceOperation) -> ServiceResult<CommandRequest> {
        let device_object = self
            .caches
            .profiles
            .device_object(&device.profile, &ro.object)
            .ok_or_else(|| {
                let msg = format!("no devobject: {} for dev: {}", ro.object, device.name);
                error!("{msg}");
                ServiceError::ServerError(msg)
            })?;
        Ok(CommandRequest { ro, device_object })
    }

    #[instrument(skip(self, device), fields(device = %device.name))]
    async fn read(&self, device: &Device, command: &str) -> ServiceResult<CommandOutcome> {
        let ops = self.resource_operations(device, command, Direction::Get)?;
        let requests = ops
            .into_iter()
            .map(|ro| self.request_for(device, ro))
            .collect::<ServiceResult<Vec<_>>>()?;

        let results = self
            .driver
            .handle_read_commands(&device.addressable, &requests)
            .await
            .map_err(|e| {
                ServiceError::ServerError(format!(
                    "HandleReadCommands error for Device: {} cmd: {command}, {e}",
                    device.name
                ))
            })?;

        let mut readings = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (i, cv) in results.into_iter().enumerate() {
            let object = self
                .caches
                .profiles
                .device_object(&device.profile, &cv.ro)
                .ok_or_else(|| {
                    let msg = format!(
                        "no devobject: {} for dev: {} in command result",
                        cv.ro, device.name
                    );
                    error!("{msg}");
                    ServiceError::ServerError(msg)
                })?;
            // values the driver left bare are matched to their request by position
            let ro = requests
                .get(i)
                .filter(|r| r.ro.object == cv.ro)
                .or_else(|| requests.iter().find(|r| r.ro.object == cv.ro))
                .map(|r| &r.ro);

            let processed = self.pipeline.process(device, &object, ro, cv);
            debug!(reading = ?processed.reading, "Reading produced");
            readings.push(processed.reading);
            failures.extend(processed.failures);
        }

        let event = Event::new(device.name.clone(), readings);
        publish(&self.sink, event.clone());

        let failure = if failures.is_empty() {
            None
        } else {
            let msg = format!(
                "Transform failed for dev: {} cmd: {command} method: get; {}",
                device.name,
                summarize_failures(&failures)
            );
            error!("{msg}");
            Some(ServiceError::TransformFailure(msg))
        };

        Ok(CommandOutcome { event, failure })
    }

    #[instrument(skip(self, device, body), fields(device = %device.name))]
    async fn write(&self, device: &Device, command: &str, body: &str) -> ServiceResult<()> {
        let ops = self.resource_operations(device, command, Direction::Set)?;
        let params = self.parse_write_params(&ops, body)?;

        let mut requests = Vec::with_capacity(params.len());
        let mut values = Vec::with_capacity(params.len());
        for (ro, cv) in params {
            let request = self.request_for(device, ro)?;
            let mut cv = cv.with_operation(request.ro.clone());

            if self.settings.data_transform() {
                transform_write(&mut cv, &request.device_object.properties).map_err(|e| {
                    let msg = format!("CommandValue ({cv}) transform failed: {e}");
                    error!("{msg}");
                    ServiceError::ServerError(msg)
                })?;
            }
            if let Some(mapped) = map_value(&cv, None) {
                cv = mapped;
            }

            requests.push(request);
            values.push(cv);
        }

        self.driver
            .handle_write_commands(&device.addressable, &requests, &values)
            .await
            .map_err(|e| {
                ServiceError::ServerError(format!(
                    "HandleWriteCommands error for Device: {} cmd: {command}, {e}",
                    device.name
                ))
            })?;
        info!(command, values = values.len(), "Write command executed");
        Ok(())
    }

    /// Parse `[{"param": "value"}, ...]` into typed values paired with their operation.
    ///
    /// Keys that match no operation's parameter are skipped.
    fn parse_write_params(
        &self,
        ops: &[ResourceOperation],
        body: &str,
    ) -> ServiceResult<Vec<(ResourceOperation, CommandValue)>> {
        let param_maps: Vec<BTreeMap<String, String>> =
            serde_json::from_str(body).map_err(|e| {
                let msg = format!("Put parameters parsing failed: {e}");
                error!("{msg}");
                ServiceError::BadRequest(msg)
            })?;

        let by_param: HashMap<&str, &ResourceOperation> =
            ops.iter().map(|ro| (ro.parameter_name(), ro)).collect();

        let origin = now_millis();
        let mut result = Vec::with_capacity(param_maps.len());
        for (key, text) in param_maps.into_iter().flatten() {
            let Some(ro) = by_param.get(key.as_str()) else {
                warn!(parameter = %key, "No resource operation matches parameter");
                continue;
            };

            let descriptor = self
                .caches
                .value_descriptors
                .for_name(&ro.object)
                .ok_or_else(|| {
                    let msg = format!("The parameter {key} cannot find the matched Value Descriptor");
                    error!("{msg}");
                    ServiceError::BadRequest(msg)
                })?;

            let cv = parse_param(ro.object.clone(), descriptor.value_type, &text, origin)
                .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
            result.push(((*ro).clone(), cv));
        }
        Ok(result)
    }
}

/// First failure in full, the rest only counted; each one is logged where it occurs
fn summarize_failures(failures: &[String]) -> String {
    match failures {
        [] => String::new(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}
