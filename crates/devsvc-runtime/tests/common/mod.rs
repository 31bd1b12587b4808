//! Shared fixtures: a scripted driver, recording collaborators and an HVAC profile

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use devsvc_cache::{EntityCaches, ProvisionSnapshot};
use devsvc_core::{
    Addressable, AsyncValuesSender, CollaboratorError, Command, CommandRequest, CommandValue,
    Device, DeviceObject, DeviceProfile, DriverError, DriverResult, Event, EventSink,
    MetadataClient, OperatingState, ProfileResource, PropertyValue, ProtocolDriver,
    ResourceOperation, Scalar, ValueDescriptor, ValueType,
};
use devsvc_runtime::{DeviceService, ServiceSettings};

// =============================================================================
// Mock Driver
// =============================================================================

/// One recorded write call
#[derive(Debug, Clone)]
pub struct WriteCall {
    pub device: String,
    pub requests: Vec<CommandRequest>,
    pub values: Vec<CommandValue>,
}

/// Driver that answers reads from a per-object value table
#[derive(Default)]
pub struct MockDriver {
    /// object name → raw value returned on read
    pub values: Mutex<HashMap<String, Scalar>>,
    /// addressable names whose calls fail
    pub failing: Mutex<HashSet<String>>,
    /// extra object names appended to every read result
    pub extra_objects: Mutex<Vec<String>>,
    pub read_calls: AtomicUsize,
    /// artificial latency per read, in milliseconds
    pub read_delay_ms: AtomicU64,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub writes: Mutex<Vec<WriteCall>>,
    pub disconnected: Mutex<Vec<String>>,
    pub stop_calls: AtomicUsize,
    /// return read values without their resource operation
    pub bare_values: AtomicBool,
    pub async_tx: Mutex<Option<AsyncValuesSender>>,
}

impl MockDriver {
    pub fn new() -> Arc<Self> {
        let driver = Self::default();
        {
            let mut values = driver.values.lock();
            values.insert("temperature".into(), Scalar::Int32(20));
            values.insert("status".into(), Scalar::Int32(1));
            values.insert("switch".into(), Scalar::Uint8(1));
            values.insert("setpoint".into(), Scalar::Float32(10.0));
            values.insert("label".into(), Scalar::String("lobby".into()));
        }
        Arc::new(driver)
    }

    pub fn set(&self, object: &str, value: Scalar) {
        self.values.lock().insert(object.to_string(), value);
    }

    pub fn fail_for(&self, device: &str) {
        self.failing.lock().insert(device.to_string());
    }

    pub fn reads(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn sender(&self) -> AsyncValuesSender {
        self.async_tx
            .lock()
            .clone()
            .expect("driver initialized with async channel")
    }
}

#[async_trait]
impl ProtocolDriver for MockDriver {
    async fn initialize(
        &self,
        _log: tracing::Span,
        async_tx: Option<AsyncValuesSender>,
    ) -> DriverResult<()> {
        *self.async_tx.lock() = async_tx;
        Ok(())
    }

    async fn handle_read_commands(
        &self,
        addressable: &Addressable,
        requests: &[CommandRequest],
    ) -> DriverResult<Vec<CommandValue>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().contains(&addressable.name) {
            return Err(DriverError::Connection(format!(
                "{} unreachable",
                addressable.name
            )));
        }

        let values = self.values.lock();
        let mut result = Vec::with_capacity(requests.len());
        for req in requests {
            let scalar = values
                .get(&req.ro.object)
                .cloned()
                .ok_or_else(|| DriverError::Protocol(format!("no value for {}", req.ro.object)))?;
            let cv = CommandValue::new(req.ro.object.clone(), 0, scalar);
            if self.bare_values.load(Ordering::SeqCst) {
                result.push(cv);
            } else {
                result.push(cv.with_operation(req.ro.clone()));
            }
        }
        for extra in self.extra_objects.lock().iter() {
            result.push(CommandValue::new(extra.clone(), 0, Scalar::Int32(0)));
        }
        Ok(result)
    }

    async fn handle_write_commands(
        &self,
        addressable: &Addressable,
        requests: &[CommandRequest],
        params: &[CommandValue],
    ) -> DriverResult<()> {
        if self.failing.lock().contains(&addressable.name) {
            return Err(DriverError::Connection(format!(
                "{} unreachable",
                addressable.name
            )));
        }
        self.writes.lock().push(WriteCall {
            device: addressable.name.clone(),
            requests: requests.to_vec(),
            values: params.to_vec(),
        });
        Ok(())
    }

    async fn stop(&self, _force: bool) -> DriverResult<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        *self.async_tx.lock() = None;
        Ok(())
    }

    async fn disconnect_device(&self, addressable: &Addressable) -> DriverResult<()> {
        self.disconnected.lock().push(addressable.name.clone());
        Ok(())
    }
}

// =============================================================================
// Recording collaborators
// =============================================================================

pub struct ChannelSink(pub mpsc::UnboundedSender<Event>);

#[async_trait]
impl EventSink for ChannelSink {
    async fn submit_event(&self, event: &Event) -> Result<(), CollaboratorError> {
        self.0
            .send(event.clone())
            .map_err(|e| CollaboratorError::Unavailable(e.to_string()))
    }
}

pub struct ChannelMetadata(pub mpsc::UnboundedSender<(String, OperatingState)>);

#[async_trait]
impl MetadataClient for ChannelMetadata {
    async fn notify_operating_state(
        &self,
        device_name: &str,
        state: OperatingState,
    ) -> Result<(), CollaboratorError> {
        self.0
            .send((device_name.to_string(), state))
            .map_err(|e| CollaboratorError::Unavailable(e.to_string()))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn object(name: &str, ty: ValueType, tweak: impl FnOnce(&mut PropertyValue)) -> DeviceObject {
    let mut pv = PropertyValue::new(ty);
    tweak(&mut pv);
    DeviceObject::new(name, pv)
}

fn switch_op(direction: &str) -> ResourceOperation {
    ResourceOperation::new(direction, "switch").with_mappings([("1", "ON"), ("0", "OFF")])
}

/// Second reading of `switch`, mapped 1/0 to YES/NO
pub fn yes_no_op() -> ResourceOperation {
    ResourceOperation::new("get", "switch").with_mappings([("1", "YES"), ("0", "NO")])
}

/// Profile used across runtime tests.
///
/// - `temperature` Int32, scale 2, offset 5
/// - `status` Int32, assertion "1"
/// - `switch` Uint8, mapped 1/0 to ON/OFF
/// - `setpoint` Float32, scale 0.5
/// - `label` String
///
/// `switches` reads `switch` twice, once per mapping table, and has no set
/// operations.
pub fn hvac_profile() -> DeviceProfile {
    let mut p = DeviceProfile::new("p-hvac", "hvac");
    p.device_resources = vec![
        object("temperature", ValueType::Int32, |pv| {
            pv.scale = Some("2".into());
            pv.offset = Some("5".into());
        }),
        object("status", ValueType::Int32, |pv| pv.assertion = Some("1".into())),
        object("switch", ValueType::Uint8, |_| {}),
        object("setpoint", ValueType::Float32, |pv| pv.scale = Some("0.5".into())),
        object("label", ValueType::String, |_| {}),
    ];

    let get = |o: &str| ResourceOperation::new("get", o);
    let set = |o: &str| ResourceOperation::new("set", o);
    p.resources = vec![
        ProfileResource {
            name: "temperature".into(),
            get: vec![get("temperature")],
            set: vec![set("temperature")],
        },
        ProfileResource {
            name: "status".into(),
            get: vec![get("status")],
            set: vec![],
        },
        ProfileResource {
            name: "switch".into(),
            get: vec![switch_op("get")],
            set: vec![switch_op("set")],
        },
        ProfileResource {
            name: "climate".into(),
            get: vec![get("temperature"), get("status"), switch_op("get"), get("label")],
            set: vec![set("temperature"), set("setpoint"), set("label")],
        },
        ProfileResource {
            name: "switches".into(),
            get: vec![switch_op("get"), yes_no_op()],
            set: vec![],
        },
        ProfileResource {
            name: "undeclared".into(),
            get: vec![get("temperature")],
            set: vec![],
        },
    ];
    p.commands = ["temperature", "status", "switch", "climate", "switches"]
        .into_iter()
        .map(|name| Command { name: name.into() })
        .collect();
    p
}

pub fn device(id: &str, name: &str) -> Device {
    Device::new(id, name, "hvac")
}

pub fn snapshot(devices: Vec<Device>) -> ProvisionSnapshot {
    let profile = hvac_profile();
    let value_descriptors = profile
        .device_resources
        .iter()
        .enumerate()
        .map(|(i, o)| ValueDescriptor::from_device_object(format!("vd-{i}"), o))
        .collect();
    ProvisionSnapshot {
        profiles: vec![profile],
        devices,
        value_descriptors,
    }
}

/// A service under test together with its collaborators' outputs
pub struct Harness {
    pub service: Arc<DeviceService>,
    pub driver: Arc<MockDriver>,
    pub events: mpsc::UnboundedReceiver<Event>,
    pub notifications: mpsc::UnboundedReceiver<(String, OperatingState)>,
}

impl Harness {
    pub async fn new(devices: Vec<Device>, settings: ServiceSettings) -> Self {
        let caches = EntityCaches::from_snapshot(snapshot(devices)).expect("valid snapshot");
        let driver = MockDriver::new();
        let (event_tx, events) = mpsc::unbounded_channel();
        let (meta_tx, notifications) = mpsc::unbounded_channel();

        let service = Arc::new(DeviceService::new(
            "test-service",
            caches,
            driver.clone(),
            Arc::new(ChannelSink(event_tx)),
            Arc::new(ChannelMetadata(meta_tx)),
            settings,
        ));
        service.start().await.expect("service starts");

        Self {
            service,
            driver,
            events,
            notifications,
        }
    }

    pub async fn with_thermostat() -> Self {
        Self::new(vec![device("d1", "thermostat")], ServiceSettings::default()).await
    }

    pub async fn next_event(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("event within timeout")
            .expect("sink channel open")
    }

    pub async fn next_notification(&mut self) -> (String, OperatingState) {
        tokio::time::timeout(Duration::from_secs(2), self.notifications.recv())
            .await
            .expect("notification within timeout")
            .expect("metadata channel open")
    }

    /// Assert nothing arrives on the event channel for a short while
    pub async fn assert_no_event(&mut self) {
        let got = tokio::time::timeout(Duration::from_millis(100), self.events.recv()).await;
        assert!(got.is_err(), "unexpected event: {got:?}");
    }
}
