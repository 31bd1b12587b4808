//! In-memory protocol driver
//!
//! Keeps one value per (device, object). Unknown values are seeded from the
//! object's default value, or the zero of its type.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn, Span};

use devsvc_conv::parse_param;
use devsvc_core::{
    now_millis, Addressable, AsyncValues, AsyncValuesSender, CommandRequest, CommandValue,
    DeviceObject, DriverError, DriverResult, ProtocolDriver, Scalar, ValueType,
};

type ValueKey = (String, String);

pub struct VirtualDriver {
    values: Mutex<HashMap<ValueKey, Scalar>>,
    async_tx: Mutex<Option<AsyncValuesSender>>,
    span: Mutex<Span>,
}

impl Default for VirtualDriver {
    fn default() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            async_tx: Mutex::new(None),
            span: Mutex::new(Span::none()),
        }
    }
}

impl VirtualDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn initial_value(object: &DeviceObject) -> DriverResult<Scalar> {
        let ty = object.properties.value_type;
        if let Some(text) = object
            .properties
            .default_value
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            return parse_param(object.name.clone(), ty, text.trim(), 0)
                .and_then(|cv| cv.scalar().map_err(Into::into))
                .map_err(|e| DriverError::Protocol(format!("default of {}: {e}", object.name)));
        }
        Ok(match ty {
            ValueType::String => Scalar::String(String::new()),
            ValueType::Bool => Scalar::Bool(false),
            _ => Scalar::from_f64(ty, 0.0)
                .ok_or_else(|| DriverError::Other(format!("no zero value for {ty}")))?,
        })
    }

    /// Push every stored value through the async channel, one batch per device.
    ///
    /// Returns the number of batches sent.
    pub async fn push_stored(&self) -> DriverResult<usize> {
        let tx = self.async_tx.lock().clone();
        let Some(tx) = tx else {
            return Ok(0);
        };

        let mut batches: HashMap<String, Vec<CommandValue>> = HashMap::new();
        {
            let origin = now_millis();
            let values = self.values.lock();
            for ((device, object), scalar) in values.iter() {
                batches
                    .entry(device.clone())
                    .or_default()
                    .push(CommandValue::new(object.clone(), origin, scalar.clone()));
            }
        }

        let count = batches.len();
        for (device_name, command_values) in batches {
            tx.send(AsyncValues {
                device_name,
                command_values,
            })
            .await
            .map_err(|_| DriverError::Other("async channel closed".into()))?;
        }
        Ok(count)
    }
}

#[async_trait]
impl ProtocolDriver for VirtualDriver {
    async fn initialize(&self, log: Span, async_tx: Option<AsyncValuesSender>) -> DriverResult<()> {
        log.in_scope(|| info!(async_readings = async_tx.is_some(), "Virtual driver initialized"));
        *self.span.lock() = log;
        *self.async_tx.lock() = async_tx;
        Ok(())
    }

    async fn handle_read_commands(
        &self,
        addressable: &Addressable,
        requests: &[CommandRequest],
    ) -> DriverResult<Vec<CommandValue>> {
        let origin = now_millis();
        let mut values = self.values.lock();
        let mut result = Vec::with_capacity(requests.len());
        for req in requests {
            let key = (addressable.name.clone(), req.ro.object.clone());
            let scalar = match values.get(&key) {
                Some(v) => v.clone(),
                None => {
                    let v = Self::initial_value(&req.device_object)?;
                    values.insert(key, v.clone());
                    v
                }
            };
            result.push(
                CommandValue::new(req.ro.object.clone(), origin, scalar).with_operation(req.ro.clone()),
            );
        }
        self.span.lock().in_scope(|| {
            debug!(device = %addressable.name, count = result.len(), "Read values")
        });
        Ok(result)
    }

    async fn handle_write_commands(
        &self,
        addressable: &Addressable,
        requests: &[CommandRequest],
        params: &[CommandValue],
    ) -> DriverResult<()> {
        if requests.len() != params.len() {
            return Err(DriverError::Protocol(format!(
                "{} requests but {} values",
                requests.len(),
                params.len()
            )));
        }

        let mut values = self.values.lock();
        for (req, cv) in requests.iter().zip(params) {
            let scalar = cv
                .scalar()
                .map_err(|e| DriverError::Protocol(e.to_string()))?;
            values.insert((addressable.name.clone(), req.ro.object.clone()), scalar);
        }
        self.span.lock().in_scope(|| {
            debug!(device = %addressable.name, count = params.len(), "Stored values")
        });
        Ok(())
    }

    async fn stop(&self, force: bool) -> DriverResult<()> {
        self.span
            .lock()
            .in_scope(|| info!(force, "Virtual driver stopping"));
        *self.async_tx.lock() = None;
        Ok(())
    }

    async fn disconnect_device(&self, addressable: &Addressable) -> DriverResult<()> {
        let mut values = self.values.lock();
        let before = values.len();
        values.retain(|(device, _), _| device != &addressable.name);
        if values.len() == before {
            warn!(device = %addressable.name, "Disconnect for device with no stored values");
        }
        Ok(())
    }
}
