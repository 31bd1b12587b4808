//! Runtime knobs consumed by the dispatch core

use std::sync::atomic::{AtomicBool, Ordering};

/// Settings shared by the dispatcher, fan-out and ingestor.
///
/// `data_transform` can be flipped while the service is running.
#[derive(Debug)]
pub struct ServiceSettings {
    /// Maximum resource operations a single command may resolve to
    pub max_cmd_ops: usize,
    /// Maximum devices processed at once by an "all devices" command
    pub max_concurrent_devices: usize,
    /// Whether the driver gets an async-values channel
    pub enable_async_readings: bool,
    /// Capacity of the async-values channel
    pub async_buffer_size: usize,
    data_transform: AtomicBool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_cmd_ops: 128,
            max_concurrent_devices: 64,
            enable_async_readings: true,
            async_buffer_size: 16,
            data_transform: AtomicBool::new(true),
        }
    }
}

impl ServiceSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_cmd_ops(mut self, max: usize) -> Self {
        self.max_cmd_ops = max;
        self
    }

    pub fn with_max_concurrent_devices(mut self, max: usize) -> Self {
        self.max_concurrent_devices = max.max(1);
        self
    }

    pub fn with_async_readings(mut self, enabled: bool, buffer_size: usize) -> Self {
        self.enable_async_readings = enabled;
        self.async_buffer_size = buffer_size.max(1);
        self
    }

    pub fn with_data_transform(self, enabled: bool) -> Self {
        self.data_transform.store(enabled, Ordering::Relaxed);
        self
    }

    pub fn data_transform(&self) -> bool {
        self.data_transform.load(Ordering::Relaxed)
    }

    pub fn set_data_transform(&self, enabled: bool) {
        self.data_transform.store(enabled, Ordering::Relaxed);
    }
}
