//! Application state for the REST surface

use std::sync::Arc;

use devsvc_runtime::DeviceService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<DeviceService>,
}

impl AppState {
    pub fn new(service: Arc<DeviceService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &DeviceService {
        &self.service
    }
}
