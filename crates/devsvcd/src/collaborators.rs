//! Log-backed event sink and metadata client

use async_trait::async_trait;
use tracing::info;

use devsvc_core::{CollaboratorError, Event, EventSink, MetadataClient, OperatingState};

/// Writes each event as a JSON line to the log
pub struct LoggingEventSink;

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn submit_event(&self, event: &Event) -> Result<(), CollaboratorError> {
        let payload =
            serde_json::to_string(event).map_err(|e| CollaboratorError::Rejected(e.to_string()))?;
        info!(device = %event.device, readings = event.readings.len(), %payload, "Event");
        Ok(())
    }
}

/// Records operating state changes in the log
pub struct LoggingMetadataClient;

#[async_trait]
impl MetadataClient for LoggingMetadataClient {
    async fn notify_operating_state(
        &self,
        device_name: &str,
        state: OperatingState,
    ) -> Result<(), CollaboratorError> {
        info!(device = %device_name, %state, "Operating state changed");
        Ok(())
    }
}
