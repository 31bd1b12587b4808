//! Downstream collaborators: event publication and metadata updates

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Event, OperatingState};

/// Failure talking to a downstream collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Destination for produced events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn submit_event(&self, event: &Event) -> Result<(), CollaboratorError>;
}

/// Receives device operating-state changes
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn notify_operating_state(
        &self,
        device_name: &str,
        state: OperatingState,
    ) -> Result<(), CollaboratorError>;
}
