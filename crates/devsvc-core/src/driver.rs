//! ProtocolDriver trait - the pluggable protocol-specific layer

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{Addressable, CommandValue, DeviceObject, ResourceOperation};

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors a driver can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Device could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Device answered with an error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Device did not answer in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Operation not supported by this driver
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Anything else
    #[error("Driver error: {0}")]
    Other(String),
}

/// One resource operation handed to the driver, with its resolved device object
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub ro: ResourceOperation,
    pub device_object: DeviceObject,
}

/// Unsolicited values pushed by a driver for one device
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncValues {
    /// Device name, or the addressable name the driver was handed
    pub device_name: String,
    pub command_values: Vec<CommandValue>,
}

/// Producer half of the bounded async-values channel
pub type AsyncValuesSender = mpsc::Sender<AsyncValues>;

/// Protocol-specific driver plugged into the device service.
///
/// The service calls read and write handlers concurrently for different
/// devices; implementations must be safe to share.
#[async_trait]
pub trait ProtocolDriver: Send + Sync {
    /// Called once at startup.
    ///
    /// `async_tx` is present when asynchronous readings are enabled; the
    /// driver may keep it and push [`AsyncValues`] at any time. Sends block
    /// when the channel is full.
    async fn initialize(
        &self,
        log: tracing::Span,
        async_tx: Option<AsyncValuesSender>,
    ) -> DriverResult<()>;

    /// Read every requested object and return one value per request
    async fn handle_read_commands(
        &self,
        addressable: &Addressable,
        requests: &[CommandRequest],
    ) -> DriverResult<Vec<CommandValue>>;

    /// Write `params[i]` to the object of `requests[i]`
    async fn handle_write_commands(
        &self,
        addressable: &Addressable,
        requests: &[CommandRequest],
        params: &[CommandValue],
    ) -> DriverResult<()>;

    /// Release driver resources; `force` skips any graceful drain
    async fn stop(&self, force: bool) -> DriverResult<()>;

    /// Drop any connection held for a device that is being removed
    async fn disconnect_device(&self, _addressable: &Addressable) -> DriverResult<()> {
        Ok(())
    }
}
