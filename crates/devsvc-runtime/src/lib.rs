//! devsvc-runtime - The device service dispatch core
//!
//! - [`CommandDispatcher`]: validates a command against one device, batches
//!   its resource operations into a single driver call, and turns the
//!   returned values into an [`Event`](devsvc_core::Event)
//! - [`FanoutExecutor`]: runs a command on every operational device with a
//!   bounded number of devices in flight, reporting success if any device
//!   succeeded
//! - [`AsyncIngestor`]: consumes values pushed by the driver through a
//!   bounded channel until the service stops
//! - [`DeviceService`]: owns all of the above plus the caches and exposes
//!   the command surface and lifecycle callbacks
//!
//! Produced events are handed to the [`EventSink`](devsvc_core::EventSink)
//! on a detached task; dispatch never waits for the sink.

mod dispatcher;
mod fanout;
mod ingest;
mod pipeline;
mod service;
mod settings;
mod sink;

pub use dispatcher::{CommandDispatcher, CommandOutcome};
pub use fanout::FanoutExecutor;
pub use ingest::AsyncIngestor;
pub use service::DeviceService;
pub use settings::ServiceSettings;
pub use sink::RetryingEventSink;
