//! devsvc-core - Core types and traits for the device service
//!
//! This crate defines the data model shared by every other crate in the
//! workspace (devices, profiles, value descriptors, command values, events),
//! the error taxonomy surfaced to callers, and the seams to the outside
//! world: the pluggable [`ProtocolDriver`] and the downstream collaborators
//! ([`EventSink`], [`MetadataClient`]).
//!
//! # Data flow
//!
//! ```text
//! command ──► dispatcher ──► ProtocolDriver ──► CommandValue ──► Reading ──► Event ──► EventSink
//!                                  │
//!                                  └──► AsyncValues (bounded channel) ──► ingestor ──► Event
//! ```

pub mod collaborators;
pub mod driver;
pub mod error;
pub mod models;

pub use collaborators::{CollaboratorError, EventSink, MetadataClient};
pub use driver::{
    AsyncValues, AsyncValuesSender, CommandRequest, DriverError, DriverResult, ProtocolDriver,
};
pub use error::{ModelError, ServiceError, ServiceResult};
pub use models::*;
