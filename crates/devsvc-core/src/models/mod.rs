//! Shared data models for the device service

mod descriptor;
mod device;
mod event;
mod profile;
mod value;

pub use descriptor::*;
pub use device::*;
pub use event::*;
pub use profile::*;
pub use value::*;

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
