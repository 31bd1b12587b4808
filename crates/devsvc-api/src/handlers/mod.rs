//! HTTP request handlers
//!
//! Handlers are thin: they extract path and body and delegate to the
//! [`DeviceService`](devsvc_runtime::DeviceService).

pub mod callback;
pub mod command;
pub mod debug;
