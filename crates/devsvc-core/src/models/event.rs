//! Readings and events

use serde::{Deserialize, Serialize};

use super::now_millis;

/// One value's publishable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Device name
    pub device: String,
    /// Device object name
    pub name: String,
    pub value: String,
    pub origin: i64,
}

/// The set of readings produced by one read command on one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub device: String,
    pub origin: i64,
    pub readings: Vec<Reading>,
}

impl Event {
    /// Build an event stamped with the current time
    pub fn new(device: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            device: device.into(),
            origin: now_millis(),
            readings,
        }
    }
}
