//! Device models

use serde::{Deserialize, Serialize};

/// Administrative lock state of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminState {
    Locked,
    #[default]
    Unlocked,
}

/// Operating (health) state of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatingState {
    #[default]
    Enabled,
    Disabled,
}

impl std::fmt::Display for OperatingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OperatingState::Enabled => "ENABLED",
            OperatingState::Disabled => "DISABLED",
        })
    }
}

/// Protocol address of a device, handed to the driver untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addressable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub path: String,
}

/// An addressable managed endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique identifier, assigned on registration when empty
    #[serde(default)]
    pub id: String,
    /// Unique name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub admin_state: AdminState,
    #[serde(default)]
    pub operating_state: OperatingState,
    /// Name of the device profile
    pub profile: String,
    #[serde(default)]
    pub addressable: Addressable,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl Device {
    /// Create an unlocked, enabled device bound to `profile`
    pub fn new(id: impl Into<String>, name: impl Into<String>, profile: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            addressable: Addressable {
                name: name.clone(),
                ..Default::default()
            },
            name,
            description: None,
            admin_state: AdminState::Unlocked,
            operating_state: OperatingState::Enabled,
            profile: profile.into(),
            labels: Vec::new(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.admin_state == AdminState::Locked
    }

    /// Eligible for "all devices" commands
    pub fn is_operational(&self) -> bool {
        self.admin_state != AdminState::Locked && self.operating_state != OperatingState::Disabled
    }
}
