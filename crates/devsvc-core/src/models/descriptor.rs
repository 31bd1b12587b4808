//! Value descriptors

use serde::{Deserialize, Serialize};

use super::{DeviceObject, ValueType};

/// Type and unit metadata describing one named value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDescriptor {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ValueDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value_type,
            uom_label: None,
            default_value: None,
            description: None,
        }
    }

    /// Derive the descriptor a device object implies
    pub fn from_device_object(id: impl Into<String>, object: &DeviceObject) -> Self {
        Self {
            id: id.into(),
            name: object.name.clone(),
            value_type: object.properties.value_type,
            uom_label: object.units.clone(),
            default_value: object.properties.default_value.clone(),
            description: object.description.clone(),
        }
    }
}
