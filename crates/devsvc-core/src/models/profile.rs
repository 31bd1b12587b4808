//! Device profile models
//!
//! A profile declares a device's protocol-level resources (device objects)
//! with their correction parameters, and binds command names to ordered
//! lists of resource operations for each direction.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::models::ValueType;

/// Direction of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Get,
    Set,
}

impl FromStr for Direction {
    type Err = ModelError;

    /// Case-insensitive; `put` is accepted as an alias of `set`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Direction::Get),
            "set" | "put" => Ok(Direction::Set),
            _ => Err(ModelError::UnknownDirection(s.to_string())),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Get => "get",
            Direction::Set => "set",
        })
    }
}

/// Type and correction parameters of a device object.
///
/// `base`, `scale` and `offset` are kept as the strings declared in the
/// profile and parsed on every transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default = "default_read_write")]
    pub read_write: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
}

fn default_read_write() -> String {
    "RW".to_string()
}

/// Treat empty strings the same as absent parameters
fn declared(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl PropertyValue {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            read_write: default_read_write(),
            default_value: None,
            base: None,
            scale: None,
            offset: None,
            assertion: None,
        }
    }

    pub fn base(&self) -> Option<&str> {
        declared(&self.base)
    }

    pub fn scale(&self) -> Option<&str> {
        declared(&self.scale)
    }

    pub fn offset(&self) -> Option<&str> {
        declared(&self.offset)
    }

    pub fn assertion(&self) -> Option<&str> {
        declared(&self.assertion)
    }
}

/// One named protocol-level data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceObject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Driver-specific attributes (register address, pin, topic, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    pub properties: PropertyValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

impl DeviceObject {
    pub fn new(name: impl Into<String>, properties: PropertyValue) -> Self {
        Self {
            name: name.into(),
            description: None,
            attributes: BTreeMap::new(),
            properties,
            units: None,
        }
    }
}

/// Binding of a command and direction to a device object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default)]
    pub operation: String,
    /// Name of the device object this operation reads or writes
    pub object: String,
    /// Key used to match write-body entries; falls back to `object`
    #[serde(default)]
    pub parameter: String,
    /// Value substitution table keyed by the canonical string form
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mappings: BTreeMap<String, String>,
}

impl ResourceOperation {
    pub fn new(operation: impl Into<String>, object: impl Into<String>) -> Self {
        let object = object.into();
        Self {
            index: None,
            operation: operation.into(),
            parameter: object.clone(),
            object,
            mappings: BTreeMap::new(),
        }
    }

    pub fn with_mappings<I, K, V>(mut self, mappings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.mappings = mappings
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = parameter.into();
        self
    }

    /// Parameter name used for write-body matching
    pub fn parameter_name(&self) -> &str {
        if self.parameter.is_empty() {
            &self.object
        } else {
            &self.parameter
        }
    }
}

/// Named command with its get and set operation lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResource {
    pub name: String,
    #[serde(default)]
    pub get: Vec<ResourceOperation>,
    #[serde(default)]
    pub set: Vec<ResourceOperation>,
}

/// Declared command name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
}

/// Template declaring a device's resources, correction parameters and commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub device_resources: Vec<DeviceObject>,
    #[serde(default)]
    pub resources: Vec<ProfileResource>,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl DeviceProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            manufacturer: None,
            model: None,
            labels: Vec::new(),
            device_resources: Vec::new(),
            resources: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn device_object(&self, name: &str) -> Option<&DeviceObject> {
        self.device_resources.iter().find(|o| o.name == name)
    }

    /// Check that every resource operation resolves to a declared device object
    pub fn validate(&self) -> Result<(), ModelError> {
        let objects: HashSet<&str> = self
            .device_resources
            .iter()
            .map(|o| o.name.as_str())
            .collect();

        for resource in &self.resources {
            for op in resource.get.iter().chain(resource.set.iter()) {
                if !objects.contains(op.object.as_str()) {
                    return Err(ModelError::UnknownDeviceObject {
                        profile: self.name.clone(),
                        object: op.object.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_case_insensitive() {
        assert_eq!("GET".parse::<Direction>().unwrap(), Direction::Get);
        assert_eq!("Set".parse::<Direction>().unwrap(), Direction::Set);
        assert_eq!("put".parse::<Direction>().unwrap(), Direction::Set);
        assert!("delete".parse::<Direction>().is_err());
    }

    #[test]
    fn test_empty_parameters_are_undeclared() {
        let mut pv = PropertyValue::new(ValueType::Int32);
        pv.scale = Some("".to_string());
        pv.offset = Some(" 5 ".to_string());
        assert_eq!(pv.scale(), None);
        assert_eq!(pv.offset(), Some("5"));
    }

    #[test]
    fn test_parameter_falls_back_to_object() {
        let mut op = ResourceOperation::new("set", "temperature");
        op.parameter.clear();
        assert_eq!(op.parameter_name(), "temperature");
        let op = op.with_parameter("setpoint");
        assert_eq!(op.parameter_name(), "setpoint");
    }

    #[test]
    fn test_validate_rejects_unknown_object() {
        let mut profile = DeviceProfile::new("p1", "hvac");
        profile.device_resources.push(DeviceObject::new(
            "temperature",
            PropertyValue::new(ValueType::Float32),
        ));
        profile.resources.push(ProfileResource {
            name: "temperature".into(),
            get: vec![ResourceOperation::new("get", "temperature")],
            set: vec![ResourceOperation::new("set", "humidity")],
        });

        let err = profile.validate().unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownDeviceObject {
                profile: "hvac".into(),
                object: "humidity".into()
            }
        );
    }

    #[test]
    fn test_profile_from_yaml() {
        let yaml = r#"
name: hvac
device_resources:
  - name: temperature
    properties:
      type: Int32
      scale: "0.1"
resources:
  - name: temperature
    get:
      - operation: get
        object: temperature
commands:
  - name: temperature
"#;
        let profile: DeviceProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(profile.device_resources[0].properties.value_type, ValueType::Int32);
        assert_eq!(profile.device_resources[0].properties.scale(), Some("0.1"));
        assert_eq!(profile.resources[0].get.len(), 1);
        assert!(profile.validate().is_ok());
    }
}
