//! TOML configuration for the daemon

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use devsvc_core::{Addressable, AdminState, Device, OperatingState};
use devsvc_runtime::ServiceSettings;

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub device: DeviceConfig,
    pub driver: DriverConfig,
    pub logging: LoggingConfig,
    pub sink: SinkConfig,
    /// Devices registered at startup
    pub device_list: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub enable_async_readings: bool,
    pub async_buffer_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "devsvc-virtual".to_string(),
            host: "0.0.0.0".to_string(),
            port: 49990,
            enable_async_readings: true,
            async_buffer_size: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub data_transform: bool,
    pub max_cmd_ops: usize,
    /// Devices in flight during an "all devices" command
    pub max_concurrent_devices: usize,
    pub profiles_dir: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            data_transform: true,
            max_cmd_ops: 128,
            max_concurrent_devices: 64,
            profiles_dir: PathBuf::from("res/profiles"),
        }
    }
}

/// Virtual driver behaviour
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Interval for pushing stored values as async readings; 0 disables
    pub push_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl SinkConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// One `[[device_list]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    pub profile: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub addressable: Option<Addressable>,
    #[serde(default)]
    pub admin_state: Option<AdminState>,
    #[serde(default)]
    pub operating_state: Option<OperatingState>,
}

impl DeviceEntry {
    /// Build a device with the given id; the addressable name defaults to the device name
    pub fn to_device(&self, id: impl Into<String>) -> Device {
        let mut device = Device::new(id, self.name.clone(), self.profile.clone());
        device.description = self.description.clone();
        device.labels = self.labels.clone();
        if let Some(addressable) = &self.addressable {
            device.addressable = addressable.clone();
            if device.addressable.name.is_empty() {
                device.addressable.name = self.name.clone();
            }
        }
        if let Some(state) = self.admin_state {
            device.admin_state = state;
        }
        if let Some(state) = self.operating_state {
            device.operating_state = state;
        }
        device
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Runtime knobs handed to the service
    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings::new()
            .with_max_cmd_ops(self.device.max_cmd_ops)
            .with_max_concurrent_devices(self.device.max_concurrent_devices)
            .with_async_readings(
                self.service.enable_async_readings,
                self.service.async_buffer_size,
            )
            .with_data_transform(self.device.data_transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.service.port, 49990);
        assert!(config.service.enable_async_readings);
        assert_eq!(config.device.max_cmd_ops, 128);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.driver.push_interval_ms, 0);
        assert!(config.device_list.is_empty());

        let settings = config.settings();
        assert_eq!(settings.max_cmd_ops, 128);
        assert_eq!(settings.max_concurrent_devices, 64);
        assert!(settings.data_transform());
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
            [service]
            name = "pump-service"
            port = 8080
            enable_async_readings = false

            [device]
            data_transform = false
            max_cmd_ops = 4
            profiles_dir = "/etc/devsvc/profiles"

            [logging]
            filter = "debug"
            format = "json"

            [sink]
            max_retries = 5

            [[device_list]]
            name = "pump-1"
            profile = "pump"
            labels = ["basement"]
            admin_state = "LOCKED"

            [device_list.addressable]
            protocol = "modbus"
            address = "10.0.0.7"
            port = 502
            "#,
        )
        .unwrap();

        assert_eq!(config.service.name, "pump-service");
        assert_eq!(config.service.host, "0.0.0.0");
        assert_eq!(config.device.profiles_dir, PathBuf::from("/etc/devsvc/profiles"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.sink.max_retries, 5);
        assert_eq!(config.sink.retry_delay(), Duration::from_millis(100));

        let settings = config.settings();
        assert!(!settings.enable_async_readings);
        assert!(!settings.data_transform());
        assert_eq!(settings.max_cmd_ops, 4);

        let device = config.device_list[0].to_device("d-1");
        assert_eq!(device.id, "d-1");
        assert_eq!(device.admin_state, AdminState::Locked);
        assert_eq!(device.addressable.name, "pump-1");
        assert_eq!(device.addressable.port, 502);
        assert_eq!(device.labels, vec!["basement"]);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/devsvc.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
