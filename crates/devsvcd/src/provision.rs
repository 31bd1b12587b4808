//! Builds the startup snapshot from profile files and the configured device list

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use devsvc_cache::ProvisionSnapshot;
use devsvc_core::{DeviceProfile, ValueDescriptor};

use crate::config::DeviceEntry;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Load every `.yaml`/`.yml` profile in `dir`.
///
/// A missing directory yields no profiles. Files that fail to parse are
/// skipped with a warning.
pub fn load_profiles(dir: &Path) -> Result<Vec<DeviceProfile>> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "Profiles directory not found");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read profiles directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if path.is_file() && (ext == "yaml" || ext == "yml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut profiles = Vec::with_capacity(paths.len());
    for path in paths {
        match load_profile_file(&path) {
            Ok(profile) => {
                tracing::info!(profile = %profile.name, file = %path.display(), "Loaded device profile");
                profiles.push(profile);
            }
            Err(e) => tracing::warn!("Failed to load {}: {:#}", path.display(), e),
        }
    }
    Ok(profiles)
}

fn load_profile_file(path: &Path) -> Result<DeviceProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile: {}", path.display()))?;
    let mut profile: DeviceProfile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse profile: {}", path.display()))?;
    if profile.id.is_empty() {
        profile.id = new_id();
    }
    Ok(profile)
}

/// Assemble the snapshot: ids for the configured devices, and one value
/// descriptor per distinct device object name across all profiles.
pub fn build_snapshot(profiles: Vec<DeviceProfile>, devices: &[DeviceEntry]) -> ProvisionSnapshot {
    let mut seen = HashSet::new();
    let value_descriptors = profiles
        .iter()
        .flat_map(|p| p.device_resources.iter())
        .filter(|o| seen.insert(o.name.clone()))
        .map(|o| ValueDescriptor::from_device_object(new_id(), o))
        .collect();

    ProvisionSnapshot {
        devices: devices.iter().map(|d| d.to_device(new_id())).collect(),
        profiles,
        value_descriptors,
    }
}
