//! Selection helpers over the devices a model can target.
//!
//! All filters are pure and keep the input order. An empty result is a
//! normal outcome, so check for it before indexing.

use super::types::{DeviceName, TargetDevice};
use crate::error::{EdgePressError, Result};

/// Devices whose name equals `name`.
pub fn filter_by_name(name: &DeviceName, devices: &[TargetDevice]) -> Vec<TargetDevice> {
    devices
        .iter()
        .filter(|device| &device.device_name == name)
        .cloned()
        .collect()
}

/// Devices running software version `version` (e.g. JetPack `"4.6"`).
pub fn filter_by_software_version(version: &str, devices: &[TargetDevice]) -> Vec<TargetDevice> {
    devices
        .iter()
        .filter(|device| device.software_version.as_deref() == Some(version))
        .cloned()
        .collect()
}

/// Devices of hardware variant `hardware_type`.
pub fn filter_by_hardware_type(hardware_type: &str, devices: &[TargetDevice]) -> Vec<TargetDevice> {
    devices
        .iter()
        .filter(|device| device.hardware_type.as_deref() == Some(hardware_type))
        .cloned()
        .collect()
}

/// Device names in first-seen order, without duplicates.
pub fn distinct_device_names(devices: &[TargetDevice]) -> Vec<DeviceName> {
    let mut names: Vec<DeviceName> = Vec::new();
    for device in devices {
        if !names.contains(&device.device_name) {
            names.push(device.device_name.clone());
        }
    }
    names
}

/// Reject `target` when the server listed the devices it supports and
/// `target` is not one of them.
///
/// An empty list means the server did not report availability, so nothing
/// is checked.
pub fn ensure_available(target: &TargetDevice, available: &[TargetDevice]) -> Result<()> {
    if available.is_empty() || available.iter().any(|device| device.same_target(target)) {
        return Ok(());
    }

    let offered: Vec<String> = available.iter().map(ToString::to_string).collect();
    Err(EdgePressError::validation(
        "target_device",
        format!(
            "{} is not available for this model (available: {})",
            target,
            offered.join(", ")
        ),
    ))
}
