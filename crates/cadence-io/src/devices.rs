//! Backend and device enumeration.
//!
//! Device selectors follow one rule everywhere: a numeric index, an exact
//! device name, or a case-insensitive partial name. Probing only queries the
//! host and never touches a running stream.

use cadence_config::{BACKEND_DEFAULT, BACKEND_DUMMY};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use crate::dummy::DUMMY_DEVICE_NAME;
use crate::{Error, Result};

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Backends usable on this machine: `dummy` followed by the available cpal hosts.
pub fn available_backends() -> Vec<String> {
    std::iter::once(BACKEND_DUMMY.to_string())
        .chain(cpal::available_hosts().into_iter().map(|id| id.name().to_lowercase()))
        .collect()
}

/// Resolve a backend name to a cpal host.
///
/// `"default"` is the platform default host; anything else is matched
/// case-insensitively against cpal host names.
pub(crate) fn resolve_host(backend: &str) -> Result<Host> {
    if backend.eq_ignore_ascii_case(BACKEND_DEFAULT) {
        return Ok(cpal::default_host());
    }

    let id = cpal::ALL_HOSTS
        .iter()
        .copied()
        .find(|id| id.name().eq_ignore_ascii_case(backend))
        .ok_or_else(|| Error::UnknownBackend(backend.to_string()))?;

    cpal::host_from_id(id).map_err(|e| Error::AudioUnavailable(format!("{}: {e}", id.name())))
}

/// List the devices of a backend.
pub fn list_devices(backend: &str) -> Result<Vec<DeviceInfo>> {
    if backend.eq_ignore_ascii_case(BACKEND_DUMMY) {
        return Ok(vec![DeviceInfo {
            name: DUMMY_DEVICE_NAME.to_string(),
            is_input: true,
            is_output: true,
            default_sample_rate: 48000,
        }]);
    }

    let host = resolve_host(backend)?;
    let mut devices = Vec::new();

    // Input devices
    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device_name(&device) {
                let sample_rate = device
                    .default_input_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(48000);

                // Check if also an output
                let is_output = device.default_output_config().is_ok();

                devices.push(DeviceInfo {
                    name,
                    is_input: true,
                    is_output,
                    default_sample_rate: sample_rate,
                });
            }
        }
    }

    // Output-only devices
    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }

                let sample_rate = device
                    .default_output_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(48000);

                devices.push(DeviceInfo {
                    name,
                    is_input: false,
                    is_output: true,
                    default_sample_rate: sample_rate,
                });
            }
        }
    }

    Ok(devices)
}

/// Report whether an output device is currently available.
///
/// `device` of `None` probes the backend's default output. Returns
/// `Ok(false)` for a missing or unusable device and an error only for an
/// unknown backend.
pub fn probe_device(backend: &str, device: Option<&str>) -> Result<bool> {
    if backend.eq_ignore_ascii_case(BACKEND_DUMMY) {
        let names = [DUMMY_DEVICE_NAME.to_string()];
        return Ok(device.is_none_or(|selector| select_device(&names, selector, "output").is_ok()));
    }

    let host = match resolve_host(backend) {
        Ok(host) => host,
        Err(Error::AudioUnavailable(reason)) => {
            tracing::debug!(backend, %reason, "host unavailable");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    match find_output_device(&host, device) {
        Ok(found) => Ok(found.default_output_config().is_ok()),
        Err(Error::NoDevice | Error::DeviceNotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Find an output device by selector, or the host default.
pub(crate) fn find_output_device(host: &Host, selector: Option<&str>) -> Result<Device> {
    match selector {
        Some(selector) => {
            let devices: Vec<_> = host
                .output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .collect();
            find_device_from_list(devices, selector, "output")
        }
        None => host.default_output_device().ok_or(Error::NoDevice),
    }
}

/// Find an input device by selector, or the host default.
pub(crate) fn find_input_device(host: &Host, selector: Option<&str>) -> Result<Device> {
    match selector {
        Some(selector) => {
            let devices: Vec<_> = host
                .input_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .collect();
            find_device_from_list(devices, selector, "input")
        }
        None => host.default_input_device().ok_or(Error::NoDevice),
    }
}

fn find_device_from_list(mut devices: Vec<Device>, selector: &str, kind: &str) -> Result<Device> {
    let names: Vec<String> = devices
        .iter()
        .map(|d| device_name(d).unwrap_or_default())
        .collect();
    let index = select_device(&names, selector, kind)?;
    Ok(devices.swap_remove(index))
}

/// Pick a device index from a list of names by index, exact name, or fuzzy match.
pub(crate) fn select_device(names: &[String], selector: &str, kind: &str) -> Result<usize> {
    // Try parsing as index first
    if let Ok(index) = selector.parse::<usize>() {
        if index < names.len() {
            return Ok(index);
        }
        return Err(Error::DeviceNotFound(format!(
            "{kind} device index {index} (only {} devices available)",
            names.len()
        )));
    }

    // Try exact match
    if let Some(index) = names.iter().position(|n| n == selector) {
        return Ok(index);
    }

    // Try case-insensitive partial match
    let search_lower = selector.to_lowercase();
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && name.to_lowercase().contains(&search_lower))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!("no {kind} device matching '{selector}'"))),
        [only] => Ok(*only),
        [first, ..] => {
            let candidates: Vec<_> = matches.iter().map(|&i| names[i].as_str()).collect();
            tracing::warn!(
                selector,
                kind,
                ?candidates,
                chosen = names[*first].as_str(),
                "selector matches multiple devices; using first match"
            );
            Ok(*first)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn select_by_index() {
        let list = names(&["Built-in", "USB Audio"]);
        assert_eq!(select_device(&list, "1", "output").unwrap(), 1);
        assert!(matches!(
            select_device(&list, "2", "output"),
            Err(Error::DeviceNotFound(msg)) if msg.contains("only 2")
        ));
    }

    #[test]
    fn exact_name_wins_over_partial() {
        let list = names(&["USB Audio Pro", "USB Audio"]);
        assert_eq!(select_device(&list, "USB Audio", "output").unwrap(), 1);
    }

    #[test]
    fn partial_match_is_case_insensitive_and_first_wins() {
        let list = names(&["HDMI 1", "Focusrite Scarlett 2i2", "hdmi 2"]);
        assert_eq!(select_device(&list, "scarlett", "input").unwrap(), 1);
        assert_eq!(select_device(&list, "HDMI", "output").unwrap(), 0);
        assert!(select_device(&list, "Motu", "output").is_err());
    }

    #[test]
    fn unnamed_devices_never_fuzzy_match() {
        let list = names(&["", "Speakers"]);
        assert_eq!(select_device(&list, "", "output").unwrap(), 0);
        assert_eq!(select_device(&list, "e", "output").unwrap(), 1);
    }

    #[test]
    fn dummy_backend_lists_and_probes_one_device() {
        let devices = list_devices("dummy").unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].is_input && devices[0].is_output);

        assert!(probe_device("dummy", None).unwrap());
        assert!(probe_device("DUMMY", Some("0")).unwrap());
        assert!(probe_device("dummy", Some("dum")).unwrap());
        assert!(!probe_device("dummy", Some("1")).unwrap());
        assert!(!probe_device("dummy", Some("speakers")).unwrap());
    }

    #[test]
    fn unknown_backend_is_an_error() {
        assert!(matches!(
            resolve_host("no-such-host"),
            Err(Error::UnknownBackend(name)) if name == "no-such-host"
        ));
        assert!(matches!(probe_device("no-such-host", None), Err(Error::UnknownBackend(_))));
        assert!(matches!(list_devices("no-such-host"), Err(Error::UnknownBackend(_))));
    }

    #[test]
    fn dummy_is_always_available() {
        assert_eq!(available_backends().first().map(String::as_str), Some("dummy"));
    }
}
