//! Connected probe discovery and selection

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::catalog::{find_family, DeviceFamily};
use super::{UsbBus, UsbDeviceInfo};
use crate::error::{Error, Result};

/// Length of a genuine ST-Link serial number in hex characters
pub const SERIAL_HEX_LEN: usize = 24;

static HEX_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-fA-F]+").unwrap());

/// Normalize a raw USB serial number string
///
/// Some ST-Link/V2 probes report their serial as raw binary, which arrives
/// here as arbitrary code points instead of a hex string. Those are expanded
/// to the hex value of each code point.
pub fn canonical_serial(raw: &str) -> String {
    match HEX_RUN.find(raw) {
        Some(m) if m.len() == SERIAL_HEX_LEN => m.as_str().to_uppercase(),
        _ => raw
            .chars()
            .map(|c| format!("{:02X}", u32::from(c)))
            .collect::<String>()
            .to_uppercase(),
    }
}

/// Escape every character of `raw` as `\xNN`, e.g. `"123"` becomes
/// `\x31\x32\x33`
pub fn escaped_serial(raw: &str) -> String {
    raw.chars()
        .map(|c| format!("\\x{:02x}", u32::from(c)))
        .collect()
}

/// An attached debug probe recognised by the catalog
#[derive(Debug, Clone)]
pub struct ConnectedProbe {
    family: &'static DeviceFamily,
    usb: UsbDeviceInfo,
    name: String,
    serial: Option<String>,
}

impl ConnectedProbe {
    /// Build a probe from its catalog entry and the bus report
    pub fn new(family: &'static DeviceFamily, usb: UsbDeviceInfo) -> Self {
        let serial = usb.serial_number.as_deref().map(canonical_serial);
        Self {
            family,
            name: family.display_name(),
            usb,
            serial,
        }
    }

    /// Catalog entry
    pub fn family(&self) -> &'static DeviceFamily {
        self.family
    }

    /// Display name, e.g. "ST-Link V2-1"
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical serial, `None` if the probe reported no serial number
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Serial number exactly as the probe reported it
    pub fn raw_serial(&self) -> Option<&str> {
        self.usb.serial_number.as_deref()
    }

    /// USB vendor id
    pub fn vendor_id(&self) -> u16 {
        self.usb.vendor_id
    }

    /// USB product id
    pub fn product_id(&self) -> u16 {
        self.usb.product_id
    }

    /// Bus identifier as reported by the USB layer
    pub fn bus(&self) -> &str {
        &self.usb.bus
    }

    /// Device address on its bus
    pub fn address(&self) -> u8 {
        self.usb.address
    }
}

impl fmt::Display for ConnectedProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (serial {})",
            self.name,
            self.serial.as_deref().unwrap_or("<none>")
        )
    }
}

/// List every attached probe known to the catalog
pub fn list_connected_probes(bus: &dyn UsbBus) -> Result<Vec<ConnectedProbe>> {
    let mut probes = Vec::new();
    for dev in bus.list_devices()? {
        match find_family(dev.vendor_id, dev.product_id) {
            Some(family) => {
                log::debug!(
                    "Found {} at bus {} address {}",
                    family.display_name(),
                    dev.bus,
                    dev.address
                );
                probes.push(ConnectedProbe::new(family, dev));
            }
            None => log::trace!(
                "Ignoring USB device {:04X}:{:04X}",
                dev.vendor_id,
                dev.product_id
            ),
        }
    }
    Ok(probes)
}

fn describe(probes: &[ConnectedProbe]) -> Vec<String> {
    probes
        .iter()
        .map(|p| {
            format!(
                "- {}; hla serial {}",
                p.name(),
                p.serial().unwrap_or("<none>")
            )
        })
        .collect()
}

/// Pick the probe to use for `operation`
///
/// With a requested serial, exactly one probe must carry it (compared
/// case-insensitively against canonical serials). Without one, exactly one
/// probe must be attached.
pub fn select_probe(
    mut probes: Vec<ConnectedProbe>,
    requested_serial: Option<&str>,
    operation: &str,
) -> Result<ConnectedProbe> {
    if probes.is_empty() {
        return Err(Error::NoDevice {
            operation: operation.to_string(),
        });
    }

    match requested_serial {
        Some(requested) => {
            let matching: Vec<usize> = probes
                .iter()
                .enumerate()
                .filter(|(_, p)| p.serial().is_some_and(|s| s.eq_ignore_ascii_case(requested)))
                .map(|(i, _)| i)
                .collect();
            match matching.as_slice() {
                [index] => Ok(probes.swap_remove(*index)),
                [] => Err(Error::DeviceMismatch {
                    message: format!("Cannot find ST-Link device with hla serial: {}", requested),
                    probes: describe(&probes),
                }),
                _ => Err(Error::DeviceMismatch {
                    message: format!(
                        "Found multiple ST-Link devices with the same hla serial: {}",
                        requested
                    ),
                    probes: describe(&probes),
                }),
            }
        }
        None if probes.len() == 1 => Ok(probes.remove(0)),
        None => Err(Error::DeviceMismatch {
            message: "Found multiple ST-Link devices. Please select one with --hla-serial"
                .to_string(),
            probes: describe(&probes),
        }),
    }
}
