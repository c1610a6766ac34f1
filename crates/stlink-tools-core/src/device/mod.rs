//! ST-Link probe identification
//!
//! USB access itself lives behind the [`UsbBus`] trait so this module stays
//! free of platform code; `stlink-tools-usb` provides the real implementation.

pub mod catalog;
mod probe;

pub use catalog::{find_family, DeviceFamily, Endpoints, StLinkVersion, STLINK_DEVICES};
pub use probe::{
    canonical_serial, escaped_serial, list_connected_probes, select_probe, ConnectedProbe,
    SERIAL_HEX_LEN,
};

use crate::error::Result;

/// A USB device as reported by the bus, before catalog matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbDeviceInfo {
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// Serial number string descriptor, if the device has one
    pub serial_number: Option<String>,
    /// Bus identifier
    pub bus: String,
    /// Device address on the bus
    pub address: u8,
}

/// Source of attached USB devices
pub trait UsbBus {
    /// Return every attached device, unfiltered
    fn list_devices(&self) -> Result<Vec<UsbDeviceInfo>>;
}
