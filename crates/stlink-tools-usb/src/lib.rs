//! stlink-tools-usb - USB enumeration for stlink-tools
//!
//! Implements [`UsbBus`] on top of `nusb`. Devices are only enumerated, never
//! opened, so no special permissions are needed beyond reading descriptors.

use nusb::MaybeFuture;
use stlink_tools_core::device::{UsbBus, UsbDeviceInfo};
use stlink_tools_core::{Error, Result};

/// The host's USB buses
#[derive(Debug, Default, Clone, Copy)]
pub struct NusbBus;

impl UsbBus for NusbBus {
    fn list_devices(&self) -> Result<Vec<UsbDeviceInfo>> {
        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| Error::Usb(e.to_string()))?
            .map(|d| UsbDeviceInfo {
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
                serial_number: d.serial_number().map(str::to_string),
                bus: d.bus_id().to_string(),
                address: d.device_address(),
            })
            .collect();

        log::debug!("{} USB devices attached", devices.len());
        Ok(devices)
    }
}
