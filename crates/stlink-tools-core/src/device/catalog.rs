//! Static catalog of supported ST-Link probes
//!
//! Probes are identified by their USB (vendor id, product id) pair. Several
//! product ids belong to the same family and differ only in whether the probe
//! exposes a USB mass-storage interface.

use std::fmt;

/// STMicroelectronics USB vendor id
pub const ST_VID: u16 = 0x0483;

/// ST-Link hardware generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StLinkVersion {
    /// ST-Link/V2
    V2,
    /// ST-Link/V2-1 (on-board Nucleo/Discovery probes)
    V2_1,
    /// STLINK-V3E (on-board, reduced feature set)
    V3E,
    /// STLINK-V3
    V3,
}

impl StLinkVersion {
    /// Short label, as printed in device names
    pub fn label(self) -> &'static str {
        match self {
            StLinkVersion::V2 => "V2",
            StLinkVersion::V2_1 => "V2-1",
            StLinkVersion::V3E => "V3E",
            StLinkVersion::V3 => "V3",
        }
    }

    /// Lowercase type tag used in machine readable listings
    pub fn type_name(self) -> &'static str {
        match self {
            StLinkVersion::V2 => "st-link v2",
            StLinkVersion::V2_1 => "st-link v2.1",
            StLinkVersion::V3E => "st-link v3e",
            StLinkVersion::V3 => "st-link v3",
        }
    }

    /// OpenOCD interface script for this generation, if OpenOCD ships a
    /// dedicated one
    pub fn openocd_interface(self) -> Option<&'static str> {
        match self {
            StLinkVersion::V2 => Some("interface/stlink-v2.cfg"),
            StLinkVersion::V2_1 => Some("interface/stlink-v2-1.cfg"),
            StLinkVersion::V3E | StLinkVersion::V3 => None,
        }
    }
}

impl fmt::Display for StLinkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// USB bulk endpoint addresses used by the probe's debug interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// Host-to-device endpoint
    pub out_ep: u8,
    /// Device-to-host endpoint
    pub in_ep: u8,
}

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFamily {
    /// Hardware generation
    pub version: StLinkVersion,
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// Whether this product id exposes the mass-storage interface
    pub mass_storage: bool,
    /// Debug interface endpoints
    pub endpoints: Option<Endpoints>,
}

impl DeviceFamily {
    /// Display name shared by every product id of the family
    pub fn display_name(&self) -> String {
        format!("ST-Link {}", self.version)
    }
}

const fn entry(
    version: StLinkVersion,
    product_id: u16,
    mass_storage: bool,
    out_ep: u8,
) -> DeviceFamily {
    DeviceFamily {
        version,
        vendor_id: ST_VID,
        product_id,
        mass_storage,
        endpoints: Some(Endpoints { out_ep, in_ep: 0x81 }),
    }
}

/// All known ST-Link probes
pub static STLINK_DEVICES: &[DeviceFamily] = &[
    entry(StLinkVersion::V2, 0x3748, true, 0x02),
    entry(StLinkVersion::V2_1, 0x374B, true, 0x01),
    entry(StLinkVersion::V2_1, 0x3752, false, 0x01),
    entry(StLinkVersion::V3E, 0x374E, true, 0x01),
    entry(StLinkVersion::V3, 0x374F, true, 0x01),
    entry(StLinkVersion::V3, 0x3753, false, 0x01),
];

/// Look up a probe family by USB ids
pub fn find_family(vendor_id: u16, product_id: u16) -> Option<&'static DeviceFamily> {
    STLINK_DEVICES
        .iter()
        .find(|d| d.vendor_id == vendor_id && d.product_id == product_id)
}
