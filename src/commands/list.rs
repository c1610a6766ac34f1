//! show-devices command implementation

use serde::Serialize;
use stlink_tools_core::device::{escaped_serial, list_connected_probes, ConnectedProbe, UsbBus};

use crate::cli::OutputFormat;

/// USB id rendered either as a number or as a `0x1234` string
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum UsbId {
    Int(u16),
    Hex(String),
}

impl UsbId {
    fn new(id: u16, hex: bool) -> Self {
        if hex {
            UsbId::Hex(format!("0x{:04X}", id))
        } else {
            UsbId::Int(id)
        }
    }
}

#[derive(Debug, Serialize)]
struct DeviceRecord<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    vendor_id: UsbId,
    product_id: UsbId,
    hla_serial: Option<&'a str>,
    hla_serial_hex: Option<String>,
    bus: &'a str,
    address: u8,
}

/// List attached probes on stdout
pub fn show_devices(
    bus: &dyn UsbBus,
    format: OutputFormat,
    hex_ids: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let probes = list_connected_probes(bus)?;
    match format {
        OutputFormat::Text => {
            if probes.is_empty() {
                log::warn!("No ST-Link devices found");
            }
            print!("{}", render_text(&probes));
        }
        OutputFormat::Json => println!("{}", render_json(&probes, hex_ids)?),
    }
    Ok(())
}

fn render_text(probes: &[ConnectedProbe]) -> String {
    let mut out = String::new();
    for probe in probes {
        out.push_str(&format!("device: {}\n", probe.name()));
        out.push_str(&format!("vendor id: 0x{:04X}\n", probe.vendor_id()));
        out.push_str(&format!("product id: 0x{:04X}\n", probe.product_id()));
        out.push_str(&format!(
            "hla serial: {}\n",
            probe.serial().unwrap_or("<none>")
        ));
        if let Some(raw) = probe.raw_serial() {
            out.push_str(&format!("hla serial (hex): {}\n", escaped_serial(raw)));
        }
        out.push('\n');
    }
    out
}

fn render_json(probes: &[ConnectedProbe], hex_ids: bool) -> serde_json::Result<String> {
    let records: Vec<DeviceRecord<'_>> = probes
        .iter()
        .map(|p| DeviceRecord {
            name: p.name(),
            kind: p.family().version.type_name(),
            vendor_id: UsbId::new(p.vendor_id(), hex_ids),
            product_id: UsbId::new(p.product_id(), hex_ids),
            hla_serial: p.serial(),
            hla_serial_hex: p.raw_serial().map(escaped_serial),
            bus: p.bus(),
            address: p.address(),
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stlink_tools_core::device::{catalog::ST_VID, find_family, UsbDeviceInfo};

    fn probes() -> Vec<ConnectedProbe> {
        let usb = |product_id: u16, serial: Option<&str>| UsbDeviceInfo {
            vendor_id: ST_VID,
            product_id,
            serial_number: serial.map(str::to_string),
            bus: "3".into(),
            address: 12,
        };
        vec![
            ConnectedProbe::new(
                find_family(ST_VID, 0x374B).unwrap(),
                usb(0x374B, Some("0671ff485550755187121723")),
            ),
            ConnectedProbe::new(find_family(ST_VID, 0x3748).unwrap(), usb(0x3748, None)),
        ]
    }

    #[test]
    fn test_text_output() {
        let text = render_text(&probes());
        assert_eq!(
            text,
            format!(
                "device: ST-Link V2-1\n\
                 vendor id: 0x0483\n\
                 product id: 0x374B\n\
                 hla serial: 0671FF485550755187121723\n\
                 hla serial (hex): {}\n\
                 \n\
                 device: ST-Link V2\n\
                 vendor id: 0x0483\n\
                 product id: 0x3748\n\
                 hla serial: <none>\n\
                 \n",
                escaped_serial("0671ff485550755187121723")
            )
        );
        assert_eq!(render_text(&[]), "");
    }

    #[test]
    fn test_json_integer_ids() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&probes(), false).unwrap()).unwrap();
        let first = &json[0];
        assert_eq!(first["name"], "ST-Link V2-1");
        assert_eq!(first["type"], "st-link v2.1");
        assert_eq!(first["vendor_id"], 0x0483);
        assert_eq!(first["product_id"], 0x374B);
        assert_eq!(first["hla_serial"], "0671FF485550755187121723");
        assert_eq!(first["bus"], "3");
        assert_eq!(first["address"], 12);
        assert!(json[1]["hla_serial"].is_null());
        assert!(json[1]["hla_serial_hex"].is_null());
        assert_eq!(json[1]["type"], "st-link v2");
    }

    #[test]
    fn test_json_escaped_serial() {
        let bus_dev = UsbDeviceInfo {
            vendor_id: ST_VID,
            product_id: 0x374B,
            serial_number: Some("123".into()),
            bus: "1".into(),
            address: 1,
        };
        let probe = ConnectedProbe::new(find_family(ST_VID, 0x374B).unwrap(), bus_dev);
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&[probe], false).unwrap()).unwrap();
        assert_eq!(json[0]["hla_serial_hex"], r"\x31\x32\x33");
    }

    #[test]
    fn test_json_hex_ids() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&probes(), true).unwrap()).unwrap();
        assert_eq!(json[0]["vendor_id"], "0x0483");
        assert_eq!(json[1]["product_id"], "0x3748");
    }

    #[test]
    fn test_json_empty() {
        assert_eq!(render_json(&[], false).unwrap(), "[]");
    }
}
