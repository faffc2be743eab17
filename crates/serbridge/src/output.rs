use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serbridge_transport::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PortsOutput<'a> {
    count: usize,
    ports: &'a [PortInfo],
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PortsOutput {
                count: ports.len(),
                ports,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "VID:PID", "DESCRIPTION"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    usb_id(port).unwrap_or_default(),
                    description(port),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for port in ports {
                let mut line = format!("{} ({})", port.name, port.kind);
                if let Some(id) = usb_id(port) {
                    line.push_str(&format!(" {id}"));
                }
                let desc = description(port);
                if !desc.is_empty() {
                    line.push_str(&format!(" {desc}"));
                }
                println!("{line}");
            }
        }
        OutputFormat::Raw => {
            for port in ports {
                println!("{}", port.name);
            }
        }
    }
}

fn usb_id(port: &PortInfo) -> Option<String> {
    match (port.vid, port.pid) {
        (Some(vid), Some(pid)) => Some(format!("{vid:04x}:{pid:04x}")),
        _ => None,
    }
}

fn description(port: &PortInfo) -> String {
    [port.manufacturer.as_deref(), port.product.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usb_port() -> PortInfo {
        PortInfo {
            name: "/dev/ttyUSB0".to_string(),
            kind: "usb",
            vid: Some(0x0403),
            pid: Some(0x6001),
            manufacturer: Some("FTDI".to_string()),
            product: Some("FT232R".to_string()),
            serial_number: None,
        }
    }

    #[test]
    fn usb_id_is_zero_padded_hex() {
        assert_eq!(usb_id(&usb_port()).as_deref(), Some("0403:6001"));
    }

    #[test]
    fn description_joins_known_fields() {
        let mut port = usb_port();
        assert_eq!(description(&port), "FTDI FT232R");
        port.manufacturer = None;
        assert_eq!(description(&port), "FT232R");
        port.product = None;
        assert_eq!(description(&port), "");
    }
}
