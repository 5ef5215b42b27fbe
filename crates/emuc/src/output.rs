use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use emuc_frame::{CanMessage, Port, Request};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    kind: &'a str,
    port: u8,
    port_name: String,
    address: String,
    extended: bool,
    remote_request: bool,
    dlc: usize,
    payload: String,
    timestamp: String,
}

impl<'a> MessageOutput<'a> {
    fn new(kind: &'a str, port: Port, message: &CanMessage) -> Self {
        Self {
            kind,
            port: port.as_u8(),
            port_name: port_name(port),
            address: address_hex(message),
            extended: message.is_extended(),
            remote_request: message.is_remote_request(),
            dlc: message.data_length(),
            payload: hex::encode_upper(message.payload()),
            timestamp: now_unix_seconds(),
        }
    }
}

#[derive(Serialize)]
struct ControlOutput<'a> {
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kbps: Option<u16>,
    timestamp: String,
}

#[derive(Serialize)]
struct LineOutput<'a> {
    line: &'a str,
    record: String,
}

/// Print a received CAN message.
pub fn print_message(port: Port, message: &CanMessage, format: OutputFormat) {
    print_message_as("message", port, message, format);
}

fn print_message_as(kind: &str, port: Port, message: &CanMessage, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput::new(kind, port, message);
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
                .set_header(vec!["PORT", "ADDRESS", "FLAGS", "DLC", "PAYLOAD"])
                .add_row(vec![
                    port_name(port),
                    address_hex(message),
                    flag_summary(message),
                    message.data_length().to_string(),
                    hex::encode_upper(message.payload()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{port} {message}");
        }
    }
}

/// Print a set-speed acknowledgement.
pub fn print_ack(format: OutputFormat) {
    print_control("ack", "Set Speed ACK", format);
}

/// Print a set-speed rejection.
pub fn print_nak(format: OutputFormat) {
    print_control("nak", "Set Speed NAK", format);
}

fn print_control(kind: &str, text: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ControlOutput {
                kind,
                port: None,
                kbps: None,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{text}"),
    }
}

/// Print a host-side request (decoded `:` or `<` line).
pub fn print_request(request: &Request, format: OutputFormat) {
    match request {
        Request::Transmit { port, message } => {
            print_message_as("transmit", *port, message, format)
        }
        Request::SetSpeed { port, kbps } => match format {
            OutputFormat::Json => {
                let out = ControlOutput {
                    kind: "set_speed",
                    port: Some(port.as_u8()),
                    kbps: Some(*kbps),
                    timestamp: now_unix_seconds(),
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Table | OutputFormat::Pretty => {
                println!("set speed port={port} kbps={kbps}");
            }
        },
    }
}

/// Print an encoded line (terminator stripped) and the record it carries.
pub fn print_line(line: &str, record: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = LineOutput {
                line,
                record: hex::encode_upper(record),
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
                .set_header(vec!["LINE", "RECORD"])
                .add_row(vec![line.to_string(), hex::encode_upper(record)]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{line}"),
    }
}

pub fn port_name(port: Port) -> String {
    match port {
        Port::One => "PORT1".to_string(),
        Port::Two => "PORT2".to_string(),
        Port::Both => "PORT12".to_string(),
        Port::Other(v) => format!("UNKNOWN({v})"),
    }
}

fn address_hex(message: &CanMessage) -> String {
    if message.is_extended() {
        format!("{:08X}", message.address())
    } else {
        format!("{:03X}", message.address())
    }
}

fn flag_summary(message: &CanMessage) -> String {
    match (message.is_extended(), message.is_remote_request()) {
        (true, true) => "EXT RTR".to_string(),
        (true, false) => "EXT".to_string(),
        (false, true) => "RTR".to_string(),
        (false, false) => "-".to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_output_fields() {
        let mut msg = CanMessage::new_extended(0x18FE_F100, &[0xAB, 0x01]);
        msg.set_remote_request();
        let out = MessageOutput::new("message", Port::Two, &msg);
        let json: serde_json::Value = serde_json::to_value(&out).unwrap();

        assert_eq!(json["kind"], "message");
        assert_eq!(json["port"], 2);
        assert_eq!(json["port_name"], "PORT2");
        assert_eq!(json["address"], "18FEF100");
        assert_eq!(json["extended"], true);
        assert_eq!(json["remote_request"], true);
        assert_eq!(json["dlc"], 2);
        assert_eq!(json["payload"], "AB01");
    }

    #[test]
    fn standard_address_uses_three_digits() {
        assert_eq!(address_hex(&CanMessage::new(0x12, &[])), "012");
    }

    #[test]
    fn unknown_port_name() {
        assert_eq!(port_name(Port::Other(9)), "UNKNOWN(9)");
        assert_eq!(port_name(Port::Both), "PORT12");
    }

    #[test]
    fn control_output_skips_missing_fields() {
        let out = ControlOutput {
            kind: "ack",
            port: None,
            kbps: None,
            timestamp: "0".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"kind":"ack","timestamp":"0"}"#
        );
    }
}
