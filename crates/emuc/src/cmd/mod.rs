use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use emuc_frame::{CanMessage, Port, SUPPORTED_SPEEDS_KBPS};

use crate::exit::{frame_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod cat;
pub mod decode;
pub mod encode;
pub mod monitor;
pub mod send;
pub mod speed;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive session: print received messages, send messages typed on stdin.
    Cat(CatArgs),
    /// Print received messages.
    Monitor(MonitorArgs),
    /// Transmit a single message.
    Send(SendArgs),
    /// Set port speed.
    Speed(SpeedArgs),
    /// Print the wire line for a message (no device needed).
    Encode(EncodeArgs),
    /// Decode a single wire line (no device needed).
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Cat(args) => cat::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Speed(args) => speed::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CatArgs {
    /// Adapter device path.
    #[arg(env = "EMUC_DEVICE")]
    pub device: PathBuf,
    /// Set the port speed (kbps) before starting.
    #[arg(long)]
    pub kbps: Option<u16>,
    /// Port(s) the speed applies to.
    #[arg(long, default_value = "12", value_parser = parse_port)]
    pub port: Port,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Adapter device path (or a captured session file).
    #[arg(env = "EMUC_DEVICE")]
    pub device: PathBuf,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Set the port speed (kbps) before monitoring.
    #[arg(long)]
    pub kbps: Option<u16>,
    /// Port(s) the speed applies to.
    #[arg(long, default_value = "12", value_parser = parse_port)]
    pub port: Port,
}

/// Fields describing one CAN message on the command line.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// Port(s) to transmit on: 1, 2 or 12.
    #[arg(long, short = 'p', default_value = "1", value_parser = parse_port)]
    pub port: Port,
    /// CAN address in hex (e.g. 123, 0x18FEF100).
    #[arg(long, value_parser = parse_hex_u32)]
    pub id: u32,
    /// Payload in hex, up to 8 bytes (e.g. DEAD).
    #[arg(long, value_parser = parse_payload)]
    pub data: Option<HexPayload>,
    /// Use a 29-bit address.
    #[arg(long, short = 'x')]
    pub extended: bool,
    /// Set the remote-transmission-request flag.
    #[arg(long)]
    pub rtr: bool,
}

impl MessageArgs {
    /// Build the message, rejecting addresses or payloads that do not fit.
    pub fn to_message(&self) -> CliResult<CanMessage> {
        let payload = self.data.as_ref().map(|p| p.0.as_slice()).unwrap_or(&[]);
        let built = if self.extended {
            CanMessage::try_new_extended(self.id, payload)
        } else {
            CanMessage::try_new(self.id, payload)
        };
        let mut message = built.map_err(|err| frame_error("invalid message", err))?;
        if self.rtr {
            message.set_remote_request();
        }
        Ok(message)
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Adapter device path.
    #[arg(env = "EMUC_DEVICE")]
    pub device: PathBuf,
    #[command(flatten)]
    pub message: MessageArgs,
}

#[derive(Args, Debug)]
pub struct SpeedArgs {
    /// Adapter device path.
    #[arg(env = "EMUC_DEVICE")]
    pub device: PathBuf,
    /// Speed in kbps (50, 125, 250, 500 or 1000).
    #[arg(long)]
    pub kbps: u16,
    /// Port(s) to configure: 1, 2 or 12.
    #[arg(long, short = 'p', default_value = "12", value_parser = parse_port)]
    pub port: Port,
    /// Wait for the adapter's ACK/NAK.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait when --wait is set (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub message: MessageArgs,
    /// Encode as an adapter-side `=` line instead of a `<` transmit line.
    #[arg(long)]
    pub received: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// The line to decode, e.g. "=010800000123DEAD000000000000D9".
    pub line: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Accepts `1`, `2`, `12` (both) or any raw byte value.
pub fn parse_port(input: &str) -> Result<Port, String> {
    match input.trim() {
        "12" => Ok(Port::Both),
        other => other
            .parse::<u8>()
            .map(Port::from)
            .map_err(|_| format!("invalid port: {input} (expected 1, 2 or 12)")),
    }
}

pub fn parse_hex_u32(input: &str) -> Result<u32, String> {
    let digits = strip_hex_prefix(input.trim());
    u32::from_str_radix(digits, 16).map_err(|err| format!("invalid hex value {input:?}: {err}"))
}

/// Raw payload bytes parsed from a hex argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexPayload(pub Vec<u8>);

pub fn parse_payload(input: &str) -> Result<HexPayload, String> {
    let digits = strip_hex_prefix(input.trim());
    hex::decode(digits)
        .map(HexPayload)
        .map_err(|err| format!("invalid hex payload {input:?}: {err}"))
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Warn about speeds the adapter is known to reject.
pub fn check_speed(kbps: u16) {
    if !SUPPORTED_SPEEDS_KBPS.contains(&kbps) {
        tracing::warn!(
            kbps,
            supported = ?SUPPORTED_SPEEDS_KBPS,
            "speed not supported by the adapter, expect a NAK"
        );
    }
}
