use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::message::CanMessage;
use crate::port::Port;
use crate::record::{pack_record, unpack_record, RECORD_SIZE};

/// Port speeds the adapter accepts, in kbit/s. Anything else is NAKed.
pub const SUPPORTED_SPEEDS_KBPS: [u16; 5] = [50, 125, 250, 500, 1000];

/// Line terminator.
pub const CRLF: &[u8] = b"\r\n";

/// Checksum accumulator seed.
const CHECKSUM_SEED: u8 = 0xFF;

/// Leading command character of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `:`: set port speed (host to adapter).
    SetSpeed,
    /// `<`: transmit a CAN message (host to adapter).
    Transmit,
    /// `=`: a CAN message received by the adapter.
    Received,
    /// `;`: control reply (set-speed ack/nak).
    Control,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b':' => Some(Command::SetSpeed),
            b'<' => Some(Command::Transmit),
            b'=' => Some(Command::Received),
            b';' => Some(Command::Control),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Command::SetSpeed => b':',
            Command::Transmit => b'<',
            Command::Received => b'=',
            Command::Control => b';',
        }
    }

    /// Number of payload bytes this command carries (checksum excluded).
    pub fn payload_len(self) -> usize {
        match self {
            Command::SetSpeed => 3,
            Command::Transmit | Command::Received => RECORD_SIZE,
            Command::Control => 1,
        }
    }
}

/// Sum of all bytes, seeded with 0xFF, truncated to 8 bits.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(CHECKSUM_SEED, |acc, b| acc.wrapping_add(*b))
}

/// Encode one line into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────┬──────────────────────┬──────────────┬──────┐
/// │ Cmd (1) │ Payload (uppercase   │ Checksum     │ CRLF │
/// │ : < = ; │ hex, 2 per byte)     │ (2 hex)      │      │
/// └─────────┴──────────────────────┴──────────────┴──────┘
/// ```
///
/// The checksum covers the ASCII text (command character and hex digits),
/// not the raw payload bytes.
pub fn frame_line(command: Command, payload: &[u8], dst: &mut BytesMut) {
    let start = dst.len();
    dst.reserve(1 + payload.len() * 2 + 2 + CRLF.len());
    dst.put_u8(command.as_byte());
    dst.put_slice(hex::encode_upper(payload).as_bytes());
    let chk = checksum(&dst[start..]);
    dst.put_slice(hex::encode_upper([chk]).as_bytes());
    dst.put_slice(CRLF);
}

/// Validate a line and strip its framing.
///
/// Accepts the line with or without its terminator (LF or CRLF). Returns the
/// command and the payload bytes with the checksum byte removed.
pub fn parse_line(line: &[u8]) -> Result<(Command, Vec<u8>)> {
    let command = line
        .first()
        .copied()
        .and_then(Command::from_byte)
        .ok_or_else(|| unrecognized(line))?;

    let body = line.strip_suffix(b"\n").unwrap_or(line);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    // Lowercase digits would decode to the same checksum value while the
    // ASCII sum changes, so only the uppercase alphabet is accepted.
    let text = &body[1..];
    if let Some(index) = text
        .iter()
        .position(|b| !matches!(b, b'0'..=b'9' | b'A'..=b'F'))
    {
        return Err(FrameError::InvalidHex(
            hex::FromHexError::InvalidHexCharacter {
                c: text[index] as char,
                index,
            },
        ));
    }

    let mut decoded = hex::decode(text)?;

    let expected = command.payload_len() + 1;
    if decoded.len() != expected {
        return Err(FrameError::WrongLength {
            expected,
            actual: decoded.len(),
        });
    }

    // Everything up to the checksum's own two hex digits.
    let computed = checksum(&body[..body.len() - 2]);
    let received = decoded[expected - 1];
    if computed != received {
        return Err(FrameError::ChecksumMismatch { computed, received });
    }

    decoded.truncate(expected - 1);
    Ok((command, decoded))
}

pub(crate) fn unrecognized(line: &[u8]) -> FrameError {
    FrameError::UnrecognizedFrame {
        line: String::from_utf8_lossy(line).into_owned(),
    }
}

/// A host-to-adapter command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Set one or both ports to `kbps` kbit/s.
    SetSpeed { port: Port, kbps: u16 },
    /// Transmit a message on one or both ports.
    Transmit { port: Port, message: CanMessage },
}

impl Request {
    /// Parse a host-side (`:` or `<`) line back into a request.
    pub fn parse(line: &[u8]) -> Result<Self> {
        let (command, payload) = parse_line(line)?;
        match command {
            Command::SetSpeed => Ok(Request::SetSpeed {
                port: Port::from(payload[0]),
                kbps: u16::from_be_bytes([payload[1], payload[2]]),
            }),
            Command::Transmit => {
                let (port, message) = unpack_record(&payload)?;
                Ok(Request::Transmit { port, message })
            }
            Command::Received | Command::Control => Err(unrecognized(line)),
        }
    }
}

/// Encode a `:` set-speed line.
pub fn encode_speed(port: Port, kbps: u16, dst: &mut BytesMut) {
    let [hi, lo] = kbps.to_be_bytes();
    frame_line(Command::SetSpeed, &[port.as_u8(), hi, lo], dst);
}

/// Encode a `<` transmit line.
pub fn encode_transmit(port: Port, message: &CanMessage, dst: &mut BytesMut) {
    frame_line(Command::Transmit, &pack_record(port, message), dst);
}

/// Encode a `=` line, as the adapter does for messages it receives.
pub fn encode_received(port: Port, message: &CanMessage, dst: &mut BytesMut) {
    frame_line(Command::Received, &pack_record(port, message), dst);
}

/// Encode any request.
pub fn encode_request(request: &Request, dst: &mut BytesMut) {
    match request {
        Request::SetSpeed { port, kbps } => encode_speed(*port, *kbps, dst),
        Request::Transmit { port, message } => encode_transmit(*port, message, dst),
    }
}
