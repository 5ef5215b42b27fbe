//! ASCII-hex line framing and CAN record codec for EMUC serial CAN adapters.
//!
//! Every line exchanged with the adapter is:
//! - A 1-byte command character (`:` set speed, `<` transmit, `=` received, `;` control)
//! - The uppercase hex rendering of the command payload
//! - A 2-digit uppercase hex checksum over all preceding ASCII bytes
//! - CRLF
//!
//! CAN messages travel as a fixed 14-byte big-endian record
//! (port, flags, address, payload).

#[cfg(feature = "async")]
pub mod async_codec;
pub mod decoder;
pub mod error;
pub mod line;
pub mod message;
pub mod port;
pub mod record;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::EmucCodec;
pub use decoder::{classify_line, DecoderConfig, Reply, StreamDecoder, ACK_PREFIX, NAK_PREFIX};
pub use error::{FrameError, Result};
pub use line::{
    checksum, encode_received, encode_request, encode_speed, encode_transmit, frame_line,
    parse_line, Command, Request, SUPPORTED_SPEEDS_KBPS,
};
pub use message::{CanMessage, EXTENDED_ADDRESS_MASK, MAX_DATA_LENGTH, STANDARD_ADDRESS_MASK};
pub use port::Port;
pub use record::{pack_record, unpack_record, RECORD_SIZE};
pub use writer::LineWriter;
