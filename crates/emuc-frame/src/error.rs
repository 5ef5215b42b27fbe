/// Errors that can occur while encoding or decoding adapter lines.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The line does not start with a known command character.
    #[error("unrecognized frame {line:?}")]
    UnrecognizedFrame { line: String },

    /// The line body is not valid hex (bad digit or odd length).
    #[error("invalid hex in frame: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded line body has the wrong number of bytes.
    #[error("wrong frame length (expected {expected} bytes, got {actual})")]
    WrongLength { expected: usize, actual: usize },

    /// The checksum byte does not match the line contents.
    #[error("bad checksum: computed {computed:#04X}, received {received:#04X}")]
    ChecksumMismatch { computed: u8, received: u8 },

    /// The adapter rejected a set-speed command.
    #[error("set-speed rejected by adapter (NAK)")]
    SpeedSetRejected,

    /// A binary record has the wrong size.
    #[error("malformed record (expected {expected} bytes, got {actual})")]
    MalformedRecord { expected: usize, actual: usize },

    /// A record declares more payload bytes than a CAN frame can carry.
    #[error("invalid data length code {0} (max 8)")]
    InvalidDataLength(u8),

    /// Payload handed to a strict constructor is longer than 8 bytes.
    #[error("payload too long ({len} bytes, max 8)")]
    PayloadTooLong { len: usize },

    /// Address handed to a strict constructor does not fit its width.
    #[error("address {address:#X} out of range (max {max:#X})")]
    AddressOutOfRange { address: u32, max: u32 },

    /// No line terminator within the configured limit.
    #[error("line too long ({len} bytes, max {max})")]
    LineTooLong { len: usize, max: usize },

    /// An I/O error occurred while reading or writing lines.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete line was received.
    #[error("connection closed (end of stream)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
