use std::fmt;

use crate::error::{FrameError, Result};

/// Maximum number of payload bytes in a classic CAN frame.
pub const MAX_DATA_LENGTH: usize = 8;

/// Address mask for standard (non-extended) messages: 10 bits.
pub const STANDARD_ADDRESS_MASK: u32 = (1 << 10) - 1;

/// Address mask for extended messages: 29 bits.
pub const EXTENDED_ADDRESS_MASK: u32 = (1 << 29) - 1;

const FLAG_EXTENDED: u8 = 0b0000_0001;
const FLAG_REMOTE_REQUEST: u8 = 0b0000_0010;
const DLC_SHIFT: u8 = 2;
const DLC_MASK: u8 = 0b0001_1111;

/// One CAN frame as sent to or received from the adapter.
///
/// The lenient constructors ([`CanMessage::new`], [`CanMessage::new_extended`])
/// mask the address to its width and truncate the payload to 8 bytes. The
/// strict ones ([`CanMessage::try_new`], [`CanMessage::try_new_extended`])
/// reject such input instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CanMessage {
    extended: bool,
    remote_request: bool,
    data_length: u8,
    address: u32,
    data: [u8; MAX_DATA_LENGTH],
}

impl CanMessage {
    /// Create a message with a 10-bit address. Extra address bits and
    /// payload bytes past the eighth are dropped.
    pub fn new(address: u32, payload: &[u8]) -> Self {
        Self::build(false, address & STANDARD_ADDRESS_MASK, payload)
    }

    /// Create a message with a 29-bit address. Extra address bits and
    /// payload bytes past the eighth are dropped.
    pub fn new_extended(address: u32, payload: &[u8]) -> Self {
        Self::build(true, address & EXTENDED_ADDRESS_MASK, payload)
    }

    /// Like [`CanMessage::new`], but out-of-range input is an error.
    pub fn try_new(address: u32, payload: &[u8]) -> Result<Self> {
        check(address, STANDARD_ADDRESS_MASK, payload)?;
        Ok(Self::new(address, payload))
    }

    /// Like [`CanMessage::new_extended`], but out-of-range input is an error.
    pub fn try_new_extended(address: u32, payload: &[u8]) -> Result<Self> {
        check(address, EXTENDED_ADDRESS_MASK, payload)?;
        Ok(Self::new_extended(address, payload))
    }

    fn build(extended: bool, address: u32, payload: &[u8]) -> Self {
        let len = payload.len().min(MAX_DATA_LENGTH);
        let mut data = [0u8; MAX_DATA_LENGTH];
        data[..len].copy_from_slice(&payload[..len]);
        Self {
            extended,
            remote_request: false,
            data_length: len as u8,
            address,
            data,
        }
    }

    /// Rebuild a message from the record fields, enforcing the invariants.
    pub(crate) fn from_parts(flags: u8, address: u32, data: [u8; MAX_DATA_LENGTH]) -> Result<Self> {
        let data_length = (flags >> DLC_SHIFT) & DLC_MASK;
        if data_length as usize > MAX_DATA_LENGTH {
            return Err(FrameError::InvalidDataLength(data_length));
        }

        let extended = flags & FLAG_EXTENDED != 0;
        let mask = if extended {
            EXTENDED_ADDRESS_MASK
        } else {
            STANDARD_ADDRESS_MASK
        };

        let mut message = Self::build(extended, address & mask, &data[..data_length as usize]);
        message.remote_request = flags & FLAG_REMOTE_REQUEST != 0;
        Ok(message)
    }

    /// True iff the address is 29 bits.
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Whether the RTR bit is set. Rarely used.
    pub fn is_remote_request(&self) -> bool {
        self.remote_request
    }

    /// Set the RTR bit. There is no way to clear it again.
    pub fn set_remote_request(&mut self) {
        self.remote_request = true;
    }

    /// Data length code, 0..=8.
    pub fn data_length(&self) -> usize {
        self.data_length as usize
    }

    /// CAN address, already masked to 10 or 29 bits.
    pub fn address(&self) -> u32 {
        self.address
    }

    /// The valid payload bytes (exactly `data_length` of them).
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.data_length()]
    }

    /// The full zero-padded 8-byte payload buffer.
    pub fn padded_payload(&self) -> &[u8; MAX_DATA_LENGTH] {
        &self.data
    }

    /// Flags byte: bit 0 extended, bit 1 RTR, bits 2..6 data length.
    pub fn flags(&self) -> u8 {
        let mut flags = self.data_length << DLC_SHIFT;
        if self.extended {
            flags |= FLAG_EXTENDED;
        }
        if self.remote_request {
            flags |= FLAG_REMOTE_REQUEST;
        }
        flags
    }
}

fn check(address: u32, mask: u32, payload: &[u8]) -> Result<()> {
    if address & !mask != 0 {
        return Err(FrameError::AddressOutOfRange { address, max: mask });
    }
    if payload.len() > MAX_DATA_LENGTH {
        return Err(FrameError::PayloadTooLong { len: payload.len() });
    }
    Ok(())
}

impl fmt::Display for CanMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Widths follow the vendor tool output: 3 digits extended, 8 standard.
        if self.extended {
            write!(f, "{:03x}:", self.address)?;
        } else {
            write!(f, "{:08x}:", self.address)?;
        }
        for (i, byte) in self.payload().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
