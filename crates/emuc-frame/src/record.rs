//! Fixed-size binary record carried inside `<` and `=` lines.
//!
//! ```text
//! ┌──────────┬──────────┬──────────────────┬──────────────────────┐
//! │ Port (1) │ Flags(1) │ Address (4B BE)  │ Payload (8, padded)  │
//! └──────────┴──────────┴──────────────────┴──────────────────────┘
//! ```

use bytes::{Buf, BufMut};

use crate::error::{FrameError, Result};
use crate::message::{CanMessage, MAX_DATA_LENGTH};
use crate::port::Port;

/// Record size: port (1) + flags (1) + address (4) + payload (8).
pub const RECORD_SIZE: usize = 14;

/// Pack a port and message into the 14-byte wire record.
pub fn pack_record(port: Port, message: &CanMessage) -> [u8; RECORD_SIZE] {
    let mut record = [0u8; RECORD_SIZE];
    let mut dst = &mut record[..];
    dst.put_u8(port.as_u8());
    dst.put_u8(message.flags());
    dst.put_u32(message.address());
    dst.put_slice(message.padded_payload());
    debug_assert!(dst.is_empty());
    record
}

/// Unpack a 14-byte wire record.
pub fn unpack_record(bytes: &[u8]) -> Result<(Port, CanMessage)> {
    if bytes.len() != RECORD_SIZE {
        return Err(FrameError::MalformedRecord {
            expected: RECORD_SIZE,
            actual: bytes.len(),
        });
    }

    let mut src = bytes;
    let port = Port::from(src.get_u8());
    let flags = src.get_u8();
    let address = src.get_u32();
    let mut data = [0u8; MAX_DATA_LENGTH];
    src.copy_to_slice(&mut data);

    let message = CanMessage::from_parts(flags, address, data)?;
    Ok((port, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_standard_message_on_port_one() {
        let msg = CanMessage::new(0x123, &[0xDE, 0xAD]);
        let record = pack_record(Port::One, &msg);
        assert_eq!(
            record,
            [0x01, 0x08, 0x00, 0x00, 0x01, 0x23, 0xDE, 0xAD, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn packs_extended_address_big_endian() {
        let mut msg = CanMessage::new_extended(0x1ABC_DEF0, &[0x11; 8]);
        msg.set_remote_request();
        let record = pack_record(Port::Both, &msg);
        assert_eq!(record[0], 0x03);
        assert_eq!(record[1], (8 << 2) | 0b11);
        assert_eq!(&record[2..6], &[0x1A, 0xBC, 0xDE, 0xF0]);
        assert_eq!(&record[6..], &[0x11; 8]);
    }

    #[test]
    fn roundtrip_every_length_and_port() {
        let ports = [Port::One, Port::Two, Port::Both, Port::Other(0x7F)];
        let payload = [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7];

        for port in ports {
            for len in 0..=MAX_DATA_LENGTH {
                let standard = CanMessage::new(0x3FF, &payload[..len]);
                let extended = CanMessage::new_extended(0x1FFF_FFFF, &payload[..len]);
                for msg in [standard, extended] {
                    let (p, m) = unpack_record(&pack_record(port, &msg)).unwrap();
                    assert_eq!(p, port);
                    assert_eq!(m, msg);
                }
            }
        }
    }

    #[test]
    fn unpack_rejects_wrong_size() {
        let err = unpack_record(&[0u8; 13]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::MalformedRecord {
                expected: 14,
                actual: 13
            }
        ));

        let err = unpack_record(&[0u8; 15]).unwrap_err();
        assert!(matches!(err, FrameError::MalformedRecord { actual: 15, .. }));
    }

    #[test]
    fn unpack_masks_high_address_bits_and_padding() {
        let record = [
            0x02, 0x04, 0xFF, 0xFF, 0xFF, 0xFF, 0x55, 0x66, 0x77, 0, 0, 0, 0, 0x99,
        ];
        let (port, msg) = unpack_record(&record).unwrap();
        assert_eq!(port, Port::Two);
        assert!(!msg.is_extended());
        assert_eq!(msg.address(), 0x3FF);
        assert_eq!(msg.payload(), &[0x55]);
        assert_eq!(msg.padded_payload(), &[0x55, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn unpack_rejects_dlc_above_eight() {
        let mut record = pack_record(Port::One, &CanMessage::new(1, &[]));
        record[1] = 12 << 2;
        let err = unpack_record(&record).unwrap_err();
        assert!(matches!(err, FrameError::InvalidDataLength(12)));
    }
}
