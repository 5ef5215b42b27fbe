//! Adapter CAN ports.
//!
//! The adapter has two CAN ports. Commands can target either one or both,
//! and received messages report which port they arrived on.

use std::fmt;

/// Which of the two (or both) CAN ports a message uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// CAN port 1 (wire value 1).
    One,
    /// CAN port 2 (wire value 2).
    Two,
    /// Both ports (wire value 3).
    Both,
    /// Any other wire value, passed through untouched.
    Other(u8),
}

impl Port {
    /// The single byte carried on the wire.
    pub fn as_u8(self) -> u8 {
        match self {
            Port::One => 1,
            Port::Two => 2,
            Port::Both => 3,
            Port::Other(v) => v,
        }
    }

    /// Returns true for 1, 2 and 3.
    pub fn is_known(self) -> bool {
        !matches!(self, Port::Other(_))
    }
}

impl From<u8> for Port {
    fn from(value: u8) -> Self {
        match value {
            1 => Port::One,
            2 => Port::Two,
            3 => Port::Both,
            other => Port::Other(other),
        }
    }
}

impl From<Port> for u8 {
    fn from(port: Port) -> Self {
        port.as_u8()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::One => f.write_str("1"),
            Port::Two => f.write_str("2"),
            Port::Both => f.write_str("12"),
            Port::Other(v) => write!(f, "{v}"),
        }
    }
}
