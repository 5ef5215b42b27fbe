//! Talk to EMUC serial CAN adapters.
//!
//! The adapter speaks a line-oriented ASCII-hex protocol over a serial
//! character device: set-speed and transmit commands go out, received CAN
//! messages and set-speed acknowledgements come back.
//!
//! # Crate Structure
//!
//! - [`transport`]: opening the adapter device and splitting it into halves
//! - [`frame`]: message model, binary record, line framing, stream decoder

/// Re-export transport types.
pub mod transport {
    pub use emuc_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use emuc_frame::*;
}
