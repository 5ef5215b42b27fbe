//! Character-device transport for EMUC serial CAN adapters.
//!
//! The adapter shows up as a serial character device (`/dev/ttyUSB0`,
//! `/dev/ttyACM0`, ...). This crate opens that path for reading and writing
//! and lets callers split the handle so a reader thread and a writer thread
//! can each own one half.
//!
//! Line discipline, baud rate and raw mode are left to the operating system
//! (`stty`, udev rules); nothing here touches termios.

pub mod device;
pub mod error;

pub use device::SerialDevice;
pub use error::{Result, TransportError};

#[cfg(feature = "async")]
pub use device::open_async;
