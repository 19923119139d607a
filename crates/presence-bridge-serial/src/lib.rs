//! Serial line transport for the door controller.
//!
//! Provides:
//! - `SerialDevice` - Newline-terminated writes to the port
//! - `open` - Open the port and start the background line reader
//! - Port enumeration for diagnostics

mod lines;
pub mod port;

pub use port::{DeviceLines, SerialConfig, SerialDevice, SerialError, available_ports, open};
