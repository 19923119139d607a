//! Relay core for the presence bridge.
//!
//! This crate provides the pieces that sit between the door controller and
//! its network clients:
//! - `ClientCommand` - Wire grammar for client commands
//! - `OccupancyState` - The shared max occupancy count
//! - `ClientRegistry` - Explicit registry of connected clients for fan-out
//! - `Relay` - Command interpretation and device line forwarding
//! - `DeviceSink` trait and `LineWriter` for newline-terminated device writes

pub mod command;
pub mod device;
pub mod occupancy;
pub mod registry;
pub mod relay;

pub use command::{ClientCommand, CommandError};
pub use device::{DeviceError, DeviceSink, LineWriter};
pub use occupancy::{DEFAULT_MAX_COUNT, MaxUpdate, OccupancyState};
pub use registry::{ClientId, ClientRegistry, RegistryError};
pub use relay::Relay;
