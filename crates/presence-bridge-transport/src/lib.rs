//! Client channel for the presence bridge.
//!
//! Provides:
//! - WebSocket transport (feature: websocket)

#[cfg(feature = "websocket")]
pub mod websocket;

#[cfg(feature = "websocket")]
pub use websocket::{create_ws_router, ws_handler};
