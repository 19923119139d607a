//! Serial port access for the door controller.

use std::{
    io::Write,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use presence_bridge_core::{DeviceError, DeviceSink};
use serialport::{SerialPort, SerialPortInfo};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::lines::read_lines;

/// Read timeout on the port. Only bounds how long the reader thread waits
/// before checking whether anyone is still listening.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Stream of lines read from the device.
pub type DeviceLines = UnboundedReceiverStream<std::io::Result<String>>;

/// Serial transport error.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("Failed to open serial port {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },
    #[error("Failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM6`.
    pub path: String,
    /// Baud rate.
    pub baud_rate: u32,
}

impl SerialConfig {
    /// Create a new config.
    #[must_use]
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

/// Write half of an open serial port.
#[derive(Clone)]
pub struct SerialDevice {
    port: Arc<Mutex<Box<dyn SerialPort>>>,
}

/// Open the port and start reading lines from it.
///
/// Reading happens on a dedicated thread; lines arrive on the returned
/// stream, which ends when the port reports EOF or a hard error.
///
/// # Errors
/// Returns error if the port cannot be opened or its handle cloned.
pub fn open(config: &SerialConfig) -> Result<(SerialDevice, DeviceLines), SerialError> {
    let open_error = |source| SerialError::Open {
        path: config.path.clone(),
        source,
    };

    let port = serialport::new(&config.path, config.baud_rate)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(open_error)?;
    let reader = port.try_clone().map_err(open_error)?;

    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("serial-reader".into())
        .spawn(move || read_lines(reader, &tx))?;

    tracing::info!("Serial port open on {} @ {} baud", config.path, config.baud_rate);

    let device = SerialDevice {
        port: Arc::new(Mutex::new(port)),
    };
    Ok((device, UnboundedReceiverStream::new(rx)))
}

#[async_trait]
impl DeviceSink for SerialDevice {
    async fn send_line(&self, line: &str) -> Result<(), DeviceError> {
        let port = Arc::clone(&self.port);
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');

        tokio::task::spawn_blocking(move || -> Result<(), DeviceError> {
            let mut port = port.lock().map_err(|_| DeviceError::Poisoned)?;
            port.write_all(&data)?;
            port.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| DeviceError::Io(std::io::Error::other(e)))?
    }
}

/// List serial ports visible on this machine.
///
/// # Errors
/// Returns error if the platform enumeration fails.
pub fn available_ports() -> Result<Vec<SerialPortInfo>, SerialError> {
    serialport::available_ports().map_err(SerialError::Enumerate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_reports_path() {
        let config = SerialConfig::new("/dev/presence-bridge-does-not-exist", 9600);

        let Err(err) = open(&config) else {
            panic!("opening a missing port should fail");
        };

        assert!(matches!(err, SerialError::Open { ref path, .. } if path == &config.path));
        assert!(err.to_string().contains("/dev/presence-bridge-does-not-exist"));
    }
}
