//! Device-bound line writes.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// Device write error.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device closed")]
    Closed,
    #[error("Device handle poisoned")]
    Poisoned,
}

/// Something that accepts lines for the door controller.
///
/// Implementations append the newline terminator themselves; callers pass
/// the bare line.
#[async_trait]
pub trait DeviceSink: Send + Sync {
    /// Write one line to the device.
    async fn send_line(&self, line: &str) -> Result<(), DeviceError>;
}

#[async_trait]
impl<T: DeviceSink + ?Sized> DeviceSink for Arc<T> {
    async fn send_line(&self, line: &str) -> Result<(), DeviceError> {
        (**self).send_line(line).await
    }
}

/// Newline-terminating writer over any async byte sink.
#[derive(Clone)]
pub struct LineWriter {
    writer: Arc<Mutex<BufWriter<Box<dyn AsyncWrite + Send + Unpin>>>>,
}

impl LineWriter {
    /// Create a new line writer.
    #[must_use]
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(BufWriter::new(Box::new(writer)))),
        }
    }
}

#[async_trait]
impl DeviceSink for LineWriter {
    async fn send_line(&self, line: &str) -> Result<(), DeviceError> {
        let mut guard = self.writer.lock().await;
        guard.write_all(line.as_bytes()).await?;
        guard.write_all(b"\n").await?;
        guard.flush().await?;
        Ok(())
    }
}
