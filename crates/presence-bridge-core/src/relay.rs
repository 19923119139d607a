//! Relay between the door controller and its clients.

use std::sync::Arc;

use futures::StreamExt;

use crate::{
    ClientCommand, ClientRegistry, DeviceSink, OccupancyState,
    command::{MAX_PREFIX, RESET},
};

/// Prefix of the door-open command written after a max increase.
pub const OPEN_DOOR_PREFIX: &str = "OPEN_DOOR:";

/// Relay core.
///
/// Interprets client commands into device writes and fans every device line
/// out to all registered clients. Owns the max occupancy count.
pub struct Relay<D> {
    device: D,
    occupancy: OccupancyState,
    clients: Arc<ClientRegistry>,
}

impl<D> Relay<D>
where
    D: DeviceSink,
{
    /// Create a new relay.
    #[must_use]
    pub fn new(device: D, clients: Arc<ClientRegistry>, initial_max: u32) -> Self {
        Self {
            device,
            occupancy: OccupancyState::new(initial_max),
            clients,
        }
    }

    /// The client registry broadcasts go to.
    #[must_use]
    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    /// Current max occupancy count.
    pub async fn current_max_count(&self) -> u32 {
        self.occupancy.current().await
    }

    /// Handle one message from a client.
    ///
    /// Nothing is sent back to the client. Malformed `MAX:` commands are
    /// dropped, and device write failures are logged without touching state.
    pub async fn handle_client_message(&self, raw: &str) {
        let command = match ClientCommand::parse(raw) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(raw = %raw.trim(), "Ignoring command: {e}");
                return;
            }
        };

        match command {
            ClientCommand::SetMax(new_max) => {
                // Held across both writes so concurrent MAX commands neither
                // lose updates nor interleave their MAX/OPEN_DOOR pairs.
                let mut occupancy = self.occupancy.lock().await;
                let update = occupancy.apply(new_max);
                tracing::info!(
                    previous = update.previous,
                    current = update.current,
                    "Updated max count"
                );

                self.write(&format!("{MAX_PREFIX}{}", update.current)).await;

                if let Some(added) = update.door_openings() {
                    tracing::info!(added, "Opening door for additional entries");
                    self.write(&format!("{OPEN_DOOR_PREFIX}{added}")).await;
                }
            }
            ClientCommand::Reset => {
                tracing::info!("Forwarding reset to device");
                self.write(RESET).await;
            }
            ClientCommand::Other(line) => {
                self.write(&line).await;
            }
        }
    }

    /// Forward one device line to every client.
    ///
    /// Returns how many clients received it.
    pub async fn handle_device_line(&self, line: &str) -> usize {
        let msg = line.trim();
        tracing::info!(line = %msg, "From device");
        self.clients.broadcast(msg).await
    }

    async fn write(&self, line: &str) -> bool {
        match self.device.send_line(line).await {
            Ok(()) => {
                tracing::info!(line = %line, "To device");
                true
            }
            Err(e) => {
                tracing::error!(line = %line, "Failed to write to device: {e}");
                false
            }
        }
    }
}

impl<D> Relay<D>
where
    D: DeviceSink + 'static,
{
    /// Forward a stream of device lines to all clients.
    ///
    /// Read errors are logged and skipped; the task ends with the stream.
    pub fn spawn_device_forwarder<S, E>(self: Arc<Self>, stream: S) -> tokio::task::JoinHandle<()>
    where
        S: futures::Stream<Item = Result<String, E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        tokio::spawn(async move {
            tokio::pin!(stream);

            while let Some(next) = stream.next().await {
                match next {
                    Ok(line) => {
                        self.handle_device_line(&line).await;
                    }
                    Err(e) => tracing::error!("Device read error: {e}"),
                }
            }

            tracing::warn!("Device stream ended");
        })
    }
}
