//! Registry of connected clients for broadcast fan-out.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Client connection identifier.
pub type ClientId = Uuid;

/// Registry error.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Client not found: {0}")]
    UnknownClient(ClientId),
    #[error("Client disconnected: {0}")]
    Disconnected(ClientId),
}

/// Explicit set of connected clients.
///
/// Each client owns an ordered outbound queue, so delivery to a single
/// client is FIFO. Clients whose queue has gone away are pruned on the next
/// broadcast.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, mpsc::UnboundedSender<String>>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client.
    ///
    /// Returns the client's id and the receiving end of its outbound queue.
    pub async fn register(&self) -> (ClientId, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.write().await.insert(id, tx);
        (id, rx)
    }

    /// Remove a client. Returns whether it was registered.
    pub async fn remove(&self, id: ClientId) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    /// Deliver a message to every registered client.
    ///
    /// Returns how many clients accepted the message.
    pub async fn broadcast(&self, msg: &str) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        {
            let clients = self.clients.read().await;
            for (id, tx) in clients.iter() {
                if tx.send(msg.to_string()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut clients = self.clients.write().await;
            for id in dead {
                clients.remove(&id);
                tracing::debug!(client_id = %id, "Pruned closed client");
            }
        }

        delivered
    }

    /// Deliver a message to a single client.
    ///
    /// # Errors
    /// Returns error if the client is unknown or its queue is closed.
    pub async fn send_to(&self, id: ClientId, msg: &str) -> Result<(), RegistryError> {
        let clients = self.clients.read().await;
        let tx = clients.get(&id).ok_or(RegistryError::UnknownClient(id))?;
        tx.send(msg.to_string())
            .map_err(|_| RegistryError::Disconnected(id))
    }

    /// Number of registered clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether no client is registered.
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_every_client() {
        let registry = ClientRegistry::new();
        let (_a, mut rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;

        assert_eq!(registry.broadcast("DOOR_OPENED").await, 2);

        assert_eq!(rx_a.recv().await.as_deref(), Some("DOOR_OPENED"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("DOOR_OPENED"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_per_client_order_is_preserved() {
        let registry = ClientRegistry::new();
        let (_id, mut rx) = registry.register().await;

        for line in ["COUNT:1", "COUNT:2", "COUNT:3"] {
            registry.broadcast(line).await;
        }

        assert_eq!(rx.recv().await.as_deref(), Some("COUNT:1"));
        assert_eq!(rx.recv().await.as_deref(), Some("COUNT:2"));
        assert_eq!(rx.recv().await.as_deref(), Some("COUNT:3"));
    }

    #[tokio::test]
    async fn test_remove_does_not_affect_others() {
        let registry = ClientRegistry::new();
        let (a, _rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;

        assert!(registry.remove(a).await);
        assert!(!registry.remove(a).await);
        assert_eq!(registry.len().await, 1);

        assert_eq!(registry.broadcast("FULL").await, 1);
        assert_eq!(rx_b.recv().await.as_deref(), Some("FULL"));
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let registry = ClientRegistry::new();
        let (_a, rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;
        drop(rx_a);

        assert_eq!(registry.broadcast("EMPTY").await, 1);
        assert_eq!(registry.len().await, 1);
        assert_eq!(rx_b.recv().await.as_deref(), Some("EMPTY"));
    }

    #[tokio::test]
    async fn test_send_to_one() {
        let registry = ClientRegistry::new();
        let (a, mut rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;

        registry.send_to(a, "hello").await.unwrap();
        assert_eq!(rx_a.recv().await.as_deref(), Some("hello"));
        assert!(rx_b.try_recv().is_err());

        let missing = Uuid::new_v4();
        assert!(matches!(
            registry.send_to(missing, "hello").await,
            Err(RegistryError::UnknownClient(id)) if id == missing
        ));

        drop(rx_a);
        assert!(matches!(
            registry.send_to(a, "again").await,
            Err(RegistryError::Disconnected(_))
        ));
        assert!(!registry.is_empty().await);
    }
}
