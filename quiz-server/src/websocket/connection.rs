use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use quiz_types::ServerMessage;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Opaque per-socket identifier, never reused across connects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a message never reached its socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    UnknownConnection,
    ChannelClosed,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::UnknownConnection => write!(f, "connection not registered"),
            DeliveryError::ChannelClosed => write!(f, "outgoing channel closed"),
        }
    }
}

struct Registered {
    sender: mpsc::UnboundedSender<ServerMessage>,
    last_activity: Instant,
}

/// Registry of live sockets keyed by connection id.
///
/// Each registration owns the sending half of an unbounded channel; the
/// socket task drains the receiving half. Activity timestamps feed the
/// periodic cleanup sweep.
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Registered>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new socket and hands back its id and outgoing channel
    pub async fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = ConnectionId::new();
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut connections = self.connections.write().await;
        connections.insert(
            id,
            Registered {
                sender,
                last_activity: Instant::now(),
            },
        );

        (id, receiver)
    }

    pub async fn unregister(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        connections.remove(&id);
    }

    /// Marks the connection as active now
    pub async fn touch(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(registered) = connections.get_mut(&id) {
            registered.last_activity = Instant::now();
        }
    }

    /// Outgoing channel for a connection, for handlers that push directly
    pub async fn sender(&self, id: ConnectionId) -> Option<mpsc::UnboundedSender<ServerMessage>> {
        let connections = self.connections.read().await;
        connections.get(&id).map(|registered| registered.sender.clone())
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), DeliveryError> {
        let connections = self.connections.read().await;
        let registered = connections
            .get(&id)
            .ok_or(DeliveryError::UnknownConnection)?;
        registered
            .sender
            .send(message)
            .map_err(|_| DeliveryError::ChannelClosed)
    }

    /// Drops every connection idle past the timeout and reports which ids
    /// went, so their sessions can be torn down too
    pub async fn cleanup_inactive_connections(&self, timeout: Duration) -> Vec<ConnectionId> {
        let mut removed = Vec::new();
        let mut connections = self.connections.write().await;
        connections.retain(|id, registered| {
            if registered.last_activity.elapsed() > timeout {
                tracing::info!("Removing inactive connection: {}", id);
                removed.push(*id);
                false
            } else {
                true
            }
        });
        removed
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe() -> ServerMessage {
        ServerMessage::Error {
            message: "probe".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_unregister() {
        let manager = ConnectionManager::new();

        let (first, _rx1) = manager.register().await;
        let (second, _rx2) = manager.register().await;
        assert_ne!(first, second);
        assert_eq!(manager.connection_count().await, 2);

        manager.unregister(first).await;
        assert_eq!(manager.connection_count().await, 1);
        assert!(manager.sender(first).await.is_none());
        assert!(manager.sender(second).await.is_some());
    }

    #[tokio::test]
    async fn test_send_reaches_the_registered_receiver() {
        let manager = ConnectionManager::new();
        let (id, mut receiver) = manager.register().await;

        manager.send_to_connection(id, probe()).await.unwrap();

        assert!(matches!(
            receiver.try_recv(),
            Ok(ServerMessage::Error { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection() {
        let manager = ConnectionManager::new();

        let result = manager.send_to_connection(ConnectionId::new(), probe()).await;
        assert_eq!(result, Err(DeliveryError::UnknownConnection));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let manager = ConnectionManager::new();
        let (id, receiver) = manager.register().await;
        drop(receiver);

        let result = manager.send_to_connection(id, probe()).await;
        assert_eq!(result, Err(DeliveryError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_cleanup_spares_recently_touched_connections() {
        let manager = ConnectionManager::new();
        let (idle, _rx1) = manager.register().await;
        let (busy, _rx2) = manager.register().await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.touch(busy).await;

        let removed = manager
            .cleanup_inactive_connections(Duration::from_millis(10))
            .await;

        assert_eq!(removed, vec![idle]);
        assert_eq!(manager.connection_count().await, 1);
        assert!(manager.sender(busy).await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_registration_is_consistent() {
        let manager = std::sync::Arc::new(ConnectionManager::new());

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    let (id, _rx) = manager.register().await;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    manager.touch(id).await;
                    manager.unregister(id).await;
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(manager.connection_count().await, 0);
    }
}
