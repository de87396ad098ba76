use crate::connection::{ConnectionId, ConnectionRegistry};
use events::Message;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Open a new subscriber stream. The subscriber stays registered until the
    /// returned [`Subscription`] is dropped.
    pub fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::unbounded_channel();
        let connection_id = self.registry.register(tx);
        info!(
            "Registered new SSE connection {} ({} open)",
            connection_id.as_str(),
            self.registry.len()
        );

        Subscription {
            receiver,
            guard: ConnectionGuard {
                registry: Arc::clone(&self.registry),
                connection_id,
            },
        }
    }

    /// Unregister a connection by ID. Unknown or already removed IDs are ignored.
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        if self.registry.unregister(connection_id) {
            info!("Unregistered SSE connection {}", connection_id.as_str());
        }
    }

    /// Send a message to every open connection, returning how many received it.
    pub fn broadcast(&self, message: &Message) -> usize {
        let delivered = self.registry.broadcast(message);
        debug!("Broadcast message to {delivered} SSE connection(s)");
        delivered
    }

    /// Close every open connection, e.g. on server shutdown.
    pub fn disconnect_all(&self) {
        let closed = self.registry.clear();
        info!("Closed {closed} SSE connection(s)");
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the broadcast stream.
pub struct Subscription {
    receiver: UnboundedReceiver<Message>,
    guard: ConnectionGuard,
}

impl Subscription {
    pub fn id(&self) -> &ConnectionId {
        &self.guard.connection_id
    }

    /// Waits for the next broadcast message. Returns `None` once the registry
    /// has dropped this subscriber.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}

/// Removes the connection from the registry when the subscriber goes away,
/// whether the client disconnected, the network failed, or the server is
/// shutting down.
struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    connection_id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.registry.unregister(&self.connection_id) {
            debug!(
                "SSE connection {} closed, unregistered",
                self.connection_id.as_str()
            );
        }
    }
}
