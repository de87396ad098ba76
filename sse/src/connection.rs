use dashmap::DashMap;
use events::Message;
use log::*;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Sending half of one subscriber's stream.
pub type Sender = UnboundedSender<Message>;

/// Unique identifier for a connection (server-generated). Doubles as the
/// handle used to unregister the subscriber later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Live set of subscriber streams, keyed by connection id.
///
/// `register` and `unregister` are O(1). `broadcast` snapshots the current
/// senders and writes to each of them, so it never holds a map lock while
/// delivering. Broadcasts themselves are serialized, which keeps the relative
/// order of messages identical for every subscriber.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Sender>,
    broadcast_lock: Mutex<()>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            broadcast_lock: Mutex::new(()),
        }
    }

    /// Register a new connection - O(1)
    pub fn register(&self, sender: Sender) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.connections.insert(connection_id.clone(), sender);
        connection_id
    }

    /// Unregister a connection - O(1). Returns `false` if it was already gone.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        self.connections.remove(connection_id).is_some()
    }

    /// Drops every connection, ending all subscriber streams. Returns how many were open.
    pub fn clear(&self) -> usize {
        let _serialized = self
            .broadcast_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = self.connections.len();
        self.connections.clear();
        count
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Broadcast message to all connections - O(n).
    ///
    /// Returns how many subscribers the message was handed to. A subscriber
    /// whose stream is already closed is dropped from the registry; it never
    /// stops delivery to the others.
    pub fn broadcast(&self, message: &Message) -> usize {
        let _serialized = self
            .broadcast_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let snapshot: Vec<(ConnectionId, Sender)> = self
            .connections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut delivered = 0;
        for (connection_id, sender) in snapshot {
            match sender.send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        "Failed to send broadcast to connection {}: {}. Dropping connection.",
                        connection_id.as_str(),
                        e
                    );
                    self.unregister(&connection_id);
                }
            }
        }

        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};

    fn subscriber(registry: &ConnectionRegistry) -> (ConnectionId, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (registry.register(tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Message>) -> Vec<String> {
        let mut seen = Vec::new();
        while let Ok(message) = rx.try_recv() {
            seen.push(message.as_text().into_owned());
        }
        seen
    }

    #[test]
    fn test_broadcast_reaches_every_registered_subscriber() {
        let registry = ConnectionRegistry::new();
        let (_a, mut rx_a) = subscriber(&registry);
        let (_b, mut rx_b) = subscriber(&registry);

        assert_eq!(registry.broadcast(&Message::from("hello")), 2);

        assert_eq!(drain(&mut rx_a), vec!["hello"]);
        assert_eq!(drain(&mut rx_b), vec!["hello"]);
    }

    #[test]
    fn test_unregistered_subscriber_receives_nothing() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = subscriber(&registry);

        assert!(registry.unregister(&a));
        assert_eq!(registry.broadcast(&Message::from("x")), 0);

        assert_eq!(rx_a.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn test_unregister_twice_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = subscriber(&registry);
        let (_b, mut rx_b) = subscriber(&registry);

        assert!(registry.unregister(&a));
        assert!(!registry.unregister(&a));
        assert_eq!(registry.len(), 1);

        registry.broadcast(&Message::from("still here"));
        assert_eq!(drain(&mut rx_b), vec!["still here"]);
    }

    #[test]
    fn test_failed_write_drops_only_the_failing_subscriber() {
        let registry = ConnectionRegistry::new();
        let (a, rx_a) = subscriber(&registry);
        let (b, mut rx_b) = subscriber(&registry);

        // A's client went away: its receiving half is gone.
        drop(rx_a);

        assert_eq!(registry.broadcast(&Message::from("y")), 1);
        assert!(!registry.contains(&a));
        assert!(registry.contains(&b));

        assert_eq!(registry.broadcast(&Message::from("z")), 1);
        assert_eq!(drain(&mut rx_b), vec!["y", "z"]);
    }

    #[test]
    fn test_broadcast_with_no_subscribers_is_a_no_op() {
        let registry = ConnectionRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.broadcast(&Message::from("nobody listening")), 0);
    }

    #[test]
    fn test_clear_disconnects_every_subscriber() {
        let registry = ConnectionRegistry::new();
        let (_a, mut rx_a) = subscriber(&registry);
        let (_b, mut rx_b) = subscriber(&registry);

        assert_eq!(registry.clear(), 2);

        assert!(registry.is_empty());
        assert_eq!(rx_a.try_recv(), Err(TryRecvError::Disconnected));
        assert_eq!(rx_b.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn test_each_register_creates_a_distinct_entry() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let first = registry.register(tx.clone());
        let second = registry.register(tx);

        assert_ne!(first, second);
        assert_eq!(registry.broadcast(&Message::from("twice")), 2);
        assert_eq!(drain(&mut rx), vec!["twice", "twice"]);
    }

    #[test]
    fn test_receivers_are_exactly_those_registered_when_broadcast_begins() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = subscriber(&registry);
        let (_b, mut rx_b) = subscriber(&registry);
        registry.unregister(&a);
        let (_c, mut rx_c) = subscriber(&registry);

        registry.broadcast(&Message::from("m"));
        let (_d, mut rx_d) = subscriber(&registry);

        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec!["m"]);
        assert_eq!(drain(&mut rx_c), vec!["m"]);
        assert!(drain(&mut rx_d).is_empty());
    }

    #[test]
    fn test_per_subscriber_order_follows_broadcast_order() {
        let registry = ConnectionRegistry::new();
        let (_a, mut rx_a) = subscriber(&registry);

        for i in 0..100 {
            registry.broadcast(&Message::from(i.to_string()));
        }

        let expected: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        assert_eq!(drain(&mut rx_a), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_broadcasts_keep_the_same_order_for_every_subscriber() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (_a, mut rx_a) = subscriber(&registry);
        let (_b, mut rx_b) = subscriber(&registry);

        let tasks: Vec<_> = (0..8)
            .map(|task| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    for i in 0..50 {
                        registry.broadcast(&Message::from(format!("{task}-{i}")));
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let seen_a = drain(&mut rx_a);
        let seen_b = drain(&mut rx_b);
        assert_eq!(seen_a.len(), 400);
        assert_eq!(seen_a, seen_b);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_register_and_unregister_race_with_broadcast() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (_steady, mut rx_steady) = subscriber(&registry);

        let churn = {
            let registry = registry.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let (tx, rx) = mpsc::unbounded_channel();
                    let id = registry.register(tx);
                    drop(rx);
                    registry.unregister(&id);
                    tokio::task::yield_now().await;
                }
            })
        };
        let sender = {
            let registry = registry.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    registry.broadcast(&Message::from(i.to_string()));
                    tokio::task::yield_now().await;
                }
            })
        };
        churn.await.unwrap();
        sender.await.unwrap();

        assert_eq!(drain(&mut rx_steady).len(), 200);
        assert_eq!(registry.len(), 1);
    }
}
