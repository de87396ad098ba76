//! Message plumbing between the queue consumer and whatever reacts to
//! consumed messages.
//!
//! # Architecture
//!
//! - **Message**: an opaque payload that flows submission → queue → handlers.
//!   It is never mutated, only forwarded.
//! - **MessageHandler**: trait for anything that reacts to a consumed message
//!   (the SSE broadcaster is the only one in this process).
//! - **Dispatcher**: hands a consumed message to every registered handler.
//!
//! This crate has no dependencies on other internal crates so the queue and
//! SSE crates can both depend on it without depending on each other.

pub mod error;

use async_trait::async_trait;
use log::*;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

pub use error::{Error, ErrorKind};

/// An opaque payload with no required schema.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    payload: Arc<[u8]>,
}

impl Message {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Arc::from(payload.into()),
        }
    }

    /// The payload as text. Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Message").field(&self.as_text()).finish()
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl From<Vec<u8>> for Message {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

/// Trait for reacting to consumed messages.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes one message. Returning an error leaves the message
    /// unacknowledged so the broker delivers it again.
    async fn handle(&self, message: &Message) -> Result<(), Error>;
}

/// Hands consumed messages to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<Vec<Arc<dyn MessageHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new message handler.
    /// Note: This creates a new dispatcher instance with the additional handler.
    pub fn with_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch a message to all registered handlers.
    /// Stops at the first handler error so the message can be redelivered as a whole.
    pub async fn dispatch(&self, message: &Message) -> Result<(), Error> {
        if self.handlers.is_empty() {
            warn!("Dispatching message with no registered handlers, it will be dropped");
        }

        for handler in self.handlers.iter() {
            handler.handle(message).await?;
        }

        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&self, message: &Message) -> Result<(), Error> {
            self.seen.lock().unwrap().push(message.as_text().into_owned());
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl MessageHandler for AlwaysFails {
        async fn handle(&self, _message: &Message) -> Result<(), Error> {
            Err(Error::new(ErrorKind::Undeliverable))
        }
    }

    #[test]
    fn test_message_text_is_lossy_for_invalid_utf8() {
        let message = Message::new(vec![b'o', b'k', 0xff]);
        assert_eq!(message.as_text(), "ok\u{fffd}");
        assert_eq!(message.len(), 3);
    }

    #[test]
    fn test_message_debug_shows_text() {
        assert_eq!(format!("{:?}", Message::from("order-42")), "Message(\"order-42\")");
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_handler_in_order() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new()
            .with_handler(first.clone())
            .with_handler(second.clone());

        dispatcher.dispatch(&Message::from("a")).await.unwrap();
        dispatcher.dispatch(&Message::from("b")).await.unwrap();

        assert_eq!(*first.seen.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(*second.seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_dispatch_stops_at_first_failing_handler() {
        let after = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new()
            .with_handler(Arc::new(AlwaysFails))
            .with_handler(after.clone());

        let err = dispatcher.dispatch(&Message::from("x")).await.unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::Undeliverable);
        assert!(after.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_without_handlers_is_ok() {
        let dispatcher = Dispatcher::default();
        assert_eq!(dispatcher.handler_count(), 0);
        assert!(dispatcher.dispatch(&Message::from("nobody")).await.is_ok());
    }

    #[test]
    fn test_with_handler_leaves_original_dispatcher_untouched() {
        let base = Dispatcher::new();
        let extended = base.clone().with_handler(Arc::new(AlwaysFails));
        assert_eq!(base.handler_count(), 0);
        assert_eq!(extended.handler_count(), 1);
    }
}
