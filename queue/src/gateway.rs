use crate::error::Error;
use async_trait::async_trait;
use events::Message;
use futures::stream::BoxStream;

/// Deliveries for the single consumer of a gateway, in queue order.
pub type DeliveryStream = BoxStream<'static, Result<Delivery, Error>>;

/// Owns the connection to the message broker.
#[async_trait]
pub trait QueueGateway: Send + Sync {
    /// Name of the queue this gateway publishes to and consumes from.
    fn queue_name(&self) -> &str;

    /// Publish one payload to the queue.
    async fn publish(&self, payload: &[u8]) -> Result<(), Error>;

    /// Start consuming. A gateway has exactly one consumer: calling this a
    /// second time fails with [`ErrorKind::Consume`](crate::error::ErrorKind::Consume).
    async fn consume(&self) -> Result<DeliveryStream, Error>;

    /// Close the broker connection.
    async fn close(&self) -> Result<(), Error>;
}

/// Settles one delivery with the broker.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// The message was processed; the broker may forget it.
    async fn ack(&self) -> Result<(), Error>;

    /// The message was not processed; the broker requeues it for redelivery.
    async fn reject(&self) -> Result<(), Error>;
}

/// A consumed message together with the capability to settle it. Settling
/// consumes the delivery, so each one is acknowledged or rejected at most once.
pub struct Delivery {
    message: Message,
    acker: Box<dyn Acknowledger>,
}

impl Delivery {
    pub fn new(message: Message, acker: impl Acknowledger + 'static) -> Self {
        Self {
            message,
            acker: Box::new(acker),
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub async fn ack(self) -> Result<(), Error> {
        self.acker.ack().await
    }

    pub async fn reject(self) -> Result<(), Error> {
        self.acker.reject().await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}
