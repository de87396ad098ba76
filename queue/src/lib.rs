//! Queue Gateway: the process's only link to the message broker.
//!
//! - [`QueueGateway`] publishes payloads and hands out the delivery stream for
//!   the single consumer.
//! - [`Delivery`] pairs a consumed [`Message`](events::Message) with its
//!   acknowledge step, making redelivery-on-failure explicit.
//! - [`Consumer`] is the task that drains deliveries into an
//!   [`events::Dispatcher`] and settles each one.
//!
//! Two backends exist: [`AmqpGateway`] for a real broker and
//! [`MemoryGateway`] for running without one.

pub mod amqp;
pub mod consumer;
pub mod error;
pub mod gateway;
pub mod memory;

use log::*;
use service::config::{Config, QueueBackend};
use std::sync::Arc;

pub use amqp::AmqpGateway;
pub use consumer::Consumer;
pub use error::{Error, ErrorKind};
pub use gateway::{Acknowledger, Delivery, DeliveryStream, QueueGateway};
pub use memory::MemoryGateway;

/// Builds the gateway selected by `queue_backend`. For AMQP this connects,
/// opens the channel and declares the queue before returning.
pub async fn connect(config: &Config) -> Result<Arc<dyn QueueGateway>, Error> {
    match config.queue_backend {
        QueueBackend::Amqp => {
            info!("Connecting to AMQP broker...");
            let gateway = AmqpGateway::connect(config.amqp_url(), config.queue_name()).await?;
            Ok(Arc::new(gateway))
        }
        QueueBackend::Memory => {
            warn!("Using the in-memory queue, messages never leave this process");
            Ok(Arc::new(MemoryGateway::new(config.queue_name())))
        }
    }
}
