use crate::error::Error;
use crate::gateway::{Delivery, QueueGateway};
use events::Dispatcher;
use futures::StreamExt;
use log::*;
use std::sync::Arc;

/// The queue's single consumer. Each delivery is dispatched to the message
/// handlers and then acknowledged; if any handler fails the delivery is
/// rejected so the broker redelivers it (at-least-once, duplicates possible).
pub struct Consumer {
    gateway: Arc<dyn QueueGateway>,
    dispatcher: Dispatcher,
}

impl Consumer {
    pub fn new(gateway: Arc<dyn QueueGateway>, dispatcher: Dispatcher) -> Self {
        Self {
            gateway,
            dispatcher,
        }
    }

    /// Consume until the delivery stream ends (`Ok`) or fails (`Err`).
    pub async fn run(self) -> Result<(), Error> {
        let mut deliveries = self.gateway.consume().await?;
        info!(
            "Waiting for messages on queue \"{}\"...",
            self.gateway.queue_name()
        );

        while let Some(delivery) = deliveries.next().await {
            self.process(delivery?).await;
        }

        warn!(
            "Delivery stream for queue \"{}\" ended",
            self.gateway.queue_name()
        );
        Ok(())
    }

    async fn process(&self, delivery: Delivery) {
        debug!("Received message: {:?}", delivery.message());

        match self.dispatcher.dispatch(delivery.message()).await {
            Ok(()) => {
                if let Err(e) = delivery.ack().await {
                    error!("Failed to acknowledge message: {e}");
                }
            }
            Err(e) => {
                error!("Failed to process message, rejecting for redelivery: {e}");
                if let Err(e) = delivery.reject().await {
                    error!("Failed to reject message: {e}");
                }
            }
        }
    }
}
