use crate::error::{Error, ErrorKind};
use crate::gateway::{Acknowledger, Delivery, DeliveryStream, QueueGateway};
use async_trait::async_trait;
use events::Message;
use futures::StreamExt;
use log::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// In-process Queue Gateway. FIFO, single consumer, rejected deliveries go
/// back to the tail of the queue. Only counters are kept once a message has
/// been handed to the consumer.
pub struct MemoryGateway {
    queue_name: String,
    sender: UnboundedSender<Message>,
    receiver: Mutex<Option<UnboundedReceiver<Message>>>,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    published: AtomicUsize,
    acked: AtomicUsize,
    rejected: AtomicUsize,
}

impl MemoryGateway {
    pub fn new(queue_name: &str) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            queue_name: queue_name.to_string(),
            sender,
            receiver: Mutex::new(Some(receiver)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// How many payloads [`QueueGateway::publish`] accepted. Redeliveries are not counted.
    pub fn published_count(&self) -> usize {
        self.counters.published.load(Ordering::SeqCst)
    }

    pub fn acked_count(&self) -> usize {
        self.counters.acked.load(Ordering::SeqCst)
    }

    pub fn rejected_count(&self) -> usize {
        self.counters.rejected.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl QueueGateway for MemoryGateway {
    fn queue_name(&self) -> &str {
        &self.queue_name
    }

    async fn publish(&self, payload: &[u8]) -> Result<(), Error> {
        // Fails only once the consumer side has been dropped.
        self.sender
            .send(Message::new(payload))
            .map_err(|_| Error::new(ErrorKind::Unavailable))?;
        self.counters.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn consume(&self) -> Result<DeliveryStream, Error> {
        let receiver = lock(&self.receiver).take().ok_or_else(|| {
            Error::new(ErrorKind::Consume(
                "a consumer is already registered".to_string(),
            ))
        })?;

        let requeue = self.sender.clone();
        let counters = Arc::clone(&self.counters);
        let deliveries = futures::stream::unfold(receiver, move |mut receiver| {
            let requeue = requeue.clone();
            let counters = Arc::clone(&counters);
            async move {
                let message = receiver.recv().await?;
                let acker = MemoryAcker {
                    message: message.clone(),
                    requeue,
                    counters,
                };
                Some((Ok(Delivery::new(message, acker)), receiver))
            }
        });

        Ok(deliveries.boxed())
    }

    async fn close(&self) -> Result<(), Error> {
        debug!("Closing in-memory queue \"{}\"", self.queue_name);
        Ok(())
    }
}

struct MemoryAcker {
    message: Message,
    requeue: UnboundedSender<Message>,
    counters: Arc<Counters>,
}

#[async_trait]
impl Acknowledger for MemoryAcker {
    async fn ack(&self) -> Result<(), Error> {
        self.counters.acked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reject(&self) -> Result<(), Error> {
        self.counters.rejected.fetch_add(1, Ordering::SeqCst);
        self.requeue
            .send(self.message.clone())
            .map_err(|_| Error::new(ErrorKind::Acknowledge))
    }
}
