use crate::error::{Error, ErrorKind};
use crate::gateway::{Acknowledger, Delivery, DeliveryStream, QueueGateway};
use async_trait::async_trait;
use events::Message;
use futures::StreamExt;
use lapin::acker::Acker;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};

const CONSUMER_TAG: &str = "queue-relay";

/// Reply code sent to the broker on a normal close.
const REPLY_SUCCESS: u16 = 200;

/// Queue Gateway backed by an AMQP 0.9.1 broker such as RabbitMQ.
///
/// One connection, one channel. Messages go through the default exchange
/// with the queue name as routing key; consumption uses manual acks.
pub struct AmqpGateway {
    connection: Connection,
    channel: Channel,
    queue_name: String,
    consuming: AtomicBool,
}

impl AmqpGateway {
    /// Connects, opens a channel and declares the queue. Any failure here is
    /// reported as [`ErrorKind::Unavailable`].
    pub async fn connect(amqp_url: &str, queue_name: &str) -> Result<Self, Error> {
        let connection = Connection::connect(amqp_url, ConnectionProperties::default())
            .await
            .map_err(|e| Error::with_source(ErrorKind::Unavailable, e))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| Error::with_source(ErrorKind::Unavailable, e))?;

        // Durable so the declaration matches queues created by other clients
        // with default settings.
        channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| Error::with_source(ErrorKind::Unavailable, e))?;

        info!("AMQP channel initialized for queue \"{queue_name}\"");

        Ok(Self {
            connection,
            channel,
            queue_name: queue_name.to_string(),
            consuming: AtomicBool::new(false),
        })
    }

    fn ensure_connected(&self) -> Result<(), Error> {
        if self.connection.status().connected() && self.channel.status().connected() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Unavailable))
        }
    }
}

#[async_trait]
impl QueueGateway for AmqpGateway {
    fn queue_name(&self) -> &str {
        &self.queue_name
    }

    async fn publish(&self, payload: &[u8]) -> Result<(), Error> {
        self.ensure_connected()?;

        self.channel
            .basic_publish(
                "",
                &self.queue_name,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default(),
            )
            .await
            .map_err(|e| Error::from_lapin(ErrorKind::Publish, e))?
            .await
            .map_err(|e| Error::from_lapin(ErrorKind::Publish, e))?;

        Ok(())
    }

    async fn consume(&self) -> Result<DeliveryStream, Error> {
        self.ensure_connected()?;

        if self.consuming.swap(true, Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::Consume(
                "a consumer is already registered".to_string(),
            )));
        }

        let consumer = match self
            .channel
            .basic_consume(
                &self.queue_name,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
        {
            Ok(consumer) => consumer,
            Err(e) => {
                self.consuming.store(false, Ordering::SeqCst);
                return Err(Error::from_lapin(
                    ErrorKind::Consume("basic.consume was refused".to_string()),
                    e,
                ));
            }
        };

        let deliveries = consumer.map(|delivery| {
            delivery
                .map(|delivery| Delivery::new(Message::new(delivery.data), AmqpAcker(delivery.acker)))
                .map_err(|e| {
                    Error::from_lapin(ErrorKind::Consume("delivery stream failed".to_string()), e)
                })
        });

        Ok(deliveries.boxed())
    }

    async fn close(&self) -> Result<(), Error> {
        if !self.connection.status().connected() {
            return Ok(());
        }
        self.channel
            .close(REPLY_SUCCESS, "Bye")
            .await
            .map_err(|e| Error::with_source(ErrorKind::Unavailable, e))?;
        self.connection
            .close(REPLY_SUCCESS, "Bye")
            .await
            .map_err(|e| Error::with_source(ErrorKind::Unavailable, e))?;
        info!("AMQP connection closed");
        Ok(())
    }
}

struct AmqpAcker(Acker);

#[async_trait]
impl Acknowledger for AmqpAcker {
    async fn ack(&self) -> Result<(), Error> {
        self.0
            .ack(BasicAckOptions::default())
            .await
            .map(|_| ())
            .map_err(|e| Error::from_lapin(ErrorKind::Acknowledge, e))
    }

    async fn reject(&self) -> Result<(), Error> {
        self.0
            .nack(BasicNackOptions {
                requeue: true,
                ..BasicNackOptions::default()
            })
            .await
            .map(|_| ())
            .map_err(|e| Error::from_lapin(ErrorKind::Acknowledge, e))
    }
}
