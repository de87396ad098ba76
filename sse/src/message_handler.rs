use crate::Manager;
use async_trait::async_trait;
use events::{Error, Message, MessageHandler};
use log::*;
use std::sync::Arc;

/// Relays every consumed queue message to all open SSE connections.
pub struct SseMessageHandler {
    sse_manager: Arc<Manager>,
}

impl SseMessageHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl MessageHandler for SseMessageHandler {
    async fn handle(&self, message: &Message) -> Result<(), Error> {
        let delivered = self.sse_manager.broadcast(message);
        debug!(
            "Relayed {}-byte message to {} SSE connection(s)",
            message.len(),
            delivered
        );
        Ok(())
    }
}
