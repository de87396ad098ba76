//! Server-Sent Events (SSE) fan-out of consumed queue messages.
//!
//! # Architecture
//!
//! - **One registry per process**: the [`Manager`] owns a
//!   [`ConnectionRegistry`](connection::ConnectionRegistry) and is shared (via
//!   `Arc`) between the HTTP layer, which opens subscriptions, and the queue
//!   consumer, which broadcasts.
//! - **Handles, not globals**: each subscriber is keyed by a server-generated
//!   [`ConnectionId`](connection::ConnectionId).
//! - **Failure isolation**: a closed subscriber stream is removed during the
//!   broadcast that notices it; every other subscriber still gets the message.
//! - **Ephemeral messages**: a client that is not connected when a message is
//!   broadcast never sees it.
//!
//! # Message Flow
//!
//! 1. Browser opens `GET /events`
//! 2. Handler calls [`Manager::subscribe`] and streams the subscription
//! 3. Queue consumer receives a message and dispatches it to
//!    [`SseMessageHandler`](message_handler::SseMessageHandler)
//! 4. The registry writes the message to every subscriber channel
//! 5. Each handler stream turns it into a `data: <message>` frame
//! 6. When the client disconnects the subscription is dropped and unregistered
//!
//! # Modules
//!
//! - `connection`: the registry and `ConnectionId`
//! - `manager`: subscriptions with automatic cleanup
//! - `message`: SSE framing of relayed messages
//! - `message_handler`: bridge from the queue consumer into broadcasts

pub mod connection;
pub mod manager;
pub mod message;
pub mod message_handler;

pub use manager::{Manager, Subscription};
pub use message_handler::SseMessageHandler;
