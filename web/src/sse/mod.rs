//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the SSE endpoint.
//! The registry and fan-out live in the `sse` crate so the queue consumer
//! can broadcast without depending on the web layer.

pub mod handler;
