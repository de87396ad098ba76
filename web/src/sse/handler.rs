use crate::AppState;
use ::sse::message::ToSseEvent;
use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use log::*;
use std::convert::Infallible;

/// SSE handler that establishes a long-lived connection for relayed messages.
/// Every broadcast becomes one `data:` frame; the connection stays open until
/// the client goes away, at which point the subscription is dropped and
/// unregistered.
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = app_state.sse_manager.subscribe();
    debug!(
        "Establishing SSE connection {}",
        subscription.id().as_str()
    );

    let stream = stream! {
        while let Some(message) = subscription.recv().await {
            yield Ok::<_, Infallible>(message.to_sse_event());
        }

        // Only reached when the server drops the connection (e.g. shutdown).
        debug!("SSE connection {} closed by server", subscription.id().as_str());
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
