use crate::controller::ApiResponse;
use crate::extractors::json_or_form::JsonOrForm;
use crate::params::message::SendParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Confirmation returned once a message has been handed to the queue.
#[derive(Debug, Serialize, ToSchema)]
pub struct SentMessage {
    message: String,
}

/// POST publish a message to the queue
#[utoipa::path(
    post,
    path = "/send",
    request_body(content = SendParams, description = "JSON or urlencoded form body"),
    responses(
        (status = 200, description = "Message was published to the queue", body = SentMessage),
        (status = 415, description = "Unsupported content type"),
        (status = 422, description = "Missing or empty message"),
        (status = 500, description = "The queue refused the message"),
        (status = 503, description = "The message queue is unavailable")
    )
)]
pub async fn send(
    State(app_state): State<AppState>,
    JsonOrForm(params): JsonOrForm<SendParams>,
) -> Result<Response, Error> {
    if let Err(reason) = params.validate() {
        debug!("Rejecting message submission: {reason}");
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, reason).into_response());
    }

    app_state.gateway.publish(params.message.as_bytes()).await?;
    info!("Message sent to queue: {:?}", params.message);

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        SentMessage {
            message: params.message,
        },
    ))
    .into_response())
}
