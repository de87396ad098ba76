use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    status: String,
    /// Number of currently open SSE connections.
    subscribers: usize,
    /// Queue that messages are relayed from.
    queue: String,
}

/// GET service health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Router is up and responding to requests", body = Health),
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(Health {
            status: "healthy".to_string(),
            subscribers: app_state.sse_manager.connection_count(),
            queue: app_state.gateway.queue_name().to_string(),
        }),
    )
}
