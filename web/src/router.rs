use crate::controller::{health_check_controller, message_controller};
use crate::sse::handler::sse_handler;
use crate::{params, AppState};
use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::services::ServeDir;
use utoipa::OpenApi;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Queue Relay API"
        ),
        paths(
            message_controller::send,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                params::message::SendParams,
                message_controller::SentMessage,
                health_check_controller::Health,
            )
        ),
        tags(
            (name = "queue_relay", description = "Publish messages to a queue and stream them back over SSE")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let static_dir = app_state.config.static_dir().to_string();

    Router::new()
        .merge(message_routes(app_state.clone()))
        .merge(sse_routes(app_state.clone()))
        .merge(health_routes(app_state))
        .merge(openapi_routes())
        .fallback_service(static_routes(&static_dir))
}

fn message_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/send", post(message_controller::send))
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", get(sse_handler))
        .with_state(app_state)
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}

fn openapi_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

pub fn static_routes(static_dir: &str) -> ServeDir {
    ServeDir::new(static_dir)
}
