//! HTTP surface: message submission, the SSE subscription stream, health,
//! and static files for the browser page.

use axum::http::{header, HeaderValue, Method};
use log::*;
use queue::QueueGateway;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

mod controller;
mod error;
mod extractors;
mod params;
pub mod router;
mod sse;

pub use error::{Error, Result};

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn QueueGateway>,
    pub sse_manager: Arc<::sse::Manager>,
}

impl AppState {
    pub fn new(
        config: Config,
        gateway: Arc<dyn QueueGateway>,
        sse_manager: Arc<::sse::Manager>,
    ) -> Self {
        Self {
            config,
            gateway,
            sse_manager,
        }
    }
}

/// Binds the configured interface and port and serves until a shutdown
/// signal arrives. Open SSE streams are closed on shutdown so in-flight
/// connections can drain.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_address = app_state.config.listen_address();
    let cors = cors_layer(&app_state.config);
    let sse_manager = Arc::clone(&app_state.sse_manager);

    let app = router::define_routes(app_state).layer(cors);

    let listener = TcpListener::bind(&listen_address).await?;
    info!("Server is running at http://{listen_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            sse_manager.disconnect_all();
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
