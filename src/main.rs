use events::Dispatcher;
use log::*;
use queue::Consumer;
use service::{config::Config, logging::Logger};
use sse::SseMessageHandler;
use std::sync::Arc;
use tokio::task::JoinError;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);
    Logger::log_startup_summary(&config);

    // Without a queue there is nothing to relay, so failing to connect is fatal.
    let gateway = match queue::connect(&config).await {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("Failed to initialize message queue: {e}");
            std::process::exit(1);
        }
    };

    let sse_manager = Arc::new(sse::Manager::new());

    let dispatcher =
        Dispatcher::new().with_handler(Arc::new(SseMessageHandler::new(Arc::clone(&sse_manager))));
    let consumer = Consumer::new(Arc::clone(&gateway), dispatcher);
    let consumer_task = tokio::spawn(async move {
        match consumer.run().await {
            Ok(()) => error!("Queue consumer stopped, shutting down"),
            Err(e) => error!("Queue consumer failed, shutting down: {e}"),
        }
        std::process::exit(1);
    });

    let app_state = web::AppState::new(config, Arc::clone(&gateway), sse_manager);

    if let Err(e) = web::init_server(app_state).await {
        error!("HTTP server failed: {e}");
        std::process::exit(1);
    }

    // The consumer exits the process when its delivery stream ends, so it
    // must be stopped before the connection is closed.
    consumer_task.abort();
    report_consumer_exit(consumer_task.await);

    if let Err(e) = gateway.close().await {
        warn!("Failed to close message queue cleanly: {e}");
    }
}

/// Logs a consumer task that ended by panicking. Returns `true` if it did.
fn report_consumer_exit(result: Result<(), JoinError>) -> bool {
    match result {
        Err(e) if !e.is_cancelled() => {
            error!("Queue consumer task panicked: {e}");
            true
        }
        _ => false,
    }
}
