mod config;
mod dispatch;
mod error;
mod interaction;
mod oauth;
mod routes;
mod signature;
mod slack;

use config::Config;
use dispatch::Dispatcher;
use oauth::LoggingCredentialStore;
use routes::AppState;
use slack::SlackWebClient;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slack_interactivity=info,tower_http=info".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let slack = Arc::new(SlackWebClient::new(config.slack_api_base_url.clone()));
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&slack)));

    let state = AppState {
        config: Arc::clone(&config),
        slack,
        dispatcher,
        credentials: Arc::new(LoggingCredentialStore),
    };

    let app = routes::router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting server on {}", addr);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
