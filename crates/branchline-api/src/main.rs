//! Branchline API server entry point.

use std::error::Error;
use std::sync::Arc;

use branchline_api::build_router;
use branchline_api::config::ServerConfig;
use branchline_api::state::{AppState, start_session_reaper};
use branchline_core::clock::SystemClock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Branchline API server");

    let config = ServerConfig::from_env()?;
    let app_state =
        AppState::with_session_policy(Arc::new(SystemClock), config.flow, config.sessions);
    let _reaper = start_session_reaper(app_state.sessions.clone());

    let app = build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    tracing::info!(flow = ?config.flow, "Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
