//! Branchline HTTP adapter.
//!
//! Hosts dialogue sessions behind a small JSON API: a client posts a dialogue
//! script, then forwards the player's skip, advance, navigation and confirm
//! signals and polls what the screen should show.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod view;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/dialogues", routes::dialogue::router())
        .with_state(app_state)
}
