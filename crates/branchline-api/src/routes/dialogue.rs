//! Routes for hosting dialogue sessions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use branchline_core::clock::Clock;
use branchline_core::error::DialogueError;
use branchline_core::event::DialogueObserver;
use branchline_flow::{DialogueHandle, Direction, FlowController, FlowStatus};
use branchline_graph::application::script::DialogueScript;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, Session};
use crate::view::{SessionView, ViewSnapshot};

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    /// Id of the new session.
    pub session_id: Uuid,
}

/// Response body for GET /{session_id}.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The session's id.
    pub session_id: Uuid,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
    /// Where the controller is.
    pub status: FlowStatus,
    /// What the screen shows.
    pub view: ViewSnapshot,
}

/// Response body returned after a player signal is accepted.
#[derive(Debug, Serialize)]
pub struct SignalResponse {
    /// Controller status when the signal was queued.
    pub status: FlowStatus,
}

/// Request body for POST /{session_id}/navigate.
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    /// Direction to move the highlight.
    pub direction: Direction,
}

/// POST /
#[instrument(skip_all, fields(root = %script.root, nodes = script.nodes.len()))]
async fn create_session(
    State(state): State<AppState>,
    Json(script): Json<DialogueScript>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let root = script.build()?;

    let view = Arc::new(SessionView::new());
    let observer: Arc<dyn DialogueObserver> = view.clone();
    let handle = FlowController::new(state.flow_config, observer).spawn(root);

    let session_id = Uuid::new_v4();
    state.sessions.insert(
        session_id,
        Session::new(handle, view, state.clock.now()),
    );
    info!(%session_id, "dialogue session created");

    Ok((StatusCode::CREATED, Json(CreateSessionResponse { session_id })))
}

/// GET /{session_id}
#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let response = state.sessions.with_session(session_id, |session| {
        Ok(SessionResponse {
            session_id,
            started_at: session.started_at,
            status: session.handle.status(),
            view: session.view.snapshot(),
        })
    })?;

    Ok(Json(response))
}

/// POST /{session_id}/skip
#[instrument(skip(state))]
async fn skip(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SignalResponse>), ApiError> {
    signal(&state, session_id, DialogueHandle::trigger_skip)
}

/// POST /{session_id}/advance
#[instrument(skip(state))]
async fn advance(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SignalResponse>), ApiError> {
    signal(&state, session_id, DialogueHandle::trigger_advance)
}

/// POST /{session_id}/navigate
#[instrument(skip(state, request), fields(direction = ?request.direction))]
async fn navigate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<NavigateRequest>,
) -> Result<(StatusCode, Json<SignalResponse>), ApiError> {
    signal(&state, session_id, |handle| handle.navigate(request.direction))
}

/// POST /{session_id}/confirm
#[instrument(skip(state))]
async fn confirm(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SignalResponse>), ApiError> {
    signal(&state, session_id, DialogueHandle::confirm_choice)
}

/// DELETE /{session_id}
#[instrument(skip(state))]
async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(session_id)?;
    info!("dialogue session removed");
    Ok(StatusCode::NO_CONTENT)
}

fn signal(
    state: &AppState,
    session_id: Uuid,
    send: impl FnOnce(&DialogueHandle) -> Result<(), DialogueError>,
) -> Result<(StatusCode, Json<SignalResponse>), ApiError> {
    let status = state.sessions.with_session(session_id, |session| {
        send(&session.handle)?;
        Ok(session.handle.status())
    })?;

    Ok((StatusCode::ACCEPTED, Json(SignalResponse { status })))
}

/// Returns the router for dialogue sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{session_id}", get(get_session).delete(end_session))
        .route("/{session_id}/skip", post(skip))
        .route("/{session_id}/advance", post(advance))
        .route("/{session_id}/navigate", post(navigate))
        .route("/{session_id}/confirm", post(confirm))
}
