//! Companion chat handlers.
//!
//! Sessions live in the [`SessionRegistry`](crate::chat::SessionRegistry);
//! every response carries a fresh snapshot so the client can re-render from
//! it alone. If the client disconnects while a reply is pending, the handler
//! future is dropped and the session records the request as abandoned.

use crate::{
    AppState,
    chat::{ChatSession, RejectReason, SessionSnapshot, SubmitOutcome},
    crisis::CrisisResources,
    types::{AppError, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Session snapshot plus the banner contents when it is showing.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crisis_resources: Option<CrisisResources>,
}

impl SessionView {
    fn of(session: &ChatSession, state: &AppState) -> Self {
        let snapshot = session.snapshot();
        let crisis_resources = snapshot
            .crisis
            .then(|| state.crisis_resources.as_ref().clone());
        Self {
            snapshot,
            crisis_resources,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub reply: String,
    pub crisis_detected: bool,
    pub session: SessionView,
}

/// Start a session holding only the greeting.
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create();
    (StatusCode::CREATED, Json(SessionView::of(&session, &state)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    let session = state.sessions.get(&id)?;
    Ok(Json(SessionView::of(&session, &state)))
}

/// End a session, cancelling any pending reply.
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.sessions.end(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send a message and wait for the companion's reply.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>> {
    let session = state.sessions.get(&id)?;

    match state.chat.submit(&session, &payload.content).await? {
        SubmitOutcome::Replied {
            reply,
            crisis_detected,
        } => Ok(Json(SendMessageResponse {
            reply,
            crisis_detected,
            session: SessionView::of(&session, &state),
        })),
        SubmitOutcome::Rejected { reason } => Err(match reason {
            RejectReason::Empty => AppError::InvalidInput("Message cannot be empty".to_string()),
            RejectReason::Busy => AppError::Busy,
            RejectReason::Closed => AppError::NotFound(format!("Chat session {}", id)),
        }),
    }
}

/// Cancel the pending reply, if any. The session returns to idle.
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    let session = state.sessions.get(&id)?;
    session.cancel();
    Ok(Json(SessionView::of(&session, &state)))
}

/// Clear a failed state so the session shows as idle again.
pub async fn acknowledge_failure(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    let session = state.sessions.get(&id)?;
    session.acknowledge_failure();
    Ok(Json(SessionView::of(&session, &state)))
}

pub async fn dismiss_crisis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    let session = state.sessions.get(&id)?;
    session.dismiss_crisis();
    Ok(Json(SessionView::of(&session, &state)))
}
