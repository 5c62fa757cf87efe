use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{check_session_id, submit_detached};
use crate::{
    error::AppError,
    message::{ChatEntry, DiagnosticsResponse, SessionCreated, SubmitRequest, SubmitResponse},
    state::SharedState,
};

pub async fn create_session_handler(State(state): State<SharedState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions.create_session().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

pub async fn submit_json_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    check_session_id(&session_id)?;
    let controller = state.sessions.ensure_session(&session_id).await;
    let outcome = submit_detached(controller.clone(), payload.message).await?;
    let transcript = controller.transcript().rendered().await;

    Ok(Json(SubmitResponse { session_id, outcome, transcript }))
}

pub async fn history_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatEntry>>, AppError> {
    check_session_id(&session_id)?;
    let controller = state
        .sessions
        .get(&session_id)
        .await
        .ok_or(AppError::SessionNotFound(session_id))?;
    Ok(Json(controller.history().await))
}

pub async fn diagnostics_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<DiagnosticsResponse>, AppError> {
    check_session_id(&session_id)?;
    let controller = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;
    let diagnostics = controller.diagnostics().snapshot().await;
    Ok(Json(DiagnosticsResponse { session_id, diagnostics }))
}
