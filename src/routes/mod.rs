// src/routes/mod.rs
pub mod api;
pub mod widget;

use std::{path::Path, sync::Arc};

use crate::error::AppError;
use crate::services::controller::{ChatController, SubmitOutcome};
use crate::state::SharedState;
use api::{create_session_handler, diagnostics_handler, history_handler, submit_json_handler};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use widget::{new_page_handler, session_page_handler, submit_form_handler};

const MAX_SESSION_ID_LEN: usize = 64;

pub fn create_router(static_dir: impl AsRef<Path>) -> Router<SharedState> {
    let api_routes = Router::new()
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{session_id}/messages", post(submit_json_handler))
        .route("/sessions/{session_id}/history", get(history_handler))
        .route("/sessions/{session_id}/diagnostics", get(diagnostics_handler));

    Router::new()
        .route("/", get(new_page_handler))
        .route("/widget/{session_id}", get(session_page_handler))
        .route("/widget/{session_id}/messages", post(submit_form_handler))
        .nest("/api", api_routes)
        .route("/health", get(|| async { "OK" }))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
}

/// Session ids are echoed into URLs and headers, so only a conservative
/// charset is accepted.
fn check_session_id(id: &str) -> Result<(), AppError> {
    let well_formed = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("malformed session id: {id:?}")))
    }
}

/// Run a submission on its own task so a client disconnect does not cancel
/// the planner call halfway through.
async fn submit_detached(controller: Arc<ChatController>, message: String) -> Result<SubmitOutcome, AppError> {
    tokio::spawn(async move { controller.submit(&message).await })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}
