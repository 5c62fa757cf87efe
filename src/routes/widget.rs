use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tokio::sync::oneshot;

use super::check_session_id;
use crate::{error::AppError, services::page::build_widget_html, state::SharedState};

#[derive(Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub message: String,
}

// Each page load starts a new session.
pub async fn new_page_handler(State(state): State<SharedState>) -> Html<String> {
    let session_id = state.sessions.create_session().await;
    Html(build_widget_html(&session_id, &[], false))
}

pub async fn session_page_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Html<String>, AppError> {
    check_session_id(&session_id)?;
    let controller = state.sessions.ensure_session(&session_id).await;
    let entries = controller.transcript().rendered().await;
    let awaiting_reply = controller.pending_requests() > 0;
    Ok(Html(build_widget_html(&session_id, &entries, awaiting_reply)))
}

pub async fn submit_form_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, AppError> {
    check_session_id(&session_id)?;
    let controller = state.sessions.ensure_session(&session_id).await;

    // Redirect once the user entry is recorded; the reply shows up on a
    // later refresh of the page.
    let (recorded_tx, recorded_rx) = oneshot::channel();
    tokio::spawn(async move {
        controller.submit_with_receipt(&form.message, recorded_tx).await
    });
    // Err means the input was ignored or refused, nothing to wait for.
    let _ = recorded_rx.await;

    Ok(Redirect::to(&format!("/widget/{session_id}#latest")))
}
