// src/message.rs
use serde::{Deserialize, Serialize};

use crate::services::diagnostics::Diagnostic;
use crate::services::controller::SubmitOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One `{role, content}` item of `session_chat_history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
}

impl ChatEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// Body posted to the planner backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerRequest {
    pub session_id: String,
    pub session_chat_history: Vec<ChatEntry>,
    pub user_id: String,
}

// Widget JSON API

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenderedEntry {
    pub role: Role,
    pub content: String,
    pub html: String,
}

#[derive(Serialize, Deserialize)]
pub struct SubmitResponse {
    pub session_id: String,
    pub outcome: SubmitOutcome,
    pub transcript: Vec<RenderedEntry>,
}

#[derive(Serialize, Deserialize)]
pub struct DiagnosticsResponse {
    pub session_id: String,
    pub diagnostics: Vec<Diagnostic>,
}
