use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Warn,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Per-session record of recovered problems. Every entry is also emitted
/// through `tracing` with the session id attached.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    session_id: Arc<str>,
    inner: Arc<RwLock<Vec<Diagnostic>>>,
}

impl Diagnostics {
    pub fn new(session_id: impl Into<Arc<str>>) -> Self {
        Self {
            session_id: session_id.into(),
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(session_id = %self.session_id, "{message}");
        self.push(DiagnosticLevel::Warn, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(session_id = %self.session_id, "{message}");
        self.push(DiagnosticLevel::Error, message).await;
    }

    pub async fn record(&self, level: DiagnosticLevel, message: impl Into<String>) {
        match level {
            DiagnosticLevel::Warn => self.warn(message).await,
            DiagnosticLevel::Error => self.error(message).await,
        }
    }

    pub async fn snapshot(&self) -> Vec<Diagnostic> {
        self.inner.read().await.clone()
    }

    async fn push(&self, level: DiagnosticLevel, message: String) {
        self.inner.write().await.push(Diagnostic { level, message });
    }
}
