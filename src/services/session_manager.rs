// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::controller::{ChatController, OverlapPolicy};
use crate::services::planner::PlannerBackend;

/// Fresh opaque id for one page load.
pub fn generate_session_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("session_{}", &raw[..12])
}

#[derive(Clone, Debug)]
pub struct WidgetSession {
    pub controller: Arc<ChatController>,
    pub last_active: Instant,
}

impl WidgetSession {
    fn new(controller: ChatController) -> Self {
        Self { controller: Arc::new(controller), last_active: Instant::now() }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, WidgetSession>>>,
    backend: Arc<dyn PlannerBackend>,
    user_id: String,
    policy: OverlapPolicy,
    ttl: Duration,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("user_id", &self.user_id)
            .field("policy", &self.policy)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn PlannerBackend>,
        user_id: impl Into<String>,
        policy: OverlapPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            backend,
            user_id: user_id.into(),
            policy,
            ttl,
        }
    }

    fn build_controller(&self, id: &str) -> ChatController {
        ChatController::new(id, self.user_id.clone(), Arc::clone(&self.backend), self.policy)
    }

    // Create a fresh session and return its id.
    pub async fn create_session(&self) -> String {
        let id = generate_session_id();
        let session = WidgetSession::new(self.build_controller(&id));

        let mut guard = self.inner.write().await;
        guard.insert(id.clone(), session);
        tracing::info!(session_id = %id, "session created");
        id
    }

    // Controller for this id, created if the id is unknown, e.g. a page
    // still open across a restart.
    pub async fn ensure_session(&self, id: &str) -> Arc<ChatController> {
        let mut guard = self.inner.write().await;
        let session = guard.entry(id.to_string()).or_insert_with(|| {
            tracing::info!(session_id = %id, "re-creating unknown session");
            WidgetSession::new(self.build_controller(id))
        });
        session.last_active = Instant::now();
        Arc::clone(&session.controller)
    }

    /// Controller of an existing session; touches `last_active`.
    pub async fn get(&self, id: &str) -> Option<Arc<ChatController>> {
        let mut guard = self.inner.write().await;
        guard.get_mut(id).map(|session| {
            session.last_active = Instant::now();
            Arc::clone(&session.controller)
        })
    }

    /// Remove a session by id
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. A session still waiting on the
    /// planner is not idle. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| {
            s.controller.pending_requests() > 0 || now.duration_since(s.last_active) < self.ttl
        });
        before - guard.len()
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// List session ids
    pub async fn list_session_ids(&self) -> Vec<String> {
        let guard = self.inner.read().await;
        guard.keys().cloned().collect()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
