// src/state.rs
use std::sync::Arc;

use crate::config::WidgetConfig;
use crate::error::ConfigError;
use crate::services::planner::{HttpPlanner, PlannerBackend};
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(config: &WidgetConfig, backend: Arc<dyn PlannerBackend>) -> Self {
        Self {
            sessions: SessionManager::new(
                backend,
                config.user_id.clone(),
                config.overlap_policy,
                config.session_ttl,
            ),
        }
    }

    /// State backed by the HTTP planner at `config.planner_url`.
    pub fn from_config(config: &WidgetConfig) -> Result<Self, ConfigError> {
        let backend = HttpPlanner::new(config.planner_url.clone())?;
        Ok(Self::new(config, Arc::new(backend)))
    }
}
