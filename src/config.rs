// src/config.rs
use std::{net::SocketAddr, path::PathBuf, time::Duration};

use crate::error::ConfigError;
use crate::services::controller::OverlapPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PLANNER_URL: &str = "http://localhost:5000/agent-planner";
pub const DEFAULT_USER_ID: &str = "user123";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug)]
pub struct WidgetConfig {
    pub bind_addr: SocketAddr,
    pub planner_url: String,
    pub user_id: String,
    pub session_ttl: Duration,
    pub overlap_policy: OverlapPolicy,
    pub static_dir: PathBuf,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            planner_url: DEFAULT_PLANNER_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
            overlap_policy: OverlapPolicy::default(),
            static_dir: PathBuf::from("public"),
        }
    }
}

impl WidgetConfig {
    /// Read settings from the process environment, after loading `.env` if
    /// one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match lookup("WIDGET_BIND_ADDR") {
            Some(raw) => raw.trim().parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
                name: "WIDGET_BIND_ADDR",
                expected: "socket address",
                value: raw,
            })?,
            None => defaults.bind_addr,
        };

        let session_ttl = match lookup("WIDGET_SESSION_TTL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "WIDGET_SESSION_TTL_SECS",
                        expected: "positive number of seconds",
                        value: raw,
                    });
                }
            },
            None => defaults.session_ttl,
        };

        let overlap_policy = match lookup("WIDGET_OVERLAP_POLICY") {
            Some(raw) => raw.parse()?,
            None => defaults.overlap_policy,
        };

        Ok(Self {
            bind_addr,
            planner_url: lookup("PLANNER_URL").unwrap_or(defaults.planner_url),
            user_id: lookup("WIDGET_USER_ID").unwrap_or(defaults.user_id),
            session_ttl,
            overlap_policy,
            static_dir: lookup("WIDGET_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        })
    }
}
