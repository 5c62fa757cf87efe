// src/services/planner.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{ConfigError, TransportError};
use crate::message::PlannerRequest;

/// Status and decoded JSON body of one planner call.
#[derive(Clone, Debug)]
pub struct RawReply {
    pub status: StatusCode,
    pub body: Value,
}

impl RawReply {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }
}

/// A planner reply validated at the boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum PlannerReply {
    /// Success status with a string `assistant`.
    Text(String),
    /// Success status with a non-string `assistant`.
    Malformed(Value),
    /// Success status without an `assistant` field.
    Missing,
    /// Non-success status; carries the backend's error message.
    Failure(String),
}

impl PlannerReply {
    /// Success is decided by the status class alone, never by body shape.
    pub fn classify(reply: RawReply) -> Self {
        let RawReply { status, mut body } = reply;
        let field = if status.is_success() { "assistant" } else { "error" };
        let value = body.as_object_mut().and_then(|map| map.remove(field));

        if status.is_success() {
            match value {
                Some(Value::String(text)) => PlannerReply::Text(text),
                Some(other) => PlannerReply::Malformed(other),
                None => PlannerReply::Missing,
            }
        } else {
            let message = match value {
                Some(Value::String(text)) => text,
                Some(other) => other.to_string(),
                None => status.to_string(),
            };
            PlannerReply::Failure(message)
        }
    }
}

#[async_trait]
pub trait PlannerBackend: Send + Sync {
    async fn plan(&self, request: &PlannerRequest) -> Result<RawReply, TransportError>;
}

/// `POST`s the request as JSON to the agent-planner endpoint.
#[derive(Clone, Debug)]
pub struct HttpPlanner {
    client: Client,
    url: String,
}

impl HttpPlanner {
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(concat!("planner-widget/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl PlannerBackend for HttpPlanner {
    async fn plan(&self, request: &PlannerRequest) -> Result<RawReply, TransportError> {
        tracing::debug!(
            url = %self.url,
            history_len = request.session_chat_history.len(),
            "posting to planner"
        );
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = response.status();
        let body = response.json::<Value>().await.map_err(TransportError::Decode)?;
        Ok(RawReply::new(status, body))
    }
}
