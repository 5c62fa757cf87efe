#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use planner_widget::error::TransportError;
use planner_widget::message::PlannerRequest;
use planner_widget::services::planner::{PlannerBackend, RawReply};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::oneshot;

pub fn ok(body: Value) -> Result<RawReply, TransportError> {
    Ok(RawReply::new(StatusCode::OK, body))
}

pub fn status(code: u16, body: Value) -> Result<RawReply, TransportError> {
    Ok(RawReply::new(StatusCode::from_u16(code).unwrap(), body))
}

pub fn down(message: &str) -> Result<RawReply, TransportError> {
    Err(TransportError::Unavailable(message.to_string()))
}

/// Answers each call with the next queued reply and records every request.
#[derive(Default)]
pub struct Scripted {
    replies: Mutex<VecDeque<Result<RawReply, TransportError>>>,
    requests: Mutex<Vec<PlannerRequest>>,
}

impl Scripted {
    pub fn new(replies: Vec<Result<RawReply, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PlannerRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlannerBackend for Scripted {
    async fn plan(&self, request: &PlannerRequest) -> Result<RawReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| down("no scripted reply left"))
    }
}

/// Each call parks until the test sends its reply through the matching gate.
#[derive(Default)]
pub struct Gated {
    gates: Mutex<VecDeque<oneshot::Receiver<RawReply>>>,
    requests: Mutex<Vec<PlannerRequest>>,
}

impl Gated {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a gate for the next call.
    pub fn gate(&self) -> oneshot::Sender<RawReply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PlannerRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until `n` calls have reached the backend.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls() < n {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("backend was not called in time");
    }
}

#[async_trait]
impl PlannerBackend for Gated {
    async fn plan(&self, request: &PlannerRequest) -> Result<RawReply, TransportError> {
        let gate = {
            self.requests.lock().unwrap().push(request.clone());
            self.gates.lock().unwrap().pop_front()
        };
        match gate {
            Some(rx) => rx
                .await
                .map_err(|_| TransportError::Unavailable("gate dropped".into())),
            None => Err(TransportError::Unavailable("no gate queued".into())),
        }
    }
}
