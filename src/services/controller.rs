// src/services/controller.rs
use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::ConfigError;
use crate::message::{ChatEntry, PlannerRequest, Role};
use crate::services::diagnostics::{DiagnosticLevel, Diagnostics};
use crate::services::planner::{PlannerBackend, PlannerReply};
use crate::services::transcript::Transcript;

/// What to do with a submission made while another one is still pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Send every submission; only the newest response gets rendered.
    #[default]
    DiscardStale,
    /// Refuse new submissions until the pending one completes.
    Reject,
}

impl FromStr for OverlapPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard-stale" | "discard_stale" => Ok(OverlapPolicy::DiscardStale),
            "reject" => Ok(OverlapPolicy::Reject),
            _ => Err(ConfigError::Invalid {
                name: "WIDGET_OVERLAP_POLICY",
                expected: "overlap policy (discard-stale, reject)",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapPolicy::DiscardStale => f.write_str("discard-stale"),
            OverlapPolicy::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Blank input; nothing was sent or recorded.
    Ignored,
    /// Refused because a request is already in flight.
    Busy,
    Answered,
    /// The backend succeeded but `assistant` was not a string.
    Malformed,
    BackendError,
    TransportError,
    /// A newer submission was made before this response arrived.
    Superseded,
}

/// Clears the in-flight flag when the submission ends, including when the
/// submitting future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Counts one accepted submission as pending until it is dropped.
struct Pending<'a>(&'a AtomicUsize);

impl<'a> Pending<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Pending(counter)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Drives one widget session: records the transcript, talks to the planner
/// and renders whatever comes back.
pub struct ChatController {
    session_id: String,
    user_id: String,
    backend: Arc<dyn PlannerBackend>,
    policy: OverlapPolicy,
    transcript: Transcript,
    diagnostics: Diagnostics,
    pending: AtomicUsize,
    in_flight: AtomicBool,
}

impl fmt::Debug for ChatController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatController")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("policy", &self.policy)
            .field("pending", &self.pending_requests())
            .finish()
    }
}

impl ChatController {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        backend: Arc<dyn PlannerBackend>,
        policy: OverlapPolicy,
    ) -> Self {
        let session_id = session_id.into();
        Self {
            diagnostics: Diagnostics::new(session_id.as_str()),
            session_id,
            user_id: user_id.into(),
            backend,
            policy,
            transcript: Transcript::new(),
            pending: AtomicUsize::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Submissions accepted but not yet answered, discarded or failed.
    pub fn pending_requests(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub async fn history(&self) -> Vec<ChatEntry> {
        self.transcript.history().await
    }

    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        self.run_submit(input, None).await
    }

    /// Like [`submit`](Self::submit), but signals `recorded` as soon as the
    /// user entry is in the transcript. The sender is dropped unsent when
    /// the input is ignored or refused.
    pub async fn submit_with_receipt(&self, input: &str, recorded: oneshot::Sender<()>) -> SubmitOutcome {
        self.run_submit(input, Some(recorded)).await
    }

    async fn run_submit(&self, input: &str, recorded: Option<oneshot::Sender<()>>) -> SubmitOutcome {
        let message = input.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let _in_flight = match self.policy {
            OverlapPolicy::Reject => match InFlight::acquire(&self.in_flight) {
                Some(guard) => Some(guard),
                None => {
                    tracing::info!(session_id = %self.session_id, "submission refused, request in flight");
                    return SubmitOutcome::Busy;
                }
            },
            OverlapPolicy::DiscardStale => None,
        };
        let _pending = Pending::enter(&self.pending);

        // The entry index doubles as the submission's ticket.
        let (turn, history) = self.transcript.append_with_history(Role::User, message).await;
        if let Some(recorded) = recorded {
            let _ = recorded.send(());
        }
        tracing::info!(
            session_id = %self.session_id,
            turn,
            history_len = history.len(),
            "submitting message"
        );

        let request = PlannerRequest {
            session_id: self.session_id.clone(),
            session_chat_history: history,
            user_id: self.user_id.clone(),
        };

        let (content, outcome, problem) = match self.backend.plan(&request).await {
            Err(err) => (
                format!("Error: {err}"),
                SubmitOutcome::TransportError,
                Some((DiagnosticLevel::Error, format!("planner request failed: {err}"))),
            ),
            Ok(raw) => match PlannerReply::classify(raw) {
                PlannerReply::Text(text) => (text, SubmitOutcome::Answered, None),
                PlannerReply::Malformed(value) => (
                    value.to_string(),
                    SubmitOutcome::Malformed,
                    Some((DiagnosticLevel::Warn, format!("assistant is not a string: {value}"))),
                ),
                PlannerReply::Missing => (
                    String::new(),
                    SubmitOutcome::Malformed,
                    Some((DiagnosticLevel::Warn, "response has no assistant field".to_string())),
                ),
                PlannerReply::Failure(message) => (
                    format!("Error: {message}"),
                    SubmitOutcome::BackendError,
                    Some((DiagnosticLevel::Error, format!("backend error: {message}"))),
                ),
            },
        };

        if !self.transcript.append_reply(turn, content).await {
            let mut note = format!("discarding response to message #{turn}: superseded by a newer message");
            if let Some((_, problem)) = &problem {
                note.push_str(&format!(" ({problem})"));
            }
            self.diagnostics.warn(note).await;
            return SubmitOutcome::Superseded;
        }

        if let Some((level, message)) = problem {
            self.diagnostics.record(level, message).await;
        }
        outcome
    }
}
