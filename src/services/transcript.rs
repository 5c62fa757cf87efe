// src/services/transcript.rs
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::message::{ChatEntry, RenderedEntry, Role};
use crate::services::render::render_entry;

#[derive(Clone, Debug)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    /// Display projection of `content`, rendered once on append.
    pub html: String,
}

impl TranscriptEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let content = content.into();
        let html = render_entry(role, &content);
        Self { role, content, html }
    }
}

impl From<&TranscriptEntry> for ChatEntry {
    fn from(entry: &TranscriptEntry) -> Self {
        ChatEntry::new(entry.role, entry.content.clone())
    }
}

impl From<&TranscriptEntry> for RenderedEntry {
    fn from(entry: &TranscriptEntry) -> Self {
        RenderedEntry {
            role: entry.role,
            content: entry.content.clone(),
            html: entry.html.clone(),
        }
    }
}

/// Ordered, append-only message store of one widget session.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    inner: Arc<RwLock<Vec<TranscriptEntry>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the new length.
    pub async fn append(&self, role: Role, content: impl Into<String>) -> usize {
        let entry = TranscriptEntry::new(role, content);
        let mut guard = self.inner.write().await;
        guard.push(entry);
        guard.len()
    }

    /// Append a message and return its index together with the history
    /// including it, under one lock so a concurrent append cannot land in
    /// between.
    pub async fn append_with_history(&self, role: Role, content: impl Into<String>) -> (usize, Vec<ChatEntry>) {
        let entry = TranscriptEntry::new(role, content);
        let mut guard = self.inner.write().await;
        guard.push(entry);
        (guard.len() - 1, guard.iter().map(ChatEntry::from).collect())
    }

    /// Append the assistant reply to the user entry at `turn`, unless a newer
    /// user entry has been appended since. Returns whether it was appended.
    pub async fn append_reply(&self, turn: usize, content: impl Into<String>) -> bool {
        let mut guard = self.inner.write().await;
        let superseded = guard
            .iter()
            .skip(turn + 1)
            .any(|entry| entry.role == Role::User);
        if superseded {
            return false;
        }
        guard.push(TranscriptEntry::new(Role::Assistant, content));
        true
    }

    /// Source text of every message in chronological order.
    pub async fn history(&self) -> Vec<ChatEntry> {
        let guard = self.inner.read().await;
        guard.iter().map(ChatEntry::from).collect()
    }

    pub async fn rendered(&self) -> Vec<RenderedEntry> {
        let guard = self.inner.read().await;
        guard.iter().map(RenderedEntry::from).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_keeps_source_text() {
        let transcript = Transcript::new();
        transcript.append(Role::User, "hello").await;
        let len = transcript.append(Role::Assistant, "**hi** <script>x</script>").await;
        assert_eq!(len, 2);

        let history = transcript.history().await;
        assert_eq!(history[1].content, "**hi** <script>x</script>");

        let rendered = transcript.rendered().await;
        assert!(rendered[1].html.contains("<strong>hi</strong>"));
        assert!(!rendered[1].html.contains("<script"));
    }

    #[tokio::test]
    async fn reply_to_an_older_turn_is_refused() {
        let transcript = Transcript::new();
        let (first, _) = transcript.append_with_history(Role::User, "first").await;
        let (second, history) = transcript.append_with_history(Role::User, "second").await;
        assert_eq!((first, second), (0, 1));
        assert_eq!(history.len(), 2);

        assert!(!transcript.append_reply(first, "late").await);
        assert!(transcript.append_reply(second, "on time").await);

        let contents: Vec<String> = transcript.history().await.into_iter().map(|e| e.content).collect();
        assert_eq!(contents, ["first", "second", "on time"]);
    }
}
