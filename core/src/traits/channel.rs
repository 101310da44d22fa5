use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Channel identity of a conversation (a Telegram chat id, `console`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// An uploaded file as announced by the channel; `file_ref` is whatever the
/// channel needs to fetch the bytes later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub filename: String,
    pub file_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub session: SessionId,
    pub text: Option<String>,
    pub document: Option<DocumentRef>,
}

impl InboundEvent {
    pub fn text(session: SessionId, text: impl Into<String>) -> Self {
        Self {
            session,
            text: Some(text.into()),
            document: None,
        }
    }
}

#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    async fn send_typing(&self, session: &SessionId) -> anyhow::Result<()>;

    async fn send_text(&self, session: &SessionId, text: &str) -> anyhow::Result<()>;

    async fn download_document(&self, document: &DocumentRef, dest: &Path) -> anyhow::Result<()>;
}

/// Notified between tool rounds of a turn, before the model is called again.
#[async_trait]
pub trait TurnProgress: Send + Sync {
    async fn tool_round_finished(&self, iteration: usize);
}

pub struct NoProgress;

#[async_trait]
impl TurnProgress for NoProgress {
    async fn tool_round_finished(&self, _iteration: usize) {}
}
