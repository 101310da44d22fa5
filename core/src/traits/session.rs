use crate::traits::{ChatMessage, SessionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub filename: String,
    pub path: PathBuf,
    pub received_at: DateTime<Utc>,
}

/// Per-session conversation state, keyed by channel identity. History only
/// changes at turn boundaries through `commit_turn`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn name(&self) -> &str;

    async fn history(&self, session: &SessionId) -> anyhow::Result<Vec<ChatMessage>>;

    async fn commit_turn(
        &self,
        session: &SessionId,
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> anyhow::Result<()>;

    async fn last_upload(&self, session: &SessionId) -> anyhow::Result<Option<UploadRecord>>;

    async fn record_upload(&self, session: &SessionId, upload: UploadRecord) -> anyhow::Result<()>;
}
