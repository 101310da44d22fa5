use crate::agent::{AgentLoop, ContextBuilder, TurnOutcome};
use crate::config::UploadPolicy;
use crate::error::TurnError;
use crate::session::SessionLocks;
use crate::traits::{
    Channel, ChatMessage, ContextSource, DocumentRef, InboundEvent, SessionId, SessionStore,
    TurnProgress, UploadRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{error, info, warn};

pub const TURN_APOLOGY: &str = "Sorry, I encountered an error processing your request.";
pub const UPLOAD_APOLOGY: &str = "Sorry, I encountered an error handling your file.";

const TASK_SNIFF_WINDOW: usize = 4;

static TASK_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"task (\d+)").expect("valid regex"));

/// Entry point for everything a channel receives. Owns the per-session
/// ordering and the commit-on-success history policy.
pub struct Gateway {
    agent: AgentLoop,
    context: ContextBuilder,
    context_source: Arc<dyn ContextSource>,
    sessions: Arc<dyn SessionStore>,
    channel: Arc<dyn Channel>,
    locks: SessionLocks,
    project_slug: String,
    inbox_dir: PathBuf,
    upload_policy: UploadPolicy,
}

impl Gateway {
    pub fn new(
        agent: AgentLoop,
        context: ContextBuilder,
        context_source: Arc<dyn ContextSource>,
        sessions: Arc<dyn SessionStore>,
        channel: Arc<dyn Channel>,
    ) -> Self {
        Self {
            agent,
            context,
            context_source,
            sessions,
            channel,
            locks: SessionLocks::default(),
            project_slug: "demo-project".to_string(),
            inbox_dir: PathBuf::from("inbound"),
            upload_policy: UploadPolicy::default(),
        }
    }

    pub fn with_project(mut self, project_slug: impl Into<String>) -> Self {
        self.project_slug = project_slug.into();
        self
    }

    pub fn with_inbox(mut self, inbox_dir: impl AsRef<Path>) -> Self {
        self.inbox_dir = inbox_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    pub async fn handle_event(&self, event: InboundEvent) {
        let session = event.session;
        let guard = self.locks.acquire(&session).await;
        let text = event.text.filter(|t| !t.trim().is_empty());

        if let Some(document) = event.document {
            self.handle_document(&session, document, text).await;
        } else if let Some(text) = text {
            self.handle_text(&session, text).await;
        }

        drop(guard);
        self.locks.release(&session);
    }

    async fn handle_text(&self, session: &SessionId, text: String) {
        info!(%session, "Received message: {}", text);

        let message = match self.sessions.last_upload(session).await {
            Ok(Some(upload)) => {
                info!(%session, file = %upload.filename, "Referencing recent upload");
                format!("{}\n\n[Recently uploaded file: {}]", text, upload.filename)
            }
            Ok(None) => text,
            Err(e) => {
                warn!(%session, "Could not read last upload: {}", e);
                text
            }
        };

        self.run_turn(session, message).await;
    }

    async fn handle_document(
        &self,
        session: &SessionId,
        document: DocumentRef,
        caption: Option<String>,
    ) {
        info!(%session, file = %document.filename, "Received document");

        let upload = match self.store_upload(session, &document).await {
            Ok(upload) => upload,
            Err(e) => {
                error!(%session, "Error handling document: {:#}", e);
                self.send_best_effort(session, UPLOAD_APOLOGY).await;
                return;
            }
        };

        if let Some(caption) = caption {
            let message = annotate_upload(&caption, &upload.filename);
            self.run_turn(session, message).await;
            return;
        }

        let task_id = match self.upload_policy {
            UploadPolicy::AskUser => None,
            UploadPolicy::InferTask => self.recent_task_mention(session).await,
        };

        match task_id {
            Some(task_id) => {
                info!(%session, task_id, "Auto-detected task context");
                let notice = format!(
                    "Received {}. Analyzing for task {}...",
                    upload.filename, task_id
                );
                if let Err(e) = self.channel.send_text(session, &notice).await {
                    warn!(%session, "Failed to send upload notice: {:#}", e);
                }
                let request = format!("Analyze this uploaded document for task {}", task_id);
                self.run_turn(session, annotate_upload(&request, &upload.filename))
                    .await;
            }
            None => {
                let prompt = format!(
                    "Received {}. What would you like me to do with it?",
                    upload.filename
                );
                self.send_best_effort(session, &prompt).await;
            }
        }
    }

    async fn store_upload(
        &self,
        session: &SessionId,
        document: &DocumentRef,
    ) -> anyhow::Result<UploadRecord> {
        let filename = sanitize_filename(&document.filename);
        tokio::fs::create_dir_all(&self.inbox_dir).await?;
        let path = self.inbox_dir.join(&filename);

        self.channel.download_document(document, &path).await?;
        info!(%session, path = %path.display(), "Saved file");

        let upload = UploadRecord {
            filename,
            path,
            received_at: Utc::now(),
        };
        self.sessions.record_upload(session, upload.clone()).await?;
        Ok(upload)
    }

    async fn recent_task_mention(&self, session: &SessionId) -> Option<String> {
        let history = match self.sessions.history(session).await {
            Ok(history) => history,
            Err(e) => {
                warn!(%session, "Could not read history: {}", e);
                return None;
            }
        };
        find_task_mention(&history)
    }

    /// Runs one turn and reports failures to the user. History is committed
    /// only after the reply went out.
    pub async fn run_turn(&self, session: &SessionId, user_message: String) {
        match self.try_turn(session, &user_message).await {
            Ok(outcome) => {
                info!(
                    %session,
                    exit = ?outcome.exit,
                    model_calls = outcome.model_calls,
                    "Sent response: {}",
                    outcome.reply.chars().take(100).collect::<String>()
                );
            }
            Err(e) => {
                error!(%session, "Error processing message: {}", e);
                self.send_best_effort(session, TURN_APOLOGY).await;
            }
        }
    }

    async fn try_turn(
        &self,
        session: &SessionId,
        user_message: &str,
    ) -> Result<TurnOutcome, TurnError> {
        self.signal_typing(session).await;

        let enriched = self.context_source.fetch(&self.project_slug).await;
        let history = self
            .sessions
            .history(session)
            .await
            .map_err(TurnError::Session)?;
        let messages = self.context.build_messages(&enriched, &history, user_message);

        let progress = TypingProgress {
            channel: self.channel.as_ref(),
            session,
        };
        let outcome = self.agent.process(messages, &progress).await?;

        self.channel
            .send_text(session, &outcome.reply)
            .await
            .map_err(TurnError::Channel)?;

        self.sessions
            .commit_turn(
                session,
                ChatMessage::user(user_message),
                ChatMessage::assistant(outcome.reply.clone()),
            )
            .await
            .map_err(TurnError::Session)?;

        Ok(outcome)
    }

    async fn signal_typing(&self, session: &SessionId) {
        if let Err(e) = self.channel.send_typing(session).await {
            warn!(%session, "Failed to send typing indicator: {:#}", e);
        }
    }

    async fn send_best_effort(&self, session: &SessionId, text: &str) {
        if let Err(e) = self.channel.send_text(session, text).await {
            error!(%session, "Failed to send message: {:#}", e);
        }
    }
}

struct TypingProgress<'a> {
    channel: &'a dyn Channel,
    session: &'a SessionId,
}

#[async_trait]
impl TurnProgress for TypingProgress<'_> {
    async fn tool_round_finished(&self, _iteration: usize) {
        if let Err(e) = self.channel.send_typing(self.session).await {
            warn!(session = %self.session, "Failed to send typing indicator: {:#}", e);
        }
    }
}

fn annotate_upload(text: &str, filename: &str) -> String {
    format!("{}\n\n[User uploaded file: {}]", text, filename)
}

/// Looks for "task N" in the last two exchanges.
pub fn find_task_mention(history: &[ChatMessage]) -> Option<String> {
    let recent = &history[history.len().saturating_sub(TASK_SNIFF_WINDOW)..];
    let joined = recent
        .iter()
        .map(|m| m.content_or_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    TASK_MENTION
        .captures(&joined)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Keeps only the final path component so uploads cannot escape the inbox.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .replace('\0', "");
    let base = base.trim();
    if base.is_empty() || base == "." || base == ".." {
        "document".to_string()
    } else {
        base.to_string()
    }
}
