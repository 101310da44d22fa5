use crate::traits::{ChatMessage, SessionId, SessionStore, UploadRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Ordered user/assistant turns of one session, capped at the most recent
/// `max_len` entries.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    max_len: usize,
}

impl ConversationHistory {
    pub fn new(max_len: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_len,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn commit_turn(&mut self, user: ChatMessage, assistant: ChatMessage) {
        self.messages.push(user);
        self.messages.push(assistant);
        if self.messages.len() > self.max_len {
            let excess = self.messages.len() - self.max_len;
            self.messages.drain(..excess);
        }
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    history: ConversationHistory,
    last_upload: Option<UploadRecord>,
}

/// Process-local session store. Sessions share nothing with each other.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
    max_history: usize,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl InMemorySessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_history,
        }
    }

    fn fresh(&self) -> SessionState {
        SessionState {
            history: ConversationHistory::new(self.max_history),
            last_upload: None,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn history(&self, session: &SessionId) -> anyhow::Result<Vec<ChatMessage>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .get(session)
            .map(|s| s.history.messages().to_vec())
            .unwrap_or_default())
    }

    async fn commit_turn(
        &self,
        session: &SessionId,
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> anyhow::Result<()> {
        let mut sessions = self.sessions.lock().await;
        let state = sessions
            .entry(session.clone())
            .or_insert_with(|| self.fresh());
        state.history.commit_turn(user, assistant);
        Ok(())
    }

    async fn last_upload(&self, session: &SessionId) -> anyhow::Result<Option<UploadRecord>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(session).and_then(|s| s.last_upload.clone()))
    }

    async fn record_upload(&self, session: &SessionId, upload: UploadRecord) -> anyhow::Result<()> {
        let mut sessions = self.sessions.lock().await;
        let state = sessions
            .entry(session.clone())
            .or_insert_with(|| self.fresh());
        state.last_upload = Some(upload);
        Ok(())
    }
}

/// One async lock per session so a session's turns run one at a time while
/// different sessions proceed concurrently.
#[derive(Default)]
pub struct SessionLocks {
    locks: std::sync::Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, session: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(session.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Forgets the session's lock once no turn holds or waits on it. Call
    /// after dropping the guard returned by [`SessionLocks::acquire`].
    pub fn release(&self, session: &SessionId) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks
            .get(session)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session);
        }
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
