//! Fakes shared by the unit tests.

use crate::error::{ProviderError, ToolError};
use crate::traits::{
    Channel, ChatMessage, ChatRequest, ChatResponse, ContextSource, DocumentRef, Provider,
    SessionId, Tool, ToolCall,
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub fn text(content: &str) -> ChatResponse {
    ChatResponse {
        text: Some(content.to_string()),
        tool_calls: vec![],
    }
}

pub fn tool_calls(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse {
        text: None,
        tool_calls: calls,
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.as_object().cloned().unwrap_or_default(),
    }
}

/// Replays canned responses in order and records every request.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ChatResponse, ProviderError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    tool_counts: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
        Self::from_results(responses.into_iter().map(Ok).collect())
    }

    pub fn from_results(responses: Vec<Result<ChatResponse, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            tool_counts: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tool_counts(&self) -> Vec<usize> {
        self.tool_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.messages.to_vec());
        self.tool_counts
            .lock()
            .unwrap()
            .push(request.tools.map(|t| t.len()).unwrap_or(0));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Malformed("script exhausted".into())))
    }
}

/// A tool with a fixed outcome that optionally logs its invocations.
pub struct StaticTool {
    name: String,
    outcome: Result<Value, String>,
    log: Option<Arc<Mutex<Vec<String>>>>,
}

impl StaticTool {
    pub fn ok(name: &str, payload: Value) -> Arc<dyn Tool> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Ok(payload),
            log: None,
        })
    }

    pub fn logged(name: &str, payload: Value, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn Tool> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Ok(payload),
            log: Some(log),
        })
    }

    pub fn failing(name: &str, message: &str) -> Arc<dyn Tool> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Err(message.to_string()),
            log: None,
        })
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "test tool"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}, "required": []})
    }

    async fn execute(&self, _args: &Map<String, Value>) -> Result<Value, ToolError> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }
        self.outcome
            .clone()
            .map_err(|message| ToolError::ExecutionFailure {
                tool: self.name.clone(),
                message,
            })
    }
}

/// Records everything the gateway sends.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(SessionId, String)>>,
    pub typing: Mutex<Vec<SessionId>>,
    pub fail_downloads: bool,
    pub fail_sends: bool,
}

impl RecordingChannel {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.lock().unwrap().len()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_typing(&self, session: &SessionId) -> anyhow::Result<()> {
        self.typing.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn send_text(&self, session: &SessionId, text: &str) -> anyhow::Result<()> {
        if self.fail_sends {
            anyhow::bail!("channel closed");
        }
        self.sent
            .lock()
            .unwrap()
            .push((session.clone(), text.to_string()));
        Ok(())
    }

    async fn download_document(&self, document: &DocumentRef, dest: &Path) -> anyhow::Result<()> {
        if self.fail_downloads {
            anyhow::bail!("download failed for {}", document.file_ref);
        }
        std::fs::write(dest, b"%PDF-1.7 test")?;
        Ok(())
    }
}

pub struct StaticContext(pub String);

#[async_trait]
impl ContextSource for StaticContext {
    async fn fetch(&self, _project_slug: &str) -> String {
        self.0.clone()
    }
}
