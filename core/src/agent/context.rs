use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::traits::ChatMessage;
use std::path::Path;

const SYSTEM_PROMPT_FILE: &str = "SYSTEM.md";
const SYSTEM_PROMPT_MAX_CHARS: usize = 20_000;
const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Builds the per-turn model exchange: system prompt, enriched project
/// context, the trailing history window and the new user message.
pub struct ContextBuilder {
    pub workspace: std::path::PathBuf,
    system_prompt: String,
    history_window: usize,
}

impl ContextBuilder {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        let workspace = workspace.as_ref().to_path_buf();
        let system_prompt = load_system_prompt(&workspace)
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        Self {
            workspace,
            system_prompt,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn build_system_prompt(&self) -> String {
        format!("{}\n\n---\n\n{}", self.system_prompt, runtime_context())
    }

    pub fn build_messages(
        &self,
        enriched_context: &str,
        history: &[ChatMessage],
        current_message: &str,
    ) -> Vec<ChatMessage> {
        let recent = &history[history.len().saturating_sub(self.history_window)..];

        let mut messages = Vec::with_capacity(recent.len() + 3);
        messages.push(ChatMessage::system(self.build_system_prompt()));
        messages.push(ChatMessage::system(format!(
            "PROJECT CONTEXT:\n{}",
            enriched_context
        )));
        messages.extend(recent.iter().cloned());
        messages.push(ChatMessage::user(current_message));
        messages
    }
}

fn runtime_context() -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M (%A)");
    format!("## Runtime Context\n\n### Current Time\n{}", timestamp)
}

fn load_system_prompt(workspace: &Path) -> Option<String> {
    let content = std::fs::read_to_string(workspace.join(SYSTEM_PROMPT_FILE)).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.chars().count() > SYSTEM_PROMPT_MAX_CHARS {
        tracing::warn!(
            max_chars = SYSTEM_PROMPT_MAX_CHARS,
            "{} truncated",
            SYSTEM_PROMPT_FILE
        );
        Some(trimmed.chars().take(SYSTEM_PROMPT_MAX_CHARS).collect())
    } else {
        Some(trimmed.to_string())
    }
}
