use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Success/error envelope handed back to the model as a `tool` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    pub payload: Option<Value>,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(payload: Value) -> Self {
        Self {
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Text placed in the `content` of the tool message: the payload itself
    /// on success, `{"error": ...}` otherwise.
    pub fn to_content(&self) -> String {
        match (&self.payload, &self.error) {
            (Some(payload), _) if self.ok => payload.to_string(),
            (_, error) => json!({ "error": error.as_deref().unwrap_or("unknown error") }).to_string(),
        }
    }
}

impl From<Result<Value, ToolError>> for ToolResult {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: &Map<String, Value>) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_content_is_the_payload() {
        let result = ToolResult::success(json!({"projects": [{"slug": "tower"}]}));
        assert_eq!(result.to_content(), r#"{"projects":[{"slug":"tower"}]}"#);
    }

    #[test]
    fn error_content_is_wrapped() {
        let result = ToolResult::from(Err(ToolError::Timeout {
            tool: "process_rfp".into(),
        }));
        assert!(!result.ok);
        assert_eq!(result.to_content(), r#"{"error":"process_rfp timed out"}"#);
    }
}
