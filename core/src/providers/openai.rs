use crate::error::ProviderError;
use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCallRequest<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolCallRequest<'a> {
    id: &'a str,
    r#type: &'a str,
    function: OpenAIFunctionRequest<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionRequest<'a> {
    name: &'a str,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool<'a> {
    r#type: &'a str,
    function: OpenAIToolFunction<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Chat-completions client for an OpenAI-compatible endpoint (vLLM).
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAIProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: None,
            model: "Qwen/Qwen3-8B".to_string(),
            endpoint: endpoint.into(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn convert_messages<'a>(&self, messages: &'a [ChatMessage]) -> Vec<OpenAIMessage<'a>> {
        messages
            .iter()
            .map(|m| {
                let tool_calls = m.tool_calls.as_ref().map(|tool_calls| {
                    tool_calls
                        .iter()
                        .map(|tc| OpenAIToolCallRequest {
                            id: &tc.id,
                            r#type: "function",
                            function: OpenAIFunctionRequest {
                                name: &tc.name,
                                arguments: Value::Object(tc.arguments.clone()).to_string(),
                            },
                        })
                        .collect()
                });

                OpenAIMessage {
                    role: m.role.as_str(),
                    content: m.content.as_deref(),
                    tool_calls,
                    tool_call_id: m.tool_call_id.as_deref(),
                    name: m.name.as_deref(),
                }
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool<'_>> {
        tools
            .iter()
            .map(|t| OpenAITool {
                r#type: "function",
                function: OpenAIToolFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect()
    }
}

fn parse_arguments(tool: &str, raw: Value) -> Result<Map<String, Value>, ProviderError> {
    let value = match raw {
        Value::Null => return Ok(Map::new()),
        Value::String(s) if s.trim().is_empty() => return Ok(Map::new()),
        Value::String(s) => serde_json::from_str::<Value>(&s).map_err(|e| {
            ProviderError::Malformed(format!("arguments for {} are not JSON: {}", tool, e))
        })?,
        other => other,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ProviderError::Malformed(format!(
            "arguments for {} are not an object: {}",
            tool, other
        ))),
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, ProviderError> {
        let tools = request.tools.map(Self::convert_tools);
        let tool_choice = tools.as_ref().map(|_| "auto");
        let openai_request = OpenAIRequest {
            model: &self.model,
            messages: self.convert_messages(request.messages),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
            tool_choice,
        };

        tracing::debug!(
            messages = request.messages.len(),
            tools = request.tools.map(|t| t.len()).unwrap_or(0),
            "Calling model endpoint"
        );

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&openai_request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body = response.text().await?;
        let openai_response: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(format!("{}: {}", e, body)))?;

        let message = openai_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ProviderError::Malformed("No choices in response".to_string()))?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|c| {
                let arguments = parse_arguments(&c.function.name, c.function.arguments)?;
                Ok(ToolCall {
                    id: c.id,
                    name: c.function.name,
                    arguments,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        Ok(ChatResponse {
            text: message.content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::call;
    use httpmock::prelude::*;
    use serde_json::json;

    fn definitions() -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "get_projects".into(),
            description: "List all available projects".into(),
            parameters: json!({"type": "object", "properties": {}, "required": []}),
        }]
    }

    fn provider(server: &MockServer) -> OpenAIProvider {
        OpenAIProvider::new(server.url("/v1/chat/completions"))
            .with_model("Qwen/Qwen3-8B")
            .with_temperature(0.7)
            .with_max_tokens(2000)
    }

    #[tokio::test]
    async fn sends_tools_with_auto_choice_and_parses_tool_calls() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .json_body_partial(
                        r#"{"model": "Qwen/Qwen3-8B", "max_tokens": 2000, "tool_choice": "auto",
                            "tools": [{"type": "function", "function": {"name": "get_projects"}}]}"#,
                    );
                then.status(200).json_body(json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "chatcmpl-tool-1",
                                "type": "function",
                                "function": {"name": "get_tasks", "arguments": "{\"project_slug\": \"tower\"}"}
                            }]
                        }
                    }]
                }));
            })
            .await;

        let tools = definitions();
        let messages = vec![ChatMessage::user("show my tasks")];
        let response = provider(&server)
            .chat(ChatRequest {
                messages: &messages,
                tools: Some(&tools),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.text.is_none());
        assert_eq!(
            response.tool_calls,
            vec![call("chatcmpl-tool-1", "get_tasks", json!({"project_slug": "tower"}))]
        );
    }

    #[tokio::test]
    async fn round_trips_tool_messages() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).json_body_partial(
                    r#"{"messages": [
                        {"role": "assistant", "tool_calls": [{"id": "call_7", "type": "function",
                          "function": {"name": "get_task", "arguments": "{\"task_id\":20}"}}]},
                        {"role": "tool", "tool_call_id": "call_7", "name": "get_task", "content": "{\"id\":20}"}
                    ]}"#,
                );
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Task 20 is blocked."}}]
                }));
            })
            .await;

        let messages = vec![
            ChatMessage::assistant_with_tool_calls(
                None,
                vec![call("call_7", "get_task", json!({"task_id": 20}))],
            ),
            ChatMessage::tool_result("call_7", "get_task", r#"{"id":20}"#),
        ];
        let response = provider(&server)
            .chat(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.text_or_empty(), "Task 20 is blocked.");
        assert!(!response.has_tool_calls());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(503).body("model loading");
            })
            .await;

        let messages = vec![ChatMessage::user("hi")];
        let err = provider(&server)
            .chat(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).body("<html>gateway</html>");
            })
            .await;

        let messages = vec![ChatMessage::user("hi")];
        let err = provider(&server)
            .chat(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn arguments_parsing() {
        assert!(parse_arguments("t", json!("")).unwrap().is_empty());
        assert!(parse_arguments("t", Value::Null).unwrap().is_empty());
        assert_eq!(
            parse_arguments("t", json!({"task_id": 3})).unwrap()["task_id"],
            json!(3)
        );
        assert!(parse_arguments("t", json!("{not json")).is_err());
        assert!(parse_arguments("t", json!("[1, 2]")).is_err());
    }
}
