use crate::agent::{ToolRegistry, strip_reasoning};
use crate::error::TurnError;
use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, TurnProgress};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_MAX_ITERATIONS: usize = 5;

pub const ITERATION_BUDGET_REPLY: &str = "I executed the tools but couldn't generate a response.";
pub const EMPTY_RESPONSE_REPLY: &str = "I processed your request but have no response to show.";

/// How a completed turn reached its final reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnExit {
    Answered,
    EmptyFinalResponse,
    IterationBudgetExceeded,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub exit: TurnExit,
    pub model_calls: usize,
    /// The full exchange as sent on the last model call, plus the tool
    /// results of the last round when the budget ran out.
    pub exchange: Vec<ChatMessage>,
}

/// Runs one turn: call the model, dispatch requested tools in order, feed
/// the results back, and stop on a text answer or after `max_iterations`
/// tool rounds.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tool_registry: Arc<ToolRegistry>,
    max_iterations: usize,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tool_registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub async fn process(
        &self,
        mut messages: Vec<ChatMessage>,
        progress: &dyn TurnProgress,
    ) -> Result<TurnOutcome, TurnError> {
        let definitions = self.tool_registry.definitions();
        let tools = if definitions.is_empty() {
            None
        } else {
            Some(definitions)
        };
        let mut model_calls = 0;

        for iteration in 1..=self.max_iterations {
            let request = ChatRequest {
                messages: &messages,
                tools,
            };
            let response = self.provider.chat(request).await?;
            model_calls += 1;

            if !response.has_tool_calls() {
                let (reply, exit) = finalize(response.text_or_empty());
                return Ok(TurnOutcome {
                    reply,
                    exit,
                    model_calls,
                    exchange: messages,
                });
            }

            let ChatResponse { text, tool_calls } = response;
            info!(
                iteration,
                count = tool_calls.len(),
                "Model requested tool calls"
            );

            messages.push(ChatMessage::assistant_with_tool_calls(
                text,
                tool_calls.clone(),
            ));

            for tool_call in tool_calls {
                debug!(tool = %tool_call.name, id = %tool_call.id, args = ?tool_call.arguments, "Executing tool");
                let result = self
                    .tool_registry
                    .execute(&tool_call.name, &tool_call.arguments)
                    .await;
                info!(tool = %tool_call.name, ok = result.ok, "Tool finished");

                messages.push(ChatMessage::tool_result(
                    tool_call.id,
                    tool_call.name,
                    result.to_content(),
                ));
            }

            if iteration < self.max_iterations {
                progress.tool_round_finished(iteration).await;
            }
        }

        warn!(
            iterations = self.max_iterations,
            "No text response within the iteration budget"
        );
        Ok(TurnOutcome {
            reply: ITERATION_BUDGET_REPLY.to_string(),
            exit: TurnExit::IterationBudgetExceeded,
            model_calls,
            exchange: messages,
        })
    }
}

fn finalize(candidate: &str) -> (String, TurnExit) {
    let stripped = strip_reasoning(candidate);
    if stripped.is_empty() {
        warn!("Empty response after stripping reasoning");
        (EMPTY_RESPONSE_REPLY.to_string(), TurnExit::EmptyFinalResponse)
    } else {
        (stripped, TurnExit::Answered)
    }
}
