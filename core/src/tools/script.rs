use crate::config::ScriptsConfig;
use crate::error::ToolError;
use crate::tools::ToolEntry;
use crate::traits::Tool;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    pub interpreter: String,
    pub script: PathBuf,
    pub args: Vec<String>,
}

/// Runs one external script and parses the single JSON document it prints.
///
/// The child inherits the gateway's environment. When `timeout` expires the
/// child is killed and the call reports [`ToolError::Timeout`]; nothing is
/// retried.
pub async fn run_script(
    tool: &str,
    invocation: &ScriptInvocation,
    timeout: Duration,
) -> Result<Value, ToolError> {
    let started_at = Instant::now();
    tracing::debug!(
        tool,
        script = %invocation.script.display(),
        args = ?invocation.args,
        timeout_ms = timeout.as_millis(),
        "Starting tool script"
    );

    let child = Command::new(&invocation.interpreter)
        .arg(&invocation.script)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ToolError::ExecutionFailure {
            tool: tool.to_string(),
            message: format!(
                "Tool execution failed: could not start {}: {}",
                invocation.script.display(),
                e
            ),
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| ToolError::ExecutionFailure {
            tool: tool.to_string(),
            message: format!("Tool execution failed: {}", e),
        })?,
        Err(_) => {
            tracing::warn!(tool, timeout_ms = timeout.as_millis(), "Tool script timed out");
            return Err(ToolError::Timeout {
                tool: tool.to_string(),
            });
        }
    };

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        let message = if stderr.trim().is_empty() {
            format!(
                "{} exited with {}",
                invocation.script.display(),
                output.status
            )
        } else {
            stderr.trim().to_string()
        };
        tracing::warn!(tool, status = %output.status, "Tool script failed");
        return Err(ToolError::ExecutionFailure {
            tool: tool.to_string(),
            message,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload = serde_json::from_str::<Value>(stdout.trim()).map_err(|e| {
        ToolError::ExecutionFailure {
            tool: tool.to_string(),
            message: format!(
                "Tool execution failed: {} emitted invalid JSON: {}",
                invocation.script.display(),
                e
            ),
        }
    })?;

    tracing::info!(
        tool,
        duration_ms = started_at.elapsed().as_millis(),
        stdout_bytes = stdout.len(),
        "Tool script finished"
    );

    Ok(payload)
}

/// A catalog entry bound to the configured script directory and interpreter.
pub struct ScriptTool {
    entry: &'static ToolEntry,
    interpreter: String,
    script: PathBuf,
    timeout: Duration,
}

impl ScriptTool {
    pub fn new(entry: &'static ToolEntry, scripts: &ScriptsConfig) -> Self {
        Self {
            entry,
            interpreter: scripts.interpreter.clone(),
            script: entry.dir.resolve(scripts).join(entry.script),
            timeout: entry.timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn invocation(&self, args: &Map<String, Value>) -> Result<ScriptInvocation, ToolError> {
        let args = (self.entry.build_args)(args).map_err(|message| {
            ToolError::InvalidArguments {
                tool: self.entry.name.to_string(),
                message,
            }
        })?;

        Ok(ScriptInvocation {
            interpreter: self.interpreter.clone(),
            script: self.script.clone(),
            args,
        })
    }
}

#[async_trait]
impl Tool for ScriptTool {
    fn name(&self) -> &str {
        self.entry.name
    }

    fn description(&self) -> &str {
        self.entry.description
    }

    fn parameters_schema(&self) -> Value {
        (self.entry.parameters)()
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<Value, ToolError> {
        let invocation = self.invocation(args)?;
        run_script(self.entry.name, &invocation, self.timeout).await
    }
}
