use thiserror::Error;

/// Failure of a model endpoint exchange. Every variant means the model is
/// unavailable for the current turn.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model endpoint unreachable: {0}")]
    Network(String),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Tool-level failures. These are fed back to the model as data.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{tool} timed out")]
    Timeout { tool: String },

    #[error("{message}")]
    ExecutionFailure { tool: String, message: String },

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

/// Aborts the current turn; the user gets an apology and history is untouched.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] ProviderError),

    #[error("session store failure: {0}")]
    Session(anyhow::Error),

    #[error("channel failure: {0}")]
    Channel(anyhow::Error),
}
