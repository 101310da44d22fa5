pub mod agent;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod tools;
pub mod traits;

#[cfg(test)]
mod testing;

pub use agent::{AgentLoop, ContextBuilder, ToolRegistry, TurnExit, TurnOutcome};
pub use backend::BackendClient;
pub use config::*;
pub use error::{ProviderError, ToolError, TurnError};
pub use gateway::Gateway;
pub use providers::*;
pub use session::{ConversationHistory, InMemorySessionStore};
pub use tools::*;
pub use traits::*;
