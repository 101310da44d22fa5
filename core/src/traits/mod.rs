pub mod channel;
pub mod context;
pub mod provider;
pub mod session;
pub mod tool;

pub use channel::{Channel, DocumentRef, InboundEvent, NoProgress, SessionId, TurnProgress};
pub use context::ContextSource;
pub use provider::{ChatMessage, ChatRequest, ChatResponse, Provider, Role, ToolCall};
pub use session::{SessionStore, UploadRecord};
pub use tool::{Tool, ToolDefinition, ToolResult};
