pub mod context;
pub mod loop_;
pub mod registry;
pub mod strip;

pub use context::ContextBuilder;
pub use loop_::{
    AgentLoop, EMPTY_RESPONSE_REPLY, ITERATION_BUDGET_REPLY, TurnExit, TurnOutcome,
};
pub use registry::ToolRegistry;
pub use strip::strip_reasoning;
