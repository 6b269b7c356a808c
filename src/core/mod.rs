//! 核心类型：错误分类、状态枚举与状态记录

pub mod error;
pub mod state;

pub use error::{AgentError, ToolError};
pub use state::{AgentState, AgentStatus, StateField};
