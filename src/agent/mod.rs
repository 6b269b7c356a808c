//! 智能体层：编排器、具体智能体行为接口、构建器、状态摘要与执行记录

pub mod base;
pub mod behavior;
pub mod builder;
pub mod execution;
pub mod summary;

pub use base::Agent;
pub use behavior::AgentBehavior;
pub use builder::AgentBuilder;
pub use execution::ExecutionRecord;
pub use summary::StateSummary;
