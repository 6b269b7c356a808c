//! ResGenie 智能体执行核心
//!
//! 模块划分：
//! - **agent**: 编排器 Agent、具体智能体行为接口、构建器、执行记录
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、生命周期状态与状态记录
//! - **llm**: 模型客户端抽象与 Mock 实现
//! - **memory**: 只追加的对话历史
//! - **observability**: 进程级日志初始化（控制台 + 轮转文件）
//! - **tools**: Tool trait、注册表、函数适配器与带重试的执行器

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;

pub use agent::{Agent, AgentBehavior, AgentBuilder, ExecutionRecord, StateSummary};
pub use core::{AgentError, AgentState, AgentStatus, ToolError};
pub use tools::{Tool, ToolInput};
