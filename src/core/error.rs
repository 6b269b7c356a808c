//! Agent 错误类型
//!
//! 所有变体都携带所属智能体名称，Display 形如 `[agent] | message`；
//! 工具执行失败会在末尾附上 `| cause: <原始错误>`，无需展开 source() 即可看到根因。

use thiserror::Error;
use tracing::Span;

/// 工具自身执行失败（由 Tool 实现返回，调用引擎不区分可重试与否）
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0}")]
    Failed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 调用被取消（取消令牌触发，或工具自身报告）
    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ToolError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ToolError::Failed(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ToolError::Cancelled)
    }
}

/// 智能体运行过程中对外暴露的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 工具名未注册；在任何尝试之前返回
    #[error("[{agent}] | tool '{tool}' not found")]
    ToolNotFound { agent: String, tool: String },

    /// 所有尝试均失败，包装最后一次错误
    #[error("[{agent}] | tool '{tool}' failed after {attempts} attempt(s) | cause: {source}")]
    ToolExecution {
        agent: String,
        tool: String,
        attempts: u32,
        #[source]
        source: ToolError,
    },

    /// 调用被取消且取消策略为立即传播
    #[error("[{agent}] | tool '{tool}' cancelled after {attempts} attempt(s)")]
    Cancelled {
        agent: String,
        tool: String,
        attempts: u32,
    },

    #[error("[{agent}] | invalid state: {reason}")]
    StateValidation { agent: String, reason: String },

    #[error("[{agent}] | tool '{tool}' already registered, use overwrite to replace it")]
    NameConflict { agent: String, tool: String },

    /// 具体智能体 run 内部的失败
    #[error("[{agent}] | {message}")]
    Run { agent: String, message: String },
}

impl AgentError {
    /// 所属智能体名称
    pub fn agent(&self) -> &str {
        match self {
            AgentError::ToolNotFound { agent, .. }
            | AgentError::ToolExecution { agent, .. }
            | AgentError::Cancelled { agent, .. }
            | AgentError::StateValidation { agent, .. }
            | AgentError::NameConflict { agent, .. }
            | AgentError::Run { agent, .. } => agent,
        }
    }

    /// 在所属智能体的 span 下记录一条 error 日志后返回自身
    pub fn logged(self, span: &Span) -> Self {
        tracing::error!(parent: span, agent = self.agent(), error = %self, "agent error");
        self
    }

    pub fn run(agent: impl Into<String>, message: impl Into<String>) -> Self {
        AgentError::Run {
            agent: agent.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_keeps_cause_text() {
        let err = AgentError::ToolExecution {
            agent: "mock_agent".into(),
            tool: "search".into(),
            attempts: 2,
            source: ToolError::failed("connection timed out"),
        };
        let text = err.to_string();
        assert!(text.starts_with("[mock_agent] | "));
        assert!(text.contains("search"));
        assert!(text.contains("2 attempt"));
        assert!(text.contains("connection timed out"));
    }

    #[test]
    fn test_error_agent_name() {
        let err = AgentError::ToolNotFound {
            agent: "planner".into(),
            tool: "missing".into(),
        };
        assert_eq!(err.agent(), "planner");
        assert_eq!(err.to_string(), "[planner] | tool 'missing' not found");
    }

    #[test]
    fn test_tool_error_from_anyhow() {
        let err: ToolError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.to_string(), "disk full");
        assert!(!err.is_cancelled());
        assert!(ToolError::Cancelled.is_cancelled());
    }
}
