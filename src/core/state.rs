//! 状态定义：AgentStatus 生命周期与 AgentState 可变记录
//!
//! AgentState 每个字段都始终存在（以空值代替“缺失”）；按名称的部分更新只接受
//! [`StateField`] 白名单中的字段，值先解码为字段类型再写入。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memory::MessageHistory;

/// 智能体运行状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Running,
    /// 等待外部结果（如尚未返回的工具调用）；核心不负责恢复调度
    Waiting,
    Completed,
    Failed,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 5] = [
        AgentStatus::Idle,
        AgentStatus::Running,
        AgentStatus::Waiting,
        AgentStatus::Completed,
        AgentStatus::Failed,
    ];

    /// 序列化边界使用的字符串形式
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Running => "running",
            AgentStatus::Waiting => "waiting",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Failed)
    }

    /// 单次 run 的生命周期：idle → running → {completed | failed | waiting}；
    /// waiting 可回到 running；终态可重新开始；任何状态都可进入 failed
    pub fn can_transition_to(&self, next: AgentStatus) -> bool {
        use AgentStatus::*;
        if *self == next || next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Waiting)
                | (Running, Completed)
                | (Waiting, Running)
                | (Waiting, Completed)
                | (Completed, Idle)
                | (Completed, Running)
                | (Failed, Idle)
                | (Failed, Running)
        )
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("unknown status: {s}"))
    }
}

/// AgentState 中可按名称更新的字段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateField {
    Messages,
    CurrentTask,
    AgentType,
    Status,
    ToolsOutput,
    Context,
    Error,
    Metadata,
}

impl StateField {
    pub const ALL: [StateField; 8] = [
        StateField::Messages,
        StateField::CurrentTask,
        StateField::AgentType,
        StateField::Status,
        StateField::ToolsOutput,
        StateField::Context,
        StateField::Error,
        StateField::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::Messages => "messages",
            StateField::CurrentTask => "current_task",
            StateField::AgentType => "agent_type",
            StateField::Status => "status",
            StateField::ToolsOutput => "tools_output",
            StateField::Context => "context",
            StateField::Error => "error",
            StateField::Metadata => "metadata",
        }
    }

    /// 不在白名单中的名称返回 None
    pub fn from_name(name: &str) -> Option<Self> {
        StateField::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

/// 智能体状态记录，由单个智能体实例独占
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub messages: MessageHistory,
    pub current_task: String,
    pub agent_type: String,
    pub status: AgentStatus,
    /// 至少成功调用过一次的工具 → 最近一次结果
    pub tools_output: HashMap<String, Value>,
    pub context: HashMap<String, Value>,
    /// 空字符串表示无错误；非空时 status 必须为 failed
    pub error: String,
    /// 任务 ID、用户 ID 等标识
    pub metadata: HashMap<String, Value>,
}

impl AgentState {
    /// 初始状态：idle，集合为空，字符串为空
    pub fn init(agent_type: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            ..Self::default()
        }
    }

    /// 把 JSON 值解码后写入指定字段；解码失败时不修改任何内容
    pub fn set_field(&mut self, field: StateField, value: Value) -> Result<(), String> {
        match field {
            StateField::Messages => {
                if !value.is_array() {
                    return Err("messages must be a list".to_string());
                }
                self.messages = decode(field, value)?;
            }
            StateField::CurrentTask => self.current_task = decode(field, value)?,
            StateField::AgentType => self.agent_type = decode(field, value)?,
            StateField::Status => {
                self.status = match value {
                    Value::Null => return Err("state is missing status".to_string()),
                    Value::String(s) => s.parse()?,
                    other => return Err(format!("status must be a string, got {other}")),
                };
            }
            StateField::ToolsOutput => self.tools_output = decode(field, value)?,
            StateField::Context => self.context = decode(field, value)?,
            StateField::Error => self.error = decode(field, value)?,
            StateField::Metadata => self.metadata = decode(field, value)?,
        }
        Ok(())
    }

    /// 检查跨字段不变量
    pub fn validate(&self) -> Result<(), String> {
        if !self.error.is_empty() && self.status != AgentStatus::Failed {
            return Err(format!(
                "error is set but status is '{}' instead of 'failed'",
                self.status
            ));
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(field: StateField, value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("{}: {}", field.as_str(), e))
}
