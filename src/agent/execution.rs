//! 执行记录：一次 run 的输入、输出、错误与起止时间
//!
//! 核心只产出该值，是否落库由外围工作流决定。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::{AgentError, AgentState, AgentStatus};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub agent_type: String,
    /// 取自输入状态 metadata 中的 task_id
    pub task_id: Option<Value>,
    pub status: AgentStatus,
    pub input: String,
    /// 成功时为结果状态的 context
    pub output: Option<Value>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    pub fn start(agent_type: impl Into<String>, state: &AgentState) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_type: agent_type.into(),
            task_id: state.metadata.get("task_id").cloned(),
            status: AgentStatus::Running,
            input: state.current_task.clone(),
            output: None,
            error_message: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn finish(&mut self, result: &Result<AgentState, AgentError>) {
        self.ended_at = Some(Utc::now());
        match result {
            Ok(state) => {
                self.status = state.status;
                self.output = serde_json::to_value(&state.context).ok();
                if !state.error.is_empty() {
                    self.error_message = Some(state.error.clone());
                }
            }
            Err(err) => {
                self.status = AgentStatus::Failed;
                self.error_message = Some(err.to_string());
            }
        }
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_success() {
        let mut input = AgentState::init("writer");
        input.current_task = "draft report".into();
        input.metadata.insert("task_id".into(), json!(7));

        let mut record = ExecutionRecord::start("writer", &input);
        assert_eq!(record.status, AgentStatus::Running);
        assert_eq!(record.task_id, Some(json!(7)));
        assert!(record.duration_ms().is_none());

        let mut output = input.clone();
        output.status = AgentStatus::Completed;
        output.context.insert("words".into(), json!(1200));
        record.finish(&Ok(output));

        assert_eq!(record.status, AgentStatus::Completed);
        assert_eq!(record.output, Some(json!({"words": 1200})));
        assert!(record.error_message.is_none());
        assert!(record.duration_ms().unwrap() >= 0);
    }

    #[test]
    fn test_record_failure() {
        let input = AgentState::init("writer");
        let mut record = ExecutionRecord::start("writer", &input);
        record.finish(&Err(AgentError::run("writer", "model unavailable")));
        assert_eq!(record.status, AgentStatus::Failed);
        assert_eq!(
            record.error_message.as_deref(),
            Some("[writer] | model unavailable")
        );
        assert!(record.output.is_none());
    }
}
