//! 状态摘要：用于日志与调试的固定小记录

use serde::Serialize;

use crate::core::AgentStatus;

/// current_task 预览的最大字符数
pub const TASK_PREVIEW_CHARS: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateSummary {
    pub name: String,
    pub status: AgentStatus,
    pub message_count: usize,
    pub tool_count: usize,
    pub has_error: bool,
    pub current_task: String,
}

/// 超过 TASK_PREVIEW_CHARS 时截断并追加 "..."
pub fn task_preview(task: &str) -> String {
    if task.chars().count() > TASK_PREVIEW_CHARS {
        format!("{}...", task.chars().take(TASK_PREVIEW_CHARS).collect::<String>())
    } else {
        task.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_preview() {
        assert_eq!(task_preview("short"), "short");
        let exact = "a".repeat(TASK_PREVIEW_CHARS);
        assert_eq!(task_preview(&exact), exact);

        let long = "长".repeat(80);
        let preview = task_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), TASK_PREVIEW_CHARS + 3);
    }
}
