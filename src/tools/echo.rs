//! Echo 工具（测试用）

use serde_json::Value;

use crate::core::ToolError;
use crate::tools::{Tool, ToolInput};

/// Echo 工具：原样返回第一个位置参数，否则返回 text 关键字参数
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoTool;

impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the argument unchanged (for testing). Args: [value] or {\"text\": \"message\"}"
    }

    fn call(&self, input: &ToolInput) -> Result<Value, ToolError> {
        input
            .arg(0)
            .or_else(|| input.kwarg("text"))
            .cloned()
            .ok_or_else(|| ToolError::InvalidInput("echo expects one argument".into()))
    }
}
