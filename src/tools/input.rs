//! 工具入参：位置参数 + 关键字参数（均为 JSON 值）

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl ToolInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只有关键字参数
    pub fn from_kwargs(kwargs: Map<String, Value>) -> Self {
        Self {
            args: Vec::new(),
            kwargs,
        }
    }

    pub fn with_arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn kwarg(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

impl From<&str> for ToolInput {
    fn from(s: &str) -> Self {
        ToolInput::new().with_arg(s)
    }
}

impl From<String> for ToolInput {
    fn from(s: String) -> Self {
        ToolInput::new().with_arg(s)
    }
}

/// 无参数
impl From<()> for ToolInput {
    fn from(_: ()) -> Self {
        ToolInput::new()
    }
}

/// 任意 JSON 值（包括对象与 null）都作为单个位置参数
impl From<Value> for ToolInput {
    fn from(value: Value) -> Self {
        ToolInput::new().with_arg(value)
    }
}

/// 输入预览，用于日志
pub(crate) fn preview(input: &ToolInput) -> String {
    let s = serde_json::to_string(input).unwrap_or_default();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversions() {
        let input = ToolInput::from("hi");
        assert_eq!(input.arg(0), Some(&json!("hi")));

        // 对象与 null 也是单个位置参数
        let input = ToolInput::from(json!({"query": "rust"}));
        assert_eq!(input.args, vec![json!({"query": "rust"})]);
        assert!(input.kwargs.is_empty());

        assert_eq!(ToolInput::from(Value::Null).args, vec![Value::Null]);
        assert!(ToolInput::from(()).is_empty());

        let mut kwargs = Map::new();
        kwargs.insert("query".into(), json!("rust"));
        let input = ToolInput::from_kwargs(kwargs);
        assert!(input.args.is_empty());
        assert_eq!(input.kwarg("query"), Some(&json!("rust")));
    }

    #[test]
    fn test_preview_truncates() {
        let input = ToolInput::new().with_arg("x".repeat(500));
        let p = preview(&input);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 203);
    }
}
