//! 函数适配器：把普通函数包装成 Tool，两种调用方式执行同一个函数

use serde_json::Value;

use crate::core::ToolError;
use crate::tools::{Tool, ToolInput};

type ToolFn = dyn Fn(&ToolInput) -> Result<Value, ToolError> + Send + Sync;

/// 由函数构建的工具；名称总是显式给出
pub struct FnTool {
    name: String,
    description: String,
    func: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&ToolInput) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            func: Box::new(func),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn call(&self, input: &ToolInput) -> Result<Value, ToolError> {
        (self.func)(input)
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_both_conventions_share_function() {
        let double = FnTool::new("double", |input| {
            let x = input
                .arg(0)
                .and_then(|v| v.as_i64())
                .ok_or_else(|| ToolError::InvalidInput("expected an integer".into()))?;
            Ok(json!(x * 2))
        })
        .with_description("Double an integer");

        let input = ToolInput::new().with_arg(21);
        assert_eq!(double.call(&input).unwrap(), json!(42));
        assert_eq!(double.call_async(&input).await.unwrap(), json!(42));
        assert_eq!(double.name(), "double");
        assert_eq!(double.description(), "Double an integer");
        assert!(matches!(
            double.call(&ToolInput::new()),
            Err(ToolError::InvalidInput(_))
        ));
    }
}
