//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / call / call_async），由 ToolRegistry 按名注册与查找。
//! 注册名以注册时给出的名称为准，可与工具自身声明的 name 不同。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::ToolError;
use crate::tools::ToolInput;

/// 工具 trait：同一能力的阻塞调用与可挂起调用
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具自身声明的名称
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// 阻塞调用
    fn call(&self, input: &ToolInput) -> Result<Value, ToolError>;

    /// 可挂起调用；默认直接执行阻塞版本
    async fn call_async(&self, input: &ToolInput) -> Result<Value, ToolError> {
        self.call(input)
    }
}

/// 同名工具已存在且未要求覆盖
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("tool '{0}' already registered")]
pub struct ToolNameConflict(pub String);

/// 工具注册表：按名称存储 Arc<dyn Tool>，由单个智能体独占
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 name 注册；已存在且 overwrite 为 false 时返回冲突且不做任何修改。
    /// 成功时返回被替换掉的旧工具（如有）
    pub fn register(
        &mut self,
        name: impl Into<String>,
        tool: Arc<dyn Tool>,
        overwrite: bool,
    ) -> Result<Option<Arc<dyn Tool>>, ToolNameConflict> {
        let name = name.into();
        if !overwrite && self.tools.contains_key(&name) {
            return Err(ToolNameConflict(name));
        }
        Ok(self.tools.insert(name, tool))
    }

    /// 移除并返回是否存在
    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 名称列表（顺序不保证）
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{EchoTool, FnTool};
    use serde_json::json;

    #[test]
    fn test_register_conflict_keeps_previous() {
        let mut registry = ToolRegistry::new();
        registry
            .register("calc", Arc::new(FnTool::new("calc", |_| Ok(json!(1)))), false)
            .unwrap();

        let err = registry
            .register("calc", Arc::new(FnTool::new("calc", |_| Ok(json!(2)))), false)
            .err()
            .unwrap();
        assert_eq!(err, ToolNameConflict("calc".into()));
        let tool = registry.get("calc").unwrap();
        assert_eq!(tool.call(&ToolInput::new()).unwrap(), json!(1));

        let replaced = registry
            .register("calc", Arc::new(FnTool::new("calc", |_| Ok(json!(2)))), true)
            .unwrap();
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);
        let tool = registry.get("calc").unwrap();
        assert_eq!(tool.call(&ToolInput::new()).unwrap(), json!(2));
    }

    #[test]
    fn test_unregister_and_get() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());
        registry.register("say", Arc::new(EchoTool), false).unwrap();
        assert!(registry.contains("say"));
        assert!(registry.get("echo").is_none());
        assert_eq!(registry.tool_names(), vec!["say".to_string()]);
        assert!(registry.unregister("say"));
        assert!(!registry.unregister("say"));
        assert!(registry.get("say").is_none());
    }
}
