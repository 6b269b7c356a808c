//! Mock LLM 客户端（用于测试，无需 API）

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// Mock 客户端：回显最后一条 Human 消息
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_human = messages
            .iter()
            .rev()
            .find(|m| m.role() == Role::Human)
            .map(|m| m.content())
            .unwrap_or("(no input)");
        Ok(format!("Echo from Mock: {}", last_human))
    }
}
