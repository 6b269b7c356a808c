//! LLM 客户端抽象
//!
//! 核心只负责准备有序的角色消息列表；调用模型并解析输出由实现 LlmClient 的协作者完成。

use async_trait::async_trait;

use crate::memory::Message;

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;
}
