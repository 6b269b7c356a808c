//! LLM 层：模型客户端抽象（核心不直接调用）与 Mock 实现

pub mod mock;
pub mod traits;

pub use mock::MockLlmClient;
pub use traits::LlmClient;
