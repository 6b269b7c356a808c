//! 具体智能体需要实现的行为：身份与 run

use async_trait::async_trait;

use crate::agent::Agent;
use crate::core::{AgentError, AgentState};

/// 具体智能体（planner / researcher / analyzer / writer 等）的能力接口
///
/// run 的约定：开始可能失败的工作前把状态置为 running；成功置为 completed，
/// 失败置为 failed 并填写 error；返回可供调用方工作流继续使用的状态。
#[async_trait]
pub trait AgentBehavior: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 未显式配置系统提示词时使用
    fn default_system_prompt(&self) -> String {
        format!("You are {}. {}", self.name(), self.description())
    }

    /// 主逻辑：可调用工具、追加消息、更新上下文与元数据
    async fn run(&self, agent: &mut Agent, state: AgentState) -> Result<AgentState, AgentError>;
}
