//! ResGenie 演示入口
//!
//! 加载配置、初始化日志，构建一个带 echo 工具的演示智能体，
//! 对命令行第一个参数给出的任务运行一次，并以 JSON 输出状态摘要。

use anyhow::Context;
use async_trait::async_trait;
use resgenie::{
    config::load_config,
    observability,
    tools::EchoTool,
    Agent, AgentBehavior, AgentError, AgentState, AgentStatus,
};

/// 演示智能体：把任务交给 echo 工具，结果写回上下文
struct EchoAgent;

#[async_trait]
impl AgentBehavior for EchoAgent {
    fn name(&self) -> &str {
        "echo_agent"
    }

    fn description(&self) -> &str {
        "Repeats the task back through the echo tool."
    }

    async fn run(&self, agent: &mut Agent, state: AgentState) -> Result<AgentState, AgentError> {
        agent.load_state(state)?;
        agent.set_status(AgentStatus::Running);

        let task = agent.state().current_task.clone();
        agent.add_human_message(task.as_str());
        match agent.invoke_tool("echo", task.as_str()).await {
            Ok(reply) => {
                agent.add_ai_message(reply.as_str().unwrap_or_default());
                agent.set_context("reply", reply);
                agent.set_status(AgentStatus::Completed);
                Ok(agent.state().clone())
            }
            Err(err) => {
                agent.set_error(err.to_string());
                Err(err)
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = load_config(None).context("Failed to load config")?;
    let _guards = observability::init(&cfg.logging).context("Failed to init logging")?;

    let task = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hello from resgenie".to_string());

    let mut agent = Agent::builder(EchoAgent)
        .with_config(&cfg.agent)
        .with_tool(EchoTool)
        .build()
        .context("Failed to build agent")?;

    let mut input = AgentState::init(agent.name());
    input.current_task = task;

    let (record, result) = agent.run_recorded(input).await;
    let summary = serde_json::to_string(&agent.get_states_summary())?;
    tracing::info!(
        env = %cfg.app.env,
        execution_id = %record.id,
        summary = %summary,
        "run complete"
    );
    result.context("Agent run failed")?;
    Ok(())
}
