//! Agent 构建器：统一的 Agent 初始化逻辑
//!
//! 可选的模型句柄、预注册工具、系统提示词、重试次数与（建议性）超时；
//! 也可直接从配置的 [agent] 段读取重试与超时设置。

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::agent::{Agent, AgentBehavior};
use crate::config::AgentSection;
use crate::core::{AgentError, AgentState};
use crate::llm::LlmClient;
use crate::tools::{RetryPolicy, Tool, ToolExecutor, ToolRegistry};

/// 默认建议超时（秒）
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

pub struct AgentBuilder {
    behavior: Arc<dyn AgentBehavior>,
    llm: Option<Arc<dyn LlmClient>>,
    tools: Vec<(Option<String>, Arc<dyn Tool>)>,
    system_prompt: Option<String>,
    policy: RetryPolicy,
    timeout: Duration,
    span: Option<Span>,
}

impl AgentBuilder {
    pub fn new(behavior: impl AgentBehavior + 'static) -> Self {
        Self::from_arc(Arc::new(behavior))
    }

    pub fn from_arc(behavior: Arc<dyn AgentBehavior>) -> Self {
        Self {
            behavior,
            llm: None,
            tools: Vec::new(),
            system_prompt: None,
            policy: RetryPolicy::default(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            span: None,
        }
    }

    /// 读取 [agent] 段：重试次数、退避、取消策略与超时
    pub fn with_config(mut self, cfg: &AgentSection) -> Self {
        self.policy = RetryPolicy::from_config(cfg);
        self.with_timeout_secs(cfg.timeout_secs)
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// 以工具自身声明的名称预注册
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push((None, Arc::new(tool)));
        self
    }

    pub fn with_named_tool(mut self, name: impl Into<String>, tool: impl Tool + 'static) -> Self {
        self.tools.push((Some(name.into()), Arc::new(tool)));
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.policy = self.policy.with_max_retries(max_retries);
        self
    }

    /// 非法值（负数、NaN）时保留当前超时
    pub fn with_timeout_secs(mut self, secs: f64) -> Self {
        if let Ok(timeout) = Duration::try_from_secs_f64(secs) {
            self.timeout = timeout;
        }
        self
    }

    /// 注入日志 span；默认 `info_span!("agent", name = ..)`
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// 构建 Agent；预注册的工具出现重名时返回 NameConflict
    pub fn build(self) -> Result<Agent, AgentError> {
        let name = self.behavior.name().to_string();
        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("agent", name = %name));
        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| self.behavior.default_system_prompt());

        let mut agent = Agent {
            behavior: self.behavior,
            llm: self.llm,
            tools: ToolRegistry::new(),
            executor: ToolExecutor::new(self.policy),
            system_prompt,
            timeout: self.timeout,
            state: AgentState::init(&name),
            span,
            cancel_token: CancellationToken::new(),
        };
        for (tool_name, tool) in self.tools {
            agent.register_tool(tool, tool_name.as_deref(), false)?;
        }

        tracing::debug!(
            parent: &agent.span,
            tools = ?agent.tool_names(),
            max_retries = agent.max_retries(),
            "agent initialized"
        );
        Ok(agent)
    }
}
