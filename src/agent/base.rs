//! Agent 编排器：组合工具注册表、调用引擎、消息历史与状态
//!
//! 具体智能体只提供身份与 run（见 [`AgentBehavior`]），其余生命周期操作都在这里。
//! 单个实例不做内部同步：同一时间只应由一条逻辑流驱动。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::agent::summary::task_preview;
use crate::agent::{AgentBehavior, AgentBuilder, ExecutionRecord, StateSummary};
use crate::core::{AgentError, AgentState, AgentStatus, StateField, ToolError};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::tools::{
    FnTool, InvocationScope, Tool, ToolExecutor, ToolInput, ToolNameConflict, ToolRegistry,
};

pub struct Agent {
    pub(super) behavior: Arc<dyn AgentBehavior>,
    pub(super) llm: Option<Arc<dyn LlmClient>>,
    pub(super) tools: ToolRegistry,
    pub(super) executor: ToolExecutor,
    pub(super) system_prompt: String,
    /// 建议性超时，核心不强制
    pub(super) timeout: Duration,
    pub(super) state: AgentState,
    pub(super) span: Span,
    pub(super) cancel_token: CancellationToken,
}

impl Agent {
    pub fn builder(behavior: impl AgentBehavior + 'static) -> AgentBuilder {
        AgentBuilder::new(behavior)
    }

    // ---------- 身份与配置 ----------

    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    pub fn description(&self) -> &str {
        self.behavior.description()
    }

    pub fn default_system_prompt(&self) -> String {
        self.behavior.default_system_prompt()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 模型句柄对核心不透明，仅供具体智能体在 run 中使用
    pub fn llm(&self) -> Option<&Arc<dyn LlmClient>> {
        self.llm.as_ref()
    }

    pub fn max_retries(&self) -> u32 {
        self.executor.policy().max_retries()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ---------- 工具 ----------

    /// 注册工具；name 为 None 时使用工具自身声明的名称
    pub fn register_tool(
        &mut self,
        tool: Arc<dyn Tool>,
        name: Option<&str>,
        overwrite: bool,
    ) -> Result<(), AgentError> {
        let name = name.map_or_else(|| tool.name().to_string(), str::to_string);
        match self.tools.register(name.clone(), tool, overwrite) {
            Ok(Some(_)) => {
                tracing::warn!(parent: &self.span, tool = %name, "tool overwritten");
            }
            Ok(None) => {
                tracing::info!(parent: &self.span, tool = %name, "tool registered");
            }
            Err(ToolNameConflict(tool)) => {
                return Err(AgentError::NameConflict {
                    agent: self.name().to_string(),
                    tool,
                }
                .logged(&self.span));
            }
        }
        Ok(())
    }

    /// 把普通函数包装为工具后注册
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        func: F,
        overwrite: bool,
    ) -> Result<(), AgentError>
    where
        F: Fn(&ToolInput) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        let tool = FnTool::new(name, func);
        self.register_tool(Arc::new(tool), None, overwrite)
    }

    /// 移除工具；名称不存在时返回 false（只记录警告）
    pub fn unregister_tool(&mut self, name: &str) -> bool {
        let removed = self.tools.unregister(name);
        if removed {
            tracing::info!(parent: &self.span, tool = name, "tool unregistered");
        } else {
            tracing::warn!(
                parent: &self.span,
                tool = name,
                "tool not found, nothing to unregister"
            );
        }
        removed
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.tools()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.tool_names()
    }

    // ---------- 调用 ----------

    /// 可挂起的工具调用；取消令牌触发时按取消策略处理
    pub async fn invoke_tool(
        &mut self,
        name: &str,
        input: impl Into<ToolInput>,
    ) -> Result<Value, AgentError> {
        let input = input.into();
        let scope = InvocationScope {
            agent: self.behavior.name(),
            span: &self.span,
            registry: &self.tools,
            outputs: &mut self.state.tools_output,
        };
        self.executor
            .execute(scope, name, &input, &self.cancel_token)
            .await
    }

    /// 阻塞的工具调用，供严格顺序执行的调用方使用
    pub fn invoke_tool_blocking(
        &mut self,
        name: &str,
        input: impl Into<ToolInput>,
    ) -> Result<Value, AgentError> {
        let input = input.into();
        let scope = InvocationScope {
            agent: self.behavior.name(),
            span: &self.span,
            registry: &self.tools,
            outputs: &mut self.state.tools_output,
        };
        self.executor
            .execute_blocking(scope, name, &input, &self.cancel_token)
    }

    /// 调用方持有的取消句柄；cancel() 会中断当前及后续调用
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// 取消之后换一个新令牌，使智能体可以继续调用工具
    pub fn renew_cancellation_token(&mut self) -> CancellationToken {
        self.cancel_token = CancellationToken::new();
        self.cancel_token.clone()
    }

    // ---------- 状态 ----------

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn reset_state(&mut self) {
        self.state = AgentState::init(self.behavior.name());
        tracing::info!(parent: &self.span, "state reset");
    }

    /// 用外部传入的状态（通常是工作流交给 run 的状态）替换当前状态。
    /// agent_type 始终是本智能体的名称
    pub fn load_state(&mut self, mut state: AgentState) -> Result<(), AgentError> {
        state.validate().map_err(|reason| self.invalid_state(reason))?;
        if state.agent_type != self.name() {
            tracing::debug!(
                parent: &self.span,
                incoming = %state.agent_type,
                "incoming state belongs to another agent type, keeping own"
            );
            state.agent_type = self.name().to_string();
        }
        self.state = state;
        Ok(())
    }

    /// 按字段名批量更新；未知字段只记录警告并跳过。
    /// 与 set_status 一致：更新了 status（非 failed）而未同时给出 error 时清空 error。
    /// 任一字段解码失败或结果不满足不变量时整体放弃，状态保持不变
    pub fn update_state<I, K>(&mut self, fields: I) -> Result<(), AgentError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut candidate = self.state.clone();
        let mut updated = Vec::new();
        for (key, value) in fields {
            let key = key.as_ref();
            let Some(field) = StateField::from_name(key) else {
                tracing::warn!(parent: &self.span, field = key, "ignoring unknown state field");
                continue;
            };
            candidate
                .set_field(field, value)
                .map_err(|reason| self.invalid_state(reason))?;
            updated.push(field);
        }
        if updated.contains(&StateField::Status)
            && !updated.contains(&StateField::Error)
            && candidate.status != AgentStatus::Failed
        {
            candidate.error.clear();
        }
        candidate
            .validate()
            .map_err(|reason| self.invalid_state(reason))?;

        self.state = candidate;
        if !updated.is_empty() {
            let names: Vec<&str> = updated.iter().map(StateField::as_str).collect();
            tracing::debug!(parent: &self.span, fields = ?names, "state updated");
        }
        Ok(())
    }

    pub fn validate_state(&self) -> Result<(), AgentError> {
        self.state
            .validate()
            .map_err(|reason| self.invalid_state(reason))
    }

    /// 设置状态；不在生命周期图中的迁移只告警不拒绝。
    /// 切到 failed 以外的状态时清空 error
    pub fn set_status(&mut self, status: AgentStatus) {
        let from = self.state.status;
        if !from.can_transition_to(status) {
            tracing::warn!(parent: &self.span, %from, to = %status, "unexpected status transition");
        }
        self.state.status = status;
        if status != AgentStatus::Failed {
            self.state.error.clear();
        }
        tracing::debug!(parent: &self.span, %from, to = %status, "status changed");
    }

    pub fn set_current_task(&mut self, task: impl Into<String>) {
        self.state.current_task = task.into();
    }

    fn invalid_state(&self, reason: String) -> AgentError {
        AgentError::StateValidation {
            agent: self.name().to_string(),
            reason,
        }
        .logged(&self.span)
    }

    // ---------- 消息 ----------

    pub fn add_message(&mut self, message: Message) {
        self.state.messages.push(message);
    }

    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::system(content));
    }

    pub fn add_human_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::human(content));
    }

    pub fn add_ai_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    pub fn add_tool_message(
        &mut self,
        content: impl Into<String>,
        tool_call_id: impl Into<String>,
    ) {
        self.add_message(Message::tool(content, tool_call_id));
    }

    pub fn get_messages(&self, include_system: bool) -> Vec<Message> {
        self.state.messages.list(include_system)
    }

    pub fn get_last_message(&self) -> Option<&Message> {
        self.state.messages.last()
    }

    pub fn clear_messages(&mut self) {
        self.state.messages.clear();
    }

    /// 交给模型的消息：系统提示词（非空时）在前，其后为完整历史
    pub fn prepare_messages_for_model(&self) -> Vec<Message> {
        let prompt = (!self.system_prompt.is_empty()).then_some(self.system_prompt.as_str());
        self.state.messages.prepare_for_model(prompt)
    }

    // ---------- 上下文与元数据 ----------

    pub fn set_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.context.insert(key.into(), value.into());
    }

    pub fn get_context(&self, key: &str) -> Option<&Value> {
        self.state.context.get(key)
    }

    pub fn get_context_or(&self, key: &str, default: Value) -> Value {
        self.get_context(key).cloned().unwrap_or(default)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.metadata.insert(key.into(), value.into());
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.state.metadata.get(key)
    }

    pub fn get_metadata_or(&self, key: &str, default: Value) -> Value {
        self.get_metadata(key).cloned().unwrap_or(default)
    }

    // ---------- 错误与摘要 ----------

    /// 写入错误信息，并强制把状态置为 failed
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.state.error = error.into();
        self.state.status = AgentStatus::Failed;
        tracing::error!(
            parent: &self.span,
            agent = self.behavior.name(),
            error = %self.state.error,
            "agent failed"
        );
    }

    pub fn get_states_summary(&self) -> StateSummary {
        StateSummary {
            name: self.name().to_string(),
            status: self.state.status,
            message_count: self.state.messages.len(),
            tool_count: self.tools.len(),
            has_error: !self.state.error.is_empty(),
            current_task: task_preview(&self.state.current_task),
        }
    }

    // ---------- 执行入口 ----------

    /// 交给具体智能体执行；错误原样向上返回
    pub async fn run(&mut self, state: AgentState) -> Result<AgentState, AgentError> {
        let behavior = Arc::clone(&self.behavior);
        tracing::info!(
            parent: &self.span,
            task = %task_preview(&state.current_task),
            "run started"
        );
        let result = behavior.run(self, state).await;
        match &result {
            Ok(out) => {
                tracing::info!(parent: &self.span, status = %out.status, "run finished");
            }
            Err(err) => {
                tracing::warn!(parent: &self.span, error = %err, "run returned an error");
            }
        }
        result
    }

    /// 与 run 相同，另外产出一条可由外围工作流持久化的执行记录
    pub async fn run_recorded(
        &mut self,
        state: AgentState,
    ) -> (ExecutionRecord, Result<AgentState, AgentError>) {
        let mut record = ExecutionRecord::start(self.name(), &state);
        let result = self.run(state).await;
        record.finish(&result);
        tracing::debug!(
            parent: &self.span,
            execution_id = %record.id,
            duration_ms = record.duration_ms().unwrap_or_default(),
            "execution recorded"
        );
        (record, result)
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.name(), self.description())
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name())
            .field("tools", &self.tool_names())
            .field("max_retries", &self.max_retries())
            .field("status", &self.state.status)
            .finish()
    }
}
