//! 工具执行器：有上限的重试调用
//!
//! 按名解析工具（未注册则立即失败、不做任何尝试），随后最多尝试 max_retries 次；
//! 首次成功即把结果写入 tools_output 并返回，全部失败则包装最后一次错误。
//! 可挂起与阻塞两种调用方式共享同一套规则，唯一的副作用是 tools_output。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::config::AgentSection;
use crate::core::{AgentError, ToolError};
use crate::tools::input::preview;
use crate::tools::{Tool, ToolInput, ToolRegistry};

/// 两次尝试之间的等待策略
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum Backoff {
    /// 不等待，立即重试
    #[default]
    None,
    Fixed { delay_ms: u64 },
    /// 从 base_ms 起每次翻倍，不超过 max_ms
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Backoff {
    /// 第 failed_attempts 次失败之后的等待时长
    pub fn delay(&self, failed_attempts: u32) -> Option<Duration> {
        match self {
            Backoff::None => None,
            Backoff::Fixed { delay_ms } => Some(Duration::from_millis(*delay_ms)),
            Backoff::Exponential { base_ms, max_ms } => {
                let factor = 1u64
                    .checked_shl(failed_attempts.saturating_sub(1))
                    .unwrap_or(u64::MAX);
                Some(Duration::from_millis(
                    base_ms.saturating_mul(factor).min(*max_ms),
                ))
            }
        }
    }
}

/// 取消信号的处理方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CancellationPolicy {
    /// 立即停止重试并返回 Cancelled
    #[default]
    Propagate,
    /// 与普通失败一样计入尝试次数并继续重试
    Retry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    pub backoff: Backoff,
    pub cancellation: CancellationPolicy,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// max_retries 至少为 1
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            backoff: Backoff::None,
            cancellation: CancellationPolicy::Propagate,
        }
    }

    pub fn from_config(cfg: &AgentSection) -> Self {
        let cancellation = if cfg.retry_on_cancel {
            CancellationPolicy::Retry
        } else {
            CancellationPolicy::Propagate
        };
        Self::new(cfg.max_retries)
            .with_backoff(cfg.backoff.clone())
            .with_cancellation(cancellation)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationPolicy) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}

/// 一次调用所需的智能体上下文：身份、日志 span、注册表与结果缓存
pub struct InvocationScope<'a> {
    pub agent: &'a str,
    pub span: &'a Span,
    pub registry: &'a ToolRegistry,
    pub outputs: &'a mut HashMap<String, Value>,
}

/// 工具执行器：持有重试策略
#[derive(Clone, Debug, Default)]
pub struct ToolExecutor {
    policy: RetryPolicy,
}

impl ToolExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 可挂起调用；取消令牌触发时当前尝试以 ToolError::Cancelled 结束
    pub async fn execute(
        &self,
        scope: InvocationScope<'_>,
        name: &str,
        input: &ToolInput,
        cancel: &CancellationToken,
    ) -> Result<Value, AgentError> {
        let tool = self.resolve(&scope, name)?;
        tracing::debug!(parent: scope.span, tool = name, input = %preview(input), "invoking tool");

        let max = self.policy.max_retries;
        let mut last_error = None;
        for attempt in 1..=max {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ToolError::Cancelled),
                result = tool.call_async(input) => result,
            };
            match outcome {
                Ok(value) => return Ok(Self::record(scope, name, attempt, value)),
                Err(err) => last_error = Some(self.on_failure(&scope, name, attempt, err)?),
            }
            if attempt < max {
                if let Some(delay) = self.policy.backoff.delay(attempt) {
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(Self::exhausted(&scope, name, max, last_error))
    }

    /// 阻塞调用；每次尝试前检查取消令牌
    pub fn execute_blocking(
        &self,
        scope: InvocationScope<'_>,
        name: &str,
        input: &ToolInput,
        cancel: &CancellationToken,
    ) -> Result<Value, AgentError> {
        let tool = self.resolve(&scope, name)?;
        tracing::debug!(
            parent: scope.span,
            tool = name,
            input = %preview(input),
            "invoking tool (blocking)"
        );

        let max = self.policy.max_retries;
        let mut last_error = None;
        for attempt in 1..=max {
            let outcome = if cancel.is_cancelled() {
                Err(ToolError::Cancelled)
            } else {
                tool.call(input)
            };
            match outcome {
                Ok(value) => return Ok(Self::record(scope, name, attempt, value)),
                Err(err) => last_error = Some(self.on_failure(&scope, name, attempt, err)?),
            }
            if attempt < max {
                if let Some(delay) = self.policy.backoff.delay(attempt) {
                    std::thread::sleep(delay);
                }
            }
        }
        Err(Self::exhausted(&scope, name, max, last_error))
    }

    fn resolve(
        &self,
        scope: &InvocationScope<'_>,
        name: &str,
    ) -> Result<Arc<dyn Tool>, AgentError> {
        scope.registry.get(name).ok_or_else(|| {
            AgentError::ToolNotFound {
                agent: scope.agent.to_string(),
                tool: name.to_string(),
            }
            .logged(scope.span)
        })
    }

    fn record(scope: InvocationScope<'_>, name: &str, attempt: u32, value: Value) -> Value {
        scope.outputs.insert(name.to_string(), value.clone());
        tracing::debug!(parent: scope.span, tool = name, attempt, "tool succeeded");
        value
    }

    /// 记录一次失败；按取消策略需要立即停止时返回 Err
    fn on_failure(
        &self,
        scope: &InvocationScope<'_>,
        name: &str,
        attempt: u32,
        err: ToolError,
    ) -> Result<ToolError, AgentError> {
        if err.is_cancelled() && self.policy.cancellation == CancellationPolicy::Propagate {
            return Err(AgentError::Cancelled {
                agent: scope.agent.to_string(),
                tool: name.to_string(),
                attempts: attempt,
            }
            .logged(scope.span));
        }
        tracing::warn!(
            parent: scope.span,
            agent = scope.agent,
            tool = name,
            "tool call failed (attempt {}/{}): {}",
            attempt,
            self.policy.max_retries,
            err
        );
        Ok(err)
    }

    fn exhausted(
        scope: &InvocationScope<'_>,
        name: &str,
        attempts: u32,
        last_error: Option<ToolError>,
    ) -> AgentError {
        AgentError::ToolExecution {
            agent: scope.agent.to_string(),
            tool: name.to_string(),
            attempts,
            source: last_error.unwrap_or_else(|| ToolError::failed("no attempt was made")),
        }
        .logged(scope.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::tools::FnTool;

    /// 前 fail_times 次失败，之后成功
    fn flaky(fail_times: u32, calls: Arc<AtomicU32>) -> FnTool {
        FnTool::new("flaky", move |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= fail_times {
                Err(ToolError::failed(format!("failure #{n}")))
            } else {
                Ok(json!("ok"))
            }
        })
    }

    fn registry_with(tool: impl Tool + 'static) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        let name = tool.name().to_string();
        registry.register(name, Arc::new(tool), false).unwrap();
        registry
    }

    #[test]
    fn test_succeeds_on_last_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let registry = registry_with(flaky(2, calls.clone()));
        let mut outputs = HashMap::new();
        let span = Span::none();
        let executor = ToolExecutor::new(RetryPolicy::new(3));

        let scope = InvocationScope {
            agent: "a",
            span: &span,
            registry: &registry,
            outputs: &mut outputs,
        };
        let value = executor
            .execute_blocking(scope, "flaky", &ToolInput::new(), &CancellationToken::new())
            .unwrap();
        assert_eq!(value, json!("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outputs.get("flaky"), Some(&json!("ok")));
    }

    #[test]
    fn test_exhausted_keeps_prior_output() {
        let calls = Arc::new(AtomicU32::new(0));
        let registry = registry_with(flaky(10, calls.clone()));
        let mut outputs = HashMap::from([("flaky".to_string(), json!("old"))]);
        let span = Span::none();
        let executor = ToolExecutor::new(RetryPolicy::new(3));

        let scope = InvocationScope {
            agent: "a",
            span: &span,
            registry: &registry,
            outputs: &mut outputs,
        };
        let err = executor
            .execute_blocking(scope, "flaky", &ToolInput::new(), &CancellationToken::new())
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match &err {
            AgentError::ToolExecution { attempts, source, .. } => {
                assert_eq!(*attempts, 3);
                assert_eq!(source.to_string(), "failure #3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("failure #3"));
        assert_eq!(outputs.get("flaky"), Some(&json!("old")));
    }

    #[test]
    fn test_unknown_tool_makes_no_attempt() {
        let registry = ToolRegistry::new();
        let mut outputs = HashMap::new();
        let span = Span::none();
        let scope = InvocationScope {
            agent: "a",
            span: &span,
            registry: &registry,
            outputs: &mut outputs,
        };
        let err = ToolExecutor::default()
            .execute_blocking(scope, "missing", &ToolInput::new(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound { .. }));
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_zero_retries_clamped() {
        assert_eq!(RetryPolicy::new(0).max_retries(), 1);
        assert_eq!(RetryPolicy::default().max_retries(), 3);
    }

    #[test]
    fn test_backoff_delays() {
        assert_eq!(Backoff::None.delay(1), None);
        assert_eq!(
            Backoff::Fixed { delay_ms: 50 }.delay(4),
            Some(Duration::from_millis(50))
        );
        let exp = Backoff::Exponential {
            base_ms: 100,
            max_ms: 1000,
        };
        assert_eq!(exp.delay(1), Some(Duration::from_millis(100)));
        assert_eq!(exp.delay(2), Some(Duration::from_millis(200)));
        assert_eq!(exp.delay(3), Some(Duration::from_millis(400)));
        assert_eq!(exp.delay(10), Some(Duration::from_millis(1000)));
        assert_eq!(exp.delay(80), Some(Duration::from_millis(1000)));
    }

    struct Cancelling {
        calls: Arc<AtomicU32>,
    }

    impl Tool for Cancelling {
        fn name(&self) -> &str {
            "cancelling"
        }

        fn call(&self, _input: &ToolInput) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ToolError::Cancelled)
        }
    }

    #[test]
    fn test_cancellation_policies() {
        let span = Span::none();
        let token = CancellationToken::new();

        let calls = Arc::new(AtomicU32::new(0));
        let registry = registry_with(Cancelling { calls: calls.clone() });
        let mut outputs = HashMap::new();
        let scope = InvocationScope {
            agent: "a",
            span: &span,
            registry: &registry,
            outputs: &mut outputs,
        };
        let err = ToolExecutor::default()
            .execute_blocking(scope, "cancelling", &ToolInput::new(), &token)
            .unwrap_err();
        assert!(matches!(err, AgentError::Cancelled { attempts: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = Arc::new(AtomicU32::new(0));
        let registry = registry_with(Cancelling { calls: calls.clone() });
        let scope = InvocationScope {
            agent: "a",
            span: &span,
            registry: &registry,
            outputs: &mut outputs,
        };
        let executor =
            ToolExecutor::new(RetryPolicy::new(3).with_cancellation(CancellationPolicy::Retry));
        let err = executor
            .execute_blocking(scope, "cancelling", &ToolInput::new(), &token)
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    /// 永不返回的异步工具
    struct Pending;

    #[async_trait]
    impl Tool for Pending {
        fn name(&self) -> &str {
            "pending"
        }

        fn call(&self, _input: &ToolInput) -> Result<Value, ToolError> {
            Err(ToolError::failed("blocking call not supported"))
        }

        async fn call_async(&self, _input: &ToolInput) -> Result<Value, ToolError> {
            std::future::pending::<()>().await;
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn test_token_interrupts_suspended_call() {
        let registry = registry_with(Pending);
        let mut outputs = HashMap::new();
        let span = Span::none();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let scope = InvocationScope {
            agent: "a",
            span: &span,
            registry: &registry,
            outputs: &mut outputs,
        };
        let err = ToolExecutor::default()
            .execute(scope, "pending", &ToolInput::new(), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Cancelled { .. }));
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn test_async_backoff_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let registry = registry_with(flaky(1, calls.clone()));
        let mut outputs = HashMap::new();
        let span = Span::none();
        let executor = ToolExecutor::new(
            RetryPolicy::new(2).with_backoff(Backoff::Fixed { delay_ms: 5 }),
        );
        let scope = InvocationScope {
            agent: "a",
            span: &span,
            registry: &registry,
            outputs: &mut outputs,
        };
        let value = executor
            .execute(scope, "flaky", &ToolInput::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(value, json!("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
