//! Risk management and audit interceptors
//!
//! These interceptors form a governance pipeline that all action invocations
//! must pass through. They enforce trading limits, log all operations, and
//! can block risky trades.

mod audit_log;
mod cooldown;
mod slippage_guard;

pub use audit_log::AuditLogInterceptor;
pub use cooldown::CooldownInterceptor;
pub use slippage_guard::SlippageGuardInterceptor;

use crate::actions::{ActionKind, ActionResponse};
use crate::config::Config;
use crate::okx::Slippage;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Whether an invocation may proceed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptorDecision {
    Allow,
    Block(String),
}

/// What an interceptor sees about one action invocation
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub action: ActionKind,
    /// Validated input, as JSON
    pub args: Value,
    /// Requested slippage for quote and swap actions
    pub slippage: Option<Slippage>,
    pub invocation_id: Uuid,
}

impl InvocationContext {
    pub fn new(action: ActionKind, args: Value, slippage: Option<Slippage>) -> Self {
        Self {
            action,
            args,
            slippage,
            invocation_id: Uuid::new_v4(),
        }
    }
}

/// Hook run around every action invocation
#[async_trait]
pub trait ActionInterceptor: Send + Sync {
    /// Called before the action runs; `Block` stops it
    async fn intercept_action(&self, context: &InvocationContext) -> Result<InterceptorDecision>;

    /// Called after the action finishes, whatever the outcome
    async fn on_action_complete(
        &self,
        context: &InvocationContext,
        result: &Result<ActionResponse>,
        duration_ms: u64,
    );
}

/// Ordered set of interceptors
#[derive(Default, Clone)]
pub struct InterceptorPipeline {
    interceptors: Vec<Arc<dyn ActionInterceptor>>,
}

impl InterceptorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard pipeline from configuration: slippage guard, cooldown (when
    /// non-zero) and audit log (when a path is set)
    pub fn from_config(config: &Config) -> Self {
        let mut pipeline = Self::new().with(Arc::new(SlippageGuardInterceptor::new(
            config.risk.max_slippage_percent,
        )));

        if config.risk.cooldown_seconds > 0 {
            pipeline = pipeline.with(Arc::new(CooldownInterceptor::new(
                config.risk.cooldown_seconds,
            )));
        }

        if let Some(path) = &config.audit_log_path {
            pipeline = pipeline.with(Arc::new(AuditLogInterceptor::new(path)));
        }

        pipeline
    }

    pub fn with(mut self, interceptor: Arc<dyn ActionInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every `intercept_action`; the first block wins
    pub async fn before(&self, context: &InvocationContext) -> Result<()> {
        for interceptor in &self.interceptors {
            if let InterceptorDecision::Block(reason) = interceptor.intercept_action(context).await? {
                tracing::warn!(
                    action = context.action.name(),
                    invocation_id = %context.invocation_id,
                    reason = %reason,
                    "Action blocked by interceptor"
                );
                return Err(Error::Blocked(reason));
            }
        }
        Ok(())
    }

    pub async fn after(
        &self,
        context: &InvocationContext,
        result: &Result<ActionResponse>,
        duration_ms: u64,
    ) {
        for interceptor in &self.interceptors {
            interceptor
                .on_action_complete(context, result, duration_ms)
                .await;
        }
    }
}
