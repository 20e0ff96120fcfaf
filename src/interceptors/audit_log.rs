//! Audit log interceptor
//!
//! Logs all action invocations for compliance and debugging.

use super::{ActionInterceptor, InterceptorDecision, InvocationContext};
use crate::actions::ActionResponse;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Entry in the audit log
#[derive(Debug, Serialize)]
struct AuditEntry {
    timestamp: DateTime<Utc>,
    entry_type: &'static str,
    invocation_id: String,
    action: &'static str,
    args: Value,
    result: Option<Value>,
    error: Option<String>,
    duration_ms: u64,
    status: &'static str,
}

/// Writer for audit log entries
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn write(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Interceptor that logs all operations to a file
pub struct AuditLogInterceptor {
    writer: Arc<Mutex<AuditLogWriter>>,
}

impl AuditLogInterceptor {
    /// Create a new audit log interceptor
    ///
    /// # Arguments
    /// * `log_path` - Path to the audit log file (JSONL format)
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter::new(log_path.into()))),
        }
    }

    async fn record(&self, entry: AuditEntry) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

#[async_trait]
impl ActionInterceptor for AuditLogInterceptor {
    async fn intercept_action(&self, context: &InvocationContext) -> Result<InterceptorDecision> {
        self.record(AuditEntry {
            timestamp: Utc::now(),
            entry_type: "action_start",
            invocation_id: context.invocation_id.to_string(),
            action: context.action.name(),
            args: context.args.clone(),
            result: None,
            error: None,
            duration_ms: 0,
            status: "pending",
        })
        .await;

        // Audit logging never blocks
        Ok(InterceptorDecision::Allow)
    }

    async fn on_action_complete(
        &self,
        context: &InvocationContext,
        result: &Result<ActionResponse>,
        duration_ms: u64,
    ) {
        let (result_value, error, status) = match result {
            Ok(response) => (
                Some(truncate_result(
                    &serde_json::to_value(response).unwrap_or(Value::Null),
                )),
                None,
                if response.is_success() { "success" } else { "error" },
            ),
            Err(e) => (None, Some(e.to_string()), "error"),
        };

        self.record(AuditEntry {
            timestamp: Utc::now(),
            entry_type: "action_complete",
            invocation_id: context.invocation_id.to_string(),
            action: context.action.name(),
            args: context.args.clone(),
            result: result_value,
            error,
            duration_ms,
            status,
        })
        .await;
    }
}

/// Truncate result for logging (token lists are large)
fn truncate_result(result: &Value) -> Value {
    let s = serde_json::to_string(result).unwrap_or_default();
    if s.len() > 1000 {
        let cut = (0..=1000).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
        serde_json::json!(format!("{}... [truncated]", &s[..cut]))
    } else {
        result.clone()
    }
}
