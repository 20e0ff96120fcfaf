//! Cooldown interceptor
//!
//! Enforces a minimum time between swaps to prevent rapid-fire trading.

use super::{ActionInterceptor, InterceptorDecision, InvocationContext};
use crate::actions::{ActionKind, ActionResponse};
use crate::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct TradeWindow {
    /// Last successful swap
    last_trade: Option<Instant>,
    /// Swap that passed the check and has not completed yet
    in_flight: Option<Uuid>,
}

/// Interceptor that enforces cooldown between swaps
///
/// A swap that passes the check holds the window until it completes, so
/// concurrent swaps are refused rather than both slipping through.
pub struct CooldownInterceptor {
    /// Minimum time between swaps
    cooldown_duration: Duration,
    window: Mutex<TradeWindow>,
}

impl CooldownInterceptor {
    /// Create a new cooldown interceptor
    ///
    /// # Arguments
    /// * `cooldown_seconds` - Minimum seconds between swaps
    pub fn new(cooldown_seconds: u64) -> Self {
        Self {
            cooldown_duration: Duration::from_secs(cooldown_seconds),
            window: Mutex::new(TradeWindow::default()),
        }
    }
}

#[async_trait]
impl ActionInterceptor for CooldownInterceptor {
    async fn intercept_action(&self, context: &InvocationContext) -> Result<InterceptorDecision> {
        // Only swaps are rate limited
        if context.action != ActionKind::Swap {
            return Ok(InterceptorDecision::Allow);
        }

        let mut window = self.window.lock().await;
        if window.in_flight.is_some() {
            return Ok(InterceptorDecision::Block(
                "Another swap is still in progress.".to_string(),
            ));
        }
        if let Some(last) = window.last_trade {
            let elapsed = last.elapsed();
            if elapsed < self.cooldown_duration {
                let remaining = self.cooldown_duration - elapsed;
                return Ok(InterceptorDecision::Block(format!(
                    "Trading cooldown active. Please wait {} more seconds.",
                    remaining.as_secs().max(1)
                )));
            }
        }
        window.in_flight = Some(context.invocation_id);

        tracing::debug!(
            cooldown_seconds = self.cooldown_duration.as_secs(),
            invocation_id = %context.invocation_id,
            "Cooldown check passed"
        );

        Ok(InterceptorDecision::Allow)
    }

    async fn on_action_complete(
        &self,
        context: &InvocationContext,
        result: &Result<ActionResponse>,
        _duration_ms: u64,
    ) {
        if context.action != ActionKind::Swap {
            return;
        }

        let mut window = self.window.lock().await;
        if window.in_flight != Some(context.invocation_id) {
            return;
        }
        window.in_flight = None;

        // A swap that returned an error envelope did not trade
        if matches!(result, Ok(response) if response.is_success()) {
            window.last_trade = Some(Instant::now());
            tracing::info!("Updated last trade timestamp for cooldown tracking");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    fn swap_context() -> InvocationContext {
        InvocationContext::new(ActionKind::Swap, json!({}), None)
    }

    #[tokio::test]
    async fn test_allows_first_trade() {
        let interceptor = CooldownInterceptor::new(60);

        let decision = interceptor.intercept_action(&swap_context()).await.unwrap();
        assert_eq!(decision, InterceptorDecision::Allow);
    }

    #[tokio::test]
    async fn test_blocks_rapid_trades() {
        let interceptor = CooldownInterceptor::new(60);
        let context = swap_context();

        // First trade should be allowed
        let decision = interceptor.intercept_action(&context).await.unwrap();
        assert_eq!(decision, InterceptorDecision::Allow);

        // Simulate successful trade
        interceptor
            .on_action_complete(&context, &Ok(ActionResponse::success(json!({}))), 100)
            .await;

        // Second trade immediately after should be blocked
        let decision = interceptor.intercept_action(&context).await.unwrap();
        assert!(matches!(decision, InterceptorDecision::Block(_)));
    }

    #[tokio::test]
    async fn test_failed_swaps_do_not_start_cooldown() {
        let interceptor = CooldownInterceptor::new(60);

        let first = swap_context();
        interceptor.intercept_action(&first).await.unwrap();
        interceptor
            .on_action_complete(&first, &Ok(ActionResponse::error("Swap failed", None)), 100)
            .await;

        let second = swap_context();
        interceptor.intercept_action(&second).await.unwrap();
        interceptor
            .on_action_complete(&second, &Err(Error::QuoteFailed("no data".into())), 100)
            .await;

        let decision = interceptor.intercept_action(&swap_context()).await.unwrap();
        assert_eq!(decision, InterceptorDecision::Allow);
    }

    #[tokio::test]
    async fn test_concurrent_swap_is_blocked_while_first_runs() {
        let interceptor = CooldownInterceptor::new(60);
        let first = swap_context();
        let second = swap_context();

        let decision = interceptor.intercept_action(&first).await.unwrap();
        assert_eq!(decision, InterceptorDecision::Allow);

        // Second swap arrives before the first completes
        let decision = interceptor.intercept_action(&second).await.unwrap();
        assert!(matches!(decision, InterceptorDecision::Block(reason) if reason.contains("in progress")));

        // Completion of the refused swap must not release the first one's slot
        interceptor
            .on_action_complete(&second, &Err(Error::Blocked("refused".into())), 0)
            .await;
        let decision = interceptor.intercept_action(&swap_context()).await.unwrap();
        assert!(matches!(decision, InterceptorDecision::Block(_)));

        // A failed first swap frees the window without starting a cooldown
        interceptor
            .on_action_complete(&first, &Ok(ActionResponse::error("Swap failed", None)), 100)
            .await;
        let decision = interceptor.intercept_action(&swap_context()).await.unwrap();
        assert_eq!(decision, InterceptorDecision::Allow);
    }

    #[tokio::test]
    async fn test_allows_quotes_during_cooldown() {
        let interceptor = CooldownInterceptor::new(60);

        let swap = swap_context();
        interceptor.intercept_action(&swap).await.unwrap();
        interceptor
            .on_action_complete(&swap, &Ok(ActionResponse::success(json!({}))), 100)
            .await;

        // Quote should still be allowed
        let context = InvocationContext::new(ActionKind::Quote, json!({}), None);
        let decision = interceptor.intercept_action(&context).await.unwrap();
        assert_eq!(decision, InterceptorDecision::Allow);
    }
}
