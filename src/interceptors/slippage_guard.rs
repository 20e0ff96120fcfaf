//! Slippage guard interceptor
//!
//! Blocks quotes and swaps that exceed the configured maximum slippage tolerance.

use super::{ActionInterceptor, InterceptorDecision, InvocationContext};
use crate::actions::ActionResponse;
use crate::okx::Slippage;
use crate::Result;
use async_trait::async_trait;

/// Interceptor that blocks trades with excessive slippage
pub struct SlippageGuardInterceptor {
    /// Maximum allowed slippage (e.g., 1.0 for 1%)
    max_slippage_percent: f64,
}

impl SlippageGuardInterceptor {
    /// Create a new slippage guard
    ///
    /// # Arguments
    /// * `max_slippage_percent` - Maximum allowed slippage percentage (e.g., 1.0 for 1%)
    pub fn new(max_slippage_percent: f64) -> Self {
        Self {
            max_slippage_percent,
        }
    }
}

#[async_trait]
impl ActionInterceptor for SlippageGuardInterceptor {
    async fn intercept_action(&self, context: &InvocationContext) -> Result<InterceptorDecision> {
        // Only quote and swap carry slippage
        let Some(slippage) = &context.slippage else {
            return Ok(InterceptorDecision::Allow);
        };

        let Some(requested) = slippage.percent_value() else {
            return Ok(InterceptorDecision::Block(format!(
                "Slippage '{}' is not a valid percentage",
                slippage.percent()
            )));
        };

        if requested > self.max_slippage_percent {
            let kind = match slippage {
                Slippage::Fixed(_) => "Requested slippage",
                Slippage::Auto { .. } => "Maximum auto slippage",
            };
            return Ok(InterceptorDecision::Block(format!(
                "{} {:.2}% exceeds maximum allowed {:.2}%",
                kind, requested, self.max_slippage_percent
            )));
        }

        tracing::debug!(
            requested_slippage = requested,
            max_slippage = self.max_slippage_percent,
            "Slippage check passed"
        );

        Ok(InterceptorDecision::Allow)
    }

    async fn on_action_complete(
        &self,
        _context: &InvocationContext,
        _result: &Result<ActionResponse>,
        _duration_ms: u64,
    ) {
        // No post-execution action needed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionKind;
    use serde_json::json;

    fn context(action: ActionKind, slippage: Option<Slippage>) -> InvocationContext {
        InvocationContext::new(action, json!({}), slippage)
    }

    #[tokio::test]
    async fn test_allows_low_slippage() {
        let interceptor = SlippageGuardInterceptor::new(1.0);
        let ctx = context(ActionKind::Swap, Some(Slippage::Fixed("0.5".into())));

        let decision = interceptor.intercept_action(&ctx).await.unwrap();
        assert_eq!(decision, InterceptorDecision::Allow);
    }

    #[tokio::test]
    async fn test_blocks_high_slippage() {
        let interceptor = SlippageGuardInterceptor::new(1.0);
        let ctx = context(ActionKind::Quote, Some(Slippage::Fixed("5".into())));

        let decision = interceptor.intercept_action(&ctx).await.unwrap();
        assert!(matches!(decision, InterceptorDecision::Block(_)));
    }

    #[tokio::test]
    async fn test_blocks_high_auto_maximum() {
        let interceptor = SlippageGuardInterceptor::new(1.0);
        let ctx = context(
            ActionKind::Swap,
            Some(Slippage::Auto {
                max_percent: "2".into(),
            }),
        );

        match interceptor.intercept_action(&ctx).await.unwrap() {
            InterceptorDecision::Block(reason) => assert!(reason.contains("auto")),
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocks_unparsable_slippage() {
        let interceptor = SlippageGuardInterceptor::new(1.0);
        let ctx = context(ActionKind::Swap, Some(Slippage::Fixed("abc".into())));

        let decision = interceptor.intercept_action(&ctx).await.unwrap();
        assert!(matches!(decision, InterceptorDecision::Block(_)));
    }

    #[tokio::test]
    async fn test_ignores_actions_without_slippage() {
        let interceptor = SlippageGuardInterceptor::new(0.0);
        let ctx = context(ActionKind::Liquidity, None);

        let decision = interceptor.intercept_action(&ctx).await.unwrap();
        assert_eq!(decision, InterceptorDecision::Allow);
    }
}
