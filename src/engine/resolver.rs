//! Selector resolution with bounded retry

use std::time::Duration;
use tracing::debug;

use crate::bridge::{BridgeError, BrowserBridge};
use crate::site::RunContext;

/// How often and how patiently a required selector is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_between: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_between: Duration::from_millis(1000),
        }
    }
}

/// An element known to be attached to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    selector: String,
}

impl ElementHandle {
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectorResolver {
    policy: RetryPolicy,
}

impl SelectorResolver {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Wait for `selector` to be attached.
    ///
    /// Required selectors get the full retry budget, optional ones a single
    /// attempt. An element that never shows up is `Ok(None)`; only a fatal
    /// bridge error is returned as `Err`.
    pub async fn resolve(
        &self,
        page: &dyn BrowserBridge,
        ctx: &mut RunContext,
        selector: &str,
        timeout: Duration,
        required: bool,
    ) -> Result<Option<ElementHandle>, BridgeError> {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match page.wait_for_selector(selector, timeout).await {
                Ok(()) => {
                    return Ok(Some(ElementHandle {
                        selector: selector.to_string(),
                    }))
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    debug!(selector, attempt, error = %e, "Selector wait failed");
                    ctx.log(format!(
                        "🔁 Attempt {} failed for selector \"{}\"",
                        attempt, selector
                    ));

                    if attempt == max_attempts || !required {
                        ctx.log(format!(
                            "Selector \"{}\" not found after {} attempts.",
                            selector, attempt
                        ));
                        return Ok(None);
                    }

                    tokio::time::sleep(self.policy.delay_between).await;
                }
            }
        }

        Ok(None)
    }
}
