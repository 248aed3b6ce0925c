//! Action sequencer
//!
//! Runs a site's actions strictly in order. Selectors of one action are
//! alternatives: the first one that resolves is acted on and the sequencer
//! moves to the next action. A failed interaction abandons the rest of that
//! action's selectors but never the sequence.

use crate::bridge::{BridgeError, BrowserBridge};
use crate::engine::actions::execute_action;
use crate::engine::resolver::SelectorResolver;
use crate::engine::result::{ActionOutcome, SequenceReport};
use crate::site::{Action, RunContext};

#[derive(Debug, Clone, Default)]
pub struct ActionSequencer {
    resolver: SelectorResolver,
}

impl ActionSequencer {
    pub fn new(resolver: SelectorResolver) -> Self {
        Self { resolver }
    }

    /// Run every action. Returns `Err` only for a fatal bridge error.
    pub async fn run(
        &self,
        page: &dyn BrowserBridge,
        ctx: &mut RunContext,
        actions: &[Action],
    ) -> Result<SequenceReport, BridgeError> {
        let mut report = SequenceReport::default();

        for action in actions {
            ctx.log(format!("[👉] Action: {}", action.name));
            if !action.event.is_empty() {
                ctx.log(action.event.clone());
            }

            let outcome = self.run_action(page, ctx, action).await?;
            report.push(&action.name, outcome);
        }

        Ok(report)
    }

    async fn run_action(
        &self,
        page: &dyn BrowserBridge,
        ctx: &mut RunContext,
        action: &Action,
    ) -> Result<ActionOutcome, BridgeError> {
        if action.selectors.is_empty() {
            return Ok(ActionOutcome::Skipped);
        }

        for selector in &action.selectors {
            let element = self
                .resolver
                .resolve(page, ctx, selector, action.timeout(), action.required)
                .await?;

            let Some(element) = element else {
                continue;
            };

            return match execute_action(page, ctx, &element, action).await {
                Ok(()) => Ok(ActionOutcome::Completed {
                    selector: selector.clone(),
                }),
                Err(e) if e.is_fatal() => Err(e),
                Err(e) => {
                    ctx.error(format!(
                        "[⚠️] Failed action \"{}\" on selector \"{}\": {}",
                        action.name, selector, e
                    ));
                    Ok(ActionOutcome::Failed {
                        selector: selector.clone(),
                        error: e.to_string(),
                    })
                }
            };
        }

        Ok(ActionOutcome::Unresolved)
    }
}
