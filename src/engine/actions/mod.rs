//! Action implementations
//!
//! One declarative action against one resolved element, followed by the
//! action's settle delay.

use tracing::debug;

use crate::bridge::{BridgeError, BrowserBridge};
use crate::engine::resolver::ElementHandle;
use crate::site::{Action, ActionKind, RunContext};

pub async fn execute_action(
    page: &dyn BrowserBridge,
    ctx: &mut RunContext,
    element: &ElementHandle,
    action: &Action,
) -> Result<(), BridgeError> {
    let selector = element.selector();

    match action.kind {
        ActionKind::Fill => {
            page.fill(selector, &ctx.coupon, action.timeout()).await?;
            page.dispatch_event(selector, "input").await?;
            page.dispatch_event(selector, "change").await?;
        }
        ActionKind::Click => {
            if !page.click_via_script(selector).await? {
                debug!(selector, "Element vanished before click");
            }
        }
        ActionKind::Interaction(interaction) => {
            page.interact(selector, interaction, action.timeout()).await?;
        }
    }

    if let Some(wait) = action.wait_after() {
        ctx.log(format!("⏳ Waiting {}ms after action", wait.as_millis()));
        tokio::time::sleep(wait).await;
    }

    Ok(())
}
