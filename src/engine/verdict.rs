//! Verdict evaluation
//!
//! A coupon is valid iff the site's `validText` is a literal, case-sensitive
//! substring of what the site showed: the marker element's text in session
//! mode, the serialized response body in API mode.

use serde_json::Value;

use crate::bridge::{BridgeError, BrowserBridge};
use crate::site::{CodeValidation, RunContext};

pub const VALID_MESSAGE: &str = "[🎉🎉🎉] Coupon is valid!";
pub const INVALID_MESSAGE: &str = "[❌❌❌] Coupon is not valid.";

/// The containment rule
pub fn is_valid(observed: &str, valid_text: &str) -> bool {
    observed.contains(valid_text)
}

fn report(ctx: &mut RunContext, valid: bool) -> bool {
    ctx.log(if valid { VALID_MESSAGE } else { INVALID_MESSAGE });
    valid
}

/// Session mode: read the marker element's visible text
pub async fn evaluate_page(
    page: &dyn BrowserBridge,
    validation: &CodeValidation,
    ctx: &mut RunContext,
) -> Result<bool, BridgeError> {
    let Some(selector) = validation.element.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(report(ctx, false));
    };

    let valid = match page.inner_text(selector).await? {
        Some(text) => is_valid(&text, &validation.valid_text),
        None => false,
    };

    Ok(report(ctx, valid))
}

/// Invalid without looking at anything, e.g. when the request never completed
pub fn reject(ctx: &mut RunContext) -> bool {
    report(ctx, false)
}

/// API mode: serialize the whole body, keys in response order, and test it as text
pub fn evaluate_response(body: &Value, validation: &CodeValidation, ctx: &mut RunContext) -> bool {
    let text = serde_json::to_string(body).unwrap_or_default();
    report(ctx, is_valid(&text, &validation.valid_text))
}
