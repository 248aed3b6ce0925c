//! Coupon placeholder substitution for API request templates
//!
//! The parameter template is serialized to text, every `{{COUPON}}` token is
//! replaced, and the result is parsed back. This is whole-template string
//! substitution, so placeholders inside keys and nested values are replaced too.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static COUPON_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{COUPON\}\}").expect("valid placeholder regex"));

/// Errors that can occur during template substitution
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to serialize template: {0}")]
    Serialize(serde_json::Error),

    #[error("Substituted template is not valid JSON: {0}")]
    Reparse(serde_json::Error),
}

/// Substitute `coupon` into every placeholder of `params`
pub fn substitute_coupon(params: &Value, coupon: &str) -> Result<Value, TemplateError> {
    let text = serde_json::to_string(params).map_err(TemplateError::Serialize)?;

    // The placeholder always sits inside a JSON string, so the replacement is
    // escaped the same way its surroundings are.
    let escaped = serde_json::to_string(coupon).map_err(TemplateError::Serialize)?;
    let escaped = &escaped[1..escaped.len() - 1];

    let substituted = COUPON_REGEX.replace_all(&text, regex::NoExpand(escaped));
    serde_json::from_str(&substituted).map_err(TemplateError::Reparse)
}

/// True if the template mentions the placeholder anywhere
pub fn has_placeholder(params: &Value) -> bool {
    serde_json::to_string(params)
        .map(|text| COUPON_REGEX.is_match(&text))
        .unwrap_or(false)
}
