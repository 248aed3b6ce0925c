//! Site configuration types
//!
//! A site entry describes how a coupon is validated on one domain: either a
//! direct API submission or a browser session driven by an ordered list of
//! declarative actions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Sites file
// ============================================================================

/// Root of the per-domain configuration file (`actions.json`).
///
/// Entries stay raw JSON until one is looked up, so a broken entry only
/// affects its own domain.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SitesFile {
    /// `waitTime` for entries that leave it out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_wait_time: Option<u64>,

    #[serde(default)]
    pub sites: BTreeMap<String, Value>,
}

// ============================================================================
// SiteConfig
// ============================================================================

/// How a site is validated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    /// Direct request against a coupon endpoint
    Api,
    /// Simulated browser session (default)
    #[default]
    #[serde(alias = "browser")]
    Session,
}

/// Declarative description of how to validate a coupon on one site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(rename = "type", default)]
    pub kind: SiteKind,

    /// Page the session starts on
    #[serde(default)]
    pub product_url: Option<String>,

    /// Settle delay before and after the action sequence, in milliseconds
    #[serde(default)]
    pub wait_time: u64,

    /// Ordered UI actions
    #[serde(default)]
    pub actions: Vec<Action>,

    #[serde(alias = "promoCode")]
    pub code_validation: CodeValidation,

    /// Coupon endpoint (API sites only)
    #[serde(default)]
    pub api_url: Option<String>,

    /// Request parameter template containing `{{COUPON}}` (API sites only)
    #[serde(default = "default_params")]
    pub params: Value,
}

fn default_params() -> Value {
    Value::Object(serde_json::Map::new())
}

impl SiteConfig {
    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time)
    }

    /// Replace the product URL (the `--used-on-product-url` override)
    pub fn with_product_url(mut self, url: impl Into<String>) -> Self {
        self.product_url = Some(url.into());
        self
    }

    /// Check the fields the selected mode depends on
    pub fn validate(&self) -> Result<(), String> {
        if self.code_validation.valid_text.is_empty() {
            return Err("codeValidation.validText must not be empty".to_string());
        }

        match self.kind {
            SiteKind::Api => {
                if self.api_url.as_deref().map_or(true, str::is_empty) {
                    return Err("api sites require apiUrl".to_string());
                }
            }
            SiteKind::Session => {
                if self.product_url.as_deref().map_or(true, str::is_empty) {
                    return Err("session sites require productUrl".to_string());
                }
                for (idx, action) in self.actions.iter().enumerate() {
                    if action.selectors.iter().any(|s| s.trim().is_empty()) {
                        return Err(format!(
                            "action {} ('{}') has an empty selector",
                            idx + 1,
                            action.name
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Success marker lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeValidation {
    /// Selector of the element whose text carries the marker (session mode)
    #[serde(default, alias = "elementAlert")]
    pub element: Option<String>,

    /// Literal, case-sensitive marker
    pub valid_text: String,
}

// ============================================================================
// Action
// ============================================================================

/// One declarative UI step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Label used in logs
    #[serde(default)]
    pub name: String,

    /// Free-form descriptive tag, logged as-is
    #[serde(default)]
    pub event: String,

    #[serde(rename = "type")]
    pub kind: ActionKind,

    /// Candidate selectors, tried in order as alternatives
    #[serde(default)]
    pub selectors: Vec<String>,

    /// Resolver timeout and post-action settle delay, in milliseconds
    #[serde(default)]
    pub wait_after: Option<u64>,

    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Element timeout used when an action has no `waitAfter`
pub const DEFAULT_SELECTOR_TIMEOUT: Duration = Duration::from_millis(30_000);

impl Action {
    /// Post-action settle delay; absent and zero both mean none
    pub fn wait_after(&self) -> Option<Duration> {
        self.wait_after
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Timeout for resolving and acting on this action's elements
    pub fn timeout(&self) -> Duration {
        self.wait_after().unwrap_or(DEFAULT_SELECTOR_TIMEOUT)
    }
}

/// What an action does with its element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActionKind {
    /// Type the coupon and fire `input` + `change`
    Fill,
    /// Script-level click
    Click,
    /// Forced engine interaction
    Interaction(Interaction),
}

/// Engine interactions dispatched with `force: true`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Hover,
    Focus,
    DblClick,
    Check,
    Uncheck,
    Tap,
}

impl Interaction {
    /// Method name understood by the automation engine
    pub fn method(&self) -> &'static str {
        match self {
            Interaction::Hover => "hover",
            Interaction::Focus => "focus",
            Interaction::DblClick => "dblclick",
            Interaction::Check => "check",
            Interaction::Uncheck => "uncheck",
            Interaction::Tap => "tap",
        }
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "fill" => ActionKind::Fill,
            "click" => ActionKind::Click,
            "hover" => ActionKind::Interaction(Interaction::Hover),
            "focus" => ActionKind::Interaction(Interaction::Focus),
            "dblclick" => ActionKind::Interaction(Interaction::DblClick),
            "check" => ActionKind::Interaction(Interaction::Check),
            "uncheck" => ActionKind::Interaction(Interaction::Uncheck),
            "tap" => ActionKind::Interaction(Interaction::Tap),
            other => return Err(format!("Unknown action type '{}'", other)),
        };
        Ok(kind)
    }
}

impl TryFrom<String> for ActionKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Fill => f.write_str("fill"),
            ActionKind::Click => f.write_str("click"),
            ActionKind::Interaction(i) => f.write_str(i.method()),
        }
    }
}

// ============================================================================
// Browser
// ============================================================================

/// Browser engines the Playwright helper can launch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BrowserType {
    Chromium,
    #[default]
    Firefox,
    Webkit,
}

impl BrowserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserType::Chromium => "chromium",
            BrowserType::Firefox => "firefox",
            BrowserType::Webkit => "webkit",
        }
    }
}
