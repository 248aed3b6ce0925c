//! Bridge modules for external capabilities
//!
//! The engine never talks to a browser or an HTTP endpoint directly:
//! - `playwright`: Browser sessions via a Playwright helper process
//! - `web`: Coupon endpoint requests via reqwest
//! - `rpc`: JSON-RPC plumbing shared by process-backed bridges

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::site::{BrowserType, Interaction, ProxyConfig};

pub mod playwright;
pub mod rpc;
pub mod web;

pub use playwright::{PlaywrightBridge, PlaywrightLauncher};
pub use web::{WebBridge, WebResponse};

/// Common error type for bridge operations
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to start server: {0}")]
    StartupFailed(String),

    #[error("Server disconnected")]
    Disconnected,

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl BridgeError {
    /// The automation process is gone; nothing else on this session can succeed
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::Disconnected)
    }
}

/// Page load milestones understood by `wait_for_load_state`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    DomContentLoaded,
    Load,
    NetworkIdle,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::Load => "load",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

/// Desktop user agent presented by every session
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.5845.188 Safari/537.36";

/// How a browser session is launched
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub browser: BrowserType,
    pub headless: bool,

    /// Persistent profile, reused across runs
    pub profile_dir: PathBuf,

    pub locale: String,
    pub user_agent: String,
    pub proxy: Option<ProxyConfig>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            browser: BrowserType::default(),
            headless: true,
            profile_dir: PathBuf::from("./pw-user"),
            locale: "en-US".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

/// One live page of an interactive browser session.
///
/// Element operations address elements by selector; a selector that matches
/// nothing is an error unless the method says otherwise.
#[async_trait]
pub trait BrowserBridge: Send + Sync {
    /// Navigate and wait for `DOMContentLoaded`
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BridgeError>;

    async fn wait_for_load_state(
        &self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), BridgeError>;

    /// Wait until the selector is attached to the DOM
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), BridgeError>;

    async fn fill(&self, selector: &str, value: &str, timeout: Duration)
        -> Result<(), BridgeError>;

    async fn dispatch_event(&self, selector: &str, event: &str) -> Result<(), BridgeError>;

    /// Call the element's `click()` from page script.
    /// Returns false when no element matched.
    async fn click_via_script(&self, selector: &str) -> Result<bool, BridgeError>;

    /// Forced engine interaction (hover, focus, ...)
    async fn interact(
        &self,
        selector: &str,
        interaction: Interaction,
        timeout: Duration,
    ) -> Result<(), BridgeError>;

    /// Rendered text of the first match, or `None` when nothing matched
    async fn inner_text(&self, selector: &str) -> Result<Option<String>, BridgeError>;

    async fn clear_cookies(&self) -> Result<(), BridgeError>;

    /// Evaluate a script expression in the page and return its JSON value
    async fn evaluate(&self, script: &str) -> Result<Value, BridgeError>;

    /// Full HTML of the current page
    async fn content(&self) -> Result<String, BridgeError>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BridgeError>;

    /// Tear down the session; safe to call more than once
    async fn close(&self) -> Result<(), BridgeError>;
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserBridge>, BridgeError>;
}
