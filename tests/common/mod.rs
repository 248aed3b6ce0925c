#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use coupon_validator::bridge::{
    BridgeError, BrowserBridge, BrowserLauncher, LaunchOptions, LoadState,
};
use coupon_validator::site::{Interaction, SiteConfig};
use serde_json::Value;
use tempfile::TempDir;

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn write_sites(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, content).expect("Failed to write sites file");
    path
}

pub fn site(json: &str) -> SiteConfig {
    serde_json::from_str(json).expect("Invalid site config")
}

/// Session site: fill `#code`, read `#msg`, marker "Success"
pub fn fill_and_check_site() -> SiteConfig {
    site(
        r##"{
            "productUrl": "https://shop.example/product",
            "actions": [
                { "name": "Type coupon", "event": "fill", "type": "fill", "selectors": ["#code"], "waitAfter": 500 }
            ],
            "codeValidation": { "element": "#msg", "validText": "Success" }
        }"##,
    )
}

pub const SITES_JSON: &str = r##"{
    "sites": {
        "shop.example": {
            "productUrl": "https://shop.example/product",
            "waitTime": 500,
            "actions": [
                { "name": "Type coupon", "type": "fill", "selectors": ["#code"] },
                { "name": "Apply", "type": "click", "selectors": ["#apply", ".apply"], "waitAfter": 1000 }
            ],
            "codeValidation": { "element": "#msg", "validText": "Success" }
        },
        "api.example": {
            "type": "api",
            "apiUrl": "https://api.example/coupon",
            "params": { "code": "{{COUPON}}" },
            "codeValidation": { "validText": "valid" }
        }
    }
}"##;

// ============================================================================
// Scripted browser
// ============================================================================

#[derive(Debug, Clone)]
struct FakeElement {
    text: String,
    /// Number of failed waits before the element is attached
    appears_after: u32,
}

#[derive(Debug, Default)]
struct FakeState {
    elements: HashMap<String, FakeElement>,
    failing: HashMap<String, String>,
    wait_attempts: HashMap<String, u32>,
    filled: HashMap<String, String>,
    calls: Vec<String>,
    goto_error: Option<String>,
    storage_error: bool,
    disconnect_on: Option<String>,
    html: String,
    closed: u32,
}

/// In-memory page that answers from a fixed element table
#[derive(Debug, Clone, Default)]
pub struct FakeBrowser {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        let browser = Self::default();
        browser.state().html = "<html><body>fake</body></html>".to_string();
        browser
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn with_element(self, selector: &str, text: &str) -> Self {
        self.with_late_element(selector, text, 0)
    }

    /// Element that only attaches after `failed_waits` unsuccessful waits
    pub fn with_late_element(self, selector: &str, text: &str, failed_waits: u32) -> Self {
        self.state().elements.insert(
            selector.to_string(),
            FakeElement {
                text: text.to_string(),
                appears_after: failed_waits,
            },
        );
        self
    }

    /// Interactions on `selector` fail with `message`
    pub fn with_failing(self, selector: &str, message: &str) -> Self {
        self.state()
            .failing
            .insert(selector.to_string(), message.to_string());
        self
    }

    pub fn with_goto_error(self, message: &str) -> Self {
        self.state().goto_error = Some(message.to_string());
        self
    }

    pub fn with_storage_error(self) -> Self {
        self.state().storage_error = true;
        self
    }

    /// The automation process dies when `selector` is waited for
    pub fn disconnect_on(self, selector: &str) -> Self {
        self.state().disconnect_on = Some(selector.to_string());
        self
    }

    pub fn wait_attempts(&self, selector: &str) -> u32 {
        self.state()
            .wait_attempts
            .get(selector)
            .copied()
            .unwrap_or(0)
    }

    pub fn filled(&self, selector: &str) -> Option<String> {
        self.state().filled.get(selector).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn close_count(&self) -> u32 {
        self.state().closed
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }

    fn check_interaction(&self, selector: &str) -> Result<(), BridgeError> {
        let state = self.state();
        if let Some(message) = state.failing.get(selector) {
            return Err(BridgeError::ServerError(message.clone()));
        }
        if !state.elements.contains_key(selector) {
            return Err(BridgeError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserBridge for FakeBrowser {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), BridgeError> {
        self.record(format!("goto {}", url));
        match self.state().goto_error.clone() {
            Some(message) => Err(BridgeError::ServerError(message)),
            None => Ok(()),
        }
    }

    async fn wait_for_load_state(
        &self,
        state: LoadState,
        _timeout: Duration,
    ) -> Result<(), BridgeError> {
        self.record(format!("waitForLoadState {}", state.as_str()));
        Err(BridgeError::Timeout)
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), BridgeError> {
        let mut state = self.state();
        if state.disconnect_on.as_deref() == Some(selector) {
            return Err(BridgeError::Disconnected);
        }

        let attempts = state.wait_attempts.entry(selector.to_string()).or_insert(0);
        *attempts += 1;
        let attempt = *attempts;

        match state.elements.get(selector) {
            Some(el) if attempt > el.appears_after => Ok(()),
            _ => Err(BridgeError::Timeout),
        }
    }

    async fn fill(&self, selector: &str, value: &str, _timeout: Duration) -> Result<(), BridgeError> {
        self.check_interaction(selector)?;
        self.record(format!("fill {} {}", selector, value));
        self.state()
            .filled
            .insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn dispatch_event(&self, selector: &str, event: &str) -> Result<(), BridgeError> {
        self.check_interaction(selector)?;
        self.record(format!("dispatch {} {}", selector, event));
        Ok(())
    }

    async fn click_via_script(&self, selector: &str) -> Result<bool, BridgeError> {
        if let Some(message) = self.state().failing.get(selector).cloned() {
            return Err(BridgeError::ServerError(message));
        }
        self.record(format!("click {}", selector));
        Ok(self.state().elements.contains_key(selector))
    }

    async fn interact(
        &self,
        selector: &str,
        interaction: Interaction,
        _timeout: Duration,
    ) -> Result<(), BridgeError> {
        self.check_interaction(selector)?;
        self.record(format!("{} {}", interaction.method(), selector));
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, BridgeError> {
        self.record(format!("innerText {}", selector));
        Ok(self.state().elements.get(selector).map(|el| el.text.clone()))
    }

    async fn clear_cookies(&self) -> Result<(), BridgeError> {
        self.record("clearCookies".to_string());
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> Result<Value, BridgeError> {
        self.record("evaluate".to_string());
        if self.state().storage_error {
            return Err(BridgeError::ServerError("SecurityError".to_string()));
        }
        Ok(Value::Bool(true))
    }

    async fn content(&self) -> Result<String, BridgeError> {
        self.record("content".to_string());
        Ok(self.state().html.clone())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BridgeError> {
        self.record(format!("screenshot fullPage={}", full_page));
        fs::write(path, b"PNG")?;
        Ok(())
    }

    async fn close(&self) -> Result<(), BridgeError> {
        self.record("close".to_string());
        self.state().closed += 1;
        Ok(())
    }
}

/// Hands out the same scripted page on every launch
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    browser: FakeBrowser,
    fail: bool,
    launches: Arc<Mutex<Vec<LaunchOptions>>>,
}

impl FakeLauncher {
    pub fn new(browser: FakeBrowser) -> Self {
        Self {
            browser,
            fail: false,
            launches: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn launches(&self) -> Vec<LaunchOptions> {
        self.launches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserBridge>, BridgeError> {
        self.launches.lock().unwrap().push(options.clone());
        if self.fail {
            return Err(BridgeError::StartupFailed(
                "browserType.launchPersistentContext: Executable doesn't exist".to_string(),
            ));
        }
        Ok(Box::new(self.browser.clone()))
    }
}
