//! Playwright Bridge - Browser sessions via a Playwright helper over JSON-RPC

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};

use super::rpc::{send_request, spawn_communication_task, RequestSender};
use super::{BridgeError, BrowserBridge, BrowserLauncher, LaunchOptions, LoadState};
use crate::site::Interaction;

/// Helper script location, relative to the working directory
pub const DEFAULT_SERVER_SCRIPT: &str = "extensions/playwright/server.js";

/// Anti-automation-detection overrides installed before any page script runs
const STEALTH_INIT_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => false });
window.navigator.chrome = { runtime: {} };
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
"#;

/// Margin added on top of engine timeouts before giving up on the helper
const RPC_GRACE: Duration = Duration::from_secs(5);

/// Bound for calls that carry no engine timeout of their own
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser start-up can be slow on a cold profile
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Launches persistent-context sessions through the Node.js helper
#[derive(Debug, Clone)]
pub struct PlaywrightLauncher {
    server_script: PathBuf,
}

impl PlaywrightLauncher {
    pub fn new(server_script: impl Into<PathBuf>) -> Self {
        Self {
            server_script: server_script.into(),
        }
    }
}

impl Default for PlaywrightLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_SCRIPT)
    }
}

#[async_trait]
impl BrowserLauncher for PlaywrightLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserBridge>, BridgeError> {
        let bridge = PlaywrightBridge::start(&self.server_script).await?;
        bridge.launch_persistent(options).await?;
        bridge.add_init_script(STEALTH_INIT_SCRIPT).await?;
        Ok(Box::new(bridge))
    }
}

pub struct PlaywrightBridge {
    request_tx: RequestSender,
    child: Mutex<Option<Child>>,
    closed: AtomicBool,
}

impl PlaywrightBridge {
    /// Spawn the helper process and wire up the RPC channel
    pub async fn start(server_script: &Path) -> Result<Self, BridgeError> {
        let node = which::which("node")
            .map_err(|e| BridgeError::StartupFailed(format!("Node.js not found: {}", e)))?;

        let mut child = Command::new(node)
            .arg(server_script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BridgeError::StartupFailed(format!("Failed to spawn Node.js: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::StartupFailed("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::StartupFailed("Failed to capture stdout".to_string()))?;

        let (request_tx, request_rx) = mpsc::channel(100);
        spawn_communication_task(request_rx, stdin, stdout);

        Ok(Self::with_channel(request_tx, Some(child)))
    }

    fn with_channel(request_tx: RequestSender, child: Option<Child>) -> Self {
        Self {
            request_tx,
            child: Mutex::new(child),
            closed: AtomicBool::new(false),
        }
    }

    /// Every request is bounded by its timeout plus a grace period, so a hung
    /// helper cannot stall the run
    async fn request_within(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, BridgeError> {
        tokio::time::timeout(
            timeout + RPC_GRACE,
            send_request(&self.request_tx, method, params),
        )
        .await
        .map_err(|_| BridgeError::Timeout)?
    }

    async fn launch_persistent(&self, options: &LaunchOptions) -> Result<(), BridgeError> {
        let proxy = options.proxy.as_ref().map(|p| {
            json!({
                "server": p.server,
                "username": p.username,
                "password": p.password,
            })
        });

        self.request_within(
            "context.launchPersistent",
            json!({
                "browserType": options.browser.as_str(),
                "userDataDir": options.profile_dir.to_string_lossy(),
                "headless": options.headless,
                "locale": options.locale,
                "userAgent": options.user_agent,
                "proxy": proxy,
            }),
            LAUNCH_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn add_init_script(&self, script: &str) -> Result<(), BridgeError> {
        self.request_within("page.addInitScript", json!({ "script": script }), CALL_TIMEOUT)
            .await?;
        Ok(())
    }
}

fn millis(timeout: Duration) -> u64 {
    timeout.as_millis() as u64
}

#[async_trait]
impl BrowserBridge for PlaywrightBridge {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BridgeError> {
        self.request_within(
            "page.goto",
            json!({
                "url": url,
                "waitUntil": LoadState::DomContentLoaded.as_str(),
                "timeout": millis(timeout),
            }),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn wait_for_load_state(
        &self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), BridgeError> {
        self.request_within(
            "page.waitForLoadState",
            json!({ "state": state.as_str(), "timeout": millis(timeout) }),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BridgeError> {
        self.request_within(
            "wait.selector",
            json!({ "selector": selector, "state": "attached", "timeout": millis(timeout) }),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> Result<(), BridgeError> {
        self.request_within(
            "element.fill",
            json!({ "selector": selector, "value": value, "timeout": millis(timeout) }),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn dispatch_event(&self, selector: &str, event: &str) -> Result<(), BridgeError> {
        self.request_within(
            "element.dispatchEvent",
            json!({ "selector": selector, "event": event }),
            CALL_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn click_via_script(&self, selector: &str) -> Result<bool, BridgeError> {
        let result = self
            .request_within(
                "element.evaluateClick",
                json!({ "selector": selector }),
                CALL_TIMEOUT,
            )
            .await?;
        Ok(result["clicked"].as_bool().unwrap_or(false))
    }

    async fn interact(
        &self,
        selector: &str,
        interaction: Interaction,
        timeout: Duration,
    ) -> Result<(), BridgeError> {
        self.request_within(
            "element.interact",
            json!({
                "selector": selector,
                "method": interaction.method(),
                "timeout": millis(timeout),
                "force": true,
            }),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, BridgeError> {
        let result = self
            .request_within(
                "element.innerText",
                json!({ "selector": selector }),
                CALL_TIMEOUT,
            )
            .await?;
        Ok(result["text"].as_str().map(|s| s.to_string()))
    }

    async fn clear_cookies(&self) -> Result<(), BridgeError> {
        self.request_within("context.clearCookies", json!({}), CALL_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BridgeError> {
        let result = self
            .request_within("page.evaluate", json!({ "script": script }), CALL_TIMEOUT)
            .await?;
        Ok(result["value"].clone())
    }

    async fn content(&self) -> Result<String, BridgeError> {
        let result = self
            .request_within("page.content", json!({}), CALL_TIMEOUT)
            .await?;
        result["html"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| BridgeError::ServerError("No HTML returned".to_string()))
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BridgeError> {
        self.request_within(
            "page.screenshot",
            json!({ "path": path.to_string_lossy(), "fullPage": full_page }),
            CALL_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), BridgeError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let closed = self
            .request_within("context.close", json!({}), CLOSE_TIMEOUT)
            .await;

        // The helper exits once its context is closed; make sure it does.
        if let Some(mut process) = self.child.lock().await.take() {
            if tokio::time::timeout(RPC_GRACE, process.wait()).await.is_err() {
                tracing::debug!("Playwright helper did not exit, killing it");
                process.kill().await?;
            }
        }

        closed.map(|_| ())
    }
}
