//! Session driver
//!
//! Owns one browser session from launch to teardown. Everything that goes
//! wrong after launch is caught here: it is logged, the verdict stays false,
//! and cleanup, snapshots and teardown still run.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::bridge::{BridgeError, BrowserBridge, BrowserLauncher, LaunchOptions, LoadState};
use crate::engine::artifacts::ArtifactWriter;
use crate::engine::sequencer::ActionSequencer;
use crate::engine::verdict;
use crate::site::{RunContext, SiteConfig};

/// Navigation bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Hard limit for reaching `DOMContentLoaded`
    pub navigation_timeout: Duration,

    /// Best-effort wait for network quiet after navigation
    pub network_idle_timeout: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            network_idle_timeout: Duration::from_secs(3),
        }
    }
}

/// Storage reset steps run in page context: (what, script, success message).
/// Each script resolves to `true` when the storage exists and was cleared.
const STORAGE_RESET_STEPS: &[(&str, &str, &str)] = &[
    (
        "localStorage",
        "(() => { localStorage.clear(); return true; })()",
        "📦 localStorage cleared",
    ),
    (
        "sessionStorage",
        "(() => { sessionStorage.clear(); return true; })()",
        "📦 sessionStorage cleared",
    ),
    (
        "IndexedDB",
        r#"(async () => {
            if (!indexedDB?.databases) return false;
            const dbs = await indexedDB.databases();
            for (const db of dbs) {
                if (db.name) await new Promise((res) => {
                    const req = indexedDB.deleteDatabase(db.name);
                    req.onsuccess = req.onerror = req.onblocked = () => res();
                });
            }
            return true;
        })()"#,
        "💾 IndexedDB cleared",
    ),
    (
        "Cache Storage",
        r#"(async () => {
            const keys = await caches.keys();
            await Promise.all(keys.map((k) => caches.delete(k)));
            return true;
        })()"#,
        "🗄️ Cache Storage cleared",
    ),
    (
        "Service Workers",
        r#"(async () => {
            if (!navigator.serviceWorker?.getRegistrations) return false;
            const regs = await navigator.serviceWorker.getRegistrations();
            await Promise.all(regs.map((r) => r.unregister()));
            return true;
        })()"#,
        "🚫 Service Workers unregistered",
    ),
];

pub struct SessionDriver {
    launcher: Arc<dyn BrowserLauncher>,
    options: LaunchOptions,
    sequencer: ActionSequencer,
    timings: SessionTimings,
}

impl SessionDriver {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        options: LaunchOptions,
        sequencer: ActionSequencer,
        timings: SessionTimings,
    ) -> Self {
        Self {
            launcher,
            options,
            sequencer,
            timings,
        }
    }

    /// Run one session and return the verdict
    pub async fn run(
        &self,
        site: &SiteConfig,
        ctx: &mut RunContext,
        artifacts: &ArtifactWriter,
    ) -> bool {
        if self.options.headless {
            ctx.log("[⏳] Starting headless-browser...");
        } else {
            ctx.log("[⏳] Starting browser...");
        }

        let page = match self.launcher.launch(&self.options).await {
            Ok(page) => page,
            Err(e) => {
                ctx.error(format!("❌ Unexpected error: {}", e));
                return false;
            }
        };

        let valid = match self.drive(page.as_ref(), site, ctx).await {
            Ok(valid) => valid,
            Err(e) => {
                ctx.error(format!("❌ Unexpected error: {}", e));
                false
            }
        };

        reset_site_state(page.as_ref(), ctx).await;
        artifacts.capture_page(page.as_ref(), ctx).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        valid
    }

    async fn drive(
        &self,
        page: &dyn BrowserBridge,
        site: &SiteConfig,
        ctx: &mut RunContext,
    ) -> Result<bool, BridgeError> {
        let url = site
            .product_url
            .as_deref()
            .ok_or_else(|| BridgeError::ConfigError("productUrl is not set".to_string()))?;

        ctx.log(format!("[🌐] Go to Website {}", url));
        page.goto(url, self.timings.navigation_timeout).await?;

        match page
            .wait_for_load_state(LoadState::NetworkIdle, self.timings.network_idle_timeout)
            .await
        {
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!("Network did not go idle: {}", e),
            Ok(()) => {}
        }

        tokio::time::sleep(site.wait_time()).await;

        if !site.actions.is_empty() {
            let report = self.sequencer.run(page, ctx, &site.actions).await?;
            debug!(
                completed = report.completed(),
                failed = report.failed(),
                unresolved = report.unresolved(),
                "Action sequence finished"
            );
        }

        tokio::time::sleep(site.wait_time()).await;

        verdict::evaluate_page(page, &site.code_validation, ctx).await
    }
}

/// Clear cookies and every per-origin storage the page can reach.
///
/// Each step is independent; a failure is logged and the next step runs.
pub async fn reset_site_state(page: &dyn BrowserBridge, ctx: &mut RunContext) {
    ctx.log("🧹 [CLEANUP] Starting site data cleanup...");

    match page.clear_cookies().await {
        Ok(()) => ctx.log("🍪 Cookies cleared"),
        Err(e) => ctx.log(format!("⚠️ Failed to clear cookies: {}", e)),
    }

    for (what, script, cleared) in STORAGE_RESET_STEPS {
        match page.evaluate(script).await {
            Ok(Value::Bool(true)) => ctx.log(*cleared),
            Ok(_) => debug!("{} not available", what),
            Err(e) => ctx.log(format!("⚠️ Failed to clear {}: {}", what, e)),
        }
    }

    ctx.log("✅ [CLEANUP] Cleanup completed");
}
