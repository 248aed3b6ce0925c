//! Run Executor - Validates one coupon against one site
//!
//! This is the orchestrator that:
//! 1. Opens a run context and the output directory
//! 2. Routes the site to the API path or a browser session
//! 3. Writes the result artifact

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::bridge::web::DEFAULT_TIMEOUT;
use crate::bridge::{BrowserLauncher, LaunchOptions, PlaywrightLauncher};
use crate::engine::api::ApiPath;
use crate::engine::artifacts::ArtifactWriter;
use crate::engine::error::ExecutorError;
use crate::engine::resolver::{RetryPolicy, SelectorResolver};
use crate::engine::result::RunResult;
use crate::engine::sequencer::ActionSequencer;
use crate::engine::session::{SessionDriver, SessionTimings};
use crate::site::{require, ProxyConfig, RunContext, SiteConfig, SiteKind};

/// The coupon validation executor
pub struct Executor {
    launcher: Arc<dyn BrowserLauncher>,
    launch_options: LaunchOptions,
    retry: RetryPolicy,
    timings: SessionTimings,
    api_timeout: Duration,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Create an executor backed by the Playwright helper
    pub fn new() -> Self {
        Self::with_launcher(Arc::new(PlaywrightLauncher::default()))
    }

    /// Create an executor with a custom browser launcher
    pub fn with_launcher(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            launcher,
            launch_options: LaunchOptions::default(),
            retry: RetryPolicy::default(),
            timings: SessionTimings::default(),
            api_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_launch_options(mut self, options: LaunchOptions) -> Self {
        self.launch_options = options;
        self
    }

    /// Route both the browser and the API path through an upstream proxy
    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.launch_options.proxy = proxy;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timings(mut self, timings: SessionTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    /// Validate `coupon` on `site` and write the artifacts.
    ///
    /// The verdict is in the returned result; `Err` means the run could not
    /// start or its result could not be written.
    pub async fn run(
        &self,
        site: &SiteConfig,
        coupon: &str,
        output: &ArtifactWriter,
    ) -> Result<RunResult, ExecutorError> {
        require("coupon", coupon)?;

        let mut ctx = RunContext::new(coupon);
        let coupon_is_valid = self.run_with_context(site, &mut ctx, output).await?;

        let result = RunResult {
            logs: ctx.into_logs(),
            coupon_is_valid,
        };
        output.write_result(&result)?;

        Ok(result)
    }

    #[instrument(skip(self, site, ctx, output), fields(run_id = %ctx.run_id, kind = ?site.kind))]
    async fn run_with_context(
        &self,
        site: &SiteConfig,
        ctx: &mut RunContext,
        output: &ArtifactWriter,
    ) -> Result<bool, ExecutorError> {
        output.prepare()?;
        info!("Validating coupon in {}", output.dir().display());

        let valid = match site.kind {
            SiteKind::Api => {
                ApiPath::new(self.launch_options.proxy.clone())
                    .with_timeout(self.api_timeout)
                    .run(site, ctx)
                    .await
            }
            SiteKind::Session => {
                let sequencer = ActionSequencer::new(SelectorResolver::new(self.retry));
                SessionDriver::new(
                    self.launcher.clone(),
                    self.launch_options.clone(),
                    sequencer,
                    self.timings,
                )
                .run(site, ctx, output)
                .await
            }
        };

        info!(valid, "Run finished");
        Ok(valid)
    }
}
