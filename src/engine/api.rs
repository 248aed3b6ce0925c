//! API path: submit the coupon straight to the site's endpoint

use std::time::Duration;
use tracing::debug;

use crate::bridge::web::{WebBridge, DEFAULT_TIMEOUT};
use crate::engine::verdict;
use crate::site::{substitute_coupon, ProxyConfig, RunContext, SiteConfig};

const SCRIPT_PROBLEM_MESSAGE: &str = "[❌❌❌] There is a problem with the script.";

#[derive(Debug, Clone)]
pub struct ApiPath {
    proxy: Option<ProxyConfig>,
    timeout: Duration,
}

impl Default for ApiPath {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ApiPath {
    pub fn new(proxy: Option<ProxyConfig>) -> Self {
        Self {
            proxy,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the API flow and return the verdict.
    ///
    /// A transport failure is logged and the coupon is invalid, whatever the marker.
    pub async fn run(&self, site: &SiteConfig, ctx: &mut RunContext) -> bool {
        let params = match substitute_coupon(&site.params, &ctx.coupon) {
            Ok(params) => params,
            Err(e) => {
                debug!("Template substitution failed: {}", e);
                ctx.log(SCRIPT_PROBLEM_MESSAGE);
                return false;
            }
        };

        let Some(url) = site.api_url.as_deref() else {
            ctx.log(SCRIPT_PROBLEM_MESSAGE);
            return false;
        };

        ctx.log(format!("[🌐] Go to Api {}", url));

        let bridge = match WebBridge::new(self.proxy.as_ref(), self.timeout) {
            Ok(bridge) => bridge,
            Err(e) => {
                debug!("HTTP client setup failed: {}", e);
                ctx.log(SCRIPT_PROBLEM_MESSAGE);
                return false;
            }
        };

        match bridge.post_json(url, &params).await {
            Ok(response) => verdict::evaluate_response(&response.body, &site.code_validation, ctx),
            Err(e) => {
                ctx.error(e.to_string());
                verdict::reject(ctx)
            }
        }
    }
}
