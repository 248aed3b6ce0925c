//! # Coupon Validator
//!
//! A declarative engine that decides whether a discount coupon is accepted by
//! an e-commerce site.
//!
//! ## Modes
//!
//! - **Session** (default): drive a Playwright browser session through the
//!   site's ordered action list, then read a success marker from the page
//! - **API**: post the coupon straight to the site's endpoint and look for
//!   the marker in the response body
//!
//! Either way a run produces exactly one verdict plus an ordered log, written
//! to `result.json`.
//!
//! Site configs live in a local sites file, which `sync` can refresh from the
//! remote site registry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coupon_validator::{ArtifactWriter, Executor, SiteSelection, SitesLoader};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let site = SitesLoader::resolve(
//!         Path::new("actions.json"),
//!         &SiteSelection::new("shop.example"),
//!     )?;
//!
//!     let executor = Executor::new();
//!     let result = executor
//!         .run(&site, "SAVE10", &ArtifactWriter::new("output"))
//!         .await?;
//!
//!     println!("couponIsValid={}", result.coupon_is_valid);
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod client;
pub mod engine;
pub mod site;

// Re-export main types
pub use bridge::{
    BridgeError, BrowserBridge, BrowserLauncher, LaunchOptions, LoadState, PlaywrightBridge,
    PlaywrightLauncher, WebBridge, WebResponse,
};
pub use client::SitesClient;
pub use engine::{
    ActionOutcome, ActionSequencer, ApiPath, ArtifactWriter, BatchResult, BatchRunner,
    ElementHandle, Executor, ExecutorError, RetryPolicy, RunResult, SelectorResolver,
    SequenceReport, SessionDriver, SessionTimings,
};
pub use site::{
    Action, ActionKind, BrowserType, CodeValidation, ConfigError, Interaction, LogEntry, LogKind,
    ProxyConfig, RunContext, RunLog, SiteConfig, SiteKind, SiteSelection, SitesFile, SitesLoader,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bridge::{BrowserBridge, BrowserLauncher, LaunchOptions};
    pub use crate::engine::{ArtifactWriter, BatchRunner, Executor, RunResult};
    pub use crate::site::{
        BrowserType, ProxyConfig, RunContext, SiteConfig, SiteKind, SiteSelection, SitesLoader,
    };
}
