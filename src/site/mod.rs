//! Site configuration and per-run state
//!
//! - `config` - SiteConfig, Action and the closed action-type set
//! - `context` - RunContext and the append-only RunLog
//! - `loader` - Load and resolve site configs from the sites file
//! - `proxy` - Upstream proxy descriptor
//! - `template` - `{{COUPON}}` substitution for API parameters

pub mod config;
pub mod context;
pub mod loader;
pub mod proxy;
pub mod template;

pub use config::{
    Action, ActionKind, BrowserType, CodeValidation, Interaction, SiteConfig, SiteKind, SitesFile,
    DEFAULT_SELECTOR_TIMEOUT,
};
pub use context::{LogEntry, LogKind, RunContext, RunLog};
pub use loader::{require, ConfigError, SiteSelection, SitesLoader};
pub use proxy::ProxyConfig;
pub use template::{has_placeholder, substitute_coupon, TemplateError};
