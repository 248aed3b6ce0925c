//! Coupon validation engine module
//!
//! This module contains:
//! - `executor` - The run orchestrator
//! - `api` - Direct endpoint submission
//! - `session` - Browser session lifecycle and site state reset
//! - `sequencer` - Ordered action execution
//! - `resolver` - Selector resolution with bounded retry
//! - `actions` - Single action implementations
//! - `verdict` - The containment rule
//! - `artifacts` - Result and snapshot files
//! - `batch` - Sequential multi-coupon runs
//! - `error` - Executor error types
//! - `result` - Run and sequence result types

pub mod actions;
pub mod api;
pub mod artifacts;
pub mod batch;
pub mod error;
pub mod executor;
pub mod resolver;
pub mod result;
pub mod sequencer;
pub mod session;
pub mod verdict;

pub use actions::execute_action;
pub use api::ApiPath;
pub use artifacts::{ArtifactWriter, HTML_SNAPSHOT_FILE, RESULT_FILE, SCREENSHOT_FILE};
pub use batch::{BatchEntry, BatchResult, BatchRunner, DEFAULT_BATCH_DELAY};
pub use error::ExecutorError;
pub use executor::Executor;
pub use resolver::{ElementHandle, RetryPolicy, SelectorResolver};
pub use result::{ActionOutcome, ActionReport, RunResult, SequenceReport};
pub use sequencer::ActionSequencer;
pub use session::{reset_site_state, SessionDriver, SessionTimings};
pub use verdict::{evaluate_page, evaluate_response, is_valid, INVALID_MESSAGE, VALID_MESSAGE};
