//! Per-run context
//!
//! Every component of a run receives the same `RunContext` by `&mut`. It carries
//! the run identity and the append-only run log that ends up in `result.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a run log entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Log,
    Error,
}

/// A single run log line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only, ordered run log
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry's message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }

    /// Number of error entries
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == LogKind::Error)
            .count()
    }

    fn push(&mut self, kind: LogKind, message: String) {
        self.entries.push(LogEntry {
            kind,
            message,
            timestamp: Utc::now(),
        });
    }
}

/// Runtime state of one validation run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Run ID
    pub run_id: String,

    /// Coupon under test
    pub coupon: String,

    logs: RunLog,
}

impl RunContext {
    /// Create a new run context with a generated run ID
    pub fn new(coupon: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            coupon: coupon.into(),
            logs: RunLog::default(),
        }
    }

    /// Append a `log` entry
    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(run_id = %self.run_id, "{}", message);
        self.logs.push(LogKind::Log, message);
    }

    /// Append an `error` entry
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(run_id = %self.run_id, "{}", message);
        self.logs.push(LogKind::Error, message);
    }

    pub fn logs(&self) -> &RunLog {
        &self.logs
    }

    /// Hand the finished log over to the result artifact
    pub fn into_logs(self) -> RunLog {
        self.logs
    }
}
