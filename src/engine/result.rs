//! Execution result types

use serde::{Deserialize, Serialize};

use crate::site::RunLog;

/// The result artifact written to `result.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub logs: RunLog,
    pub coupon_is_valid: bool,
}

/// What happened to one action of the sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A selector resolved and the interaction ran
    Completed { selector: String },
    /// No selectors configured
    Skipped,
    /// None of the selectors resolved
    Unresolved,
    /// The interaction on `selector` failed
    Failed { selector: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub name: String,
    pub outcome: ActionOutcome,
}

/// Per-action outcomes of one completed sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReport {
    pub actions: Vec<ActionReport>,
}

impl SequenceReport {
    pub(crate) fn push(&mut self, name: &str, outcome: ActionOutcome) {
        self.actions.push(ActionReport {
            name: name.to_string(),
            outcome,
        });
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, ActionOutcome::Completed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ActionOutcome::Failed { .. }))
    }

    pub fn unresolved(&self) -> usize {
        self.count(|o| matches!(o, ActionOutcome::Unresolved))
    }

    fn count(&self, pred: impl Fn(&ActionOutcome) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(&a.outcome)).count()
    }
}
