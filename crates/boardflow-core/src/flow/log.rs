//! Run logs: immutable per-execution records.
//!
//! A fired rule produces exactly one log with per-action outcomes. Logs
//! are append-only; nothing mutates them after emission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flow::rule::RunStatus;

/// Outcome of one attempted action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub details: Option<String>,
}

impl ActionOutcome {
    pub fn succeeded(details: Option<String>) -> Self {
        Self {
            success: true,
            error: None,
            details,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: None,
        }
    }
}

/// Record of one rule execution attempt.
///
/// `action_results` is parallel to the attempted prefix of the action
/// sequence; a length shorter than `actions_total` signals an abort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRunLog {
    pub id: String,
    pub rule_id: String,
    pub board_id: String,
    pub card_id: Option<String>,
    /// Event kind that fired the rule
    pub triggered_by: Option<String>,
    pub triggered_at: DateTime<Utc>,
    pub status: RunStatus,
    pub actions_total: usize,
    pub actions_succeeded: usize,
    pub actions_failed: usize,
    pub action_results: Vec<ActionOutcome>,
    pub error_message: Option<String>,
    pub duration_ms: u64,
}

impl FlowRunLog {
    /// Classify a run from its attempted results.
    ///
    /// Success requires every action attempted and succeeded; a run with
    /// zero successes is failed; everything else is partial, including
    /// aborted sequences that had at least one success.
    pub fn compute_status(actions_total: usize, results: &[ActionOutcome]) -> RunStatus {
        let succeeded = results.iter().filter(|r| r.success).count();

        if succeeded == results.len() && results.len() == actions_total {
            RunStatus::Success
        } else if succeeded == 0 {
            RunStatus::Failed
        } else {
            RunStatus::Partial
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Whether the sequence stopped before attempting every action
    pub fn abort_detected(&self) -> bool {
        self.action_results.len() < self.actions_total
    }
}
