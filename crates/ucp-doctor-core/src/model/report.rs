//! Check results and the diagnostic report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::codes::DiagnosticCode;
use crate::model::profile::DiscoveryProfile;

/// Error code recorded when a check body faults.
pub const CHECK_ERROR: &str = "CHECK_ERROR";

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Skip,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Warn => "warn",
            CheckStatus::Skip => "skip",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one check in one run. Exactly one exists per selected check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: CheckStatus,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<DiagnosticCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    /// Wall-clock duration in milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u64,

    pub timestamp: DateTime<Utc>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// An unexpected fault raised while executing a check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticError {
    pub code: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

/// Counts per status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub skipped: usize,
}

impl ReportSummary {
    /// Tally statuses over a result list.
    pub fn tally(results: &[CheckResult]) -> Self {
        let count = |status: CheckStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            passed: count(CheckStatus::Pass),
            failed: count(CheckStatus::Fail),
            warnings: count(CheckStatus::Warn),
            skipped: count(CheckStatus::Skip),
        }
    }
}

/// Terminal artifact of a diagnostic run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub summary: ReportSummary,

    /// Results in execution order.
    pub checks: Vec<CheckResult>,

    /// The last discovery document a check stored in the run context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<DiscoveryProfile>,

    /// SHA-256 of the canonical JSON encoding of `profile`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_digest: Option<String>,

    pub errors: Vec<DiagnosticError>,

    /// True when the run was cancelled before every check produced a result.
    #[serde(default)]
    pub cancelled: bool,
}

impl DiagnosticReport {
    /// Whether no check failed.
    pub fn passed(&self) -> bool {
        self.summary.failed == 0
    }

    /// Look up a result by check id.
    pub fn result(&self, id: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|r| r.id == id)
    }

    /// Status of a check, if it produced a result.
    pub fn status_of(&self, id: &str) -> Option<CheckStatus> {
        self.result(id).map(|r| r.status)
    }
}
