//! Progress callbacks for callers that stream results as they are produced.

use async_trait::async_trait;

use crate::model::CheckResult;

/// Receives lifecycle notifications during a run.
///
/// Notifications are side effects only: they are awaited in order but can
/// never change which checks run or what they report.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    /// Fired immediately before a check body executes. Not fired for checks
    /// skipped on unmet dependencies.
    async fn on_check_start(&self, _id: &str, _name: &str) {}

    /// Fired once per result, including synthetic skips.
    async fn on_check_complete(&self, _result: &CheckResult) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

#[async_trait]
impl ProgressObserver for NoProgress {}
