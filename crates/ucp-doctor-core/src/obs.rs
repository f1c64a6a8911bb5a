//! Structured lifecycle events for diagnostic runs.
//!
//! Every event carries an `event` field (`run.started`, `check.completed`,
//! ...) so log pipelines can filter on it without parsing messages.

use tracing::{info, warn};

use crate::model::CheckStatus;

/// Span covering one diagnostic run. Attach it with
/// [`tracing::Instrument::instrument`] so it stays valid across awaits.
pub fn run_span(run_id: &str, target: &str) -> tracing::Span {
    tracing::info_span!("ucp_doctor.run", run_id = %run_id, target = %target)
}

pub fn emit_run_started(run_id: &str, target: &str, checks: usize) {
    info!(event = "run.started", run_id = %run_id, target = %target, checks = checks);
}

pub fn emit_check_started(check_id: &str) {
    tracing::debug!(event = "check.started", check_id = %check_id);
}

pub fn emit_check_completed(check_id: &str, status: CheckStatus, duration_ms: u64) {
    info!(
        event = "check.completed",
        check_id = %check_id,
        status = %status,
        duration_ms = duration_ms,
    );
}

pub fn emit_check_skipped(check_id: &str, unmet: &[&str]) {
    info!(event = "check.skipped", check_id = %check_id, unmet = ?unmet);
}

/// A check body returned an error; the run continues.
pub fn emit_check_error(check_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "check.error", check_id = %check_id, error = %error);
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, failed: usize, passed: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        failed = failed,
        passed = passed,
    );
}

pub fn emit_run_cancelled(run_id: &str, completed: usize, remaining: usize) {
    warn!(
        event = "run.cancelled",
        run_id = %run_id,
        completed = completed,
        remaining = remaining,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitters_do_not_panic_without_subscriber() {
        let span = run_span("run-1", "https://shop.example");
        let _guard = span.enter();
        emit_run_started("run-1", "https://shop.example", 3);
        emit_check_started("connectivity");
        emit_check_completed("connectivity", CheckStatus::Pass, 4);
        emit_check_skipped("json-format", &["discovery-endpoint"]);
        emit_check_error("json-format", &"boom");
        emit_run_cancelled("run-1", 1, 2);
        emit_run_finished("run-1", 10, 0, true);
    }
}
