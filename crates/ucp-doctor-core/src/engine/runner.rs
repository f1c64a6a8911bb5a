//! The scheduler: orders checks, runs them, assembles the report.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::canonical::canonical_digest;
use crate::checks::all_checks;
use crate::engine::check::{Check, CheckId, CheckOutcome};
use crate::engine::context::DiagnosticContext;
use crate::engine::plan::execution_order;
use crate::engine::progress::ProgressObserver;
use crate::error::{DoctorError, Result};
use crate::model::{
    CheckResult, CheckStatus, DiagnosticError, DiagnosticOptions, DiagnosticReport,
    DiscoveryProfile, ReportSummary, CHECK_ERROR,
};
use crate::obs;
use crate::probe::{HttpProbe, ReqwestProbe};

/// Message of the synthetic result recorded for a check whose dependencies
/// did not all run successfully.
pub const DEPENDENCIES_NOT_MET: &str = "dependencies not met";

/// Runs a validated, dependency-ordered set of checks against one target
/// per call. The engine holds no per-run state, so one instance may serve
/// concurrent runs.
pub struct DiagnosticEngine {
    options: DiagnosticOptions,
    /// Already in execution order.
    checks: Vec<Box<dyn Check>>,
    probe: Arc<dyn HttpProbe>,
}

impl std::fmt::Debug for DiagnosticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticEngine")
            .field("options", &self.options)
            .field("checks", &self.check_ids())
            .finish_non_exhaustive()
    }
}

impl DiagnosticEngine {
    /// Engine over the built-in checks, narrowed to `options.checks` when
    /// that list is non-empty.
    pub fn new(options: DiagnosticOptions) -> Result<Self> {
        Self::with_checks(options, all_checks())
    }

    /// Engine over an arbitrary check set. Fails on duplicate ids, on
    /// dependency cycles, and on a selected id that names no check.
    pub fn with_checks(options: DiagnosticOptions, checks: Vec<Box<dyn Check>>) -> Result<Self> {
        let selected = select(checks, &options.checks)?;
        let order = execution_order(&selected)?;

        let mut slots: Vec<Option<Box<dyn Check>>> = selected.into_iter().map(Some).collect();
        let checks = order.into_iter().filter_map(|i| slots[i].take()).collect();

        Ok(Self {
            options,
            checks,
            probe: Arc::new(ReqwestProbe::new()),
        })
    }

    /// Replace the HTTP collaborator.
    pub fn with_probe(mut self, probe: Arc<dyn HttpProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn options(&self) -> &DiagnosticOptions {
        &self.options
    }

    /// Check ids in execution order.
    pub fn check_ids(&self) -> Vec<CheckId> {
        self.checks.iter().map(|c| c.id()).collect()
    }

    /// Run every check against `target`.
    pub async fn diagnose(&self, target: &str, observer: &dyn ProgressObserver) -> DiagnosticReport {
        let (_keep_open, cancel) = watch::channel(false);
        self.diagnose_with_cancel(target, observer, cancel).await
    }

    /// Like [`diagnose`](Self::diagnose), but stops as soon as `cancel`
    /// becomes `true`: the in-flight check is abandoned, no further check is
    /// started, and the report holds what was produced so far with
    /// `cancelled = true`.
    pub async fn diagnose_with_cancel(
        &self,
        target: &str,
        observer: &dyn ProgressObserver,
        mut cancel: watch::Receiver<bool>,
    ) -> DiagnosticReport {
        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id.to_string(), target);
        self.run(run_id, target, observer, &mut cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        run_id: Uuid,
        target: &str,
        observer: &dyn ProgressObserver,
        cancel: &mut watch::Receiver<bool>,
    ) -> DiagnosticReport {
        let run_label = run_id.to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        obs::emit_run_started(&run_label, target, self.checks.len());

        let mut ctx = DiagnosticContext::new(target, self.options.clone(), self.probe.clone());
        let mut statuses: HashMap<CheckId, CheckStatus> = HashMap::with_capacity(self.checks.len());
        let mut results: Vec<CheckResult> = Vec::with_capacity(self.checks.len());
        let mut errors = Vec::new();
        let mut cancelled = false;

        for check in &self.checks {
            if *cancel.borrow() {
                cancelled = true;
                break;
            }

            let unmet: Vec<&str> = check
                .dependencies()
                .iter()
                .filter(|dep| matches!(statuses.get(*dep), None | Some(CheckStatus::Fail)))
                .map(|dep| dep.as_str())
                .collect();
            if !unmet.is_empty() {
                obs::emit_check_skipped(check.id().as_str(), &unmet);
                let result = self.to_result(&**check, CheckOutcome::skip(DEPENDENCIES_NOT_MET), 0);
                statuses.insert(check.id(), result.status);
                observer.on_check_complete(&result).await;
                results.push(result);
                continue;
            }

            observer.on_check_start(check.id().as_str(), check.name()).await;
            obs::emit_check_started(check.id().as_str());

            let check_clock = Instant::now();
            let outcome = tokio::select! {
                biased;
                _ = cancellation(cancel) => None,
                outcome = check.run(&mut ctx) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                cancelled = true;
                break;
            };

            let outcome = outcome.unwrap_or_else(|err| {
                obs::emit_check_error(check.id().as_str(), &err);
                errors.push(DiagnosticError {
                    code: CHECK_ERROR.to_string(),
                    message: format!("{err:#}"),
                    check: Some(check.id().to_string()),
                });
                CheckOutcome::fail(format!("Check raised an error: {err:#}"))
            });

            let result = self.to_result(&**check, outcome, elapsed_ms(check_clock));
            obs::emit_check_completed(check.id().as_str(), result.status, result.duration_ms);
            statuses.insert(check.id(), result.status);
            observer.on_check_complete(&result).await;
            results.push(result);
        }

        if cancelled {
            obs::emit_run_cancelled(&run_label, results.len(), self.checks.len() - results.len());
        }

        let summary = ReportSummary::tally(&results);
        let duration_ms = elapsed_ms(clock);
        obs::emit_run_finished(&run_label, duration_ms, summary.failed, summary.failed == 0);

        let profile = ctx.profile.take();
        let profile_digest = profile.as_ref().and_then(digest_profile);

        DiagnosticReport {
            id: run_id,
            target: target.to_string(),
            started_at,
            completed_at: Utc::now(),
            duration_ms,
            summary,
            checks: results,
            profile,
            profile_digest,
            errors,
            cancelled,
        }
    }

    fn to_result(&self, check: &dyn Check, outcome: CheckOutcome, duration_ms: u64) -> CheckResult {
        CheckResult {
            id: check.id().to_string(),
            name: check.name().to_string(),
            description: check.description().to_string(),
            status: outcome.status,
            message: outcome.message,
            code: outcome.code,
            details: if self.options.verbose {
                outcome.details
            } else {
                None
            },
            duration_ms,
            timestamp: Utc::now(),
        }
    }
}

/// Keep registration order, narrowed to `wanted` when non-empty.
fn select(checks: Vec<Box<dyn Check>>, wanted: &[String]) -> Result<Vec<Box<dyn Check>>> {
    if wanted.is_empty() {
        return Ok(checks);
    }
    if let Some(unknown) = wanted
        .iter()
        .find(|id| !checks.iter().any(|c| c.id().as_str() == id.as_str()))
    {
        return Err(DoctorError::UnknownCheck {
            id: unknown.clone(),
        });
    }
    Ok(checks
        .into_iter()
        .filter(|c| wanted.iter().any(|id| id == c.id().as_str()))
        .collect())
}

/// Resolves once the flag reads `true`. A dropped sender means the run can
/// no longer be cancelled, so the future then never resolves.
async fn cancellation(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn digest_profile(profile: &DiscoveryProfile) -> Option<String> {
    let value = serde_json::to_value(profile).ok()?;
    canonical_digest(&value).ok()
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
