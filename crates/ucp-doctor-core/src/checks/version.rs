//! Protocol version checks.

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde_json::json;

use crate::engine::{Check, CheckId, CheckOutcome, DiagnosticContext};
use crate::registry::{deprecation_reason, is_deprecated, is_known_version, LATEST_VERSION};

/// Versions older than this many days draw a warning.
pub const MAX_VERSION_AGE_DAYS: i64 = 365;

fn version_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok())
        .as_ref()
}

/// `YYYY-MM-DD` naming a real calendar date.
pub fn parse_version_date(version: &str) -> Option<NaiveDate> {
    if !version_pattern().is_some_and(|re| re.is_match(version)) {
        return None;
    }
    NaiveDate::parse_from_str(version, "%Y-%m-%d").ok()
}

pub struct VersionFormatCheck;

#[async_trait]
impl Check for VersionFormatCheck {
    fn id(&self) -> CheckId {
        CheckId::VERSION_FORMAT
    }

    fn name(&self) -> &'static str {
        "Version Format"
    }

    fn description(&self) -> &'static str {
        "Validates UCP version is in YYYY-MM-DD format"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(version) = ctx
            .profile
            .as_ref()
            .map(|p| p.ucp.version.clone())
            .filter(|v| !v.is_empty())
        else {
            return Ok(CheckOutcome::skip("No version field found"));
        };

        if !version_pattern().is_some_and(|re| re.is_match(&version)) {
            return Ok(CheckOutcome::fail(format!(
                "Version \"{version}\" is not in YYYY-MM-DD format"
            ))
            .with_details(json!({ "version": version, "expected": "YYYY-MM-DD" })));
        }

        let Some(date) = parse_version_date(&version) else {
            return Ok(
                CheckOutcome::fail(format!("Version \"{version}\" is not a valid date"))
                    .with_details(json!({ "version": version })),
            );
        };

        ctx.version_date = Some(date);
        Ok(
            CheckOutcome::pass(format!("Version \"{version}\" is valid YYYY-MM-DD format"))
                .with_details(json!({ "version": version, "parsed": date.to_string() })),
        )
    }
}

pub struct VersionRecencyCheck;

#[async_trait]
impl Check for VersionRecencyCheck {
    fn id(&self) -> CheckId {
        CheckId::VERSION_RECENCY
    }

    fn name(&self) -> &'static str {
        "Version Recency"
    }

    fn description(&self) -> &'static str {
        "Checks if the UCP version is recent"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::VERSION_FORMAT]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let (Some(profile), Some(date)) = (ctx.profile.as_ref(), ctx.version_date) else {
            return Ok(CheckOutcome::skip("No valid version date available"));
        };
        let version = &profile.ucp.version;
        let days_old = (Utc::now().date_naive() - date).num_days();
        let details = json!({ "version": version, "daysOld": days_old });

        if days_old > MAX_VERSION_AGE_DAYS {
            return Ok(CheckOutcome::warn(format!(
                "Version \"{version}\" is {days_old} days old. Consider updating."
            ))
            .with_details(details));
        }
        Ok(
            CheckOutcome::pass(format!("Version \"{version}\" is current ({days_old} days old)"))
                .with_details(details),
        )
    }
}

pub struct VersionRegistryCheck;

#[async_trait]
impl Check for VersionRegistryCheck {
    fn id(&self) -> CheckId {
        CheckId::VERSION_REGISTRY
    }

    fn name(&self) -> &'static str {
        "Version Registry Validation"
    }

    fn description(&self) -> &'static str {
        "Validates version against known UCP specification versions"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::VERSION_FORMAT]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(profile) = ctx.profile.as_ref() else {
            return Ok(CheckOutcome::skip("No version field found"));
        };
        let version = &profile.ucp.version;

        if !is_known_version(version) {
            return Ok(CheckOutcome::warn(format!(
                "Version \"{version}\" is not a published UCP specification version"
            ))
            .with_details(json!({
                "version": version,
                "latestKnownVersion": LATEST_VERSION,
                "note": "This may be a pre-release or draft version",
            })));
        }

        if is_deprecated(version) {
            return Ok(CheckOutcome::warn(format!("Version \"{version}\" is deprecated"))
                .with_details(json!({
                    "version": version,
                    "deprecationReason": deprecation_reason(version),
                    "latestVersion": LATEST_VERSION,
                })));
        }

        Ok(CheckOutcome::pass(format!(
            "Version \"{version}\" is a known UCP specification version"
        ))
        .with_details(json!({ "version": version, "latestVersion": LATEST_VERSION })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::fakes::StaticProbe;
    use crate::model::{CheckStatus, DiagnosticOptions};

    fn ctx(version: &str) -> DiagnosticContext {
        let mut c = DiagnosticContext::new(
            "https://shop.example",
            DiagnosticOptions::default(),
            Arc::new(StaticProbe::new()),
        );
        c.profile = Some(serde_json::from_value(json!({ "ucp": { "version": version } })).unwrap());
        c
    }

    #[test]
    fn test_parse_version_date() {
        assert_eq!(
            parse_version_date("2026-01-11"),
            NaiveDate::from_ymd_opt(2026, 1, 11)
        );
        assert!(parse_version_date("2026-02-30").is_none());
        assert!(parse_version_date("2026-1-11").is_none());
        assert!(parse_version_date("v2026-01-11").is_none());
    }

    #[tokio::test]
    async fn test_format_pass_stores_date() {
        let mut c = ctx("2026-01-11");
        let outcome = VersionFormatCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert_eq!(c.version_date, NaiveDate::from_ymd_opt(2026, 1, 11));
    }

    #[tokio::test]
    async fn test_format_rejects_shape_and_impossible_dates() {
        let mut c = ctx("January 2026");
        let outcome = VersionFormatCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert!(outcome.message.contains("not in YYYY-MM-DD format"));

        let mut c = ctx("2026-13-01");
        let outcome = VersionFormatCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert!(outcome.message.contains("not a valid date"));
        assert!(c.version_date.is_none());
    }

    #[tokio::test]
    async fn test_recency_warns_for_old_versions() {
        let mut c = ctx("2001-01-01");
        c.version_date = NaiveDate::from_ymd_opt(2001, 1, 1);
        let outcome = VersionRecencyCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Warn);

        let mut c = ctx("today");
        c.version_date = Some(Utc::now().date_naive());
        let outcome = VersionRecencyCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert!(outcome.message.contains("(0 days old)"));
    }

    #[tokio::test]
    async fn test_registry_known_and_unknown() {
        let mut c = ctx(LATEST_VERSION);
        assert_eq!(VersionRegistryCheck.run(&mut c).await.unwrap().status, CheckStatus::Pass);
        let mut c = ctx("2030-06-01");
        let outcome = VersionRegistryCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Warn);
        assert!(outcome.message.contains("not a published"));
    }
}
