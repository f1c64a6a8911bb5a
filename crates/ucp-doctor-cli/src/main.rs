//! UCP Doctor CLI
//!
//! The `ucp-doctor` command fetches a merchant's `/.well-known/ucp` discovery
//! document and runs the conformance checks against it.
//!
//! Progress lines go to stderr as each check completes; the JSON report goes
//! to stdout or to `--output`.
//!
//! ## Exit codes
//!
//! - `0`: no check failed
//! - `1`: at least one check failed
//! - `2`: the run could not start, or was interrupted

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{info, warn, Level};

use ucp_doctor_core::model::DEFAULT_TIMEOUT_MS;
use ucp_doctor_core::{
    all_checks, Check, CheckResult, CheckStatus, DiagnosticEngine, DiagnosticOptions,
    DiagnosticReport, ProgressObserver,
};

const EXIT_FAILED_CHECKS: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "ucp-doctor")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diagnose a UCP discovery document", long_about = None)]
struct Cli {
    /// Absolute merchant URL to diagnose, e.g. https://shop.example
    #[arg(env = "UCP_DOCTOR_TARGET", required_unless_present = "list_checks")]
    target: Option<String>,

    /// Timeout for each network request, in milliseconds
    #[arg(long, env = "UCP_DOCTOR_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Do not probe declared REST endpoints
    #[arg(long, env = "UCP_DOCTOR_SKIP_ENDPOINTS")]
    skip_endpoints: bool,

    /// Probe declared spec and schema URLs
    #[arg(long, env = "UCP_DOCTOR_CHECK_SCHEMAS")]
    check_schemas: bool,

    /// Keep per-check details in the report and log at debug level
    #[arg(short, long, env = "UCP_DOCTOR_VERBOSE")]
    verbose: bool,

    /// Run only these checks (repeatable)
    #[arg(
        long = "check",
        value_name = "ID",
        env = "UCP_DOCTOR_CHECKS",
        value_delimiter = ','
    )]
    checks: Vec<String>,

    /// Counterpart capability set for the intersection check (repeatable)
    #[arg(
        long = "reference-capability",
        value_name = "NAME",
        env = "UCP_DOCTOR_REFERENCE_CAPABILITIES",
        value_delimiter = ','
    )]
    reference_capabilities: Vec<String>,

    /// JSON document carrying `ap2.merchant_authorization` to verify
    #[arg(long, value_name = "FILE", env = "UCP_DOCTOR_AP2_SAMPLE")]
    ap2_sample: Option<PathBuf>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long, value_name = "FILE", env = "UCP_DOCTOR_OUTPUT")]
    output: Option<PathBuf>,

    /// Emit JSON-formatted log lines
    #[arg(long, env = "UCP_DOCTOR_JSON_LOGS")]
    json_logs: bool,

    /// Print the available checks and exit
    #[arg(long)]
    list_checks: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    ucp_doctor_core::telemetry::init_tracing(cli.json_logs, level);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_checks {
        cmd_list_checks();
        return Ok(ExitCode::SUCCESS);
    }

    let target = cli.target.clone().context("A target is required")?;
    let options = options_from_cli(&cli)?;
    let engine = DiagnosticEngine::new(options).context("Failed to build the check plan")?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with partial report");
            let _ = cancel_tx.send(true);
        }
    });

    let report = cmd_diagnose(&engine, &target, cli.output.as_deref(), cancel_rx).await?;
    Ok(ExitCode::from(exit_code(&report)))
}

/// Map parsed arguments onto engine options.
fn options_from_cli(cli: &Cli) -> Result<DiagnosticOptions> {
    let mut options = DiagnosticOptions::default()
        .with_timeout_ms(cli.timeout_ms)
        .with_checks(cli.checks.iter().cloned())
        .verbose(cli.verbose);

    if cli.skip_endpoints {
        options = options.without_endpoint_probes();
    }
    options.check_schemas = cli.check_schemas;

    if !cli.reference_capabilities.is_empty() {
        options.reference_capabilities = Some(cli.reference_capabilities.clone());
    }

    if let Some(path) = &cli.ap2_sample {
        options.ap2_sample = Some(read_ap2_sample(path)?);
    }

    Ok(options)
}

fn read_ap2_sample(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read AP2 sample {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("AP2 sample {} is not valid JSON", path.display()))
}

fn cmd_list_checks() {
    for check in all_checks() {
        let deps: Vec<&str> = check.dependencies().iter().map(|d| d.as_str()).collect();
        if deps.is_empty() {
            println!("{:<24} {}", check.id(), check.description());
        } else {
            println!(
                "{:<24} {} (after: {})",
                check.id(),
                check.description(),
                deps.join(", ")
            );
        }
    }
}

async fn cmd_diagnose(
    engine: &DiagnosticEngine,
    target: &str,
    output: Option<&Path>,
    cancel: watch::Receiver<bool>,
) -> Result<DiagnosticReport> {
    info!(url = %target, checks = engine.check_ids().len(), "Diagnosing");

    let report = engine
        .diagnose_with_cancel(target, &ProgressPrinter, cancel)
        .await;

    let s = &report.summary;
    eprintln!(
        "{} checks: {} passed, {} failed, {} warnings, {} skipped ({}ms)",
        s.total, s.passed, s.failed, s.warnings, s.skipped, report.duration_ms
    );

    write_report(&report, output)?;
    Ok(report)
}

fn write_report(report: &DiagnosticReport, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn exit_code(report: &DiagnosticReport) -> u8 {
    if report.cancelled {
        EXIT_FATAL
    } else if report.passed() {
        0
    } else {
        EXIT_FAILED_CHECKS
    }
}

/// Streams one line per result to stderr.
struct ProgressPrinter;

#[async_trait]
impl ProgressObserver for ProgressPrinter {
    async fn on_check_complete(&self, result: &CheckResult) {
        eprintln!("{}", progress_line(result));
    }
}

fn progress_line(result: &CheckResult) -> String {
    let tag = match result.status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Skip => "SKIP",
    };
    let mut line = format!("[{tag}] {:<24} {}", result.id, result.message);
    if let Some(code) = &result.code {
        line.push_str(&format!(" [{}]", code.as_str()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ucp_doctor_core::fakes::StaticProbe;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ucp-doctor"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_engine_defaults() {
        let cli = parse(&["https://shop.example"]);
        let options = options_from_cli(&cli).unwrap();
        assert_eq!(options, DiagnosticOptions::default());
    }

    #[test]
    fn test_flags_map_onto_options() {
        let cli = parse(&[
            "https://shop.example",
            "--timeout-ms",
            "2500",
            "--skip-endpoints",
            "--check-schemas",
            "--verbose",
            "--check",
            "connectivity",
            "--check",
            "discovery-endpoint",
            "--reference-capability",
            "dev.ucp.shopping.checkout",
        ]);
        let options = options_from_cli(&cli).unwrap();

        assert_eq!(options.timeout_ms, 2500);
        assert!(!options.check_endpoints);
        assert!(options.check_schemas);
        assert!(options.verbose);
        assert_eq!(options.checks, vec!["connectivity", "discovery-endpoint"]);
        assert_eq!(
            options.reference_capabilities,
            Some(vec!["dev.ucp.shopping.checkout".to_string()])
        );
    }

    #[test]
    fn test_target_required_unless_listing() {
        assert!(Cli::try_parse_from(["ucp-doctor"]).is_err());
        let cli = parse(&["--list-checks"]);
        assert!(cli.list_checks);
        assert!(cli.target.is_none());
    }

    #[test]
    fn test_ap2_sample_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, r#"{"ap2": {"merchant_authorization": "a..b"}}"#).unwrap();

        let cli = parse(&["https://shop.example", "--ap2-sample", path.to_str().unwrap()]);
        let options = options_from_cli(&cli).unwrap();

        let sample = options.ap2_sample.unwrap();
        assert_eq!(sample["ap2"]["merchant_authorization"], "a..b");
    }

    #[test]
    fn test_unreadable_ap2_sample_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let cli = parse(&["https://shop.example", "--ap2-sample", missing.to_str().unwrap()]);
        let err = options_from_cli(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read AP2 sample"));

        let garbled = dir.path().join("garbled.json");
        std::fs::write(&garbled, "{not json").unwrap();
        let cli = parse(&["https://shop.example", "--ap2-sample", garbled.to_str().unwrap()]);
        let err = options_from_cli(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("is not valid JSON"));
    }

    #[test]
    fn test_unknown_check_fails_engine_construction() {
        let cli = parse(&["https://shop.example", "--check", "no-such-check"]);
        let options = options_from_cli(&cli).unwrap();
        assert!(DiagnosticEngine::new(options).is_err());
    }

    #[test]
    fn test_progress_line_carries_status_and_code() {
        let line = progress_line(&CheckResult {
            id: "order-capability".into(),
            name: "Order Capability".into(),
            description: String::new(),
            status: CheckStatus::Fail,
            message: "Order capability requires signing keys".into(),
            code: Some(ucp_doctor_core::DiagnosticCode::UcpOrderMissingSigningKeys),
            details: None,
            duration_ms: 0,
            timestamp: chrono::Utc::now(),
        });
        assert!(line.starts_with("[FAIL] order-capability"));
        assert!(line.ends_with("[UCP_ORDER_MISSING_SIGNING_KEYS]"));
    }

    #[tokio::test]
    async fn test_report_written_to_output_file() {
        let engine = DiagnosticEngine::new(DiagnosticOptions::default().with_timeout_ms(50))
            .unwrap()
            .with_probe(Arc::new(
                StaticProbe::new().with_timeout("https://shop.example"),
            ));
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.json");
        let (_tx, rx) = watch::channel(false);

        let report = cmd_diagnose(&engine, "https://shop.example", Some(&out), rx)
            .await
            .unwrap();

        assert_eq!(exit_code(&report), EXIT_FAILED_CHECKS);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["target"], "https://shop.example");
        assert_eq!(written["summary"]["failed"], 1);
        assert_eq!(written["checks"][0]["id"], "connectivity");
        assert_eq!(written["checks"][0]["status"], "fail");
    }

    #[tokio::test]
    async fn test_cancelled_run_exits_fatal() {
        let engine = DiagnosticEngine::new(DiagnosticOptions::default())
            .unwrap()
            .with_probe(Arc::new(StaticProbe::new()));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.json");
        let report = cmd_diagnose(&engine, "https://shop.example", Some(&out), rx)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(exit_code(&report), EXIT_FATAL);
    }
}
