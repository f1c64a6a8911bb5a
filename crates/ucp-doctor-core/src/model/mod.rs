//! Data model: discovery document, options, results, report.

pub mod codes;
pub mod options;
pub mod profile;
pub mod report;

pub use codes::DiagnosticCode;
pub use options::{DiagnosticOptions, DEFAULT_TIMEOUT_MS};
pub use profile::{
    A2aBinding, Capability, DiscoveryProfile, EmbeddedBinding, EndpointBinding, KeyUse,
    PaymentHandler, PaymentSection, Service, SigningKey, UcpCore,
};
pub use report::{
    CheckResult, CheckStatus, DiagnosticError, DiagnosticReport, ReportSummary, CHECK_ERROR,
};
