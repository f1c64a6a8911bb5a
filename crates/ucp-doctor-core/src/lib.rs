//! UCP Doctor Core Library
//!
//! Conformance diagnostics for Universal Commerce Protocol discovery
//! documents: a dependency-ordered check pipeline, capability graph
//! validation and detached JWS verification over canonical JSON.

pub mod canonical;
pub mod checks;
pub mod engine;
pub mod error;
pub mod fakes;
pub mod graph;
pub mod jws;
pub mod model;
pub mod obs;
pub mod probe;
pub mod registry;
pub mod schema;
pub mod telemetry;

pub use canonical::{canonical_digest, canonicalize, canonicalize_excluding};

pub use checks::all_checks;

pub use engine::{
    Check, CheckId, CheckOutcome, DiagnosticContext, DiagnosticEngine, NoProgress,
    ProgressObserver, DEPENDENCIES_NOT_MET,
};

pub use error::{DoctorError, Result};

pub use graph::{
    classify, find_dangling_extensions, simulate_intersection, validate_namespace_binding,
    BindingViolation, Classification, DanglingExtension, IntersectionOutcome, PrunedCapability,
    DEFAULT_REFERENCE_CAPABILITIES,
};

pub use jws::{
    parse_detached_jws, verify_detached_jws, DetachedJws, JwsError, SignatureAlgorithm,
    AP2_SIGNATURE_ALGORITHMS,
};

pub use model::{
    Capability, CheckResult, CheckStatus, DiagnosticCode, DiagnosticError, DiagnosticOptions,
    DiagnosticReport, DiscoveryProfile, ReportSummary, SigningKey,
};

pub use probe::{HttpProbe, ProbeError, ProbeResponse, ReqwestProbe};

pub use schema::{validate_profile, SchemaIssue};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
