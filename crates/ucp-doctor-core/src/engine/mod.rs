//! Check contract, run context and the dependency-ordered scheduler.

pub mod check;
pub mod context;
pub mod plan;
pub mod progress;
pub mod runner;

pub use check::{Check, CheckId, CheckOutcome};
pub use context::DiagnosticContext;
pub use progress::{NoProgress, ProgressObserver};
pub use runner::{DiagnosticEngine, DEPENDENCIES_NOT_MET};
