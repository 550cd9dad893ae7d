#![forbid(unsafe_code)]
//! shapeval-exec: runs validation passes and reports violations.
//!
//! For every node shape the `Validator` asks the dirty check first, plans
//! only what the transaction can affect, drains the plans and records the
//! outcome in a `ValidationReport` plus a `RunManifest`.

pub mod metrics;
pub mod report;
pub mod validator;

pub use report::{ValidationReport, Violation};
pub use validator::{ExecError, Validator};
