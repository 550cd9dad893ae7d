#![forbid(unsafe_code)]
//! shapeval-core: the data every other shapeval crate speaks.
//!
//! Contents:
//! - `term`: RDF-like terms and statements (quoted triples carry provenance).
//! - `tuple`: `ValidationTuple`, the unit flowing through plan operators, and
//!   the declared `IteratorShape` of a stream.
//! - `shape`: the immutable shape tree (targets, paths, leaf constraints and
//!   AND/OR/NOT combinators).
//! - `source`: the statement-source boundary with the storage layer and the
//!   transaction `Delta`.
//! - `config`, `error`, `hash`, `id`, `manifest`: ambient plumbing.
//!
//! No I/O and no evaluation logic live here.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod shape;
pub mod source;
pub mod term;
pub mod tuple;

/// Engine version recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, Result};
