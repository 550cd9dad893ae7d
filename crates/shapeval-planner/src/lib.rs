#![forbid(unsafe_code)]
//! shapeval-planner: shape tree → violation plan.
//!
//! Design:
//! - `ShapePlanner` is implemented for `shapeval_core::shape::Shape`; each
//!   variant of `ShapeKind` has its own module under `combinators` (plus
//!   `leaf` for constraints).
//! - Negation is rewritten with De Morgan's laws while planning. The shape
//!   tree is never touched; negated operands are described by
//!   `combinators::Operand`.
//! - Shape reconciliation is lowest common denominator: mixed declared
//!   shapes, or a sub-shape with its own path, give an `Aggregated` result.
//! - `requires_evaluation` is the cheap dirty check the executor runs before
//!   planning anything.

pub mod combinators;
pub mod context;
pub mod dirty;
pub mod error;
pub mod leaf;
pub mod targets;

#[cfg(test)]
pub(crate) mod testing;

pub use combinators::ShapePlanner;
pub use context::{CollectingSink, DiagnosticsSink, Frame, PlanContext, TracingSink};
pub use dirty::node_requires_evaluation;
pub use error::PlanError;
