//! Convenient re-exports for downstream crates.

pub use crate::config::ValidationConfig;
pub use crate::error::{Error, Result};
pub use crate::id::ShapeId;
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::shape::{
    Constraint, NodeShape, Path, Shape, ShapeKind, SourceConstraintComponent, Target,
};
pub use crate::source::{Delta, SharedSource, StatementIter, StatementSource};
pub use crate::term::{Statement, Term, TermKind, RDF_TYPE};
pub use crate::tuple::{IteratorShape, Scope, ValidationTuple};
