//! Violation records and the per-pass report.

use serde::{Deserialize, Serialize};

use shapeval_core::id::ShapeId;
use shapeval_core::manifest::RunManifest;
use shapeval_core::shape::{Shape, SourceConstraintComponent};
use shapeval_core::term::{Statement, Term};
use shapeval_core::tuple::{Scope, ValidationTuple};

/// One violating focus node (and value, when the plan kept it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub focus: Term,
    pub value: Option<Term>,
    pub provenance: Option<Statement>,
    pub scope: Scope,
    /// Node shape the focus node was selected by.
    pub node_shape: ShapeId,
    /// Top-level shape that was violated.
    pub source_shape: ShapeId,
    pub component: SourceConstraintComponent,
    /// Shapes the tuple passed through, innermost first.
    pub trace: Vec<ShapeId>,
}

impl Violation {
    pub fn from_tuple(tuple: &ValidationTuple, node_shape: ShapeId, shape: &Shape) -> Self {
        Self {
            focus: tuple.target().clone(),
            value: tuple.value().cloned(),
            provenance: tuple.provenance().cloned(),
            scope: tuple.scope(),
            node_shape,
            source_shape: shape.id,
            component: shape.component(),
            trace: tuple.shapes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    /// Shapes whose draining stopped at `max_violations_per_shape`.
    pub truncated: Vec<ShapeId>,
    pub manifest: RunManifest,
}

impl ValidationReport {
    pub fn conforms(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations reported for one top-level shape.
    pub fn for_shape(&self, shape: ShapeId) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.source_shape == shape)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
