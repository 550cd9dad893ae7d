//! Fixtures shared by planner tests: a tiny person/age/name dataset.

use std::sync::Arc;

use shapeval_core::config::ValidationConfig;
use shapeval_core::id::ShapeId;
use shapeval_core::shape::{Constraint, NodeShape, Path, Shape, Target};
use shapeval_core::source::SharedSource;
use shapeval_core::term::{Statement, Term, RDF_TYPE};
use shapeval_core::tuple::ValidationTuple;
use shapeval_io::MemoryStore;
use shapeval_operators::collect;

use crate::combinators::ShapePlanner;
use crate::context::{Frame, PlanContext};

pub fn person(id: &str) -> Statement {
    Statement::new(Term::iri(id), Term::iri(RDF_TYPE), Term::iri("Person"))
}

pub fn age(id: &str, v: Term) -> Statement {
    Statement::new(Term::iri(id), Term::iri("age"), v)
}

pub fn name(id: &str) -> Statement {
    Statement::new(Term::iri(id), Term::iri("name"), Term::str(id))
}

pub fn store(sts: Vec<Statement>) -> SharedSource {
    Arc::new(MemoryStore::from(sts))
}

pub fn node(shape: Shape) -> NodeShape {
    NodeShape::new(ShapeId::new(1000), vec![Target::Class(Term::iri("Person"))], vec![shape])
}

pub fn leaf(id: u64, c: Constraint) -> Shape {
    Shape::constraint(ShapeId::new(id), c)
}

pub fn on(p: &str) -> Path {
    Path::Predicate(Term::iri(p))
}

pub fn bulk(source: SharedSource, config: &ValidationConfig) -> PlanContext<'_> {
    PlanContext::bulk(source, config)
}

/// Plan and drain the node's first shape.
pub fn run(ctx: &PlanContext<'_>, node: &NodeShape, negate: bool) -> Vec<ValidationTuple> {
    let plan = node.shapes[0]
        .plan(ctx, Frame::root(node), None, negate)
        .unwrap();
    match plan {
        Some(p) => collect(p).unwrap(),
        None => Vec::new(),
    }
}

/// Distinct target names, sorted.
pub fn violators(tuples: &[ValidationTuple]) -> Vec<String> {
    let mut out: Vec<String> = tuples
        .iter()
        .map(|t| match t.target() {
            Term::Iri(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    out.sort();
    out.dedup();
    out
}
