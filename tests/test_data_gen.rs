//! Shared fixtures for the integration tests: a four-person graph and a few
//! constraints on `age`.
#![allow(dead_code)]

use std::sync::Arc;

use shapeval_core::prelude::*;
use shapeval_exec::ValidationReport;
use shapeval_io::MemoryStore;

pub const NODE: u64 = 1;

pub fn person(id: &str) -> Statement {
    Statement::new(Term::iri(id), Term::iri(RDF_TYPE), Term::iri("Person"))
}

pub fn age(id: &str, v: Term) -> Statement {
    Statement::new(Term::iri(id), Term::iri("age"), v)
}

/// a: 30, b: "old", c: no age, d: 15 and 40.
pub fn people() -> MemoryStore {
    vec![
        person("a"),
        person("b"),
        person("c"),
        person("d"),
        age("a", Term::Int(30)),
        age("b", Term::str("old")),
        age("d", Term::Int(15)),
        age("d", Term::Int(40)),
    ]
    .into()
}

pub fn shared(store: MemoryStore) -> SharedSource {
    Arc::new(store)
}

pub fn age_path() -> Path {
    Path::Predicate(Term::iri("age"))
}

/// Violated by b.
pub fn is_int(id: u64) -> Shape {
    Shape::constraint(ShapeId::new(id), Constraint::Datatype(TermKind::Int))
}

/// Violated by c.
pub fn min_one(id: u64) -> Shape {
    Shape::constraint(ShapeId::new(id), Constraint::MinCount(1))
}

/// Violated by d.
pub fn max_one(id: u64) -> Shape {
    Shape::constraint(ShapeId::new(id), Constraint::MaxCount(1))
}

/// Violated by b and d.
pub fn known_age(id: u64) -> Shape {
    Shape::constraint(ShapeId::new(id), Constraint::In(vec![Term::Int(15), Term::Int(30)]))
}

pub fn on_age(shape: Shape) -> Shape {
    shape.with_path(age_path())
}

pub fn persons(shapes: Vec<Shape>) -> NodeShape {
    NodeShape::new(ShapeId::new(NODE), vec![Target::Class(Term::iri("Person"))], shapes)
}

/// Distinct focus nodes of a report, as plain names.
pub fn focus_names(report: &ValidationReport) -> Vec<String> {
    let mut names: Vec<String> = report
        .violations
        .iter()
        .filter_map(|v| match &v.focus {
            Term::Iri(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    names.sort();
    names.dedup();
    names
}
