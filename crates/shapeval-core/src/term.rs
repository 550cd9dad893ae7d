//! RDF-like terms and statements. Pure data; the storage layer owns the real
//! encodings and maps them onto these when it answers scans.
//!
//! `Term` is totally ordered so every stream in the algebra can be kept sorted
//! by target, which the merge joins rely on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `rdf:type`, used by class-based target selection.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    Blank(String),
    Str(String),
    Int(i64),
    Bool(bool),
    /// A quoted statement. Provenance columns hold the fact that produced a value.
    Triple(Box<Statement>),
}

/// Coarse kind of a term, checked by `Constraint::Datatype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
    Iri,
    Blank,
    Str,
    Int,
    Bool,
    Triple,
}

impl Term {
    pub fn iri(s: impl Into<String>) -> Self {
        Term::Iri(s.into())
    }

    pub fn blank(s: impl Into<String>) -> Self {
        Term::Blank(s.into())
    }

    pub fn str(s: impl Into<String>) -> Self {
        Term::Str(s.into())
    }

    pub fn kind(&self) -> TermKind {
        match self {
            Term::Iri(_) => TermKind::Iri,
            Term::Blank(_) => TermKind::Blank,
            Term::Str(_) => TermKind::Str,
            Term::Int(_) => TermKind::Int,
            Term::Bool(_) => TermKind::Bool,
            Term::Triple(_) => TermKind::Triple,
        }
    }

    /// The smallest term in the total order; used as a range lower bound.
    pub fn min_value() -> Self {
        Term::Iri(String::new())
    }

    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Term::Triple(st) => Some(st),
            _ => None,
        }
    }
}

impl From<Statement> for Term {
    fn from(st: Statement) -> Self {
        Term::Triple(Box::new(st))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(s) => write!(f, "<{s}>"),
            Term::Blank(s) => write!(f, "_:{s}"),
            Term::Str(s) => write!(f, "{s:?}"),
            Term::Int(i) => write!(f, "{i}"),
            Term::Bool(b) => write!(f, "{b}"),
            Term::Triple(st) => write!(f, "<< {st} >>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Statement {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// True when every bound position equals the statement's term.
    pub fn matches(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> bool {
        s.map_or(true, |s| *s == self.subject)
            && p.map_or(true, |p| *p == self.predicate)
            && o.map_or(true, |o| *o == self.object)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_value_sorts_first() {
        let mut terms = vec![
            Term::Int(-5),
            Term::iri(""),
            Term::blank("a"),
            Term::iri("a"),
            Term::Bool(false),
        ];
        terms.sort();
        assert_eq!(terms[0], Term::min_value());
    }

    #[test]
    fn statement_pattern_matching() {
        let st = Statement::new(Term::iri("s"), Term::iri("p"), Term::Int(1));
        assert!(st.matches(Some(&Term::iri("s")), None, None));
        assert!(st.matches(None, Some(&Term::iri("p")), Some(&Term::Int(1))));
        assert!(!st.matches(None, Some(&Term::iri("q")), None));
    }
}
