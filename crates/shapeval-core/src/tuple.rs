//! `ValidationTuple` and the declared `IteratorShape` of a tuple stream.
//!
//! Column layout: `[target, value?, provenance?]`. Provenance is a quoted
//! statement (`Term::Triple`) so projection and equality treat it like any
//! other column. Equality, hashing and ordering only look at the columns;
//! scope and shape tags ride along for reporting.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::id::ShapeId;
use crate::term::{Statement, Term};

/// Whether a tuple came from the evaluated delta or from pre-existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    Base,
    Delta,
}

/// Declared column contract of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IteratorShape {
    /// target, value and provenance are all meaningful.
    TripleBased,
    /// Only target (and possibly value) are meaningful; provenance dropped.
    Aggregated,
}

impl IteratorShape {
    /// Lowest common denominator of a set of declared shapes.
    ///
    /// Returns `None` for an empty set.
    pub fn reconcile<I: IntoIterator<Item = IteratorShape>>(shapes: I) -> Option<IteratorShape> {
        shapes.into_iter().reduce(|a, b| if a == b { a } else { IteratorShape::Aggregated })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TupleRepr")]
pub struct ValidationTuple {
    line: Vec<Term>,
    scope: Scope,
    shapes: Vec<ShapeId>,
}

/// Wire form; decoding goes through `from_line` so the target column always exists.
#[derive(Deserialize)]
struct TupleRepr {
    line: Vec<Term>,
    #[serde(default)]
    scope: Scope,
    #[serde(default)]
    shapes: Vec<ShapeId>,
}

impl TryFrom<TupleRepr> for ValidationTuple {
    type Error = String;

    fn try_from(repr: TupleRepr) -> std::result::Result<Self, Self::Error> {
        let mut tuple = ValidationTuple::from_line(repr.line)
            .ok_or_else(|| "validation tuple has no target column".to_string())?;
        tuple.scope = repr.scope;
        tuple.shapes = repr.shapes;
        Ok(tuple)
    }
}

impl ValidationTuple {
    pub fn new(target: Term) -> Self {
        Self {
            line: vec![target],
            scope: Scope::Base,
            shapes: Vec::new(),
        }
    }

    /// A `(target, value, provenance)` tuple.
    pub fn triple(target: Term, value: Term, provenance: Statement) -> Self {
        Self {
            line: vec![target, value, Term::from(provenance)],
            scope: Scope::Base,
            shapes: Vec::new(),
        }
    }

    /// Build from raw columns; `None` when the target column is missing.
    pub fn from_line(line: Vec<Term>) -> Option<Self> {
        if line.is_empty() {
            return None;
        }
        Some(Self {
            line,
            scope: Scope::Base,
            shapes: Vec::new(),
        })
    }

    pub fn with_value(mut self, value: Term) -> Self {
        self.line.truncate(1);
        self.line.push(value);
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn target(&self) -> &Term {
        &self.line[0]
    }

    pub fn value(&self) -> Option<&Term> {
        self.line.get(1)
    }

    pub fn provenance(&self) -> Option<&Statement> {
        self.line.get(2).and_then(Term::as_statement)
    }

    pub fn line(&self) -> &[Term] {
        &self.line
    }

    pub fn width(&self) -> usize {
        self.line.len()
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    /// First `len` columns (the whole line when it is shorter).
    pub fn key(&self, len: usize) -> &[Term] {
        &self.line[..len.min(self.line.len())]
    }

    /// Keep only the first `len` columns; the target always survives.
    pub fn trim(mut self, len: usize) -> Self {
        self.line.truncate(len.max(1));
        self
    }

    /// Append columns (used by joins when combining two tuples).
    pub fn extend_line<I: IntoIterator<Item = Term>>(&mut self, cols: I) {
        self.line.extend(cols);
    }

    pub fn tag(&mut self, shape: ShapeId) {
        self.shapes.push(shape);
    }

    /// Merge reporting metadata from a tuple this one was joined with.
    pub fn absorb(&mut self, other: &ValidationTuple) {
        self.shapes.extend(other.shapes.iter().copied());
        if other.scope == Scope::Delta {
            self.scope = Scope::Delta;
        }
    }
}

impl PartialEq for ValidationTuple {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line
    }
}

impl Eq for ValidationTuple {}

impl Hash for ValidationTuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.line.hash(state);
    }
}

impl PartialOrd for ValidationTuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValidationTuple {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line.cmp(&other.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(s: &str, p: &str, o: i64) -> Statement {
        Statement::new(Term::iri(s), Term::iri(p), Term::Int(o))
    }

    #[test]
    fn triple_tuple_exposes_columns() {
        let t = ValidationTuple::triple(Term::iri("a"), Term::Int(1), st("a", "p", 1));
        assert_eq!(t.target(), &Term::iri("a"));
        assert_eq!(t.value(), Some(&Term::Int(1)));
        assert_eq!(t.provenance(), Some(&st("a", "p", 1)));
        assert_eq!(t.width(), 3);
    }

    #[test]
    fn trim_drops_provenance_but_never_the_target() {
        let t = ValidationTuple::triple(Term::iri("a"), Term::Int(1), st("a", "p", 1));
        let trimmed = t.clone().trim(1);
        assert_eq!(trimmed.line(), &[Term::iri("a")]);
        assert!(trimmed.provenance().is_none());
        assert_eq!(t.trim(0).width(), 1);
    }

    #[test]
    fn equality_ignores_tags_and_scope() {
        let mut a = ValidationTuple::new(Term::iri("a"));
        a.tag(ShapeId::new(7));
        let b = ValidationTuple::new(Term::iri("a")).with_scope(Scope::Delta);
        assert_eq!(a, b);
    }

    #[test]
    fn decoding_rejects_a_missing_target() {
        assert!(serde_json::from_str::<ValidationTuple>(r#"{"line":[],"scope":"Base","shapes":[]}"#).is_err());

        let mut t = ValidationTuple::triple(Term::iri("a"), Term::Int(1), st("a", "p", 1))
            .with_scope(Scope::Delta);
        t.tag(ShapeId::new(3));
        let back: ValidationTuple = serde_json::from_str(&serde_json::to_string(&t).unwrap()).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.scope(), Scope::Delta);
        assert_eq!(back.shapes(), [ShapeId::new(3)]);
    }

    #[test]
    fn reconcile_is_lowest_common_denominator() {
        use IteratorShape::*;
        assert_eq!(IteratorShape::reconcile([TripleBased, TripleBased]), Some(TripleBased));
        assert_eq!(IteratorShape::reconcile([TripleBased, Aggregated]), Some(Aggregated));
        assert_eq!(IteratorShape::reconcile([]), None);
    }
}
