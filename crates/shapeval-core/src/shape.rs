//! The shape tree: an immutable, externally built description of what to
//! validate.
//!
//! A `NodeShape` owns the target selection; the `Shape`s below it form a
//! closed tagged tree (`Constraint` leaves combined by `And`/`Or`/`Not`). The
//! planner walks it with a `match` over `ShapeKind`; nothing mutates it after
//! construction, so one tree can serve concurrent validation passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::Result;
use crate::id::ShapeId;
use crate::source::{Delta, StatementSource};
use crate::term::{Term, TermKind, RDF_TYPE};

/// How values are reached from a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Path {
    /// Objects of `target p ?value`.
    Predicate(Term),
    /// Subjects of `?value p target`.
    Inverse(Term),
}

impl Path {
    pub fn predicate(&self) -> &Term {
        match self {
            Path::Predicate(p) | Path::Inverse(p) => p,
        }
    }

    pub fn is_inverse(&self) -> bool {
        matches!(self, Path::Inverse(_))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Predicate(p) => write!(f, "{p}"),
            Path::Inverse(p) => write!(f, "^{p}"),
        }
    }
}

/// Target selection of a node shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// All instances of a class (`?x rdf:type C`).
    Class(Term),
    /// An explicit list of nodes; they are targets whether or not any data exists.
    Node(Vec<Term>),
    /// Every subject of the predicate.
    SubjectsOf(Term),
    /// Every object of the predicate.
    ObjectsOf(Term),
}

impl Target {
    /// Every term this selector picks out of `source`.
    pub fn select(&self, source: &dyn StatementSource) -> Result<BTreeSet<Term>> {
        let mut out = BTreeSet::new();
        match self {
            Target::Class(class) => {
                let rdf_type = Term::iri(RDF_TYPE);
                for st in source.scan(None, Some(&rdf_type), Some(class))? {
                    out.insert(st?.subject);
                }
            }
            Target::Node(nodes) => out.extend(nodes.iter().cloned()),
            Target::SubjectsOf(p) => {
                for st in source.scan(None, Some(p), None)? {
                    out.insert(st?.subject);
                }
            }
            Target::ObjectsOf(p) => {
                for st in source.scan(None, Some(p), None)? {
                    out.insert(st?.object);
                }
            }
        }
        Ok(out)
    }

    /// Is `term` selected by this target in `source`?
    pub fn contains(&self, source: &dyn StatementSource, term: &Term) -> Result<bool> {
        match self {
            Target::Class(class) => {
                source.has_match(Some(term), Some(&Term::iri(RDF_TYPE)), Some(class))
            }
            Target::Node(nodes) => Ok(nodes.contains(term)),
            Target::SubjectsOf(p) => source.has_match(Some(term), Some(p), None),
            Target::ObjectsOf(p) => source.has_match(None, Some(p), Some(term)),
        }
    }

    /// Terms whose selection may have changed because of `delta`.
    pub fn affected(&self, delta: &Delta) -> Result<BTreeSet<Term>> {
        let mut out = BTreeSet::new();
        for side in [&delta.added, &delta.removed] {
            match self {
                Target::Node(nodes) => {
                    for node in nodes {
                        if mentions(side.as_ref(), node)? {
                            out.insert(node.clone());
                        }
                    }
                }
                other => out.extend(other.select(side.as_ref())?),
            }
        }
        Ok(out)
    }

    /// Does the delta contain a statement this selector looks at?
    pub fn touched_by(&self, delta: &Delta) -> Result<bool> {
        match self {
            Target::Class(class) => delta.touches(None, Some(&Term::iri(RDF_TYPE)), Some(class)),
            Target::Node(nodes) => {
                for node in nodes {
                    if mentions(delta.added.as_ref(), node)? || mentions(delta.removed.as_ref(), node)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Target::SubjectsOf(p) | Target::ObjectsOf(p) => delta.touches(None, Some(p), None),
        }
    }
}

/// A listed node is touched as subject or object (inverse paths read it there).
fn mentions(source: &dyn StatementSource, node: &Term) -> Result<bool> {
    Ok(source.has_match(Some(node), None, None)? || source.has_match(None, None, Some(node))?)
}

/// Source constraint component reported alongside a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceConstraintComponent {
    DatatypeConstraintComponent,
    InConstraintComponent,
    HasValueConstraintComponent,
    MinCountConstraintComponent,
    MaxCountConstraintComponent,
    AndConstraintComponent,
    OrConstraintComponent,
    NotConstraintComponent,
}

/// Leaf constraints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    /// Every value must be of this kind.
    Datatype(TermKind),
    /// Every value must be one of these terms.
    In(Vec<Term>),
    /// Some value must equal this term.
    HasValue(Term),
    /// At least this many values.
    MinCount(usize),
    /// At most this many values.
    MaxCount(usize),
}

impl Constraint {
    /// Value-level constraints judge each value on its own and can report the
    /// offending value with its provenance. The others judge a target's whole
    /// value set and only report the target.
    pub fn is_value_level(&self) -> bool {
        matches!(self, Constraint::Datatype(_) | Constraint::In(_))
    }

    /// Does a single value satisfy a value-level constraint?
    pub fn accepts_value(&self, value: &Term) -> bool {
        match self {
            Constraint::Datatype(kind) => value.kind() == *kind,
            Constraint::In(allowed) => allowed.contains(value),
            _ => true,
        }
    }

    /// Is a target with these values in violation of a count-style constraint?
    pub fn violated_by_values(&self, values: &[Term]) -> bool {
        match self {
            Constraint::HasValue(v) => !values.contains(v),
            Constraint::MinCount(n) => values.len() < *n,
            Constraint::MaxCount(n) => values.len() > *n,
            Constraint::Datatype(_) | Constraint::In(_) => {
                values.iter().any(|v| !self.accepts_value(v))
            }
        }
    }

    pub fn component(&self) -> SourceConstraintComponent {
        use SourceConstraintComponent::*;
        match self {
            Constraint::Datatype(_) => DatatypeConstraintComponent,
            Constraint::In(_) => InConstraintComponent,
            Constraint::HasValue(_) => HasValueConstraintComponent,
            Constraint::MinCount(_) => MinCountConstraintComponent,
            Constraint::MaxCount(_) => MaxCountConstraintComponent,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Datatype(k) => write!(f, "datatype({k:?})"),
            Constraint::In(vs) => {
                write!(f, "in(")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            Constraint::HasValue(v) => write!(f, "hasValue({v})"),
            Constraint::MinCount(n) => write!(f, "minCount({n})"),
            Constraint::MaxCount(n) => write!(f, "maxCount({n})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Constraint(Constraint),
    /// Violated when any member is violated.
    And(Vec<Shape>),
    /// Disjunction of branches; each branch is a conjunction of its members.
    Or(Vec<Vec<Shape>>),
    Not(Box<Shape>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub deactivated: bool,
    /// Own path; `None` inherits the nearest ancestor's.
    pub path: Option<Path>,
    pub kind: ShapeKind,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind) -> Self {
        Self {
            id,
            deactivated: false,
            path: None,
            kind,
        }
    }

    pub fn constraint(id: ShapeId, constraint: Constraint) -> Self {
        Self::new(id, ShapeKind::Constraint(constraint))
    }

    pub fn and(id: ShapeId, members: Vec<Shape>) -> Self {
        Self::new(id, ShapeKind::And(members))
    }

    pub fn or(id: ShapeId, branches: Vec<Vec<Shape>>) -> Self {
        Self::new(id, ShapeKind::Or(branches))
    }

    pub fn not(id: ShapeId, inner: Shape) -> Self {
        Self::new(id, ShapeKind::Not(Box::new(inner)))
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.deactivated = true;
        self
    }

    /// True when this shape declares a path different from the one it inherits.
    pub fn has_own_path(&self, inherited: Option<&Path>) -> bool {
        match &self.path {
            Some(own) => inherited != Some(own),
            None => false,
        }
    }

    /// Immediate sub-shapes in declaration order.
    pub fn children(&self) -> Box<dyn Iterator<Item = &Shape> + '_> {
        match &self.kind {
            ShapeKind::Constraint(_) => Box::new(std::iter::empty()),
            ShapeKind::And(members) => Box::new(members.iter()),
            ShapeKind::Or(branches) => Box::new(branches.iter().flatten()),
            ShapeKind::Not(inner) => Box::new(std::iter::once(inner.as_ref())),
        }
    }

    pub fn component(&self) -> SourceConstraintComponent {
        match &self.kind {
            ShapeKind::Constraint(c) => c.component(),
            ShapeKind::And(_) => SourceConstraintComponent::AndConstraintComponent,
            ShapeKind::Or(_) => SourceConstraintComponent::OrConstraintComponent,
            ShapeKind::Not(_) => SourceConstraintComponent::NotConstraintComponent,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deactivated {
            write!(f, "~")?;
        }
        if let Some(p) = &self.path {
            write!(f, "{p}:")?;
        }
        match &self.kind {
            ShapeKind::Constraint(c) => write!(f, "{c}"),
            ShapeKind::Not(inner) => write!(f, "not({inner})"),
            ShapeKind::And(members) => {
                write!(f, "and(")?;
                write_list(f, members)?;
                write!(f, ")")
            }
            ShapeKind::Or(branches) => {
                write!(f, "or(")?;
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write_list(f, branch)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, shapes: &[Shape]) -> fmt::Result {
    for (i, s) in shapes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{s}")?;
    }
    Ok(())
}

/// Root of a shape tree: a target selection plus the shapes its targets must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeShape {
    pub id: ShapeId,
    pub targets: Vec<Target>,
    pub deactivated: bool,
    pub shapes: Vec<Shape>,
}

impl NodeShape {
    pub fn new(id: ShapeId, targets: Vec<Target>, shapes: Vec<Shape>) -> Self {
        Self {
            id,
            targets,
            deactivated: false,
            shapes,
        }
    }
}
