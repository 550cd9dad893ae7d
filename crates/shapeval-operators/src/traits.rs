//! Cursor + plan node traits shared by every operator.
//!
//! A `PlanNode` is a description of a computation. Calling `iterate` consumes
//! it and hands back the `Cursor` that actually produces tuples. Because the
//! node is gone afterwards, a plan cannot be read twice by accident; sharing a
//! result between consumers goes through `TargetProvider`.

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::plan::PlanGraph;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("malformed shape tree: {0}")]
    MalformedShapeTree(String),

    #[error("upstream I/O failure: {0}")]
    UpstreamIo(String),

    #[error("execution error: {0}")]
    Exec(String),
}

impl From<shapeval_core::Error> for OpError {
    fn from(e: shapeval_core::Error) -> Self {
        match e {
            shapeval_core::Error::MalformedShapeTree(m) => OpError::MalformedShapeTree(m),
            shapeval_core::Error::UpstreamIo(m) => OpError::UpstreamIo(m),
            other => OpError::Exec(other.to_string()),
        }
    }
}

/// Pull-based tuple stream.
///
/// Invariants:
/// - After `next` returns `Ok(None)` every later call returns `Ok(None)`.
/// - `close` releases upstream resources and is safe to call more than once.
/// - After `next` returns `Err`, the cursor has already closed its inputs.
pub trait Cursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError>;

    fn close(&mut self);
}

pub type BoxCursor = Box<dyn Cursor>;

/// A single-pass plan node.
pub trait PlanNode {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    /// Declared column contract of the tuples this node produces.
    fn shape(&self) -> IteratorShape;

    /// Open the node. Opening a composite node opens its children.
    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError>;

    /// Add this node (and its children) to `graph`; returns the node's index.
    fn explain(&self, graph: &mut PlanGraph) -> usize;
}

pub type BoxPlan = Box<dyn PlanNode>;

/// Something that can hand out fresh plan nodes over the same tuples.
pub trait TargetProvider {
    fn plan_node(&self) -> Result<BoxPlan, OpError>;
}

/// `TargetProvider` that rebuilds the plan from scratch on each request.
pub struct PlanFactory<F> {
    build: F,
}

impl<F> PlanFactory<F>
where
    F: Fn() -> Result<BoxPlan, OpError>,
{
    pub fn new(build: F) -> Self {
        Self { build }
    }
}

impl<F> TargetProvider for PlanFactory<F>
where
    F: Fn() -> Result<BoxPlan, OpError>,
{
    fn plan_node(&self) -> Result<BoxPlan, OpError> {
        (self.build)()
    }
}

/// Open every plan; if one fails, close the ones already opened.
pub(crate) fn open_all(plans: Vec<BoxPlan>) -> Result<Vec<BoxCursor>, OpError> {
    let mut cursors: Vec<BoxCursor> = Vec::with_capacity(plans.len());
    for plan in plans {
        match plan.iterate() {
            Ok(c) => cursors.push(c),
            Err(e) => {
                for c in &mut cursors {
                    c.close();
                }
                return Err(e);
            }
        }
    }
    Ok(cursors)
}

/// Read a cursor to the end and close it.
pub fn drain(mut cursor: BoxCursor) -> Result<Vec<ValidationTuple>, OpError> {
    let mut out = Vec::new();
    loop {
        match cursor.next() {
            Ok(Some(t)) => out.push(t),
            Ok(None) => break,
            Err(e) => {
                cursor.close();
                return Err(e);
            }
        }
    }
    cursor.close();
    Ok(out)
}

/// Open and drain a plan.
pub fn collect(plan: BoxPlan) -> Result<Vec<ValidationTuple>, OpError> {
    drain(plan.iterate()?)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Instrumented sources shared by operator tests.

    use std::cell::Cell;
    use std::rc::Rc;

    use shapeval_core::term::{Statement, Term};
    use shapeval_core::tuple::{IteratorShape, ValidationTuple};

    use super::*;

    pub fn target(name: &str) -> ValidationTuple {
        ValidationTuple::new(Term::iri(name))
    }

    pub fn triple(name: &str, v: i64) -> ValidationTuple {
        ValidationTuple::triple(
            Term::iri(name),
            Term::Int(v),
            Statement::new(Term::iri(name), Term::iri("p"), Term::Int(v)),
        )
    }

    pub fn targets(names: &[&str]) -> Vec<ValidationTuple> {
        names.iter().map(|n| target(n)).collect()
    }

    pub fn names(tuples: &[ValidationTuple]) -> Vec<String> {
        tuples
            .iter()
            .map(|t| match t.target() {
                Term::Iri(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    /// Counters observed by `Scripted` cursors.
    #[derive(Clone, Default)]
    pub struct Counters {
        pub opened: Rc<Cell<usize>>,
        pub pulled: Rc<Cell<usize>>,
        pub closed: Rc<Cell<usize>>,
    }

    /// Source that counts opens/pulls/closes and can fail after `fail_after` tuples.
    pub struct Scripted {
        tuples: Vec<ValidationTuple>,
        shape: IteratorShape,
        counters: Counters,
        fail_after: Option<usize>,
    }

    impl Scripted {
        pub fn new(tuples: Vec<ValidationTuple>, shape: IteratorShape, counters: &Counters) -> Self {
            Self {
                tuples,
                shape,
                counters: counters.clone(),
                fail_after: None,
            }
        }

        pub fn failing_after(mut self, n: usize) -> Self {
            self.fail_after = Some(n);
            self
        }
    }

    struct ScriptedCursor {
        tuples: std::vec::IntoIter<ValidationTuple>,
        counters: Counters,
        served: usize,
        fail_after: Option<usize>,
        closed: bool,
    }

    impl Cursor for ScriptedCursor {
        fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
            if self.closed {
                return Ok(None);
            }
            if self.fail_after == Some(self.served) {
                return Err(OpError::UpstreamIo("scripted failure".into()));
            }
            let t = self.tuples.next();
            if t.is_some() {
                self.served += 1;
                self.counters.pulled.set(self.counters.pulled.get() + 1);
            }
            Ok(t)
        }

        fn close(&mut self) {
            if !self.closed {
                self.closed = true;
                self.counters.closed.set(self.counters.closed.get() + 1);
            }
        }
    }

    impl PlanNode for Scripted {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        fn shape(&self) -> IteratorShape {
            self.shape
        }

        fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
            self.counters.opened.set(self.counters.opened.get() + 1);
            Ok(Box::new(ScriptedCursor {
                tuples: self.tuples.into_iter(),
                counters: self.counters,
                served: 0,
                fail_after: self.fail_after,
                closed: false,
            }))
        }

        fn explain(&self, graph: &mut PlanGraph) -> usize {
            graph.operator("Scripted", &[])
        }
    }
}
