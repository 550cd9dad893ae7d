//! Leaf nodes over already-materialized tuples.

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, Cursor, OpError, PlanNode};

/// A node that produces nothing. Stands in for deactivated shapes.
#[derive(Debug, Clone, Copy)]
pub struct EmptyNode {
    shape: IteratorShape,
}

impl EmptyNode {
    pub fn new(shape: IteratorShape) -> Self {
        Self { shape }
    }
}

struct EmptyCursor;

impl Cursor for EmptyCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        Ok(None)
    }

    fn close(&mut self) {}
}

impl PlanNode for EmptyNode {
    fn name(&self) -> &'static str {
        "Empty"
    }

    fn shape(&self) -> IteratorShape {
        self.shape
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(EmptyCursor))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        graph.operator("Empty", &[])
    }
}

/// Fixed tuples, sorted on construction.
#[derive(Debug, Clone)]
pub struct VecSource {
    tuples: Vec<ValidationTuple>,
    shape: IteratorShape,
}

impl VecSource {
    pub fn new(mut tuples: Vec<ValidationTuple>, shape: IteratorShape) -> Self {
        tuples.sort();
        Self { tuples, shape }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

pub(crate) struct VecCursor {
    tuples: std::vec::IntoIter<ValidationTuple>,
}

impl VecCursor {
    pub(crate) fn new(tuples: Vec<ValidationTuple>) -> Self {
        Self {
            tuples: tuples.into_iter(),
        }
    }
}

impl Cursor for VecCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        Ok(self.tuples.next())
    }

    fn close(&mut self) {
        self.tuples = Vec::new().into_iter();
    }
}

impl PlanNode for VecSource {
    fn name(&self) -> &'static str {
        "Values"
    }

    fn shape(&self) -> IteratorShape {
        self.shape
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(VecCursor::new(self.tuples)))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        graph.operator(format!("Values({})", self.tuples.len()), &[])
    }
}
