//! Reporting wrappers: shape tagging and declared-shape overrides.

use shapeval_core::id::ShapeId;
use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

/// Tag every tuple with the shape that produced it.
pub struct EnrichWithShape {
    input: BoxPlan,
    shape_id: ShapeId,
}

impl EnrichWithShape {
    pub fn new(input: BoxPlan, shape_id: ShapeId) -> Self {
        Self { input, shape_id }
    }
}

impl PlanNode for EnrichWithShape {
    fn name(&self) -> &'static str {
        "EnrichWithShape"
    }

    fn shape(&self) -> IteratorShape {
        self.input.shape()
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(EnrichCursor {
            input: self.input.iterate()?,
            shape_id: self.shape_id,
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let child = self.input.explain(graph);
        graph.operator(format!("EnrichWithShape({})", self.shape_id), &[child])
    }
}

struct EnrichCursor {
    input: BoxCursor,
    shape_id: ShapeId,
}

impl Cursor for EnrichCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        match self.input.next() {
            Ok(Some(mut t)) => {
                t.tag(self.shape_id);
                Ok(Some(t))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.input.close();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.input.close();
    }
}

/// Relabel the declared shape of a subplan without touching its tuples.
///
/// Used when a combinator degrades its result to `Aggregated` even though the
/// child still carries provenance columns.
pub struct ShapeOverride {
    input: BoxPlan,
    shape: IteratorShape,
}

impl ShapeOverride {
    pub fn new(input: BoxPlan, shape: IteratorShape) -> Self {
        Self { input, shape }
    }
}

impl PlanNode for ShapeOverride {
    fn name(&self) -> &'static str {
        "ShapeOverride"
    }

    fn shape(&self) -> IteratorShape {
        self.shape
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        self.input.iterate()
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let child = self.input.explain(graph);
        graph.operator(format!("ShapeOverride({:?})", self.shape), &[child])
    }
}
