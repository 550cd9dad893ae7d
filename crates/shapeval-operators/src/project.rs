//! Projection: keep a prefix of each tuple's columns.

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

/// Cut every tuple down to its first `len` columns (never fewer than one).
///
/// Keeping fewer than three columns drops provenance, so the result declares
/// itself `Aggregated`.
pub struct Trim {
    input: BoxPlan,
    len: usize,
}

impl Trim {
    pub fn new(input: BoxPlan, len: usize) -> Self {
        Self {
            input,
            len: len.max(1),
        }
    }
}

impl PlanNode for Trim {
    fn name(&self) -> &'static str {
        "TrimTuple"
    }

    fn shape(&self) -> IteratorShape {
        if self.len >= 3 {
            self.input.shape()
        } else {
            IteratorShape::Aggregated
        }
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(TrimCursor {
            input: self.input.iterate()?,
            len: self.len,
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let child = self.input.explain(graph);
        graph.operator(format!("TrimTuple(0..{})", self.len), &[child])
    }
}

struct TrimCursor {
    input: BoxCursor,
    len: usize,
}

impl Cursor for TrimCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        match self.input.next() {
            Ok(t) => Ok(t.map(|t| t.trim(self.len))),
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
