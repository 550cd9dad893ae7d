//! Union: k-way merge of sorted inputs.
//!
//! Duplicates are kept (bag semantics); wrap in `Unique` to deduplicate. All
//! inputs must declare the same shape; reconciling them is the caller's job.

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::buffer::PeekableCursor;
use crate::plan::PlanGraph;
use crate::traits::{open_all, BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

pub struct Union {
    inputs: Vec<BoxPlan>,
    shape: IteratorShape,
}

impl Union {
    pub fn new(inputs: Vec<BoxPlan>) -> Result<Self, OpError> {
        let Some(first) = inputs.first().map(|p| p.shape()) else {
            return Err(OpError::MalformedShapeTree("union over zero inputs".into()));
        };
        if let Some(odd) = inputs.iter().find(|p| p.shape() != first) {
            return Err(OpError::MalformedShapeTree(format!(
                "union inputs declare different shapes ({first:?} vs {:?} from {})",
                odd.shape(),
                odd.name()
            )));
        }
        Ok(Self {
            inputs,
            shape: first,
        })
    }
}

impl PlanNode for Union {
    fn name(&self) -> &'static str {
        "Union"
    }

    fn shape(&self) -> IteratorShape {
        self.shape
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        let inputs = open_all(self.inputs)?
            .into_iter()
            .map(PeekableCursor::new)
            .collect();
        Ok(Box::new(UnionCursor { inputs }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let children: Vec<usize> = self.inputs.iter().map(|p| p.explain(graph)).collect();
        graph.operator("Union", &children)
    }
}

struct UnionCursor {
    inputs: Vec<PeekableCursor>,
}

impl UnionCursor {
    fn advance(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        for input in &mut self.inputs {
            input.fill()?;
        }
        let smallest = self
            .inputs
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.buffered().map(|t| (i, t)))
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(i, _)| i);
        match smallest {
            Some(i) => self.inputs[i].next(),
            None => Ok(None),
        }
    }
}

impl Cursor for UnionCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        let res = self.advance();
        if res.is_err() {
            self.close();
        }
        res
    }

    fn close(&mut self) {
        for input in &mut self.inputs {
            input.close();
        }
    }
}
