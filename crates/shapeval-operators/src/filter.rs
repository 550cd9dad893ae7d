//! Filter: pass through tuples accepted by a predicate.

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

type Predicate = Box<dyn Fn(&ValidationTuple) -> bool>;

pub struct Filter {
    input: BoxPlan,
    label: String,
    predicate: Predicate,
}

impl Filter {
    /// `label` names the predicate in plan graphs.
    pub fn new<F>(input: BoxPlan, label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ValidationTuple) -> bool + 'static,
    {
        Self {
            input,
            label: label.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl PlanNode for Filter {
    fn name(&self) -> &'static str {
        "Filter"
    }

    fn shape(&self) -> IteratorShape {
        self.input.shape()
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(FilterCursor {
            input: self.input.iterate()?,
            predicate: self.predicate,
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let child = self.input.explain(graph);
        graph.operator(format!("Filter({})", self.label), &[child])
    }
}

struct FilterCursor {
    input: BoxCursor,
    predicate: Predicate,
}

impl Cursor for FilterCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        loop {
            match self.input.next() {
                Ok(Some(t)) if (self.predicate)(&t) => return Ok(Some(t)),
                Ok(Some(_)) => continue,
                Ok(None) => return Ok(None),
                Err(e) => {
                    self.input.close();
                    return Err(e);
                }
            }
        }
    }

    fn close(&mut self) {
        self.input.close();
    }
}
