//! Sort: restore the stream ordering after an operator that breaks it.
//!
//! Materializes the whole input on the first pull. Only needed for plans the
//! library did not build itself, such as externally supplied target sets.

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::plan::PlanGraph;
use crate::source::VecCursor;
use crate::traits::{drain, BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

pub struct Sort {
    input: BoxPlan,
}

impl Sort {
    pub fn new(input: BoxPlan) -> Self {
        Self { input }
    }
}

impl PlanNode for Sort {
    fn name(&self) -> &'static str {
        "Sort"
    }

    fn shape(&self) -> IteratorShape {
        self.input.shape()
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(SortCursor {
            state: SortState::Pending(Some(self.input)),
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let child = self.input.explain(graph);
        graph.operator("Sort", &[child])
    }
}

enum SortState {
    Pending(Option<BoxPlan>),
    Sorted(VecCursor),
}

struct SortCursor {
    state: SortState,
}

impl Cursor for SortCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        if let SortState::Pending(input) = &mut self.state {
            let Some(input) = input.take() else {
                return Ok(None);
            };
            let mut tuples = drain(input.iterate()?)?;
            // stable: equal lines keep their arrival order
            tuples.sort();
            self.state = SortState::Sorted(VecCursor::new(tuples));
        }
        match &mut self.state {
            SortState::Sorted(c) => c.next(),
            SortState::Pending(_) => Ok(None),
        }
    }

    fn close(&mut self) {
        match &mut self.state {
            SortState::Pending(input) => {
                input.take();
            }
            SortState::Sorted(c) => c.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::collect;
    use crate::traits::testing::*;

    #[test]
    fn sorts_lazily_on_first_pull() {
        let counters = Counters::default();
        let upstream = Scripted::new(targets(&["c", "a", "b"]), IteratorShape::Aggregated, &counters);
        let mut cursor = Box::new(Sort::new(Box::new(upstream))).iterate().unwrap();
        assert_eq!(counters.opened.get(), 0);
        let first = cursor.next().unwrap().unwrap();
        assert_eq!(names(&[first]), vec!["a"]);
        assert_eq!(counters.closed.get(), 1);
        cursor.close();
    }

    #[test]
    fn closing_before_pull_never_opens_input() {
        let counters = Counters::default();
        let upstream = Scripted::new(targets(&["a"]), IteratorShape::Aggregated, &counters);
        let mut cursor = Box::new(Sort::new(Box::new(upstream))).iterate().unwrap();
        cursor.close();
        assert!(cursor.next().unwrap().is_none());
        assert_eq!(counters.opened.get(), 0);
        assert!(collect(Box::new(Sort::new(Box::new(crate::source::EmptyNode::new(
            IteratorShape::Aggregated
        )))))
        .unwrap()
        .is_empty());
    }
}
