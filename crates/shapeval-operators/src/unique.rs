//! Unique: drop repeats of an already-seen line (or line prefix).
//!
//! The first occurrence wins and keeps its position, so a sorted input stays
//! sorted. Scope and shape tags of the dropped repeats are discarded.

use std::collections::HashSet;

use shapeval_core::term::Term;
use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

pub struct Unique {
    input: BoxPlan,
    key_len: Option<usize>,
}

impl Unique {
    /// Deduplicate on the whole line.
    pub fn new(input: BoxPlan) -> Self {
        Self {
            input,
            key_len: None,
        }
    }

    /// Deduplicate on the first `len` columns.
    pub fn by_prefix(input: BoxPlan, len: usize) -> Self {
        Self {
            input,
            key_len: Some(len.max(1)),
        }
    }
}

impl PlanNode for Unique {
    fn name(&self) -> &'static str {
        "Unique"
    }

    fn shape(&self) -> IteratorShape {
        self.input.shape()
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(UniqueCursor {
            input: self.input.iterate()?,
            key_len: self.key_len,
            seen: HashSet::new(),
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let child = self.input.explain(graph);
        let label = match self.key_len {
            Some(n) => format!("Unique(prefix={n})"),
            None => "Unique".to_string(),
        };
        graph.operator(label, &[child])
    }
}

struct UniqueCursor {
    input: BoxCursor,
    key_len: Option<usize>,
    seen: HashSet<Vec<Term>>,
}

impl UniqueCursor {
    fn advance(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        while let Some(t) = self.input.next()? {
            let key = match self.key_len {
                Some(n) => t.key(n),
                None => t.line(),
            };
            if self.seen.insert(key.to_vec()) {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }
}

impl Cursor for UniqueCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        let res = self.advance();
        if res.is_err() {
            self.close();
        }
        res
    }

    fn close(&mut self) {
        self.input.close();
        self.seen.clear();
    }
}
