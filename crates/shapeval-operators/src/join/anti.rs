//! AntiJoin: left tuples whose target never appears on the right.

use std::cmp::Ordering;

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use super::{key, open_sides, Sides};
use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

pub struct AntiJoin {
    left: BoxPlan,
    right: BoxPlan,
}

impl AntiJoin {
    pub fn new(left: BoxPlan, right: BoxPlan) -> Self {
        Self { left, right }
    }
}

impl PlanNode for AntiJoin {
    fn name(&self) -> &'static str {
        "AntiJoin"
    }

    fn shape(&self) -> IteratorShape {
        self.left.shape()
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(AntiJoinCursor {
            sides: open_sides(self.left, self.right)?,
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let l = self.left.explain(graph);
        let r = self.right.explain(graph);
        graph.operator("AntiJoin", &[l, r])
    }
}

struct AntiJoinCursor {
    sides: Sides,
}

impl AntiJoinCursor {
    fn advance(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        loop {
            self.sides.left.fill()?;
            let Some(l) = self.sides.left.buffered() else {
                return Ok(None);
            };
            let target = key(l, Some(1)).to_vec();
            let excluded = loop {
                match self.sides.right.peek()? {
                    None => break false,
                    Some(r) => match key(r, Some(1)).cmp(target.as_slice()) {
                        Ordering::Less => {}
                        Ordering::Equal => break true,
                        Ordering::Greater => break false,
                    },
                }
                self.sides.right.next()?;
            };
            let l = self.sides.left.next()?;
            if !excluded {
                return Ok(l);
            }
        }
    }
}

impl Cursor for AntiJoinCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        let res = self.advance();
        if res.is_err() {
            self.close();
        }
        res
    }

    fn close(&mut self) {
        self.sides.close();
    }
}
