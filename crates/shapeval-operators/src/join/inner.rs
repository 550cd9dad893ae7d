//! InnerJoin: intersection of two target-only streams.

use std::cmp::Ordering;

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use super::{key, open_sides, take_group, Sides};
use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

/// Emits each target present on both sides exactly once, as a one-column
/// tuple. Both inputs must be `Aggregated`.
pub struct InnerJoin {
    left: BoxPlan,
    right: BoxPlan,
}

impl InnerJoin {
    pub fn new(left: BoxPlan, right: BoxPlan) -> Result<Self, OpError> {
        for side in [&left, &right] {
            if side.shape() != IteratorShape::Aggregated {
                return Err(OpError::MalformedShapeTree(format!(
                    "inner join input {} is {:?}, expected Aggregated",
                    side.name(),
                    side.shape()
                )));
            }
        }
        Ok(Self { left, right })
    }
}

impl PlanNode for InnerJoin {
    fn name(&self) -> &'static str {
        "InnerJoin"
    }

    fn shape(&self) -> IteratorShape {
        IteratorShape::Aggregated
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(InnerJoinCursor {
            sides: open_sides(self.left, self.right)?,
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let l = self.left.explain(graph);
        let r = self.right.explain(graph);
        graph.operator("InnerJoin", &[l, r])
    }
}

struct InnerJoinCursor {
    sides: Sides,
}

impl InnerJoinCursor {
    fn advance(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        loop {
            self.sides.left.fill()?;
            self.sides.right.fill()?;
            let (Some(l), Some(r)) = (self.sides.left.buffered(), self.sides.right.buffered())
            else {
                return Ok(None);
            };
            match key(l, Some(1)).cmp(key(r, Some(1))) {
                Ordering::Less => {
                    self.sides.left.next()?;
                }
                Ordering::Greater => {
                    self.sides.right.next()?;
                }
                Ordering::Equal => {
                    let k = key(l, Some(1)).to_vec();
                    let lefts = take_group(&mut self.sides.left, &k, Some(1))?;
                    let rights = take_group(&mut self.sides.right, &k, Some(1))?;
                    let mut out = match lefts.into_iter().next() {
                        Some(t) => t.trim(1),
                        None => continue,
                    };
                    for r in &rights {
                        out.absorb(r);
                    }
                    return Ok(Some(out));
                }
            }
        }
    }
}

impl Cursor for InnerJoinCursor {
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
