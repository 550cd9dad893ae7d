//! EqualsJoin: column-exact merge join.

use std::cmp::Ordering;
use std::collections::VecDeque;

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use super::{key, open_sides, take_group, Sides};
use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

/// Emits one combined tuple per pair of left/right tuples with equal keys.
///
/// With `use_all` the key is the whole line, otherwise only the target. The
/// combined tuple is the left line followed by the right columns beyond the
/// key; shape tags of both sides are kept.
pub struct EqualsJoin {
    left: BoxPlan,
    right: BoxPlan,
    use_all: bool,
}

impl EqualsJoin {
    pub fn new(left: BoxPlan, right: BoxPlan, use_all: bool) -> Result<Self, OpError> {
        if left.shape() != right.shape() {
            return Err(OpError::MalformedShapeTree(format!(
                "equality join over different shapes ({:?} vs {:?})",
                left.shape(),
                right.shape()
            )));
        }
        Ok(Self {
            left,
            right,
            use_all,
        })
    }
}

impl PlanNode for EqualsJoin {
    fn name(&self) -> &'static str {
        "EqualsJoin"
    }

    fn shape(&self) -> IteratorShape {
        self.left.shape()
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(EqualsJoinCursor {
            sides: open_sides(self.left, self.right)?,
            key_len: if self.use_all { None } else { Some(1) },
            pending: VecDeque::new(),
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let l = self.left.explain(graph);
        let r = self.right.explain(graph);
        let label = if self.use_all {
            "EqualsJoin(all columns)"
        } else {
            "EqualsJoin(target)"
        };
        graph.operator(label, &[l, r])
    }
}

struct EqualsJoinCursor {
    sides: Sides,
    key_len: Option<usize>,
    pending: VecDeque<ValidationTuple>,
}

impl EqualsJoinCursor {
    fn advance(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        loop {
            if let Some(t) = self.pending.pop_front() {
                return Ok(Some(t));
            }
            self.sides.left.fill()?;
            self.sides.right.fill()?;
            let (Some(l), Some(r)) = (self.sides.left.buffered(), self.sides.right.buffered())
            else {
                return Ok(None);
            };
            match key(l, self.key_len).cmp(key(r, self.key_len)) {
                Ordering::Less => {
                    self.sides.left.next()?;
                }
                Ordering::Greater => {
                    self.sides.right.next()?;
                }
                Ordering::Equal => {
                    let k = key(l, self.key_len).to_vec();
                    let lefts = take_group(&mut self.sides.left, &k, self.key_len)?;
                    let rights = take_group(&mut self.sides.right, &k, self.key_len)?;
                    for l in &lefts {
                        for r in &rights {
                            self.pending.push_back(combine(l, r, k.len()));
                        }
                    }
                }
            }
        }
    }
}

fn combine(left: &ValidationTuple, right: &ValidationTuple, key_len: usize) -> ValidationTuple {
    let mut out = left.clone();
    out.extend_line(right.line().iter().skip(key_len).cloned());
    out.absorb(right);
    out
}

impl Cursor for EqualsJoinCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        let res = self.advance();
        if res.is_err() {
            self.close();
        }
        res
    }

    fn close(&mut self) {
        self.sides.close();
        self.pending.clear();
    }
}
