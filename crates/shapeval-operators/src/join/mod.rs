//! Merge joins over target-sorted streams.
//!
//! Every join reads its two inputs through `PeekableCursor`s and advances the
//! side with the smaller key, so both inputs must honor the ordering contract.

pub mod anti;
pub mod equals;
pub mod inner;

pub use anti::AntiJoin;
pub use equals::EqualsJoin;
pub use inner::InnerJoin;

use shapeval_core::term::Term;
use shapeval_core::tuple::ValidationTuple;

use crate::buffer::PeekableCursor;
use crate::traits::{BoxCursor, Cursor, OpError};

/// Comparison key: the first `len` columns, or the whole line.
fn key(t: &ValidationTuple, len: Option<usize>) -> &[Term] {
    match len {
        Some(n) => t.key(n),
        None => t.line(),
    }
}

/// Pull every consecutive tuple whose key equals `k`.
fn take_group(
    input: &mut PeekableCursor,
    k: &[Term],
    len: Option<usize>,
) -> Result<Vec<ValidationTuple>, OpError> {
    let mut group = Vec::new();
    loop {
        match input.peek()? {
            Some(t) if key(t, len) == k => {}
            _ => return Ok(group),
        }
        if let Some(t) = input.next()? {
            group.push(t);
        }
    }
}

/// Left and right inputs of a binary operator.
struct Sides {
    left: PeekableCursor,
    right: PeekableCursor,
}

impl Sides {
    fn new(left: BoxCursor, right: BoxCursor) -> Self {
        Self {
            left: PeekableCursor::new(left),
            right: PeekableCursor::new(right),
        }
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
    }
}

/// Open both sides; closes the left one if the right one fails to open.
fn open_sides(
    left: crate::traits::BoxPlan,
    right: crate::traits::BoxPlan,
) -> Result<Sides, OpError> {
    let mut l = left.iterate()?;
    match right.iterate() {
        Ok(r) => Ok(Sides::new(l, r)),
        Err(e) => {
            l.close();
            Err(e)
        }
    }
}
