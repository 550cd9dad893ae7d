//! One-tuple lookahead over a cursor.

use shapeval_core::tuple::ValidationTuple;

use crate::traits::{BoxCursor, Cursor, OpError};

/// Wraps exactly one cursor. `peek` is idempotent until the next `next`.
pub struct PeekableCursor {
    inner: BoxCursor,
    head: Option<Option<ValidationTuple>>,
}

impl PeekableCursor {
    pub fn new(inner: BoxCursor) -> Self {
        Self { inner, head: None }
    }

    pub fn peek(&mut self) -> Result<Option<&ValidationTuple>, OpError> {
        self.fill()?;
        Ok(self.buffered())
    }

    /// Pull the head into the buffer if it is not there yet.
    pub fn fill(&mut self) -> Result<(), OpError> {
        if self.head.is_none() {
            self.head = Some(self.inner.next()?);
        }
        Ok(())
    }

    /// The buffered head, without pulling.
    pub fn buffered(&self) -> Option<&ValidationTuple> {
        self.head.as_ref().and_then(Option::as_ref)
    }
}

impl Cursor for PeekableCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        match self.head.take() {
            Some(head) => Ok(head),
            None => self.inner.next(),
        }
    }

    fn close(&mut self) {
        self.inner.close();
        self.head = Some(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecCursor;
    use crate::traits::testing::*;

    #[test]
    fn peek_is_idempotent_until_next() {
        let mut c = PeekableCursor::new(Box::new(VecCursor::new(targets(&["a", "b"]))));
        let first = c.peek().unwrap().cloned();
        assert_eq!(c.peek().unwrap().cloned(), first);
        assert_eq!(c.next().unwrap(), first);
        assert_eq!(names(&[c.next().unwrap().unwrap()]), vec!["b"]);
        assert!(c.peek().unwrap().is_none());
        assert!(c.next().unwrap().is_none());
    }

    #[test]
    fn close_empties_the_buffer() {
        let mut c = PeekableCursor::new(Box::new(VecCursor::new(targets(&["a"]))));
        c.fill().unwrap();
        c.close();
        assert!(c.next().unwrap().is_none());
    }
}
