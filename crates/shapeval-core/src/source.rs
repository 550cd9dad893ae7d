//! Boundary with the storage/transaction layer.
//!
//! The algebra never owns data. It asks a `StatementSource` for scans and
//! receives owned iterators, so cursors built on top of a scan stay `'static`
//! and can be closed (dropped) independently of the source.

use std::sync::Arc;

use crate::error::Result;
use crate::term::{Statement, Term};

/// Owned stream of statements produced by one scan.
pub type StatementIter = Box<dyn Iterator<Item = Result<Statement>> + Send>;

/// Pattern-scan access to a set of statements.
///
/// Scans with a bound subject must yield statements sorted by
/// `(predicate, object)`; scans with only the predicate bound must yield them
/// sorted by `(object, subject)`. Leaf operators rely on this to keep their
/// output ordered by target.
pub trait StatementSource: Send + Sync {
    fn scan(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<StatementIter>;

    fn is_empty(&self) -> bool;

    /// Does any statement match the pattern?
    fn has_match(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<bool> {
        match self.scan(subject, predicate, object)?.next() {
            Some(st) => st.map(|_| true),
            None => Ok(false),
        }
    }
}

pub type SharedSource = Arc<dyn StatementSource>;

/// The added/removed views of a pending commit.
///
/// Only used to decide whether a shape needs evaluation and which targets are
/// affected; never read as tuple data.
#[derive(Clone)]
pub struct Delta {
    pub added: SharedSource,
    pub removed: SharedSource,
}

impl Delta {
    pub fn new(added: SharedSource, removed: SharedSource) -> Self {
        Self { added, removed }
    }

    /// True when either side of the delta has a statement matching the pattern.
    pub fn touches(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<bool> {
        Ok(self.added.has_match(subject, predicate, object)?
            || self.removed.has_match(subject, predicate, object)?)
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl std::fmt::Debug for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delta")
            .field("added_empty", &self.added.is_empty())
            .field("removed_empty", &self.removed.is_empty())
            .finish()
    }
}
