//! In-memory statement store.
//!
//! Two sorted indexes: `spo` answers subject-bound scans, `pos` answers
//! predicate-bound scans. Both hand out owned iterators so a cursor can keep
//! reading after the scan call returns.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use shapeval_core::error::Result;
use shapeval_core::source::{StatementIter, StatementSource};
use shapeval_core::term::{Statement, Term};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Statement>", into = "Vec<Statement>")]
pub struct MemoryStore {
    spo: BTreeSet<Statement>,
    pos: BTreeSet<(Term, Term, Term)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the statement was already present.
    pub fn insert(&mut self, st: Statement) -> bool {
        let key = (st.predicate.clone(), st.object.clone(), st.subject.clone());
        if self.spo.insert(st) {
            self.pos.insert(key);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, st: &Statement) -> bool {
        if self.spo.remove(st) {
            self.pos.remove(&(st.predicate.clone(), st.object.clone(), st.subject.clone()));
            true
        } else {
            false
        }
    }

    pub fn contains(&self, st: &Statement) -> bool {
        self.spo.contains(st)
    }

    pub fn len(&self) -> usize {
        self.spo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spo.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.spo.iter()
    }

    fn collect(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Vec<Statement> {
        match (subject, predicate) {
            (Some(s), _) => {
                let lo = Statement::new(s.clone(), Term::min_value(), Term::min_value());
                self.spo
                    .range(lo..)
                    .take_while(|st| &st.subject == s)
                    .filter(|st| st.matches(None, predicate, object))
                    .cloned()
                    .collect()
            }
            (None, Some(p)) => {
                let lo = (
                    p.clone(),
                    object.cloned().unwrap_or_else(Term::min_value),
                    Term::min_value(),
                );
                self.pos
                    .range(lo..)
                    .take_while(|(pp, oo, _)| pp == p && object.map_or(true, |o| o == oo))
                    .map(|(p, o, s)| Statement::new(s.clone(), p.clone(), o.clone()))
                    .collect()
            }
            (None, None) => self
                .spo
                .iter()
                .filter(|st| st.matches(None, None, object))
                .cloned()
                .collect(),
        }
    }
}

impl StatementSource for MemoryStore {
    fn scan(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<StatementIter> {
        let hits = self.collect(subject, predicate, object);
        Ok(Box::new(hits.into_iter().map(Ok)))
    }

    fn is_empty(&self) -> bool {
        self.spo.is_empty()
    }
}

impl FromIterator<Statement> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        let mut store = MemoryStore::new();
        store.extend(iter);
        store
    }
}

impl Extend<Statement> for MemoryStore {
    fn extend<I: IntoIterator<Item = Statement>>(&mut self, iter: I) {
        for st in iter {
            self.insert(st);
        }
    }
}

impl From<Vec<Statement>> for MemoryStore {
    fn from(v: Vec<Statement>) -> Self {
        v.into_iter().collect()
    }
}

impl From<MemoryStore> for Vec<Statement> {
    fn from(store: MemoryStore) -> Self {
        store.spo.into_iter().collect()
    }
}
