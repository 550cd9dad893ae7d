//! Leaf scans against a `StatementSource`.
//!
//! `TargetScan` turns a node shape's target selectors into target tuples,
//! `ValuesOf` expands targets into `(target, value, provenance)` tuples along
//! a path, and `CountValues` judges each target against its whole value set.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use shapeval_core::shape::{Path, Target};
use shapeval_core::source::{Delta, SharedSource};
use shapeval_core::term::{Statement, Term};
use shapeval_core::tuple::{IteratorShape, Scope, ValidationTuple};

use crate::buffer::PeekableCursor;
use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode};

/// Which targets a `TargetScan` produces.
#[derive(Clone, Debug)]
pub enum TargetMode {
    /// Every currently selected target, scoped `Base`.
    All,
    /// Currently selected targets the delta may have affected, scoped `Delta`:
    /// newly selected ones, plus those with a changed statement on `path`.
    Affected { delta: Delta, path: Option<Path> },
}

pub struct TargetScan {
    source: SharedSource,
    targets: Vec<Target>,
    mode: TargetMode,
}

impl TargetScan {
    pub fn new(source: SharedSource, targets: Vec<Target>, mode: TargetMode) -> Self {
        Self {
            source,
            targets,
            mode,
        }
    }
}

impl fmt::Display for TargetScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            TargetMode::All => "all",
            TargetMode::Affected { .. } => "affected",
        };
        write!(f, "TargetScan({mode}: ")?;
        for (i, t) in self.targets.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{t:?}")?;
        }
        write!(f, ")")
    }
}

impl PlanNode for TargetScan {
    fn name(&self) -> &'static str {
        "TargetScan"
    }

    fn shape(&self) -> IteratorShape {
        IteratorShape::Aggregated
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(TargetScanCursor {
            scan: Some(*self),
            selected: BTreeSet::new().into_iter(),
            scope: Scope::Base,
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        graph.operator(self.to_string(), &[])
    }
}

impl TargetScan {
    fn select(&self) -> Result<BTreeSet<Term>, OpError> {
        let source = self.source.as_ref();
        let mut out = BTreeSet::new();
        match &self.mode {
            TargetMode::All => {
                for t in &self.targets {
                    out.extend(t.select(source)?);
                }
            }
            TargetMode::Affected { delta, path } => {
                let mut candidates = BTreeSet::new();
                for t in &self.targets {
                    candidates.extend(t.affected(delta)?);
                }
                if let Some(path) = path {
                    for side in [&delta.added, &delta.removed] {
                        for st in side.scan(None, Some(path.predicate()), None)? {
                            let st = st?;
                            candidates.insert(if path.is_inverse() { st.object } else { st.subject });
                        }
                    }
                }
                for term in candidates {
                    if self.is_selected(&term)? {
                        out.insert(term);
                    }
                }
            }
        }
        Ok(out)
    }

    fn is_selected(&self, term: &Term) -> Result<bool, OpError> {
        for t in &self.targets {
            if t.contains(self.source.as_ref(), term)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

struct TargetScanCursor {
    scan: Option<TargetScan>,
    selected: std::collections::btree_set::IntoIter<Term>,
    scope: Scope,
}

impl Cursor for TargetScanCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        if let Some(scan) = self.scan.take() {
            self.scope = match scan.mode {
                TargetMode::All => Scope::Base,
                TargetMode::Affected { .. } => Scope::Delta,
            };
            self.selected = scan.select()?.into_iter();
        }
        Ok(self
            .selected
            .next()
            .map(|t| ValidationTuple::new(t).with_scope(self.scope)))
    }

    fn close(&mut self) {
        self.scan = None;
        self.selected = BTreeSet::new().into_iter();
    }
}

/// For every target tuple, the values reached along `path`.
///
/// With no path the value is the target itself and there is no provenance,
/// so the stream is `Aggregated`.
pub struct ValuesOf {
    targets: BoxPlan,
    source: SharedSource,
    path: Option<Path>,
}

impl ValuesOf {
    pub fn new(targets: BoxPlan, source: SharedSource, path: Option<Path>) -> Self {
        Self {
            targets,
            source,
            path,
        }
    }
}

impl PlanNode for ValuesOf {
    fn name(&self) -> &'static str {
        "ValuesOf"
    }

    fn shape(&self) -> IteratorShape {
        if self.path.is_some() {
            IteratorShape::TripleBased
        } else {
            IteratorShape::Aggregated
        }
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        Ok(Box::new(ValuesCursor {
            targets: self.targets.iterate()?,
            source: self.source,
            path: self.path,
            pending: VecDeque::new(),
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let child = self.targets.explain(graph);
        let label = match &self.path {
            Some(p) => format!("ValuesOf({p})"),
            None => "ValuesOf(self)".to_string(),
        };
        graph.operator(label, &[child])
    }
}

struct ValuesCursor {
    targets: BoxCursor,
    source: SharedSource,
    path: Option<Path>,
    pending: VecDeque<ValidationTuple>,
}

impl ValuesCursor {
    fn expand(&mut self, target: ValidationTuple) -> Result<(), OpError> {
        let scope = target.scope();
        let focus = target.target().clone();
        let Some(path) = &self.path else {
            self.pending.push_back(target.trim(1).with_value(focus));
            return Ok(());
        };
        let hits = match path {
            Path::Predicate(p) => self.source.scan(Some(&focus), Some(p), None)?,
            Path::Inverse(p) => self.source.scan(None, Some(p), Some(&focus))?,
        };
        for st in hits {
            let st: Statement = st?;
            let value = if path.is_inverse() {
                st.subject.clone()
            } else {
                st.object.clone()
            };
            self.pending
                .push_back(ValidationTuple::triple(focus.clone(), value, st).with_scope(scope));
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        loop {
            if let Some(t) = self.pending.pop_front() {
                return Ok(Some(t));
            }
            match self.targets.next()? {
                Some(target) => self.expand(target)?,
                None => return Ok(None),
            }
        }
    }
}

impl Cursor for ValuesCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        let res = self.advance();
        if res.is_err() {
            self.close();
        }
        res
    }

    fn close(&mut self) {
        self.targets.close();
        self.pending.clear();
    }
}

type CountTest = Box<dyn Fn(&[Term]) -> bool>;

/// Emits `(target)` for every target whose value set passes `test`.
///
/// `values` must be sorted by target and cover the same targets; targets with
/// no values are judged against an empty set.
pub struct CountValues {
    targets: BoxPlan,
    values: BoxPlan,
    label: String,
    test: CountTest,
}

impl CountValues {
    pub fn new<F>(targets: BoxPlan, values: BoxPlan, label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&[Term]) -> bool + 'static,
    {
        Self {
            targets,
            values,
            label: label.into(),
            test: Box::new(test),
        }
    }
}

impl PlanNode for CountValues {
    fn name(&self) -> &'static str {
        "CountValues"
    }

    fn shape(&self) -> IteratorShape {
        IteratorShape::Aggregated
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        let mut targets = self.targets.iterate()?;
        let values = match self.values.iterate() {
            Ok(v) => v,
            Err(e) => {
                targets.close();
                return Err(e);
            }
        };
        Ok(Box::new(CountCursor {
            targets,
            values: PeekableCursor::new(values),
            test: self.test,
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let t = self.targets.explain(graph);
        let v = self.values.explain(graph);
        graph.operator(format!("CountValues({})", self.label), &[t, v])
    }
}

struct CountCursor {
    targets: BoxCursor,
    values: PeekableCursor,
    test: CountTest,
}

impl CountCursor {
    fn advance(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        while let Some(target) = self.targets.next()? {
            let mut values = Vec::new();
            loop {
                match self.values.peek()? {
                    Some(v) if v.target() < target.target() => {}
                    Some(v) if v.target() == target.target() => {
                        if let Some(value) = v.value() {
                            values.push(value.clone());
                        }
                    }
                    _ => break,
                }
                self.values.next()?;
            }
            if (self.test)(&values) {
                return Ok(Some(target.trim(1)));
            }
        }
        Ok(None)
    }
}

impl Cursor for CountCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        let res = self.advance();
        if res.is_err() {
            self.close();
        }
        res
    }

    fn close(&mut self) {
        self.targets.close();
        self.values.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::buffer::BufferedSplitter;
    use crate::source::VecSource;
    use crate::traits::collect;
    use crate::traits::testing::*;
    use shapeval_core::error::Result as CoreResult;
    use shapeval_core::source::{StatementIter, StatementSource};
    use shapeval_core::term::RDF_TYPE;

    /// Sorted vector of statements; enough of a store for scan tests.
    struct Statements(Vec<Statement>);

    impl StatementSource for Statements {
        fn scan(
            &self,
            subject: Option<&Term>,
            predicate: Option<&Term>,
            object: Option<&Term>,
        ) -> CoreResult<StatementIter> {
            let mut hits: Vec<Statement> = self
                .0
                .iter()
                .filter(|st| st.matches(subject, predicate, object))
                .cloned()
                .collect();
            if subject.is_none() {
                hits.sort_by(|a, b| (&a.object, &a.subject).cmp(&(&b.object, &b.subject)));
            } else {
                hits.sort();
            }
            Ok(Box::new(hits.into_iter().map(Ok)))
        }

        fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
    }

    fn st(s: &str, p: &str, o: Term) -> Statement {
        Statement::new(Term::iri(s), Term::iri(p), o)
    }

    fn typed(s: &str, class: &str) -> Statement {
        st(s, RDF_TYPE, Term::iri(class))
    }

    fn source(sts: Vec<Statement>) -> SharedSource {
        Arc::new(Statements(sts))
    }

    #[test]
    fn all_targets_are_base_scoped_and_sorted() {
        let src = source(vec![typed("b", "C"), typed("a", "C"), typed("z", "D")]);
        let scan = TargetScan::new(src, vec![Target::Class(Term::iri("C"))], TargetMode::All);
        let out = collect(Box::new(scan)).unwrap();
        assert_eq!(names(&out), vec!["a", "b"]);
        assert!(out.iter().all(|t| t.scope() == Scope::Base));
    }

    #[test]
    fn affected_targets_cover_new_selection_and_path_changes() {
        let after = source(vec![
            typed("a", "C"),
            typed("b", "C"),
            typed("c", "C"),
            st("b", "age", Term::Int(3)),
        ]);
        let delta = Delta::new(
            source(vec![typed("a", "C"), st("b", "age", Term::Int(3))]),
            source(vec![st("x", "age", Term::Int(1))]),
        );
        let mode = TargetMode::Affected {
            delta,
            path: Some(Path::Predicate(Term::iri("age"))),
        };
        let scan = TargetScan::new(after, vec![Target::Class(Term::iri("C"))], mode);
        let out = collect(Box::new(scan)).unwrap();
        assert_eq!(names(&out), vec!["a", "b"]);
        assert!(out.iter().all(|t| t.scope() == Scope::Delta));
    }

    #[test]
    fn values_follow_forward_and_inverse_paths() {
        let src = source(vec![
            st("a", "knows", Term::iri("b")),
            st("a", "knows", Term::iri("c")),
            st("c", "knows", Term::iri("b")),
        ]);
        let roots = || -> BoxPlan {
            Box::new(VecSource::new(targets(&["a", "b"]), IteratorShape::Aggregated))
        };

        let fwd = ValuesOf::new(roots(), src.clone(), Some(Path::Predicate(Term::iri("knows"))));
        assert_eq!(fwd.shape(), IteratorShape::TripleBased);
        let out = collect(Box::new(fwd)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].value(), Some(&Term::iri("c")));
        assert_eq!(out[1].provenance(), Some(&st("a", "knows", Term::iri("c"))));

        let inv = ValuesOf::new(roots(), src, Some(Path::Inverse(Term::iri("knows"))));
        let out = collect(Box::new(inv)).unwrap();
        assert_eq!(names(&out), vec!["b", "b"]);
        assert_eq!(out[0].value(), Some(&Term::iri("a")));
    }

    #[test]
    fn no_path_means_the_focus_node_itself() {
        let values = ValuesOf::new(
            Box::new(VecSource::new(targets(&["a"]), IteratorShape::Aggregated)),
            source(vec![]),
            None,
        );
        assert_eq!(values.shape(), IteratorShape::Aggregated);
        let out = collect(Box::new(values)).unwrap();
        assert_eq!(out[0].value(), Some(&Term::iri("a")));
    }

    #[test]
    fn count_values_judges_whole_value_sets() {
        let src = source(vec![
            st("a", "p", Term::Int(1)),
            st("a", "p", Term::Int(2)),
            st("c", "p", Term::Int(1)),
        ]);
        let splitter = BufferedSplitter::new(Box::new(VecSource::new(
            targets(&["a", "b", "c"]),
            IteratorShape::Aggregated,
        )));
        let values = ValuesOf::new(splitter.consumer(), src, Some(Path::Predicate(Term::iri("p"))));
        let count = CountValues::new(splitter.consumer(), Box::new(values), "minCount(2)", |vs| {
            vs.len() < 2
        });
        let out = collect(Box::new(count)).unwrap();
        assert_eq!(names(&out), vec!["b", "c"]);
        assert!(out.iter().all(|t| t.width() == 1));
    }
}
