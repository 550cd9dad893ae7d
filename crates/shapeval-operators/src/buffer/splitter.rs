//! BufferedSplitter: fan one upstream plan out to any number of consumers.
//!
//! The upstream is opened when the first consumer is iterated and read
//! lazily into an append-only cache. Each consumer keeps its own read
//! position, so consumers can advance in any interleaving and all see the
//! same sequence. A failure is cached too: every consumer that reads up to
//! the failed position gets the same error.
//!
//! The cache lives behind `Rc<RefCell<_>>`; splitters (and the plans built on
//! them) belong to one evaluation pass on one thread.

use std::cell::RefCell;
use std::rc::Rc;

use shapeval_core::tuple::{IteratorShape, ValidationTuple};

use crate::plan::PlanGraph;
use crate::traits::{BoxCursor, BoxPlan, Cursor, OpError, PlanNode, TargetProvider};

enum Upstream {
    Pending(BoxPlan),
    Open(BoxCursor),
    Done,
    Failed(OpError),
}

struct Shared {
    upstream: Upstream,
    cache: Vec<ValidationTuple>,
    opened: usize,
}

impl Shared {
    fn open(&mut self) -> Result<(), OpError> {
        if !matches!(self.upstream, Upstream::Pending(_)) {
            return Ok(());
        }
        if let Upstream::Pending(plan) = std::mem::replace(&mut self.upstream, Upstream::Done) {
            self.opened += 1;
            match plan.iterate() {
                Ok(cursor) => self.upstream = Upstream::Open(cursor),
                Err(e) => {
                    self.upstream = Upstream::Failed(e.clone());
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Tuple at `pos`, pulling from upstream when the cache ends there.
    fn read(&mut self, pos: usize) -> Result<Option<ValidationTuple>, OpError> {
        if let Some(t) = self.cache.get(pos) {
            return Ok(Some(t.clone()));
        }
        let pulled = match &mut self.upstream {
            Upstream::Open(cursor) => cursor.next(),
            Upstream::Pending(_) | Upstream::Done => return Ok(None),
            Upstream::Failed(e) => return Err(e.clone()),
        };
        match pulled {
            Ok(Some(t)) => {
                self.cache.push(t.clone());
                Ok(Some(t))
            }
            Ok(None) => {
                self.finish(Upstream::Done);
                Ok(None)
            }
            Err(e) => {
                self.finish(Upstream::Failed(e.clone()));
                Err(e)
            }
        }
    }

    fn finish(&mut self, state: Upstream) {
        if let Upstream::Open(mut cursor) = std::mem::replace(&mut self.upstream, state) {
            cursor.close();
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Upstream::Open(cursor) = &mut self.upstream {
            cursor.close();
        }
    }
}

/// Replayable handle over one upstream plan.
#[derive(Clone)]
pub struct BufferedSplitter {
    shared: Rc<RefCell<Shared>>,
    shape: IteratorShape,
}

impl BufferedSplitter {
    pub fn new(upstream: BoxPlan) -> Self {
        let shape = upstream.shape();
        Self {
            shared: Rc::new(RefCell::new(Shared {
                upstream: Upstream::Pending(upstream),
                cache: Vec::new(),
                opened: 0,
            })),
            shape,
        }
    }

    /// A fresh single-pass consumer reading from the shared cache.
    pub fn consumer(&self) -> BoxPlan {
        Box::new(SplitterNode {
            shared: Rc::clone(&self.shared),
            shape: self.shape,
        })
    }

    pub fn shape(&self) -> IteratorShape {
        self.shape
    }

    /// How many times the upstream has been opened (0 or 1).
    pub fn upstream_opens(&self) -> usize {
        self.shared.borrow().opened
    }

    /// Tuples cached so far.
    pub fn buffered(&self) -> usize {
        self.shared.borrow().cache.len()
    }
}

impl TargetProvider for BufferedSplitter {
    fn plan_node(&self) -> Result<BoxPlan, OpError> {
        Ok(self.consumer())
    }
}

struct SplitterNode {
    shared: Rc<RefCell<Shared>>,
    shape: IteratorShape,
}

impl PlanNode for SplitterNode {
    fn name(&self) -> &'static str {
        "BufferedSplitter"
    }

    fn shape(&self) -> IteratorShape {
        self.shape
    }

    fn iterate(self: Box<Self>) -> Result<BoxCursor, OpError> {
        self.shared.borrow_mut().open()?;
        Ok(Box::new(SplitterCursor {
            shared: self.shared,
            pos: 0,
            closed: false,
        }))
    }

    fn explain(&self, graph: &mut PlanGraph) -> usize {
        let key = Rc::as_ptr(&self.shared) as usize;
        if let Some(idx) = graph.shared(key) {
            return idx;
        }
        let shared = self.shared.borrow();
        let child = match &shared.upstream {
            Upstream::Pending(plan) => Some(plan.explain(graph)),
            _ => None,
        };
        let idx = graph.operator("BufferedSplitter", child.as_slice());
        graph.register_shared(key, idx);
        idx
    }
}

struct SplitterCursor {
    shared: Rc<RefCell<Shared>>,
    pos: usize,
    closed: bool,
}

impl Cursor for SplitterCursor {
    fn next(&mut self) -> Result<Option<ValidationTuple>, OpError> {
        if self.closed {
            return Ok(None);
        }
        let res = self.shared.borrow_mut().read(self.pos);
        match &res {
            Ok(Some(_)) => self.pos += 1,
            Ok(None) => {}
            Err(_) => self.closed = true,
        }
        res
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::testing::*;
    use crate::traits::{collect, drain};

    #[test]
    fn consumers_see_identical_sequences_in_any_interleaving() {
        let counters = Counters::default();
        let upstream = Scripted::new(targets(&["a", "b", "c"]), IteratorShape::Aggregated, &counters);
        let splitter = BufferedSplitter::new(Box::new(upstream));
        let mut first = splitter.consumer().iterate().unwrap();
        let mut second = splitter.plan_node().unwrap().iterate().unwrap();

        let a1 = first.next().unwrap();
        let a2 = first.next().unwrap();
        let b1 = second.next().unwrap();
        assert_eq!(a1, b1);
        let rest = drain(second).unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(Some(rest[0].clone()), a2);
        assert_eq!(drain(first).unwrap().len(), 1);

        assert_eq!(splitter.upstream_opens(), 1);
        assert_eq!(counters.opened.get(), 1);
        assert_eq!(counters.pulled.get(), 3);
        assert_eq!(counters.closed.get(), 1);
    }

    #[test]
    fn late_consumer_replays_from_the_cache() {
        let counters = Counters::default();
        let upstream = Scripted::new(targets(&["a", "b"]), IteratorShape::Aggregated, &counters);
        let splitter = BufferedSplitter::new(Box::new(upstream));
        assert_eq!(collect(splitter.consumer()).unwrap().len(), 2);
        assert_eq!(names(&collect(splitter.consumer()).unwrap()), vec!["a", "b"]);
        assert_eq!(counters.pulled.get(), 2);
    }

    #[test]
    fn upstream_failure_is_replayed_at_the_same_position() {
        let counters = Counters::default();
        let upstream = Scripted::new(targets(&["a", "b", "c"]), IteratorShape::Aggregated, &counters)
            .failing_after(2);
        let splitter = BufferedSplitter::new(Box::new(upstream));

        let mut first = splitter.consumer().iterate().unwrap();
        let mut second = splitter.consumer().iterate().unwrap();
        assert!(first.next().unwrap().is_some());
        assert!(first.next().unwrap().is_some());
        assert!(matches!(first.next(), Err(OpError::UpstreamIo(_))));

        assert!(second.next().unwrap().is_some());
        assert!(second.next().unwrap().is_some());
        assert!(matches!(second.next(), Err(OpError::UpstreamIo(_))));
        assert_eq!(counters.closed.get(), 1);
    }

    #[test]
    fn shared_upstream_is_explained_once() {
        let upstream = Scripted::new(targets(&["a"]), IteratorShape::Aggregated, &Counters::default());
        let splitter = BufferedSplitter::new(Box::new(upstream));
        let (x, y) = (splitter.consumer(), splitter.consumer());
        let mut g = PlanGraph::new();
        let i = x.explain(&mut g);
        let j = y.explain(&mut g);
        assert_eq!(i, j);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn dropping_an_unread_splitter_closes_the_upstream() {
        let counters = Counters::default();
        let upstream = Scripted::new(targets(&["a", "b"]), IteratorShape::Aggregated, &counters);
        let splitter = BufferedSplitter::new(Box::new(upstream));
        let mut c = splitter.consumer().iterate().unwrap();
        c.next().unwrap();
        c.close();
        drop(c);
        drop(splitter);
        assert_eq!(counters.closed.get(), 1);
    }
}
