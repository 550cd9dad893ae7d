//! Everything a planning pass needs besides the shape tree itself.

use std::cell::RefCell;

use shapeval_core::config::ValidationConfig;
use shapeval_core::id::ShapeId;
use shapeval_core::shape::{NodeShape, Path, Shape, Target};
use shapeval_core::source::{Delta, SharedSource};
use shapeval_operators::{PlanGraph, PlanNode, TargetMode};

/// Receives plan diagnostics (Graphviz DOT) when `print_plans` is set.
pub trait DiagnosticsSink {
    fn plan_dot(&self, shape: ShapeId, label: &str, dot: &str);
}

/// Logs each plan at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn plan_dot(&self, shape: ShapeId, label: &str, dot: &str) {
        tracing::info!(%shape, %label, "plan:\n{dot}");
    }
}

/// Keeps every reported plan in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    plans: RefCell<Vec<(ShapeId, String)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<(ShapeId, String)> {
        std::mem::take(&mut *self.plans.borrow_mut())
    }
}

impl DiagnosticsSink for CollectingSink {
    fn plan_dot(&self, shape: ShapeId, _label: &str, dot: &str) {
        self.plans.borrow_mut().push((shape, dot.to_string()));
    }
}

/// Data views, delta and settings for one planning pass.
pub struct PlanContext<'a> {
    source: SharedSource,
    delta: Option<Delta>,
    base_empty: bool,
    config: &'a ValidationConfig,
    sink: Option<&'a dyn DiagnosticsSink>,
}

impl<'a> PlanContext<'a> {
    /// Validate everything in `source`.
    pub fn bulk(source: SharedSource, config: &'a ValidationConfig) -> Self {
        Self {
            source,
            delta: None,
            base_empty: false,
            config,
            sink: None,
        }
    }

    /// Validate a pending commit: `source` is the data after the commit.
    pub fn incremental(
        source: SharedSource,
        delta: Delta,
        base_empty: bool,
        config: &'a ValidationConfig,
    ) -> Self {
        Self {
            source,
            delta: Some(delta),
            base_empty,
            config,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn DiagnosticsSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    pub fn delta(&self) -> Option<&Delta> {
        self.delta.as_ref()
    }

    pub fn base_empty(&self) -> bool {
        self.base_empty
    }

    pub fn config(&self) -> &ValidationConfig {
        self.config
    }

    /// Bulk passes look at every target; incremental ones only at affected ones.
    pub fn is_bulk(&self) -> bool {
        self.config.validate_all || self.delta.is_none()
    }

    pub fn target_mode(&self, path: Option<&Path>) -> TargetMode {
        match &self.delta {
            Some(delta) if !self.config.validate_all => TargetMode::Affected {
                delta: delta.clone(),
                path: path.cloned(),
            },
            _ => TargetMode::All,
        }
    }

    pub(crate) fn report_plan(&self, shape: &Shape, plan: &dyn PlanNode) {
        if !self.config.print_plans {
            return;
        }
        let dot = PlanGraph::of(plan).to_dot();
        let label = shape.to_string();
        match self.sink {
            Some(sink) => sink.plan_dot(shape.id, &label, &dot),
            None => TracingSink.plan_dot(shape.id, &label, &dot),
        }
    }
}

/// Target selection and effective path seen by a shape during planning.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'s> {
    targets: &'s [Target],
    path: Option<&'s Path>,
}

impl<'s> Frame<'s> {
    pub fn new(targets: &'s [Target]) -> Self {
        Self {
            targets,
            path: None,
        }
    }

    pub fn root(node: &'s NodeShape) -> Self {
        Self::new(&node.targets)
    }

    /// The frame inside `shape`: its own path wins over the inherited one.
    pub fn enter<'t>(&self, shape: &'t Shape) -> Frame<'t>
    where
        's: 't,
    {
        Frame {
            targets: self.targets,
            path: shape.path.as_ref().or(self.path),
        }
    }

    pub fn targets(&self) -> &'s [Target] {
        self.targets
    }

    pub fn path(&self) -> Option<&'s Path> {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeval_core::shape::Constraint;
    use shapeval_core::term::Term;

    #[test]
    fn own_path_overrides_inherited_path() {
        let targets = vec![Target::Class(Term::iri("C"))];
        let outer = Shape::and(ShapeId::new(1), vec![]).with_path(Path::Predicate(Term::iri("p")));
        let inner = Shape::constraint(ShapeId::new(2), Constraint::MinCount(1));
        let own = Shape::constraint(ShapeId::new(3), Constraint::MinCount(1))
            .with_path(Path::Inverse(Term::iri("q")));

        let frame = Frame::new(&targets).enter(&outer);
        assert_eq!(frame.enter(&inner).path(), Some(&Path::Predicate(Term::iri("p"))));
        assert_eq!(frame.enter(&own).path(), Some(&Path::Inverse(Term::iri("q"))));
        assert_eq!(frame.enter(&own).targets().len(), 1);
    }
}
