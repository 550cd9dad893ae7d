//! Validator: dirty check → plan → drain, once per shape per pass.
//!
//! A `Validator` is immutable after construction and can be shared across
//! threads; each pass builds its own plans from the shared shape tree.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use shapeval_core::config::ValidationConfig;
use shapeval_core::hash::{hash_serde, Hash256};
use shapeval_core::manifest::RunManifest;
use shapeval_core::shape::{NodeShape, Shape};
use shapeval_core::source::SharedSource;
use shapeval_io::Transaction;
use shapeval_operators::{BoxPlan, Cursor, OpError, PlanNode};
use shapeval_planner::{
    node_requires_evaluation, DiagnosticsSink, Frame, PlanContext, PlanError, ShapePlanner,
};

use crate::metrics::emit_span;
use crate::report::{ValidationReport, Violation};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("planning: {0}")]
    Plan(#[from] PlanError),
    #[error("operator exec: {0}")]
    Operator(#[from] OpError),
    #[error("hashing error: {0}")]
    Hash(String),
}

impl ExecError {
    /// The shape tree broke a structural rule; no pass over it can succeed.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ExecError::Plan(PlanError::MalformedShapeTree(_))
                | ExecError::Plan(PlanError::Op(OpError::MalformedShapeTree(_)))
                | ExecError::Operator(OpError::MalformedShapeTree(_))
        )
    }
}

pub struct Validator {
    shapes: Vec<NodeShape>,
    config: ValidationConfig,
    shapes_hash: Hash256,
}

impl Validator {
    pub fn new(shapes: Vec<NodeShape>, config: ValidationConfig) -> Result<Self, ExecError> {
        config
            .validate()
            .map_err(|e| ExecError::Config(e.to_string()))?;
        let shapes_hash = hash_serde(&shapes).map_err(|e| ExecError::Hash(e.to_string()))?;
        Ok(Self {
            shapes,
            config,
            shapes_hash,
        })
    }

    /// Load node shapes from their JSON encoding.
    pub fn from_json(json: &str, config: ValidationConfig) -> Result<Self, ExecError> {
        let shapes: Vec<NodeShape> =
            serde_json::from_str(json).map_err(|e| ExecError::Config(e.to_string()))?;
        Self::new(shapes, config)
    }

    pub fn shapes(&self) -> &[NodeShape] {
        &self.shapes
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn shapes_hash(&self) -> Hash256 {
        self.shapes_hash
    }

    /// Validate every target in `source`.
    pub fn validate_all(&self, source: SharedSource) -> Result<ValidationReport, ExecError> {
        self.run(&PlanContext::bulk(source, &self.config))
    }

    /// Validate a pending commit. Only targets the delta can affect are
    /// checked unless `validate_all` is set.
    pub fn validate(&self, tx: &Transaction) -> Result<ValidationReport, ExecError> {
        self.run(&self.incremental(tx))
    }

    /// Like `validate`, with plan diagnostics sent to `sink` instead of the log.
    pub fn validate_with_sink(
        &self,
        tx: &Transaction,
        sink: &dyn DiagnosticsSink,
    ) -> Result<ValidationReport, ExecError> {
        self.run(&self.incremental(tx).with_sink(sink))
    }

    fn incremental(&self, tx: &Transaction) -> PlanContext<'_> {
        PlanContext::incremental(
            tx.after().clone(),
            tx.delta().clone(),
            tx.base_empty(),
            &self.config,
        )
    }

    fn run(&self, ctx: &PlanContext<'_>) -> Result<ValidationReport, ExecError> {
        let mut manifest = RunManifest::new(self.shapes_hash, now_millis());
        let mut violations = Vec::new();
        let mut truncated = Vec::new();

        'nodes: for node in &self.shapes {
            if node.deactivated || !self.node_is_dirty(ctx, node)? {
                manifest.shapes_skipped += node.shapes.len();
                continue;
            }
            let frame = Frame::root(node);
            for shape in &node.shapes {
                if let (false, Some(delta)) = (ctx.is_bulk(), ctx.delta()) {
                    if !shape.requires_evaluation(frame, delta)? {
                        tracing_debug(shape, "untouched by delta; skipped");
                        manifest.shapes_skipped += 1;
                        continue;
                    }
                }
                let Some(plan) = shape.plan(ctx, frame, None, false)? else {
                    manifest.shapes_skipped += 1;
                    continue;
                };
                manifest.shapes_evaluated += 1;

                let before = violations.len();
                let capped = self.drain(plan, node, shape, &mut violations)?;
                let found = violations.len() - before;
                if capped {
                    truncated.push(shape.id);
                }
                emit_span(
                    "shape_evaluated",
                    &[
                        ("shape", shape.id.to_string()),
                        ("violations", found.to_string()),
                        ("truncated", capped.to_string()),
                    ],
                );
                if self.config.fail_fast && found > 0 {
                    break 'nodes;
                }
            }
        }

        manifest.violations = violations.len();
        let manifest = manifest.finish(now_millis());
        emit_span(
            "validation_finished",
            &[
                ("evaluated", manifest.shapes_evaluated.to_string()),
                ("skipped", manifest.shapes_skipped.to_string()),
                ("violations", manifest.violations.to_string()),
            ],
        );
        Ok(ValidationReport {
            violations,
            truncated,
            manifest,
        })
    }

    fn node_is_dirty(&self, ctx: &PlanContext<'_>, node: &NodeShape) -> Result<bool, ExecError> {
        match ctx.delta() {
            Some(delta) if !ctx.is_bulk() => Ok(node_requires_evaluation(node, delta)?),
            _ => Ok(true),
        }
    }

    /// Pull violations until the plan is exhausted or the per-shape cap is
    /// hit. Returns whether the cap cut the stream short.
    fn drain(
        &self,
        plan: BoxPlan,
        node: &NodeShape,
        shape: &Shape,
        out: &mut Vec<Violation>,
    ) -> Result<bool, ExecError> {
        let cap = self.config.max_violations_per_shape;
        let mut cursor = plan.iterate()?;
        let mut taken = 0usize;
        loop {
            if cap.is_some_and(|c| taken >= c) {
                let more = cursor.next()?.is_some();
                cursor.close();
                return Ok(more);
            }
            match cursor.next()? {
                Some(t) => {
                    out.push(Violation::from_tuple(&t, node.id, shape));
                    taken += 1;
                }
                None => {
                    cursor.close();
                    return Ok(false);
                }
            }
        }
    }
}

#[cfg(feature = "tracing")]
fn tracing_debug(shape: &Shape, msg: &str) {
    tracing::debug!(shape = %shape.id, "{msg}");
}

#[cfg(not(feature = "tracing"))]
fn tracing_debug(_shape: &Shape, _msg: &str) {}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
