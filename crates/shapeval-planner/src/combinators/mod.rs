//! Shape combinators and the planning entry point for every `ShapeKind`.
//!
//! Two building blocks do the work:
//! - `conjunction`: a target violates the conjunction when it violates any
//!   operand, so the operand plans are unioned and deduplicated.
//! - `disjunction`: a target violates the disjunction only when it violates
//!   every branch, so branch plans are intersected with joins.
//!
//! Negation never reaches the streams directly: `NOT OR` is planned as a
//! conjunction of negated branches and `NOT AND` as a disjunction of negated
//! members, until a negated leaf turns into an anti join.

pub mod and;
pub mod not;
pub mod or;

use shapeval_core::shape::{Path, Shape, ShapeKind};
use shapeval_core::source::Delta;
use shapeval_core::tuple::IteratorShape;
use shapeval_operators::{
    BoxPlan, EnrichWithShape, PlanNode, TargetProvider, Trim, Union, Unique,
};

use crate::context::{Frame, PlanContext};
use crate::error::Result;
use crate::{dirty, leaf, targets};

pub use or::disjunction;

/// Planning surface of a shape.
pub trait ShapePlanner {
    /// Plan producing this shape's violations (or, with `negate`, the
    /// violations of its negation). `targets` restricts the focus nodes;
    /// `None` means the node shape's own selection. Deactivated shapes yield
    /// no plan.
    fn plan(
        &self,
        ctx: &PlanContext<'_>,
        frame: Frame<'_>,
        targets: Option<&dyn TargetProvider>,
        negate: bool,
    ) -> Result<Option<BoxPlan>>;

    /// Every target the shape looks at, regardless of pass/fail.
    fn all_targets_plan(&self, ctx: &PlanContext<'_>, frame: Frame<'_>, negate: bool)
        -> Result<BoxPlan>;

    fn requires_evaluation(&self, frame: Frame<'_>, delta: &Delta) -> Result<bool>;
}

impl ShapePlanner for Shape {
    fn plan(
        &self,
        ctx: &PlanContext<'_>,
        frame: Frame<'_>,
        targets: Option<&dyn TargetProvider>,
        negate: bool,
    ) -> Result<Option<BoxPlan>> {
        if self.deactivated {
            tracing::debug!(shape = %self.id, "deactivated; no plan");
            return Ok(None);
        }
        let frame = frame.enter(self);
        match &self.kind {
            ShapeKind::Constraint(c) => leaf::plan_leaf(ctx, frame, self, c, targets, negate),
            ShapeKind::And(members) => and::plan_and(ctx, frame, self, members, targets, negate),
            ShapeKind::Or(branches) => or::plan_or(ctx, frame, self, branches, targets, negate),
            ShapeKind::Not(inner) => not::plan_not(ctx, frame, self, inner, targets, negate),
        }
    }

    // The target domain of a shape and of its negation are the same set.
    fn all_targets_plan(
        &self,
        ctx: &PlanContext<'_>,
        frame: Frame<'_>,
        _negate: bool,
    ) -> Result<BoxPlan> {
        targets::all_targets(ctx, frame, self)
    }

    fn requires_evaluation(&self, frame: Frame<'_>, delta: &Delta) -> Result<bool> {
        dirty::requires_evaluation(self, frame, delta)
    }
}

/// One input of a conjunction or disjunction.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'s> {
    Shape { shape: &'s Shape, negate: bool },
    /// Negation of an OR branch (a conjunction of its members).
    NegatedBranch(&'s [Shape]),
}

impl<'s> Operand<'s> {
    pub fn positive(shape: &'s Shape) -> Self {
        Operand::Shape {
            shape,
            negate: false,
        }
    }

    pub fn negated(shape: &'s Shape) -> Self {
        Operand::Shape {
            shape,
            negate: true,
        }
    }

    pub fn plan(
        &self,
        ctx: &PlanContext<'_>,
        frame: Frame<'_>,
        targets: Option<&dyn TargetProvider>,
    ) -> Result<Option<BoxPlan>> {
        match *self {
            Operand::Shape { shape, negate } => shape.plan(ctx, frame, targets, negate),
            Operand::NegatedBranch([single]) => single.plan(ctx, frame, targets, true),
            // NOT (m1 AND .. AND mk) = (NOT m1) OR .. OR (NOT mk)
            Operand::NegatedBranch(members) => {
                let branches: Vec<Vec<Operand<'_>>> =
                    members.iter().map(|m| vec![Operand::negated(m)]).collect();
                disjunction(ctx, frame, &branches, targets)
            }
        }
    }

    pub fn has_own_path(&self, inherited: Option<&Path>) -> bool {
        match *self {
            Operand::Shape { shape, .. } => shape.has_own_path(inherited),
            Operand::NegatedBranch(members) => members.iter().any(|m| m.has_own_path(inherited)),
        }
    }

    pub fn requires_evaluation(&self, frame: Frame<'_>, delta: &Delta) -> Result<bool> {
        match *self {
            Operand::Shape { shape, .. } => shape.requires_evaluation(frame, delta),
            Operand::NegatedBranch(members) => {
                for m in members {
                    if m.requires_evaluation(frame, delta)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

impl std::fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Shape { shape, negate: false } => write!(f, "{}", shape.id),
            Operand::Shape { shape, negate: true } => write!(f, "not {}", shape.id),
            Operand::NegatedBranch(members) => {
                write!(f, "not [")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m.id)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Lowest common denominator of the operand plans' declared shapes.
pub(crate) fn reconcile<I>(shapes: I, own_path: bool) -> IteratorShape
where
    I: IntoIterator<Item = IteratorShape>,
{
    match IteratorShape::reconcile(shapes) {
        Some(IteratorShape::TripleBased) if !own_path => IteratorShape::TripleBased,
        _ => IteratorShape::Aggregated,
    }
}

/// `Unique(Trim1(plan))`: the distinct targets of a plan.
pub(crate) fn distinct_targets(plan: BoxPlan) -> BoxPlan {
    Box::new(Unique::new(Box::new(Trim::new(plan, 1))))
}

/// Violations of any operand.
///
/// In an incremental pass without an external target set, operands the
/// delta does not touch are skipped: their affected-target set is empty.
pub fn conjunction(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    operands: &[Operand<'_>],
    targets: Option<&dyn TargetProvider>,
) -> Result<Option<BoxPlan>> {
    union_of(ctx, frame, operands, targets, true)
}

/// `conjunction` without the delta skip, for disjunction branches: a branch
/// with no plan drops out of the intersection instead of emptying it.
pub(crate) fn branch_conjunction(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    operands: &[Operand<'_>],
    targets: Option<&dyn TargetProvider>,
) -> Result<Option<BoxPlan>> {
    union_of(ctx, frame, operands, targets, false)
}

fn union_of(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    operands: &[Operand<'_>],
    targets: Option<&dyn TargetProvider>,
    skip_untouched: bool,
) -> Result<Option<BoxPlan>> {
    let mut plans = Vec::with_capacity(operands.len());
    let mut own_path = false;
    for op in operands {
        if let (true, None, Some(delta)) = (skip_untouched, targets, ctx.delta()) {
            if !ctx.is_bulk() && !op.requires_evaluation(frame, delta)? {
                tracing::debug!(operand = %op, "untouched by delta; skipped");
                continue;
            }
        }
        if let Some(plan) = op.plan(ctx, frame, targets)? {
            own_path |= op.has_own_path(frame.path());
            plans.push(plan);
        }
    }
    if plans.is_empty() {
        return Ok(None);
    }

    let inputs: Vec<BoxPlan> = match reconcile(plans.iter().map(|p| p.shape()), own_path) {
        IteratorShape::TripleBased => plans,
        IteratorShape::Aggregated => plans
            .into_iter()
            .map(|p| Box::new(Trim::new(p, 1)) as BoxPlan)
            .collect(),
    };
    Ok(Some(Box::new(Unique::new(Box::new(Union::new(inputs)?)))))
}

/// Tag a combinator's plan with its shape and hand it to the diagnostics sink.
pub(crate) fn finish(ctx: &PlanContext<'_>, shape: &Shape, plan: BoxPlan) -> BoxPlan {
    let plan: BoxPlan = Box::new(EnrichWithShape::new(plan, shape.id));
    ctx.report_plan(shape, plan.as_ref());
    plan
}
