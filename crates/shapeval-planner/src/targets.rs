//! Where a plan's focus nodes come from.

use shapeval_core::shape::{Shape, ShapeKind};
use shapeval_core::tuple::IteratorShape;
use shapeval_operators::{
    BoxPlan, EmptyNode, Sort, TargetProvider, TargetScan, Trim, Union, Unique,
};

use crate::combinators::ShapePlanner;
use crate::context::{Frame, PlanContext};
use crate::error::Result;

/// Focus nodes for a leaf: the external set when given, otherwise the node
/// shape's selection scoped by the pass.
pub(crate) fn focus_targets(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    targets: Option<&dyn TargetProvider>,
) -> Result<BoxPlan> {
    match targets {
        Some(provider) => external(provider),
        None => Ok(scan(ctx, frame)),
    }
}

/// An externally supplied target set, normalized to sorted distinct targets.
pub(crate) fn external(provider: &dyn TargetProvider) -> Result<BoxPlan> {
    let trimmed = Trim::new(provider.plan_node()?, 1);
    Ok(Box::new(Unique::new(Box::new(Sort::new(Box::new(trimmed))))))
}

pub(crate) fn scan(ctx: &PlanContext<'_>, frame: Frame<'_>) -> BoxPlan {
    Box::new(TargetScan::new(
        ctx.source().clone(),
        frame.targets().to_vec(),
        ctx.target_mode(frame.path()),
    ))
}

/// Every target the shape looks at, whether it passes or not.
pub(crate) fn all_targets(ctx: &PlanContext<'_>, frame: Frame<'_>, shape: &Shape) -> Result<BoxPlan> {
    if shape.deactivated {
        return Ok(Box::new(EmptyNode::new(IteratorShape::Aggregated)));
    }
    let frame = frame.enter(shape);
    if let ShapeKind::Constraint(_) = shape.kind {
        return Ok(scan(ctx, frame));
    }
    let mut inputs = Vec::new();
    for child in shape.children() {
        inputs.push(child.all_targets_plan(ctx, frame, false)?);
    }
    if inputs.is_empty() {
        return Ok(Box::new(EmptyNode::new(IteratorShape::Aggregated)));
    }
    Ok(Box::new(Unique::new(Box::new(Union::new(inputs)?))))
}
