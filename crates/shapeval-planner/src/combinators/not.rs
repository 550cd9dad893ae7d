//! NOT: plan the inner shape with the negation flag flipped.

use shapeval_core::shape::Shape;
use shapeval_operators::{BoxPlan, TargetProvider};

use super::{finish, ShapePlanner};
use crate::context::{Frame, PlanContext};
use crate::error::Result;

pub(crate) fn plan_not(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    shape: &Shape,
    inner: &Shape,
    targets: Option<&dyn TargetProvider>,
    negate: bool,
) -> Result<Option<BoxPlan>> {
    let plan = inner.plan(ctx, frame, targets, !negate)?;
    Ok(plan.map(|p| finish(ctx, shape, p)))
}
