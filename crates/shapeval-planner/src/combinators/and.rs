//! AND: a target violates `and(S1, .., Sn)` when it violates any member.

use shapeval_core::shape::Shape;
use shapeval_operators::{BoxPlan, TargetProvider};

use super::{conjunction, disjunction, finish, Operand};
use crate::context::{Frame, PlanContext};
use crate::error::{PlanError, Result};

pub(crate) fn plan_and(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    shape: &Shape,
    members: &[Shape],
    targets: Option<&dyn TargetProvider>,
    negate: bool,
) -> Result<Option<BoxPlan>> {
    if members.is_empty() {
        return Err(PlanError::MalformedShapeTree(format!("{} has no members", shape.id)));
    }
    let plan = if negate {
        // NOT (S1 AND .. AND Sn) = (NOT S1) OR .. OR (NOT Sn)
        let branches: Vec<Vec<Operand<'_>>> =
            members.iter().map(|m| vec![Operand::negated(m)]).collect();
        disjunction(ctx, frame, &branches, targets)?
    } else {
        let operands: Vec<Operand<'_>> = members.iter().map(Operand::positive).collect();
        conjunction(ctx, frame, &operands, targets)?
    };
    Ok(plan.map(|p| finish(ctx, shape, p)))
}
