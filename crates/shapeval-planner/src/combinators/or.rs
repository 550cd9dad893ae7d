//! OR: a target violates `or(B1 | .. | Bn)` when it violates every branch.
//!
//! Branches are first evaluated unrestricted to collect candidate targets
//! (the targets violating at least one branch). Every branch is then
//! evaluated again restricted to those candidates and the results are
//! intersected: column-exact equality joins while provenance survives,
//! target-only inner joins once any branch is `Aggregated`.

use shapeval_core::shape::Shape;
use shapeval_core::tuple::IteratorShape;
use shapeval_operators::{
    BoxPlan, BufferedSplitter, EqualsJoin, InnerJoin, PlanNode, ShapeOverride, TargetProvider,
    Trim, Union, Unique,
};

use super::{branch_conjunction, conjunction, distinct_targets, finish, reconcile, Operand};
use crate::context::{Frame, PlanContext};
use crate::error::{PlanError, Result};

pub(crate) fn plan_or(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    shape: &Shape,
    branches: &[Vec<Shape>],
    targets: Option<&dyn TargetProvider>,
    negate: bool,
) -> Result<Option<BoxPlan>> {
    check_branches(shape, branches)?;
    let plan = if negate {
        // NOT (B1 OR .. OR Bn) = (NOT B1) AND .. AND (NOT Bn)
        let operands: Vec<Operand<'_>> =
            branches.iter().map(|b| Operand::NegatedBranch(b.as_slice())).collect();
        conjunction(ctx, frame, &operands, targets)?
    } else {
        let branches: Vec<Vec<Operand<'_>>> = branches
            .iter()
            .map(|b| b.iter().map(Operand::positive).collect())
            .collect();
        disjunction(ctx, frame, &branches, targets)?
    };
    Ok(plan.map(|p| finish(ctx, shape, p)))
}

fn check_branches(shape: &Shape, branches: &[Vec<Shape>]) -> Result<()> {
    if branches.is_empty() {
        return Err(PlanError::MalformedShapeTree(format!("{} has no branches", shape.id)));
    }
    if branches.iter().any(Vec::is_empty) {
        return Err(PlanError::MalformedShapeTree(format!("{} has an empty branch", shape.id)));
    }
    Ok(())
}

/// Where the restricted branch evaluations get their focus nodes.
enum Candidates<'t> {
    Unrestricted,
    Given(&'t dyn TargetProvider),
    Buffered(BufferedSplitter),
}

impl<'t> Candidates<'t> {
    fn provider(&self) -> Option<&dyn TargetProvider> {
        match self {
            Candidates::Unrestricted => None,
            Candidates::Given(p) => Some(*p),
            Candidates::Buffered(s) => Some(s),
        }
    }
}

/// Violations of every branch (each branch a conjunction of its operands).
pub fn disjunction(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    branches: &[Vec<Operand<'_>>],
    targets: Option<&dyn TargetProvider>,
) -> Result<Option<BoxPlan>> {
    if branches.is_empty() || branches.iter().any(Vec::is_empty) {
        return Err(PlanError::MalformedShapeTree(
            "disjunction needs at least one non-empty branch".into(),
        ));
    }
    if let [branch] = branches {
        if let [single] = branch.as_slice() {
            return single.plan(ctx, frame, targets);
        }
    }

    let candidates = match targets {
        Some(given) if ctx.config().cache_select_nodes => {
            Candidates::Buffered(BufferedSplitter::new(given.plan_node()?))
        }
        Some(given) => Candidates::Given(given),
        None if ctx.base_empty() => Candidates::Unrestricted,
        None => {
            let mut inputs = Vec::with_capacity(branches.len());
            for branch in branches {
                if let Some(plan) = conjunction(ctx, frame, branch, None)? {
                    inputs.push(Box::new(Trim::new(plan, 1)) as BoxPlan);
                }
            }
            if inputs.is_empty() {
                return Ok(None);
            }
            let union = Unique::new(Box::new(Union::new(inputs)?));
            Candidates::Buffered(BufferedSplitter::new(Box::new(union)))
        }
    };

    let mut plans = Vec::with_capacity(branches.len());
    let mut own_path = false;
    for branch in branches {
        own_path |= branch.iter().any(|op| op.has_own_path(frame.path()));
        if let Some(plan) = branch_conjunction(ctx, frame, branch, candidates.provider())? {
            plans.push(plan);
        }
    }
    if plans.is_empty() {
        return Ok(None);
    }

    let shape = reconcile(plans.iter().map(|p| p.shape()), own_path);
    let combined = intersect(plans, shape)?;
    Ok(Some(match shape {
        IteratorShape::TripleBased => combined,
        IteratorShape::Aggregated => Box::new(ShapeOverride::new(combined, IteratorShape::Aggregated)),
    }))
}

/// Fold the branch plans left to right into their intersection.
fn intersect(plans: Vec<BoxPlan>, shape: IteratorShape) -> Result<BoxPlan> {
    let single = plans.len() == 1;
    let mut plans = plans.into_iter();
    let Some(first) = plans.next() else {
        return Err(PlanError::MalformedShapeTree("intersection of zero plans".into()));
    };
    if single {
        let union = Union::new(vec![first])?;
        return Ok(match shape {
            IteratorShape::TripleBased => Box::new(Unique::new(Box::new(union))),
            IteratorShape::Aggregated => distinct_targets(Box::new(union)),
        });
    }
    match shape {
        IteratorShape::TripleBased => {
            let mut acc = first;
            for next in plans {
                acc = Box::new(EqualsJoin::new(acc, next, true)?);
            }
            Ok(acc)
        }
        IteratorShape::Aggregated => {
            let mut acc = distinct_targets(first);
            for next in plans {
                acc = Box::new(InnerJoin::new(acc, distinct_targets(next))?);
            }
            Ok(acc)
        }
    }
}
