//! Constraint leaves.
//!
//! Value-level constraints (`Datatype`, `In`) filter `(target, value,
//! provenance)` tuples and stay `TripleBased` when a path exists. Count-style
//! constraints (`HasValue`, `MinCount`, `MaxCount`) need a target's whole
//! value set, so they fan the targets out to a value scan and a
//! `CountValues` merge and report `(target)` only.
//!
//! A negated leaf is the target domain minus the leaf's own violators.

use shapeval_core::shape::{Constraint, Shape};
use shapeval_operators::{
    AntiJoin, BoxPlan, BufferedSplitter, CountValues, EnrichWithShape, Filter, TargetProvider,
    Trim, Unique, ValuesOf,
};

use crate::context::{Frame, PlanContext};
use crate::error::Result;
use crate::targets::focus_targets;

pub(crate) fn plan_leaf(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    shape: &Shape,
    constraint: &Constraint,
    targets: Option<&dyn TargetProvider>,
    negate: bool,
) -> Result<Option<BoxPlan>> {
    let plan = if negate {
        negated(ctx, frame, constraint, targets)?
    } else {
        violations(ctx, frame, constraint, targets)?
    };
    tracing::trace!(shape = %shape.id, %constraint, negate, "planned leaf");
    Ok(Some(Box::new(EnrichWithShape::new(plan, shape.id))))
}

fn violations(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    constraint: &Constraint,
    targets: Option<&dyn TargetProvider>,
) -> Result<BoxPlan> {
    let focus = focus_targets(ctx, frame, targets)?;
    let path = frame.path().cloned();
    let label = constraint.to_string();

    if constraint.is_value_level() {
        let c = constraint.clone();
        let values = ValuesOf::new(focus, ctx.source().clone(), path);
        return Ok(Box::new(Filter::new(Box::new(values), label, move |t| {
            t.value().map_or(false, |v| !c.accepts_value(v))
        })));
    }

    let split = BufferedSplitter::new(focus);
    let values = ValuesOf::new(split.consumer(), ctx.source().clone(), path);
    let c = constraint.clone();
    Ok(Box::new(CountValues::new(
        split.consumer(),
        Box::new(values),
        label,
        move |vs| c.violated_by_values(vs),
    )))
}

fn negated(
    ctx: &PlanContext<'_>,
    frame: Frame<'_>,
    constraint: &Constraint,
    targets: Option<&dyn TargetProvider>,
) -> Result<BoxPlan> {
    let domain = BufferedSplitter::new(focus_targets(ctx, frame, targets)?);
    let positive = violations(ctx, frame, constraint, Some(&domain))?;
    let violators = Unique::new(Box::new(Trim::new(positive, 1)));
    Ok(Box::new(AntiJoin::new(domain.consumer(), Box::new(violators))))
}

#[cfg(test)]
mod tests {
    use shapeval_core::config::ValidationConfig;
    use shapeval_core::id::ShapeId;
    use shapeval_core::term::{Term, TermKind};

    use crate::testing::*;

    use super::*;

    #[test]
    fn value_level_violations_keep_provenance() {
        let src = store(vec![
            person("a"),
            person("b"),
            age("a", Term::str("x")),
            age("b", Term::Int(3)),
        ]);
        let config = ValidationConfig::default();
        let n = node(leaf(1, Constraint::Datatype(TermKind::Int)).with_path(on("age")));
        let out = run(&bulk(src, &config), &n, false);
        assert_eq!(violators(&out), vec!["a"]);
        assert_eq!(out[0].provenance(), Some(&age("a", Term::str("x"))));
        assert_eq!(out[0].shapes(), [ShapeId::new(1)]);
    }

    #[test]
    fn count_constraints_report_targets_only() {
        let src = store(vec![
            person("a"),
            person("b"),
            person("c"),
            age("a", Term::Int(1)),
            age("a", Term::Int(2)),
            age("b", Term::Int(1)),
        ]);
        let config = ValidationConfig::default();
        let n = node(leaf(1, Constraint::MinCount(2)).with_path(on("age")));
        let out = run(&bulk(src.clone(), &config), &n, false);
        assert_eq!(violators(&out), vec!["b", "c"]);
        assert!(out.iter().all(|t| t.width() == 1));

        let negated = run(&bulk(src, &config), &n, true);
        assert_eq!(violators(&negated), vec!["a"]);
    }

    #[test]
    fn no_path_constrains_the_focus_node() {
        let src = store(vec![person("a"), person("b"), person("c")]);
        let config = ValidationConfig::default();
        let n = node(leaf(1, Constraint::In(vec![Term::iri("a"), Term::iri("b")])));
        assert_eq!(violators(&run(&bulk(src, &config), &n, false)), vec!["c"]);
    }

    #[test]
    fn deactivated_leaf_has_no_plan() {
        let src = store(vec![person("a")]);
        let config = ValidationConfig::default();
        let n = node(leaf(1, Constraint::MinCount(1)).with_path(on("age")).deactivated());
        assert!(run(&bulk(src.clone(), &config), &n, false).is_empty());
        assert!(run(&bulk(src, &config), &n, true).is_empty());
    }
}
