//! End-to-end checks of the OR/AND/NOT algebra through the validator.

mod test_data_gen;

use shapeval_core::config::ValidationConfig;
use shapeval_core::id::ShapeId;
use shapeval_core::shape::{Path, Shape, SourceConstraintComponent};
use shapeval_core::term::Term;
use shapeval_core::tuple::IteratorShape;
use shapeval_exec::Validator;
use shapeval_operators::PlanNode;
use shapeval_planner::{Frame, PlanContext, ShapePlanner};
use test_data_gen::*;

fn violators(shape: Shape) -> Vec<String> {
    let v = Validator::new(vec![persons(vec![shape])], ValidationConfig::default())
        .expect("validator");
    let report = v.validate_all(shared(people())).expect("bulk pass");
    focus_names(&report)
}

#[test]
fn or_reports_targets_violating_every_branch() {
    let or = Shape::or(
        ShapeId::new(10),
        vec![vec![on_age(known_age(11))], vec![on_age(max_one(12))]],
    );
    assert_eq!(violators(or), vec!["d"]);
}

#[test]
fn or_with_disjoint_violators_conforms() {
    let or = Shape::or(
        ShapeId::new(10),
        vec![vec![on_age(is_int(11))], vec![on_age(max_one(12))]],
    );
    assert!(violators(or).is_empty());
}

#[test]
fn branch_is_a_conjunction_of_its_members() {
    // branch 1 violated by b (not int) and d (two ages); branch 2 by c
    let or = Shape::or(
        ShapeId::new(10),
        vec![
            vec![on_age(is_int(11)), on_age(max_one(12))],
            vec![on_age(min_one(13))],
        ],
    );
    assert!(violators(or).is_empty());

    let or = Shape::or(
        ShapeId::new(20),
        vec![
            vec![on_age(is_int(21)), on_age(max_one(22))],
            vec![on_age(known_age(23))],
        ],
    );
    assert_eq!(violators(or), vec!["b", "d"]);
}

#[test]
fn single_branch_single_member_behaves_like_the_member() {
    let or = Shape::or(ShapeId::new(10), vec![vec![on_age(min_one(11))]]);
    assert_eq!(violators(or), violators(on_age(min_one(11))));
}

#[test]
fn negation_complements_within_the_target_set() {
    let or = || {
        Shape::or(
            ShapeId::new(10),
            vec![vec![on_age(known_age(11))], vec![on_age(max_one(12))]],
        )
    };
    assert_eq!(violators(or()), vec!["d"]);
    assert_eq!(violators(Shape::not(ShapeId::new(9), or())), vec!["a", "b", "c"]);
}

#[test]
fn not_and_matches_or_of_negations() {
    let and = Shape::and(ShapeId::new(10), vec![on_age(known_age(11)), on_age(max_one(12))]);
    let not_and = Shape::not(ShapeId::new(9), and);
    let or_of_nots = Shape::or(
        ShapeId::new(20),
        vec![
            vec![Shape::not(ShapeId::new(21), on_age(known_age(22)))],
            vec![Shape::not(ShapeId::new(23), on_age(max_one(24)))],
        ],
    );
    assert_eq!(violators(not_and), vec!["a", "c"]);
    assert_eq!(violators(or_of_nots), vec!["a", "c"]);
}

#[test]
fn double_negation_is_identity() {
    let or = || {
        Shape::or(
            ShapeId::new(10),
            vec![vec![on_age(known_age(11))], vec![on_age(is_int(12))]],
        )
    };
    let twice = Shape::not(ShapeId::new(8), Shape::not(ShapeId::new(9), or()));
    assert_eq!(violators(twice), violators(or()));
}

#[test]
fn deactivated_shapes_never_report() {
    // a branch with no active member drops out of the intersection
    let or = Shape::or(
        ShapeId::new(10),
        vec![
            vec![on_age(known_age(11))],
            vec![on_age(max_one(12)).deactivated()],
        ],
    );
    assert_eq!(violators(or), vec!["b", "d"]);
    let and = Shape::and(
        ShapeId::new(15),
        vec![on_age(known_age(16)), on_age(max_one(17)).deactivated()],
    );
    assert_eq!(violators(and), vec!["b", "d"]);
    let off = Shape::or(ShapeId::new(20), vec![vec![on_age(min_one(21))]]).deactivated();
    assert!(violators(off).is_empty());
}

fn declared_shape(shape: Shape) -> IteratorShape {
    let node = persons(vec![shape]);
    let config = ValidationConfig::default();
    let ctx = PlanContext::bulk(shared(people()), &config);
    node.shapes[0]
        .plan(&ctx, Frame::root(&node), None, false)
        .expect("plan")
        .expect("active shape")
        .shape()
}

#[test]
fn reconciliation_keeps_triples_only_when_every_branch_does() {
    let inherited = Shape::or(
        ShapeId::new(10),
        vec![vec![known_age(11)], vec![is_int(12)]],
    )
    .with_path(age_path());
    assert_eq!(declared_shape(inherited), IteratorShape::TripleBased);

    let mixed = Shape::or(
        ShapeId::new(10),
        vec![vec![known_age(11)], vec![max_one(12)]],
    )
    .with_path(age_path());
    assert_eq!(declared_shape(mixed), IteratorShape::Aggregated);

    let own_path = Shape::or(
        ShapeId::new(10),
        vec![
            vec![known_age(11)],
            vec![is_int(12).with_path(Path::Predicate(Term::iri("shoe_size")))],
        ],
    )
    .with_path(age_path());
    assert_eq!(declared_shape(own_path), IteratorShape::Aggregated);
}

#[test]
fn report_names_the_violated_top_level_shape() {
    let or = Shape::or(
        ShapeId::new(10),
        vec![vec![on_age(known_age(11))], vec![on_age(max_one(12))]],
    );
    let v = Validator::new(vec![persons(vec![or])], ValidationConfig::default()).unwrap();
    let report = v.validate_all(shared(people())).unwrap();
    assert!(!report.conforms());
    for violation in &report.violations {
        assert_eq!(violation.source_shape, ShapeId::new(10));
        assert_eq!(violation.component, SourceConstraintComponent::OrConstraintComponent);
        assert_eq!(violation.node_shape, ShapeId::new(NODE));
    }
    let json = report.to_json().unwrap();
    assert!(json.contains("OrConstraintComponent"));
}
