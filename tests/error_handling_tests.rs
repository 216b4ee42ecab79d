//! Tests for error handling: every failure mode surfaces as a typed
//! `QueryError` from the stage that detects it, never a panic, and a
//! failing stage aborts the whole evaluation.

use relq::{
    CompareOp, Filter, OutputField, Query, QueryError, Relation, ResourceLimits, Schema,
    SortSpec, Transform, Value,
};

fn users() -> Relation {
    Relation::build(
        ["name", "user", "age"],
        vec![
            vec!["Ann".into(), "a1".into(), Value::Int64(12)],
            vec!["Bo".into(), "b2".into(), Value::Int64(25)],
        ],
    )
    .expect("fixture")
}

// Schema errors

#[test]
fn test_projecting_unknown_field() {
    let err = Query::from(users())
        .project(["country"])
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownField { .. }));
    // The message names both the missing field and the schema
    let message = err.to_string();
    assert!(message.contains("country"));
    assert!(message.contains("name"));
}

#[test]
fn test_filtering_unknown_field() {
    let err = Query::from(users())
        .filter(Filter::eq("score", 1i64))
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownField { .. }));
}

#[test]
fn test_sorting_unknown_field() {
    let err = Query::from(users())
        .sort(SortSpec::by(["height"]))
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownField { .. }));
}

#[test]
fn test_duplicate_schema_field() {
    let err = Schema::new(["user", "user"]).unwrap_err();
    assert!(matches!(err, QueryError::DuplicateField { .. }));
}

// Arity errors

#[test]
fn test_tuple_arity_mismatch_on_construction() {
    let err = Relation::build(
        ["name", "age"],
        vec![vec!["Ann".into()]],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        QueryError::ArityMismatch {
            expected: 2,
            got: 1,
            ..
        }
    ));
}

#[test]
fn test_custom_filter_with_no_inputs() {
    let err = Query::from(users())
        .filter(Filter::custom(&[], |_| true))
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::ArityMismatch { .. }));
}

#[test]
fn test_transform_with_no_inputs() {
    let err = Query::from(users())
        .derive(Transform::new(&[], "out", |_| Value::Int64(0)))
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::ArityMismatch { .. }));
}

// Join key errors

#[test]
fn test_join_without_shared_fields() {
    let other = Relation::build(["game", "score"], vec![]).expect("fixture");
    let err = Query::join([users(), other]).evaluate().unwrap_err();
    assert!(matches!(err, QueryError::NoSharedFields { .. }));
}

// Empty group errors

#[test]
fn test_average_over_empty_relation() {
    let empty = Relation::empty(Schema::new(["age"]).expect("schema"));
    let err = Query::from(empty)
        .aggregate(vec![OutputField::average("age", "average")])
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::EmptyGroup { .. }));
}

#[test]
fn test_max_over_empty_relation() {
    let empty = Relation::empty(Schema::new(["age"]).expect("schema"));
    let err = Query::from(empty)
        .aggregate(vec![OutputField::max("age", "oldest")])
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::EmptyGroup { .. }));
}

// Type mismatch errors

#[test]
fn test_comparing_string_field_to_integer() {
    let err = Query::from(users())
        .filter(Filter::compare("name", CompareOp::Gt, 10i64))
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::TypeMismatch { .. }));
}

#[test]
fn test_averaging_a_string_field() {
    let err = Query::from(users())
        .aggregate(vec![OutputField::average("name", "avg")])
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::TypeMismatch { .. }));
}

#[test]
fn test_sorting_mixed_type_column() {
    let mixed = Relation::build(
        ["x"],
        vec![vec![Value::Int64(1)], vec!["one".into()]],
    )
    .expect("fixture");
    let err = Query::from(mixed)
        .sort(SortSpec::by(["x"]))
        .evaluate()
        .unwrap_err();
    assert!(matches!(err, QueryError::TypeMismatch { .. }));
}

// Resource errors

#[test]
fn test_intermediate_limit_reports_stage() {
    let limits = ResourceLimits {
        max_intermediate_rows: Some(1),
        ..ResourceLimits::default()
    };
    let err = Query::from(users())
        .filter(Filter::compare("age", CompareOp::Gt, 0i64))
        .evaluate_with(&limits)
        .unwrap_err();
    match err {
        QueryError::Resource(resource) => {
            assert!(resource.to_string().contains("filter"));
        }
        other => panic!("expected resource error, got {other:?}"),
    }
}

#[test]
fn test_row_width_limit() {
    let limits = ResourceLimits {
        max_row_width: Some(2),
        ..ResourceLimits::default()
    };
    let err = Query::from(users()).evaluate_with(&limits).unwrap_err();
    assert!(matches!(err, QueryError::Resource(_)));
}

// A failing stage aborts the whole evaluation

#[test]
fn test_error_in_late_stage_discards_earlier_work() {
    let result = Query::from(users())
        .filter(Filter::compare("age", CompareOp::Ge, 0i64))
        .project(["nonexistent"])
        .evaluate();
    assert!(result.is_err());
}
