//! Predicate Evaluator
//!
//! Scalar filters and transforms over named fields. A filter keeps a row
//! iff its function over the bound input fields returns true; a transform
//! appends (or replaces) exactly one named output field per row.
//!
//! Conjunctions are expressed as a list of filters; disjunction across
//! clauses is expressed as a single [`Filter::custom`] boolean function
//! taking all relevant fields as input, since clause lists combine as AND.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::{QueryError, QueryResult};
use crate::relation::Relation;
use crate::value::{Tuple, Value};

/// Comparison operators for field predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
}

impl CompareOp {
    fn matches(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// Boolean function over the values bound to a filter's input fields
pub type BoolFn = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// Scalar function producing a transform's output value
pub type MapFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Clone)]
enum FilterKind {
    /// field op literal
    Compare {
        field: String,
        op: CompareOp,
        literal: Value,
    },
    /// left-field op right-field
    CompareFields {
        left: String,
        op: CompareOp,
        right: String,
    },
    /// arbitrary boolean function over one or more fields
    Custom { inputs: Vec<String>, func: BoolFn },
}

/// A row filter bound to named input fields
#[derive(Clone)]
pub struct Filter {
    kind: FilterKind,
}

impl Filter {
    /// Compare a field against a literal value
    pub fn compare(field: &str, op: CompareOp, literal: impl Into<Value>) -> Self {
        Filter {
            kind: FilterKind::Compare {
                field: field.to_string(),
                op,
                literal: literal.into(),
            },
        }
    }

    /// Equality against a literal, the most common filter form
    pub fn eq(field: &str, literal: impl Into<Value>) -> Self {
        Filter::compare(field, CompareOp::Eq, literal)
    }

    /// Compare two fields of the same row
    pub fn compare_fields(left: &str, op: CompareOp, right: &str) -> Self {
        Filter {
            kind: FilterKind::CompareFields {
                left: left.to_string(),
                op,
                right: right.to_string(),
            },
        }
    }

    /// Arbitrary boolean function over the named input fields.
    ///
    /// Values are passed in the declared input order. This is the escape
    /// hatch for OR across clauses and any other combination a simple
    /// comparison cannot express.
    pub fn custom<F>(inputs: &[&str], func: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        Filter {
            kind: FilterKind::Custom {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                func: Arc::new(func),
            },
        }
    }

    /// Apply the filter, keeping matching rows in order
    pub fn apply(&self, input: &Relation) -> QueryResult<Relation> {
        match &self.kind {
            FilterKind::Compare { field, op, literal } => {
                let index = input.schema().field_index(field)?;
                input.select(|tuple| {
                    let value = tuple.get(index).expect("arity checked on construction");
                    Ok(op.matches(value.try_cmp(literal)?))
                })
            }
            FilterKind::CompareFields { left, op, right } => {
                let left_index = input.schema().field_index(left)?;
                let right_index = input.schema().field_index(right)?;
                input.select(|tuple| {
                    let a = tuple.get(left_index).expect("arity checked on construction");
                    let b = tuple
                        .get(right_index)
                        .expect("arity checked on construction");
                    Ok(op.matches(a.try_cmp(b)?))
                })
            }
            FilterKind::Custom { inputs, func } => {
                if inputs.is_empty() {
                    return Err(QueryError::ArityMismatch {
                        context: "custom filter inputs".to_string(),
                        expected: 1,
                        got: 0,
                    });
                }
                let indices = input.schema().field_indices(inputs)?;
                input.select(|tuple| {
                    let bound: Vec<Value> = indices
                        .iter()
                        .map(|&i| tuple.get(i).expect("arity checked on construction").clone())
                        .collect();
                    Ok(func(&bound))
                })
            }
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FilterKind::Compare { field, op, literal } => {
                write!(f, "Filter({} {} {})", field, op, literal)
            }
            FilterKind::CompareFields { left, op, right } => {
                write!(f, "Filter({} {} {})", left, op, right)
            }
            FilterKind::Custom { inputs, .. } => {
                write!(f, "Filter(custom over [{}])", inputs.join(", "))
            }
        }
    }
}

/// A per-row transform producing one named output field
#[derive(Clone)]
pub struct Transform {
    inputs: Vec<String>,
    output: String,
    func: MapFn,
}

impl Transform {
    /// Create a transform of the named input fields into `output`.
    ///
    /// If `output` already exists in the schema its values are replaced;
    /// otherwise the field is appended after the existing fields.
    pub fn new<F>(inputs: &[&str], output: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Transform {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: output.to_string(),
            func: Arc::new(func),
        }
    }

    /// The output field name
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Apply the transform, producing a fresh relation
    pub fn apply(&self, input: &Relation) -> QueryResult<Relation> {
        if self.inputs.is_empty() {
            return Err(QueryError::ArityMismatch {
                context: "transform inputs".to_string(),
                expected: 1,
                got: 0,
            });
        }
        let indices = input.schema().field_indices(&self.inputs)?;
        let replaced = input.schema().contains(&self.output);
        let output_index = if replaced {
            Some(input.schema().field_index(&self.output)?)
        } else {
            None
        };

        let schema = if replaced {
            input.schema().clone()
        } else {
            let mut names: Vec<String> = input.schema().field_names().to_vec();
            names.push(self.output.clone());
            crate::schema::Schema::new(names)?
        };

        let mut tuples = Vec::with_capacity(input.len());
        for tuple in input.iter() {
            let bound: Vec<Value> = indices
                .iter()
                .map(|&i| tuple.get(i).expect("arity checked on construction").clone())
                .collect();
            let computed = (self.func)(&bound);

            let mut values: Vec<Value> = tuple.values().to_vec();
            match output_index {
                Some(i) => values[i] = computed,
                None => values.push(computed),
            }
            tuples.push(Tuple::new(values));
        }
        Relation::new(schema, tuples)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transform([{}] -> {})",
            self.inputs.join(", "),
            self.output
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Relation {
        Relation::build(
            ["name", "age", "country"],
            vec![
                vec!["Ann".into(), Value::Int64(12), "US".into()],
                vec!["Bo".into(), Value::Int64(25), "IE".into()],
                vec!["Cy".into(), Value::Int64(17), "US".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_equality_filter() {
        let out = Filter::eq("country", "US").apply(&users()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.tuples()[0].get(0), Some(&Value::string("Ann")));
        assert_eq!(out.tuples()[1].get(0), Some(&Value::string("Cy")));
    }

    #[test]
    fn test_comparison_filter() {
        let out = Filter::compare("age", CompareOp::Lt, 18i64)
            .apply(&users())
            .unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_custom_filter_expresses_or() {
        // age < 15 OR country = "IE" cannot be a conjunction of clauses
        let filter = Filter::custom(&["age", "country"], |values| {
            let age = values[0].as_i64().unwrap_or(i64::MAX);
            let country = values[1].as_str().unwrap_or("");
            age < 15 || country == "IE"
        });
        let out = filter.apply(&users()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.tuples()[0].get(0), Some(&Value::string("Ann")));
        assert_eq!(out.tuples()[1].get(0), Some(&Value::string("Bo")));
    }

    #[test]
    fn test_filter_type_mismatch() {
        let err = Filter::compare("name", CompareOp::Lt, 10i64)
            .apply(&users())
            .unwrap_err();
        assert!(matches!(err, QueryError::TypeMismatch { .. }));
    }

    #[test]
    fn test_filter_unknown_field() {
        let err = Filter::eq("score", 1i64).apply(&users()).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
    }

    #[test]
    fn test_transform_appends_field() {
        let double = Transform::new(&["age"], "double_age", |values| {
            Value::Int64(values[0].as_i64().unwrap_or(0) * 2)
        });
        let out = double.apply(&users()).unwrap();
        assert_eq!(
            out.schema().field_names(),
            &["name", "age", "country", "double_age"]
        );
        assert_eq!(out.tuples()[0].get(3), Some(&Value::Int64(24)));
    }

    #[test]
    fn test_transform_replaces_existing_field() {
        let bump = Transform::new(&["age"], "age", |values| {
            Value::Int64(values[0].as_i64().unwrap_or(0) + 1)
        });
        let out = bump.apply(&users()).unwrap();
        assert_eq!(out.schema().arity(), 3);
        assert_eq!(out.tuples()[0].get(1), Some(&Value::Int64(13)));
    }

    #[test]
    fn test_filter_idempotent() {
        let filter = Filter::eq("country", "US");
        let once = filter.apply(&users()).unwrap();
        let twice = filter.apply(&once).unwrap();
        assert_eq!(once, twice);
    }
}
