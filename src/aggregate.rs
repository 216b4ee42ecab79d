//! Group/Aggregate Engine
//!
//! Partitions a relation by declared grouping fields and computes
//! aggregate functions per partition. Grouping is always explicit: every
//! output field is declared either as a grouping field (a plain
//! projection) or as an aggregate; nothing is inferred from the
//! projection shape. An empty grouping declaration aggregates the whole
//! relation as a single global group.
//!
//! Groups are emitted in the order they are first encountered in the
//! input, with rows inside a group kept in input order, so downstream
//! sort stages have a deterministic starting point.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::relation::Relation;
use crate::schema::Schema;
use crate::value::{DataType, Tuple, Value};

/// Aggregate function kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// Count rows in the partition (needs no source field)
    Count,
    /// Sum of a numeric field; integer if every input is an integer
    Sum,
    /// Average of a numeric field (float division)
    Average,
    /// Minimum value; ties keep the first-encountered minimal value
    Min,
    /// Maximum value; ties keep the first-encountered maximal value
    Max,
}

#[derive(Debug, Clone)]
enum OutputKind {
    Group,
    Aggregate {
        func: AggregateFunction,
        source: Option<String>,
    },
}

/// One declared output field of an aggregation
#[derive(Debug, Clone)]
pub struct OutputField {
    name: String,
    kind: OutputKind,
}

impl OutputField {
    /// A grouping field: projected as-is and part of the partition key
    pub fn group(field: &str) -> Self {
        OutputField {
            name: field.to_string(),
            kind: OutputKind::Group,
        }
    }

    /// Row count per partition
    pub fn count(name: &str) -> Self {
        OutputField {
            name: name.to_string(),
            kind: OutputKind::Aggregate {
                func: AggregateFunction::Count,
                source: None,
            },
        }
    }

    /// Sum of `source` per partition
    pub fn sum(source: &str, name: &str) -> Self {
        OutputField::with_source(AggregateFunction::Sum, source, name)
    }

    /// Average of `source` per partition
    pub fn average(source: &str, name: &str) -> Self {
        OutputField::with_source(AggregateFunction::Average, source, name)
    }

    /// Minimum of `source` per partition
    pub fn min(source: &str, name: &str) -> Self {
        OutputField::with_source(AggregateFunction::Min, source, name)
    }

    /// Maximum of `source` per partition
    pub fn max(source: &str, name: &str) -> Self {
        OutputField::with_source(AggregateFunction::Max, source, name)
    }

    fn with_source(func: AggregateFunction, source: &str, name: &str) -> Self {
        OutputField {
            name: name.to_string(),
            kind: OutputKind::Aggregate {
                func,
                source: Some(source.to_string()),
            },
        }
    }

    /// The output field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for grouping fields
    pub fn is_group(&self) -> bool {
        matches!(self.kind, OutputKind::Group)
    }
}

/// Per-group running state for one aggregate function
enum Accumulator {
    Count(u64),
    Sum {
        int: i64,
        float: f64,
        all_int: bool,
        rows: u64,
        source: String,
    },
    Average {
        sum: f64,
        rows: u64,
        source: String,
    },
    Extreme {
        current: Option<Value>,
        keep_greater: bool,
        source: String,
    },
}

impl Accumulator {
    fn new(func: AggregateFunction, source: Option<&String>) -> Self {
        let source = source.cloned().unwrap_or_default();
        match func {
            AggregateFunction::Count => Accumulator::Count(0),
            AggregateFunction::Sum => Accumulator::Sum {
                int: 0,
                float: 0.0,
                all_int: true,
                rows: 0,
                source,
            },
            AggregateFunction::Average => Accumulator::Average {
                sum: 0.0,
                rows: 0,
                source,
            },
            AggregateFunction::Min => Accumulator::Extreme {
                current: None,
                keep_greater: false,
                source,
            },
            AggregateFunction::Max => Accumulator::Extreme {
                current: None,
                keep_greater: true,
                source,
            },
        }
    }

    fn push(&mut self, value: Option<&Value>) -> QueryResult<()> {
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum {
                int,
                float,
                all_int,
                rows,
                ..
            } => {
                let value = value.expect("aggregate source resolved");
                match value {
                    Value::Int64(v) => {
                        *int += v;
                        *float += *v as f64;
                    }
                    Value::Float64(v) => {
                        *all_int = false;
                        *float += v;
                    }
                    other => {
                        return Err(numeric_mismatch("sum", other));
                    }
                }
                *rows += 1;
            }
            Accumulator::Average { sum, rows, .. } => {
                let value = value.expect("aggregate source resolved");
                match value.as_f64() {
                    Some(v) => {
                        *sum += v;
                        *rows += 1;
                    }
                    None => return Err(numeric_mismatch("average", value)),
                }
            }
            Accumulator::Extreme {
                current,
                keep_greater,
                ..
            } => match current {
                None => *current = Some(value.expect("aggregate source resolved").clone()),
                Some(best) => {
                    let value = value.expect("aggregate source resolved");
                    let ordering = value.try_cmp(best)?;
                    // Strict comparison: ties retain the first-encountered value
                    let replace = if *keep_greater {
                        ordering == std::cmp::Ordering::Greater
                    } else {
                        ordering == std::cmp::Ordering::Less
                    };
                    if replace {
                        *current = Some(value.clone());
                    }
                }
            },
        }
        Ok(())
    }

    fn finalize(self) -> QueryResult<Value> {
        match self {
            Accumulator::Count(n) => Ok(Value::Int64(n as i64)),
            Accumulator::Sum {
                int,
                float,
                all_int,
                rows,
                source,
            } => {
                if rows == 0 {
                    return Err(QueryError::EmptyGroup { field: source });
                }
                if all_int {
                    Ok(Value::Int64(int))
                } else {
                    Ok(Value::Float64(float))
                }
            }
            Accumulator::Average { sum, rows, source } => {
                if rows == 0 {
                    return Err(QueryError::EmptyGroup { field: source });
                }
                Ok(Value::Float64(sum / rows as f64))
            }
            Accumulator::Extreme {
                current, source, ..
            } => current.ok_or(QueryError::EmptyGroup { field: source }),
        }
    }
}

fn numeric_mismatch(operation: &'static str, value: &Value) -> QueryError {
    QueryError::TypeMismatch {
        operation,
        left: value.data_type(),
        right: DataType::Float64,
    }
}

/// Partition `input` by its grouping fields and compute the declared
/// aggregates per partition.
///
/// Output tuples contain the declared fields in declared order, one tuple
/// per partition. With no grouping fields the whole input forms a single
/// global group (materialized even when the input is empty, so a global
/// `count` over an empty relation yields 0).
pub fn aggregate(input: &Relation, outputs: &[OutputField]) -> QueryResult<Relation> {
    if outputs.is_empty() {
        return Err(QueryError::ArityMismatch {
            context: "aggregate outputs".to_string(),
            expected: 1,
            got: 0,
        });
    }

    let schema = Schema::new(outputs.iter().map(|o| o.name.clone()))?;

    // Resolve source indices up front so unknown fields fail before any work
    let mut group_indices = Vec::new();
    let mut agg_specs: Vec<(AggregateFunction, Option<usize>, Option<String>)> = Vec::new();
    for output in outputs {
        match &output.kind {
            OutputKind::Group => {
                group_indices.push(input.schema().field_index(&output.name)?);
            }
            OutputKind::Aggregate { func, source } => {
                let index = match source {
                    Some(name) => Some(input.schema().field_index(name)?),
                    None => None,
                };
                agg_specs.push((*func, index, source.clone()));
            }
        }
    }

    // Partition in first-encounter order
    let mut order: Vec<Vec<Value>> = Vec::new();
    let mut groups: HashMap<Vec<Value>, (Tuple, Vec<Accumulator>)> = HashMap::new();

    if group_indices.is_empty() && input.is_empty() {
        // Single global group with zero rows
        order.push(Vec::new());
        groups.insert(
            Vec::new(),
            (
                Tuple::empty(),
                agg_specs
                    .iter()
                    .map(|(func, _, source)| Accumulator::new(*func, source.as_ref()))
                    .collect(),
            ),
        );
    }

    for tuple in input.iter() {
        let key: Vec<Value> = group_indices
            .iter()
            .map(|&i| tuple.get(i).expect("arity checked on construction").clone())
            .collect();
        let entry = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (
                tuple.clone(),
                agg_specs
                    .iter()
                    .map(|(func, _, source)| Accumulator::new(*func, source.as_ref()))
                    .collect(),
            )
        });
        for ((_, source_index, _), accumulator) in agg_specs.iter().zip(entry.1.iter_mut()) {
            accumulator.push(source_index.map(|i| {
                tuple.get(i).expect("arity checked on construction")
            }))?;
        }
    }

    // Finalize once all rows of every group are consumed
    let mut tuples = Vec::with_capacity(order.len());
    for key in order {
        let (representative, accumulators) = groups
            .remove(&key)
            .expect("every ordered key has a group entry");
        let mut finalized = accumulators
            .into_iter()
            .map(Accumulator::finalize)
            .collect::<QueryResult<Vec<Value>>>()?
            .into_iter();

        let mut values = Vec::with_capacity(outputs.len());
        let mut group_cursor = group_indices.iter();
        for output in outputs {
            match output.kind {
                OutputKind::Group => {
                    let &index = group_cursor.next().expect("group indices match outputs");
                    values.push(
                        representative
                            .get(index)
                            .expect("arity checked on construction")
                            .clone(),
                    );
                }
                OutputKind::Aggregate { .. } => {
                    values.push(finalized.next().expect("accumulators match outputs"));
                }
            }
        }
        tuples.push(Tuple::new(values));
    }

    debug!(
        input_rows = input.len(),
        groups = tuples.len(),
        "aggregate"
    );
    Relation::new(schema, tuples)
}
