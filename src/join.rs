//! Join Engine
//!
//! Strict inner equi-join across relations. The join key is implicit: the
//! set of field names shared by the inputs. Tuples combine iff their
//! shared-key values are pairwise equal; the output schema is the union
//! of the input field names with shared names kept once.
//!
//! Implemented as a hash join: build an index keyed by the join-key
//! values on the smaller relation, probe with the other relation's rows
//! in order. Multiple matches for a key produce the cross product. An
//! empty result is a valid outcome, not an error.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::relation::Relation;
use crate::value::{Tuple, Value};

/// Equi-join two relations on their shared field names
pub fn join(left: &Relation, right: &Relation) -> QueryResult<Relation> {
    let shared = left.schema().shared_fields(right.schema());
    if shared.is_empty() {
        return Err(QueryError::NoSharedFields {
            left: left.schema().to_string(),
            right: right.schema().to_string(),
        });
    }

    let left_keys = left.schema().field_indices(&shared)?;
    let right_keys = right.schema().field_indices(&shared)?;

    // Right-side fields that are not part of the shared key / left schema
    let right_extra: Vec<usize> = right
        .schema()
        .field_names()
        .iter()
        .enumerate()
        .filter(|(_, name)| !left.schema().contains(name))
        .map(|(i, _)| i)
        .collect();

    let schema = left.schema().merge(right.schema());

    // Build on the smaller side, probe with the larger; output rows are
    // emitted in probe order so the result is deterministic either way.
    let mut tuples = Vec::new();
    if left.len() <= right.len() {
        let index = build_index(left, &left_keys);
        for probe in right.iter() {
            let key = key_of(probe, &right_keys);
            if let Some(matches) = index.get(&key) {
                for &build in matches {
                    tuples.push(combine(build, probe, &right_extra));
                }
            }
        }
    } else {
        let index = build_index(right, &right_keys);
        for probe in left.iter() {
            let key = key_of(probe, &left_keys);
            if let Some(matches) = index.get(&key) {
                for &build in matches {
                    tuples.push(combine(probe, build, &right_extra));
                }
            }
        }
    }

    debug!(
        key = %shared.join(", "),
        left_rows = left.len(),
        right_rows = right.len(),
        output_rows = tuples.len(),
        "join"
    );
    Relation::new(schema, tuples)
}

/// Join two or more relations, folding pairwise left to right
pub fn join_all(relations: &[Relation]) -> QueryResult<Relation> {
    let (first, rest) = relations.split_first().ok_or(QueryError::ArityMismatch {
        context: "join sources".to_string(),
        expected: 2,
        got: 0,
    })?;
    let mut result = first.clone();
    for relation in rest {
        result = join(&result, relation)?;
    }
    Ok(result)
}

fn build_index<'a>(
    relation: &'a Relation,
    keys: &[usize],
) -> HashMap<Vec<Value>, Vec<&'a Tuple>> {
    let mut index: HashMap<Vec<Value>, Vec<&Tuple>> = HashMap::with_capacity(relation.len());
    for tuple in relation.iter() {
        index.entry(key_of(tuple, keys)).or_default().push(tuple);
    }
    index
}

fn key_of(tuple: &Tuple, keys: &[usize]) -> Vec<Value> {
    keys.iter()
        .map(|&i| tuple.get(i).expect("arity checked on construction").clone())
        .collect()
}

fn combine(left: &Tuple, right: &Tuple, right_extra: &[usize]) -> Tuple {
    let mut values: Vec<Value> = left.values().to_vec();
    values.extend(
        right_extra
            .iter()
            .map(|&i| right.get(i).expect("arity checked on construction").clone()),
    );
    Tuple::new(values)
}
