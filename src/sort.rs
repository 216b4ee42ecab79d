//! Sort/Limit Engine
//!
//! Orders a relation by one or more fields with a single direction flag
//! for the whole sort key, optionally truncating to the first N rows.
//! Composed with grouping fields it becomes top-N-per-group: partitions
//! are formed in first-encounter order, each partition is sorted and
//! truncated independently, and the partitions are concatenated.
//!
//! Sorting is stable: rows with equal sort keys keep their original
//! relative order, which is what makes "two oldest users per country"
//! style queries deterministic.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::relation::Relation;
use crate::value::{Tuple, Value};

/// Sort direction, applied to the whole sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A sort/limit declaration
#[derive(Debug, Clone)]
pub struct SortSpec {
    fields: Vec<String>,
    direction: Direction,
    limit: Option<usize>,
    group_by: Vec<String>,
}

impl SortSpec {
    /// Sort ascending by the given fields
    pub fn by<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SortSpec {
            fields: fields.into_iter().map(Into::into).collect(),
            direction: Direction::Ascending,
            limit: None,
            group_by: Vec::new(),
        }
    }

    /// Switch to descending order
    pub fn descending(mut self) -> Self {
        self.direction = Direction::Descending;
        self
    }

    /// Keep only the first `n` rows (per group, if grouped)
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Partition by the given fields and sort/limit inside each partition
    pub fn per_group<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Sort (and optionally truncate) a relation according to a [`SortSpec`]
pub fn sort(input: &Relation, spec: &SortSpec) -> QueryResult<Relation> {
    let sort_indices = input.schema().field_indices(&spec.fields)?;

    if spec.group_by.is_empty() {
        let mut tuples: Vec<Tuple> = input.tuples().to_vec();
        sort_tuples(&mut tuples, &sort_indices, spec.direction)?;
        if let Some(n) = spec.limit {
            tuples.truncate(n);
        }
        debug!(rows = tuples.len(), grouped = false, "sort");
        return Relation::new(input.schema().clone(), tuples);
    }

    // Top-N-per-group: partition first, in first-encounter order
    let group_indices = input.schema().field_indices(&spec.group_by)?;
    let mut order: Vec<Vec<Value>> = Vec::new();
    let mut partitions: HashMap<Vec<Value>, Vec<Tuple>> = HashMap::new();
    for tuple in input.iter() {
        let key: Vec<Value> = group_indices
            .iter()
            .map(|&i| tuple.get(i).expect("arity checked on construction").clone())
            .collect();
        if !partitions.contains_key(&key) {
            order.push(key.clone());
        }
        partitions.entry(key).or_default().push(tuple.clone());
    }

    let mut tuples = Vec::with_capacity(input.len());
    for key in order {
        let mut partition = partitions
            .remove(&key)
            .expect("every ordered key has a partition");
        sort_tuples(&mut partition, &sort_indices, spec.direction)?;
        if let Some(n) = spec.limit {
            partition.truncate(n);
        }
        tuples.extend(partition);
    }
    debug!(rows = tuples.len(), grouped = true, "sort");
    Relation::new(input.schema().clone(), tuples)
}

/// Stable sort by the lexicographic sort-field key.
///
/// `sort_by` requires an infallible comparator, so a comparison failure
/// is captured and rechecked afterwards; the stable sort leaves order
/// untouched for pairs reported equal, which is harmless given the
/// result is discarded on error.
fn sort_tuples(
    tuples: &mut [Tuple],
    indices: &[usize],
    direction: Direction,
) -> QueryResult<()> {
    let mut error: Option<QueryError> = None;
    tuples.sort_by(|a, b| {
        if error.is_some() {
            return Ordering::Equal;
        }
        for &index in indices {
            let left = a.get(index).expect("arity checked on construction");
            let right = b.get(index).expect("arity checked on construction");
            match left.try_cmp(right) {
                Ok(Ordering::Equal) => continue,
                Ok(ordering) => {
                    return match direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    };
                }
                Err(e) => {
                    error = Some(e);
                    return Ordering::Equal;
                }
            }
        }
        Ordering::Equal
    });
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
