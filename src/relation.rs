//! Materialized Relations
//!
//! A relation is a schema plus an ordered sequence of tuples. Every
//! pipeline stage consumes relations immutably and produces a fresh one,
//! so sub-queries can be reused across enclosing queries without aliasing
//! side effects. Insertion order is preserved unless a sort stage
//! reorders it.

use std::collections::HashSet;

use crate::error::{QueryError, QueryResult};
use crate::schema::Schema;
use crate::value::{Tuple, Value};

/// An ordered, schema-typed collection of tuples
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    schema: Schema,
    tuples: Vec<Tuple>,
}

impl Relation {
    /// Create a relation, checking every tuple against the schema arity
    pub fn new(schema: Schema, tuples: Vec<Tuple>) -> QueryResult<Self> {
        for (row, tuple) in tuples.iter().enumerate() {
            if tuple.arity() != schema.arity() {
                return Err(QueryError::ArityMismatch {
                    context: format!("row {}", row),
                    expected: schema.arity(),
                    got: tuple.arity(),
                });
            }
        }
        Ok(Relation { schema, tuples })
    }

    /// Create an empty relation with the given schema
    pub fn empty(schema: Schema) -> Self {
        Relation {
            schema,
            tuples: Vec::new(),
        }
    }

    /// Convenience constructor from field names and raw rows
    pub fn build<S, I>(fields: I, rows: Vec<Vec<Value>>) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = Schema::new(fields)?;
        let tuples = rows.into_iter().map(Tuple::new).collect();
        Relation::new(schema, tuples)
    }

    /// The relation's schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// True if the relation has no rows
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// The rows in order
    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    /// Iterate over the rows
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    /// Consume the relation, yielding its rows
    pub fn into_tuples(self) -> Vec<Tuple> {
        self.tuples
    }

    /// Get one value by row index and field name.
    ///
    /// Fails on an undeclared field; panics if `row` is out of bounds,
    /// like slice indexing.
    pub fn value_at(&self, row: usize, field: &str) -> QueryResult<&Value> {
        let index = self.schema.field_index(field)?;
        Ok(self.tuples[row]
            .get(index)
            .expect("arity checked on construction"))
    }

    /// Project to the named fields, preserving row count and row order
    pub fn project(&self, fields: &[String]) -> QueryResult<Relation> {
        let indices = self.schema.field_indices(fields)?;
        let schema = self.schema.project(fields)?;
        let tuples = self.tuples.iter().map(|t| t.project(&indices)).collect();
        Ok(Relation { schema, tuples })
    }

    /// Keep the rows for which the predicate returns true, in order
    pub fn select<F>(&self, predicate: F) -> QueryResult<Relation>
    where
        F: Fn(&Tuple) -> QueryResult<bool>,
    {
        let mut tuples = Vec::new();
        for tuple in &self.tuples {
            if predicate(tuple)? {
                tuples.push(tuple.clone());
            }
        }
        Ok(Relation {
            schema: self.schema.clone(),
            tuples,
        })
    }

    /// Remove duplicate rows, keeping the first occurrence of each
    pub fn distinct(&self) -> Relation {
        let mut seen: HashSet<&Tuple> = HashSet::with_capacity(self.tuples.len());
        let mut tuples = Vec::new();
        for tuple in &self.tuples {
            if seen.insert(tuple) {
                tuples.push(tuple.clone());
            }
        }
        Relation {
            schema: self.schema.clone(),
            tuples,
        }
    }

    /// Concatenate a schema-compatible relation after this one
    pub fn union(&self, other: &Relation) -> QueryResult<Relation> {
        if other.schema.arity() != self.schema.arity() {
            return Err(QueryError::ArityMismatch {
                context: "union".to_string(),
                expected: self.schema.arity(),
                got: other.schema.arity(),
            });
        }
        // Field names must match positionally; a union across reordered
        // schemas would silently misalign columns
        for (i, name) in other.schema.field_names().iter().enumerate() {
            if self.schema.field_name(i) != Some(name.as_str()) {
                return Err(QueryError::UnknownField {
                    field: name.clone(),
                    schema: self.schema.to_string(),
                });
            }
        }
        let mut tuples = self.tuples.clone();
        tuples.extend(other.tuples.iter().cloned());
        Ok(Relation {
            schema: self.schema.clone(),
            tuples,
        })
    }
}

impl<'a> IntoIterator for &'a Relation {
    type Item = &'a Tuple;
    type IntoIter = std::slice::Iter<'a, Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.tuples.iter()
    }
}
