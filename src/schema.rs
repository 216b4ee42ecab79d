//! Relation Schemas
//!
//! A schema is an ordered sequence of unique field names. Fields carry no
//! declared type; values are runtime-typed (see [`crate::value`]). Schemas
//! resolve field names to tuple positions for every pipeline stage.

use std::fmt;

use crate::error::{QueryError, QueryResult};

/// Ordered field names of a relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    /// Create a schema from field names, rejecting duplicates
    pub fn new<I, S>(fields: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        for (i, name) in fields.iter().enumerate() {
            if fields[..i].contains(name) {
                return Err(QueryError::DuplicateField {
                    field: name.clone(),
                });
            }
        }
        Ok(Schema { fields })
    }

    /// Get the number of fields
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Get field name by index
    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Get all field names
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    /// Resolve a field name to its tuple position
    pub fn field_index(&self, name: &str) -> QueryResult<usize> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| QueryError::UnknownField {
                field: name.to_string(),
                schema: self.to_string(),
            })
    }

    /// Resolve several field names at once, preserving the requested order
    pub fn field_indices(&self, names: &[String]) -> QueryResult<Vec<usize>> {
        names.iter().map(|n| self.field_index(n)).collect()
    }

    /// True if the schema declares the given field
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Create a schema for a projection of the named fields
    pub fn project(&self, names: &[String]) -> QueryResult<Schema> {
        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            self.field_index(name)?;
            fields.push(name.clone());
        }
        Schema::new(fields)
    }

    /// Field names shared with another schema, in this schema's order
    pub fn shared_fields(&self, other: &Schema) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| other.contains(f))
            .cloned()
            .collect()
    }

    /// Join output schema: all of this schema's fields, then the other
    /// schema's fields that are not shared. Duplicate names across the two
    /// inputs are the same logical field and appear once.
    pub fn merge(&self, other: &Schema) -> Schema {
        let mut fields = self.fields.clone();
        fields.extend(
            other
                .fields
                .iter()
                .filter(|f| !self.contains(f))
                .cloned(),
        );
        Schema { fields }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let schema = Schema::new(["name", "age"]).unwrap();
        assert_eq!(schema.arity(), 2);
        assert_eq!(schema.field_name(0), Some("name"));
        assert_eq!(schema.field_index("age").unwrap(), 1);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::new(["user", "game", "user"]).unwrap_err();
        assert!(matches!(err, QueryError::DuplicateField { .. }));
    }

    #[test]
    fn test_unknown_field() {
        let schema = Schema::new(["name", "age"]).unwrap();
        let err = schema.field_index("country").unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
    }

    #[test]
    fn test_project_preserves_requested_order() {
        let schema = Schema::new(["name", "user", "age"]).unwrap();
        let projected = schema.project(&["age".into(), "name".into()]).unwrap();
        assert_eq!(projected.field_names(), &["age", "name"]);
    }

    #[test]
    fn test_merge_keeps_shared_fields_once() {
        let users = Schema::new(["name", "user", "age"]).unwrap();
        let scores = Schema::new(["user", "game", "score"]).unwrap();

        assert_eq!(users.shared_fields(&scores), vec!["user"]);
        let merged = users.merge(&scores);
        assert_eq!(
            merged.field_names(),
            &["name", "user", "age", "game", "score"]
        );
    }
}
