//! Evaluator Error Types
//!
//! All pipeline stages report failures through a single [`QueryError`].
//! Errors are raised synchronously by the stage that detects them and
//! abort the whole evaluation; there is no partial or recovered execution.

use thiserror::Error;

use crate::execution::ResourceError;
use crate::value::DataType;

/// Query evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Reference to a field that is not declared in the schema
    #[error("Unknown field '{field}' (schema: [{schema}])")]
    UnknownField { field: String, schema: String },

    /// Duplicate field name within one schema
    #[error("Duplicate field '{field}' in schema")]
    DuplicateField { field: String },

    /// Tuple or function input count does not match the declared arity
    #[error("Arity mismatch at {context}: expected {expected}, got {got}")]
    ArityMismatch {
        context: String,
        expected: usize,
        got: usize,
    },

    /// Attempted join between relations with no shared field names
    #[error("Cannot join: no shared fields between [{left}] and [{right}]")]
    NoSharedFields { left: String, right: String },

    /// Aggregate requested over a group with zero contributing rows
    #[error("Cannot aggregate '{field}': group has no rows")]
    EmptyGroup { field: String },

    /// Comparison or arithmetic on incompatible scalar types
    #[error("Type mismatch: cannot {operation} {left:?} and {right:?}")]
    TypeMismatch {
        operation: &'static str,
        left: DataType,
        right: DataType,
    },

    /// Resource limit exceeded during evaluation
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Result type for query evaluation
pub type QueryResult<T> = Result<T, QueryError>;
