//! Resource Limits Module
//!
//! Provides resource limit enforcement for query evaluation:
//! - Result set size limits
//! - Intermediate result limits
//! - Row width (tuple arity) limits
//!
//! ## Design
//!
//! Uses cooperative checking - the pipeline calls `check_*` methods after
//! each stage to verify limits are not exceeded. All limits are optional;
//! `None` means unlimited, and the default is fully permissive.

use serde::{Deserialize, Serialize};

/// Resource limit error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    /// Result size limit exceeded
    #[error("Result size limit exceeded: {actual} rows, limit {limit} rows")]
    ResultRowsExceeded { limit: usize, actual: usize },

    /// Intermediate result size exceeded
    #[error("Intermediate result limit exceeded at '{stage}': {actual} rows, limit {limit} rows")]
    IntermediateRowsExceeded {
        limit: usize,
        actual: usize,
        stage: String,
    },

    /// Row width (tuple arity) exceeded
    #[error("Row width limit exceeded: {actual} fields, limit {limit} fields")]
    RowWidthExceeded { limit: usize, actual: usize },
}

/// Resource limits configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of rows in the final result (None = unlimited)
    #[serde(default)]
    pub max_result_rows: Option<usize>,

    /// Maximum number of rows in intermediate results (None = unlimited)
    #[serde(default)]
    pub max_intermediate_rows: Option<usize>,

    /// Maximum row width, i.e. fields per tuple (None = unlimited)
    #[serde(default)]
    pub max_row_width: Option<usize>,
}

impl ResourceLimits {
    /// Fully permissive limits
    pub fn unlimited() -> Self {
        ResourceLimits::default()
    }

    /// Check an intermediate stage's output size
    pub fn check_intermediate(&self, stage: &str, rows: usize) -> Result<(), ResourceError> {
        match self.max_intermediate_rows {
            Some(limit) if rows > limit => Err(ResourceError::IntermediateRowsExceeded {
                limit,
                actual: rows,
                stage: stage.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Check the final result size
    pub fn check_result(&self, rows: usize) -> Result<(), ResourceError> {
        match self.max_result_rows {
            Some(limit) if rows > limit => Err(ResourceError::ResultRowsExceeded {
                limit,
                actual: rows,
            }),
            _ => Ok(()),
        }
    }

    /// Check a schema's row width
    pub fn check_row_width(&self, width: usize) -> Result<(), ResourceError> {
        match self.max_row_width {
            Some(limit) if width > limit => Err(ResourceError::RowWidthExceeded {
                limit,
                actual: width,
            }),
            _ => Ok(()),
        }
    }
}
