//! Execution Hardening
//!
//! Cooperative resource limit enforcement for query evaluation.

mod limits;

pub use limits::{ResourceError, ResourceLimits};
