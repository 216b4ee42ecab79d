//! # relq — In-Memory Relational Query Evaluator
//!
//! A small, self-contained evaluator for declarative query pipelines
//! over in-memory tuple relations: projection, filtering, equi-joins,
//! grouping with aggregation, stable sorting, and top-N-per-group.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Relation(s)
//!     ↓
//! [Join Engine]          → equi-join on shared field names (if > 1 source)
//!     ↓
//! [Predicate Evaluator]  → filters and per-row transforms
//!     ↓
//! [Group/Aggregate]      → partition by declared grouping fields,
//!     ↓                    count / sum / average / min / max
//! [Sort/Limit]           → stable sort, limit, top-N-per-group
//!     ↓
//! Relation
//! ```
//!
//! Every stage consumes its input immutably and materializes a fresh
//! relation, so queries and sub-queries are referentially transparent:
//! the same pipeline over the same inputs always produces the same
//! output, and a sub-query can be embedded in several enclosing queries
//! without aliasing effects.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relq::{Filter, OutputField, Query, Relation, Value};
//!
//! let scores = Relation::build(
//!     ["user", "game", "score"],
//!     vec![
//!         vec!["ann".into(), "Tetris".into(), Value::Int64(7000)],
//!         vec!["bob".into(), "Chess".into(), Value::Int64(50)],
//!     ],
//! )?;
//!
//! // Top 3 scorers per game
//! let top = Query::from(scores.clone())
//!     .top_per_group(&["game"], &["score"], 3)
//!     .evaluate()?;
//!
//! // Best score for one game, reusable as a sub-query
//! let best_chess = Query::from(scores)
//!     .filter(Filter::eq("game", "Chess"))
//!     .aggregate(vec![OutputField::max("score", "best")])
//!     .evaluate()?;
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `value` | Scalar values and fixed-arity tuples |
//! | `schema` | Ordered, unique field names |
//! | `relation` | Materialized relations: project, select, distinct, union |
//! | `predicate` | Filters (incl. custom boolean functions) and transforms |
//! | `join` | Hash equi-join on shared field names |
//! | `aggregate` | Grouping and aggregate functions |
//! | `sort` | Stable sort, limit, top-N-per-group |
//! | `query` | Pipeline builder and sub-query composition |
//! | `execution` | Cooperative resource limits |
//! | `config` | Hierarchical TOML + environment configuration |

pub mod aggregate;
pub mod config;
pub mod error;
pub mod execution;
pub mod join;
pub mod predicate;
pub mod query;
pub mod relation;
pub mod schema;
pub mod sort;
pub mod value;

// Re-export the public surface
pub use aggregate::{aggregate, AggregateFunction, OutputField};
pub use config::{Config, LoggingConfig};
pub use error::{QueryError, QueryResult};
pub use execution::{ResourceError, ResourceLimits};
pub use join::{join, join_all};
pub use predicate::{CompareOp, Filter, Transform};
pub use query::{Query, Source};
pub use relation::Relation;
pub use schema::Schema;
pub use sort::{sort, Direction, SortSpec};
pub use value::{DataType, Tuple, Value};
