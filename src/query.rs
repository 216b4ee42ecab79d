//! Query Composer
//!
//! Chains the pipeline stages into a reusable query description:
//! sources → join (when more than one source) → the declared stages in
//! order. A query is a plain value; evaluating it never mutates the
//! sources, so the same query (or a sub-query embedded as a source) can
//! be evaluated any number of times with identical results.
//!
//! Sub-queries are composed by passing a `Query` where a source is
//! expected; there is no registry of named queries — a reusable query is
//! just an ordinary function returning a `Query`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relq::{CompareOp, Filter, OutputField, Query};
//!
//! // Count active users per country, keeping countries with >= 25
//! let per_country = Query::from(users)
//!     .filter(Filter::eq("active", true))
//!     .aggregate(vec![
//!         OutputField::group("country"),
//!         OutputField::count("count"),
//!     ])
//!     .filter(Filter::compare("count", CompareOp::Ge, 25i64))
//!     .evaluate()?;
//! ```

use tracing::debug;

use crate::aggregate::{aggregate, OutputField};
use crate::error::{QueryError, QueryResult};
use crate::execution::ResourceLimits;
use crate::join::join_all;
use crate::predicate::{Filter, Transform};
use crate::relation::Relation;
use crate::sort::{sort, SortSpec};

/// A query source: a materialized relation or a nested sub-query
#[derive(Debug, Clone)]
pub enum Source {
    /// An already-materialized relation
    Relation(Relation),
    /// A sub-query evaluated before the enclosing pipeline runs
    Query(Box<Query>),
}

impl From<Relation> for Source {
    fn from(relation: Relation) -> Self {
        Source::Relation(relation)
    }
}

impl From<Query> for Source {
    fn from(query: Query) -> Self {
        Source::Query(Box::new(query))
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Filter(Filter),
    Derive(Transform),
    Project(Vec<String>),
    Aggregate(Vec<OutputField>),
    Distinct,
    Sort(SortSpec),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Filter(_) => "filter",
            Stage::Derive(_) => "derive",
            Stage::Project(_) => "project",
            Stage::Aggregate(_) => "aggregate",
            Stage::Distinct => "distinct",
            Stage::Sort(_) => "sort",
        }
    }
}

/// A composable query pipeline over one or more sources
#[derive(Debug, Clone)]
pub struct Query {
    sources: Vec<Source>,
    stages: Vec<Stage>,
}

impl Query {
    /// Start a pipeline over a single source
    pub fn from(source: impl Into<Source>) -> Self {
        Query {
            sources: vec![source.into()],
            stages: Vec::new(),
        }
    }

    /// Start a pipeline joining two or more sources on their shared
    /// field names, folding pairwise left to right
    pub fn join<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Source>,
    {
        Query {
            sources: sources.into_iter().map(Into::into).collect(),
            stages: Vec::new(),
        }
    }

    /// Keep rows matching the filter. Filters declared in sequence
    /// combine as AND; use [`Filter::custom`] for OR.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.stages.push(Stage::Filter(filter));
        self
    }

    /// Append (or replace) one computed field per row
    pub fn derive(mut self, transform: Transform) -> Self {
        self.stages.push(Stage::Derive(transform));
        self
    }

    /// Project to the named fields, preserving row order
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages
            .push(Stage::Project(fields.into_iter().map(Into::into).collect()));
        self
    }

    /// Group by the declared grouping fields and aggregate
    pub fn aggregate(mut self, outputs: Vec<OutputField>) -> Self {
        self.stages.push(Stage::Aggregate(outputs));
        self
    }

    /// Remove duplicate rows, keeping first occurrences
    pub fn distinct(mut self) -> Self {
        self.stages.push(Stage::Distinct);
        self
    }

    /// Sort (and optionally truncate) per the given [`SortSpec`]
    pub fn sort(mut self, spec: SortSpec) -> Self {
        self.stages.push(Stage::Sort(spec));
        self
    }

    /// Keep only the first `n` rows, without reordering
    pub fn limit(mut self, n: usize) -> Self {
        self.stages
            .push(Stage::Sort(SortSpec::by(Vec::<String>::new()).limit(n)));
        self
    }

    /// Top-N-per-group: partition by `group_fields`, sort each partition
    /// descending by `sort_fields`, keep the first `n` rows per partition
    pub fn top_per_group(self, group_fields: &[&str], sort_fields: &[&str], n: usize) -> Self {
        self.sort(
            SortSpec::by(sort_fields.iter().map(|s| s.to_string()))
                .descending()
                .limit(n)
                .per_group(group_fields.iter().map(|s| s.to_string())),
        )
    }

    /// Evaluate with unlimited resources
    pub fn evaluate(&self) -> QueryResult<Relation> {
        self.evaluate_with(&ResourceLimits::unlimited())
    }

    /// Evaluate, cooperatively checking the given resource limits after
    /// every stage
    pub fn evaluate_with(&self, limits: &ResourceLimits) -> QueryResult<Relation> {
        if self.sources.is_empty() {
            return Err(QueryError::ArityMismatch {
                context: "query sources".to_string(),
                expected: 1,
                got: 0,
            });
        }

        // Materialize sources; nested queries evaluate first
        let mut inputs = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let relation = match source {
                Source::Relation(relation) => relation.clone(),
                Source::Query(query) => query.evaluate_with(limits)?,
            };
            inputs.push(relation);
        }

        let mut current = if inputs.len() == 1 {
            inputs.into_iter().next().expect("one source")
        } else {
            let joined = join_all(&inputs)?;
            limits.check_intermediate("join", joined.len())?;
            joined
        };
        limits.check_row_width(current.schema().arity())?;

        for stage in &self.stages {
            current = match stage {
                Stage::Filter(filter) => filter.apply(&current)?,
                Stage::Derive(transform) => transform.apply(&current)?,
                Stage::Project(fields) => current.project(fields)?,
                Stage::Aggregate(outputs) => aggregate(&current, outputs)?,
                Stage::Distinct => current.distinct(),
                Stage::Sort(spec) => sort(&current, spec)?,
            };
            limits.check_intermediate(stage.name(), current.len())?;
            limits.check_row_width(current.schema().arity())?;
            debug!(stage = stage.name(), rows = current.len(), "stage complete");
        }

        limits.check_result(current.len())?;
        Ok(current)
    }
}
