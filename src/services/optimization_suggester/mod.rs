//! Suggestion generator
//!
//! Turns each detected problem into at most one optimization suggestion.
//! Dispatch is an exhaustive match on `ProblemType`, so a new problem kind
//! has to be mapped here explicitly before it compiles.

pub mod models;
pub mod templates;

#[cfg(test)]
mod tests;

pub use models::{Category, OptimizationSuggestion, Priority};

use crate::models::QueryRecord;
use crate::services::query_analyzer::{Problem, ProblemType};

type SuggestionBuilder = fn(&QueryRecord) -> OptimizationSuggestion;

fn builder_for(problem_type: ProblemType) -> Option<SuggestionBuilder> {
    match problem_type {
        ProblemType::FullTableScan => Some(templates::index_optimization),
        ProblemType::SelectStar => Some(templates::specific_columns),
        ProblemType::LikePrefixWildcard => Some(templates::like_optimization),
        ProblemType::OrCondition => Some(templates::or_replacement),
        ProblemType::FunctionInWhere => Some(templates::function_optimization),
        ProblemType::TooManyRows => Some(templates::row_reduction),
        ProblemType::SubqueryInefficient => Some(templates::cte_or_join),
        ProblemType::MemoryIntensive => Some(templates::memory_tuning),
        ProblemType::NoWhereClause => Some(templates::add_where_clause),
        ProblemType::NoIndex
        | ProblemType::JoinInefficient
        | ProblemType::OrderByExpensive
        | ProblemType::GroupByExpensive
        | ProblemType::LargeResultSet => None,
    }
}

/// One suggestion per problem with a template, in problem order
///
/// Problems of the same kind are not collapsed.
pub fn generate_suggestions(record: &QueryRecord, problems: &[Problem]) -> Vec<OptimizationSuggestion> {
    problems
        .iter()
        .filter_map(|problem| builder_for(problem.problem_type))
        .map(|build| build(record))
        .collect()
}
