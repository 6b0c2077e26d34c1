//! Statement-structure rule (P003)
//!
//! Purely lexical checks on the SQL text. The text is scanned first; an
//! empty statement has nothing to report, a malformed one fails the pass.

use super::*;
use crate::services::query_analyzer::patterns;
use crate::services::query_analyzer::scanner::{self, ScanError};

/// P003: Statement structure
/// Condition: SELECT *, OR in WHERE, leading-wildcard LIKE, function in WHERE,
/// unfiltered SELECT, FROM-subquery
pub struct P003StatementStructure;

impl DetectionPass for P003StatementStructure {
    fn id(&self) -> &str {
        "P003"
    }
    fn name(&self) -> &str {
        "Statement structure"
    }

    fn evaluate(&self, context: &DetectionContext) -> Result<Vec<Problem>, DetectError> {
        let sql = context.record.query_text.as_str();

        match scanner::scan(sql) {
            Ok(()) => {},
            Err(ScanError::Empty) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let mut problems = Vec::new();

        if let Some(hit) = patterns::find_select_star(sql) {
            problems.push(Problem::new(
                ProblemType::SelectStar,
                Severity::Medium,
                "Query uses SELECT *",
                "List only the columns you need to cut I/O and network transfer",
                hit,
            ));
        }

        if let Some(hit) = patterns::find_or_condition(sql) {
            problems.push(Problem::new(
                ProblemType::OrCondition,
                Severity::Low,
                "WHERE clause contains OR, which may prevent index use",
                "Consider splitting into UNION ALL branches or using IN",
                hit,
            ));
        }

        if let Some(hit) = patterns::find_leading_wildcard_like(sql) {
            problems.push(Problem::new(
                ProblemType::LikePrefixWildcard,
                Severity::High,
                "LIKE pattern starts with a wildcard and cannot use an index",
                "Avoid leading % in LIKE; consider full-text search or an n-gram index",
                hit,
            ));
        }

        if let Some(hit) = patterns::find_function_in_where(sql) {
            problems.push(Problem::new(
                ProblemType::FunctionInWhere,
                Severity::Medium,
                "WHERE clause applies a function to a column",
                "Move the function to the constant side or precompute the value",
                hit,
            ));
        }

        if patterns::lacks_where_clause(sql) {
            problems.push(Problem::new(
                ProblemType::NoWhereClause,
                Severity::High,
                "Query has no WHERE clause and may scan the whole table",
                "Add filter conditions or a LIMIT to bound the rows read",
                "no WHERE clause",
            ));
        }

        if let Some(hit) = patterns::find_from_subquery(sql) {
            problems.push(Problem::new(
                ProblemType::SubqueryInefficient,
                Severity::Medium,
                "Query reads from a derived-table subquery",
                "Consider rewriting the subquery as a JOIN or a CTE",
                hit,
            ));
        }

        Ok(problems)
    }
}
