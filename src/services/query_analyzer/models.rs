//! Problem models produced by the detector

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::models::Severity;

/// Closed set of problem kinds the detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemType {
    FullTableScan,
    NoIndex,
    TooManyRows,
    MemoryIntensive,
    JoinInefficient,
    SubqueryInefficient,
    #[serde(rename = "ORDERBY_EXPENSIVE")]
    OrderByExpensive,
    #[serde(rename = "GROUPBY_EXPENSIVE")]
    GroupByExpensive,
    LargeResultSet,
    NoWhereClause,
    SelectStar,
    OrCondition,
    LikePrefixWildcard,
    FunctionInWhere,
}

impl ProblemType {
    /// Symbolic name, as used in JSON reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTableScan => "FULL_TABLE_SCAN",
            Self::NoIndex => "NO_INDEX",
            Self::TooManyRows => "TOO_MANY_ROWS",
            Self::MemoryIntensive => "MEMORY_INTENSIVE",
            Self::JoinInefficient => "JOIN_INEFFICIENT",
            Self::SubqueryInefficient => "SUBQUERY_INEFFICIENT",
            Self::OrderByExpensive => "ORDERBY_EXPENSIVE",
            Self::GroupByExpensive => "GROUPBY_EXPENSIVE",
            Self::LargeResultSet => "LARGE_RESULT_SET",
            Self::NoWhereClause => "NO_WHERE_CLAUSE",
            Self::SelectStar => "SELECT_STAR",
            Self::OrCondition => "OR_CONDITION",
            Self::LikePrefixWildcard => "LIKE_PREFIX_WILDCARD",
            Self::FunctionInWhere => "FUNCTION_IN_WHERE",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullTableScan => "Full table scan",
            Self::NoIndex => "Missing index",
            Self::TooManyRows => "Too many rows scanned",
            Self::MemoryIntensive => "High memory usage",
            Self::JoinInefficient => "Inefficient JOIN",
            Self::SubqueryInefficient => "Inefficient subquery",
            Self::OrderByExpensive => "Expensive ORDER BY",
            Self::GroupByExpensive => "Expensive GROUP BY",
            Self::LargeResultSet => "Large result set",
            Self::NoWhereClause => "Missing WHERE clause",
            Self::SelectStar => "SELECT * usage",
            Self::OrCondition => "OR condition",
            Self::LikePrefixWildcard => "LIKE with leading wildcard",
            Self::FunctionInWhere => "Function in WHERE clause",
        }
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnosed problem on one query
///
/// Severity is assigned by the rule that found it, independent of the
/// query's overall severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub problem_type: ProblemType,
    pub severity: Severity,
    pub description: String,
    /// Generic remediation hint
    pub suggestion: String,
    /// Matched snippet or derived fact that triggered the problem
    pub evidence: String,
}

impl Problem {
    pub fn new(
        problem_type: ProblemType,
        severity: Severity,
        description: impl Into<String>,
        suggestion: impl Into<String>,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            problem_type,
            severity,
            description: description.into(),
            suggestion: suggestion.into(),
            evidence: evidence.into(),
        }
    }
}

/// Optional execution plan attached to a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionPlan {
    /// `EXPLAIN` output as returned by the server
    Text(String),
    Structured(serde_json::Value),
}

impl ExecutionPlan {
    /// Plan as flat text; structured plans are serialized to JSON
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            ExecutionPlan::Text(text) => Cow::Borrowed(text),
            ExecutionPlan::Structured(value) => Cow::Owned(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_plan_text() {
        let plan = ExecutionPlan::Structured(serde_json::json!({"node": "OLAP_SCAN"}));
        assert!(plan.as_text().contains("OLAP_SCAN"));
        assert_eq!(ExecutionPlan::Text("x".into()).as_text(), "x");
    }

    #[test]
    fn test_problem_type_serialization_matches_symbolic_name() {
        for pt in [
            ProblemType::FullTableScan,
            ProblemType::OrderByExpensive,
            ProblemType::GroupByExpensive,
            ProblemType::LikePrefixWildcard,
        ] {
            let json = serde_json::to_string(&pt).unwrap();
            assert_eq!(json, format!("\"{}\"", pt.as_str()));
        }
    }

    #[test]
    fn test_problem_type_roundtrip_from_name() {
        let parsed: ProblemType = serde_json::from_str("\"ORDERBY_EXPENSIVE\"").unwrap();
        assert_eq!(parsed, ProblemType::OrderByExpensive);
    }
}
