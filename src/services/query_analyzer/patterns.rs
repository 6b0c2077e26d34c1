//! Named lexical predicates over SQL text
//!
//! Every predicate is case-insensitive and works on the raw statement text.
//! Matches are reported as the snippet that triggered them so callers can
//! use it as evidence.

use once_cell::sync::Lazy;
use regex::Regex;

static SELECT_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bSELECT\s+\*").unwrap());

static WHERE_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bWHERE\b").unwrap());

static OR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bOR\b").unwrap());

static LEADING_WILDCARD_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bLIKE\s+['"]%[^%][^'"]*['"]?"#).unwrap());

static WHERE_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\bWHERE\s+([^;]+)").unwrap());

/// Clause keywords that end a WHERE body
static WHERE_TERMINATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(GROUP\s+BY|ORDER\s+BY|HAVING|LIMIT|UNION)\b").unwrap());

static FUNCTION_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z_][A-Z0-9_]*\([^)]+\)").unwrap());

static STARTS_WITH_SELECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*SELECT\b").unwrap());

static JOIN_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bJOIN\b").unwrap());

static AGGREGATE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(COUNT|SUM|AVG|MAX|MIN)\s*\(").unwrap());

static FROM_SUBQUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\bFROM\s*\([^)]*?\bSELECT\b").unwrap());

/// Plan operators that indicate an unpruned scan
pub const PLAN_SCAN_MARKERS: &[&str] = &["OLAP_SCAN", "FULL_SCAN"];

/// `SELECT *` anywhere in the statement
pub fn find_select_star(sql: &str) -> Option<&str> {
    SELECT_STAR.find(sql).map(|m| m.as_str())
}

pub fn has_where(sql: &str) -> bool {
    WHERE_KEYWORD.is_match(sql)
}

/// An `OR` token in a statement that has a WHERE clause
///
/// The token is not required to sit inside the WHERE body.
pub fn find_or_condition(sql: &str) -> Option<&str> {
    if !has_where(sql) {
        return None;
    }
    OR_TOKEN.find(sql).map(|m| m.as_str())
}

/// `LIKE '%...'` with a single leading wildcard
pub fn find_leading_wildcard_like(sql: &str) -> Option<&str> {
    LEADING_WILDCARD_LIKE.find(sql).map(|m| m.as_str())
}

/// Body of the first WHERE clause, up to the next clause keyword or `;`
pub fn where_clause(sql: &str) -> Option<&str> {
    let body = WHERE_BODY.captures(sql)?.get(1)?.as_str();
    let body = match WHERE_TERMINATOR.find(body) {
        Some(m) => &body[..m.start()],
        None => body,
    };
    let body = body.trim();
    if body.is_empty() { None } else { Some(body) }
}

/// First function-call-shaped token inside the WHERE body
pub fn find_function_in_where(sql: &str) -> Option<&str> {
    let body = where_clause(sql)?;
    FUNCTION_CALL.find(body).map(|m| m.as_str())
}

/// A plain SELECT that reads without any filter
///
/// JOINs and aggregate-only statements are excluded; both legitimately
/// read whole inputs.
pub fn lacks_where_clause(sql: &str) -> bool {
    STARTS_WITH_SELECT.is_match(sql)
        && !has_where(sql)
        && !JOIN_KEYWORD.is_match(sql)
        && !AGGREGATE_CALL.is_match(sql)
}

/// `FROM (SELECT ...` derived table
pub fn find_from_subquery(sql: &str) -> Option<&str> {
    FROM_SUBQUERY.find(sql).map(|m| m.as_str())
}

/// First scan marker found in the plan text
pub fn plan_scan_marker(plan_text: &str) -> Option<&'static str> {
    let upper = plan_text.to_uppercase();
    PLAN_SCAN_MARKERS.iter().copied().find(|marker| upper.contains(marker))
}
