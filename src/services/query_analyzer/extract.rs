//! Lexical extraction of table and column names
//!
//! Best effort only: names are pulled out with regexes, so quoted
//! identifiers containing spaces and exotic syntax are not handled.

use once_cell::sync::Lazy;
use regex::Regex;

use super::patterns::where_clause;
use crate::utils::unique_ordered;

static TABLE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN|INTO|UPDATE|TABLE)\s+([^\s,;]+)").unwrap()
});

/// Column compared with `=`, `<`, `>` or `!`
static COMPARED_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*[=<>!]").unwrap());

static ORDER_BY_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bORDER\s+BY\s+([^;]+)").unwrap());

static JOIN_CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\bON\s+([^;]+?)(?:\bJOIN\b|\bWHERE\b|\bGROUP\s+BY\b|\bORDER\s+BY\b|$)")
        .unwrap()
});

/// Identifier, keeping only the column part of `alias.column`
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[A-Za-z_][A-Za-z0-9_]*\.)?([A-Za-z_][A-Za-z0-9_]*)\b").unwrap()
});

/// Tokens after FROM/JOIN/... that are not table names
const NON_TABLE_WORDS: &[&str] =
    &["WHERE", "ON", "SELECT", "AS", "SET", "VALUES", "LATERAL", "IF", "DUAL"];

/// Keywords that can appear inside ORDER BY and ON bodies
const CLAUSE_KEYWORDS: &[&str] = &[
    "AND", "OR", "NOT", "ON", "AS", "ASC", "DESC", "LIMIT", "OFFSET", "NULLS", "FIRST", "LAST",
    "IS", "NULL", "IN", "LEFT", "RIGHT", "INNER", "OUTER", "FULL", "CROSS", "USING", "BETWEEN",
    "LIKE", "TRUE", "FALSE",
];

fn is_clause_keyword(word: &str) -> bool {
    CLAUSE_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// Tables referenced after FROM, JOIN, INTO, UPDATE or TABLE, in order of appearance
///
/// A keyword inside a function call, such as `EXTRACT(YEAR FROM ts)`, is not
/// a table reference and is skipped.
pub fn extract_tables(sql: &str) -> Vec<String> {
    let tables = TABLE_REF
        .captures_iter(sql)
        .filter(|caps| caps.get(0).is_some_and(|m| !inside_function_call(sql, m.start())))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|raw| !raw.starts_with('('))
        .map(|raw| {
            raw.chars()
                .filter(|c| !matches!(c, '`' | '"' | '[' | ']' | ')'))
                .collect::<String>()
        })
        .filter(|name| {
            !name.is_empty() && !NON_TABLE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(name))
        })
        .collect();

    unique_ordered(tables)
}

/// Whether `pos` sits in a parenthesized group that is not a subquery
fn inside_function_call(sql: &str, pos: usize) -> bool {
    let mut open = Vec::new();
    for (i, c) in sql[..pos].char_indices() {
        match c {
            '(' => open.push(i),
            ')' => {
                open.pop();
            },
            _ => {},
        }
    }
    let Some(&paren) = open.last() else {
        return false;
    };
    let inner = sql[paren + 1..].trim_start();
    !inner.get(..6).is_some_and(|head| head.eq_ignore_ascii_case("SELECT"))
}

/// Columns compared in the WHERE clause
pub fn extract_where_columns(sql: &str) -> Vec<String> {
    let Some(body) = where_clause(sql) else {
        return Vec::new();
    };
    let columns = COMPARED_COLUMN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|word| !is_clause_keyword(word))
        .map(str::to_string)
        .collect();

    unique_ordered(columns)
}

/// Identifiers in the ORDER BY clause
pub fn extract_order_columns(sql: &str) -> Vec<String> {
    let Some(body) = ORDER_BY_BODY.captures(sql).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };
    identifiers(body.as_str())
}

/// Identifiers in every JOIN ... ON condition
pub fn extract_join_columns(sql: &str) -> Vec<String> {
    let columns = JOIN_CONDITION
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .flat_map(|m| identifiers(m.as_str()))
        .collect();

    unique_ordered(columns)
}

fn identifiers(text: &str) -> Vec<String> {
    let words = IDENTIFIER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|word| !is_clause_keyword(word))
        .map(str::to_string)
        .collect();

    unique_ordered(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tables_in_order() {
        let sql = "SELECT * FROM `sales`.`orders` o JOIN customers c ON o.cid = c.id";
        assert_eq!(extract_tables(sql), vec!["sales.orders", "customers"]);
    }

    #[test]
    fn test_extract_tables_skips_subqueries_and_keywords() {
        let sql = "SELECT * FROM (SELECT id FROM events) x";
        assert_eq!(extract_tables(sql), vec!["events"]);
        assert_eq!(extract_tables("INSERT INTO logs SELECT * FROM staging"), vec!["logs", "staging"]);
        assert_eq!(extract_tables("UPDATE users SET a = 1"), vec!["users"]);
        assert!(extract_tables("SELECT 1").is_empty());
    }

    #[test]
    fn test_extract_tables_ignores_from_inside_function_calls() {
        let sql = "SELECT EXTRACT(YEAR FROM ts), TRIM(BOTH ' ' FROM name) FROM events \
                   WHERE id IN (SELECT event_id FROM flagged)";
        assert_eq!(extract_tables(sql), vec!["events", "flagged"]);
    }

    #[test]
    fn test_extract_where_columns() {
        let sql = "SELECT * FROM orders WHERE status = 'pending' AND amount > 100 ORDER BY id";
        assert_eq!(extract_where_columns(sql), vec!["status", "amount"]);
        assert!(extract_where_columns("SELECT * FROM orders").is_empty());
    }

    #[test]
    fn test_extract_order_columns() {
        let sql = "SELECT * FROM t ORDER BY t.created_at DESC, id ASC LIMIT 10";
        assert_eq!(extract_order_columns(sql), vec!["created_at", "id"]);
    }

    #[test]
    fn test_extract_join_columns() {
        let sql = "SELECT * FROM o JOIN c ON o.customer_id = c.id \
                   LEFT JOIN r ON r.region_id = c.region_id WHERE o.x = 1";
        assert_eq!(extract_join_columns(sql), vec!["customer_id", "id", "region_id"]);
    }
}
