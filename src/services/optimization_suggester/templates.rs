//! Per-problem suggestion templates
//!
//! Every function here builds one suggestion for one problem kind. The SQL
//! they produce is an illustrative starting point for a human, not a
//! rewrite that has been checked for equivalence.

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{Category, OptimizationSuggestion, Priority};
use crate::models::QueryRecord;
use crate::services::query_analyzer::{
    extract_join_columns, extract_order_columns, extract_tables, extract_where_columns,
};
use crate::utils::unique_ordered;

static LEADING_WILDCARD_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bLIKE\s+(['"])%"#).unwrap());

const PLACEHOLDER_TABLE: &str = "your_table";
const PLACEHOLDER_COLUMNS: &str = "<columns>";

fn first_table(sql: &str) -> String {
    extract_tables(sql)
        .into_iter()
        .next()
        .unwrap_or_else(|| PLACEHOLDER_TABLE.to_string())
}

/// Columns worth indexing: WHERE comparisons, ORDER BY, JOIN ON
pub fn index_candidate_columns(sql: &str) -> Vec<String> {
    let mut columns = extract_where_columns(sql);
    columns.extend(extract_order_columns(sql));
    columns.extend(extract_join_columns(sql));
    unique_ordered(columns)
}

// ============================================================================
// Templates
// ============================================================================

pub fn index_optimization(record: &QueryRecord) -> OptimizationSuggestion {
    let sql = &record.query_text;
    let columns = index_candidate_columns(sql);
    let column_list =
        if columns.is_empty() { PLACEHOLDER_COLUMNS.to_string() } else { columns.join(", ") };

    let suggested = format!(
        "-- Index template, adjust table and column order before use\n\
         CREATE INDEX idx_optimization ON {} ({});",
        first_table(sql),
        column_list
    );

    OptimizationSuggestion::new(
        "Add an index for the filtered columns",
        format!(
            "Query ran for {:.2}s; an index on the filtered and joined columns may avoid a full scan",
            record.execution_time
        ),
        Priority::High,
        Category::Index,
        sql.as_str(),
    )
    .with_suggested_sql(suggested)
    .with_estimated_improvement("Estimated 50%-90% faster when the index is selective")
    .with_implementation_notes(format!(
        "1. Check the selectivity of {}\n2. Prefer a sort key or composite index when several columns are filtered together\n3. Watch index usage after rollout",
        column_list
    ))
}

pub fn specific_columns(record: &QueryRecord) -> OptimizationSuggestion {
    let sql = &record.query_text;
    let suggested = format!(
        "-- List only the columns you need\nSELECT col1, col2, col3 FROM {} WHERE ...;",
        first_table(sql)
    );

    OptimizationSuggestion::new(
        "Avoid SELECT *",
        "SELECT * returns every column and adds I/O and network overhead",
        Priority::Medium,
        Category::Query,
        sql.as_str(),
    )
    .with_suggested_sql(suggested)
    .with_estimated_improvement("Typically 30%-70% less data transferred")
    .with_implementation_notes(
        "1. Select only the columns the caller reads\n2. Skip wide columns such as large strings or JSON\n3. Fewer columns also lower memory use",
    )
}

pub fn like_optimization(record: &QueryRecord) -> OptimizationSuggestion {
    let sql = &record.query_text;
    let suggested = LEADING_WILDCARD_LITERAL.replace_all(sql, "LIKE ${1}").into_owned();

    OptimizationSuggestion::new(
        "Remove the leading wildcard from LIKE",
        "LIKE with a leading % (e.g. '%abc') cannot use an index",
        Priority::High,
        Category::Query,
        sql.as_str(),
    )
    .with_suggested_sql(suggested)
    .with_estimated_improvement("Index lookups become possible instead of a full scan")
    .with_implementation_notes(
        "1. The rewrite changes semantics to a prefix match; confirm that is acceptable\n2. Otherwise consider an n-gram bloom filter or inverted index",
    )
}

pub fn or_replacement(record: &QueryRecord) -> OptimizationSuggestion {
    let suggested = "-- UNION ALL template\n\
                     SELECT * FROM table1 WHERE condition1\n\
                     UNION ALL\n\
                     SELECT * FROM table1 WHERE condition2;";

    OptimizationSuggestion::new(
        "Replace OR with UNION ALL",
        "OR conditions can disable index use; UNION ALL branches may be cheaper",
        Priority::Low,
        Category::Query,
        record.query_text.as_str(),
    )
    .with_suggested_sql(suggested)
    .with_estimated_improvement("Index hit rate may improve by 20%-50%")
    .with_implementation_notes(
        "1. Benchmark both forms\n2. UNION ALL is only equivalent when the conditions are mutually exclusive\n3. Use UNION when rows can match both branches",
    )
}

pub fn function_optimization(record: &QueryRecord) -> OptimizationSuggestion {
    let suggested = "-- Example: move the function to the constant side\n\
                     -- Before: WHERE YEAR(created_at) = 2023\n\
                     -- After:  WHERE created_at >= '2023-01-01' AND created_at < '2024-01-01'";

    OptimizationSuggestion::new(
        "Avoid functions on columns in WHERE",
        "Wrapping a column in a function prevents index use and partition pruning",
        Priority::Medium,
        Category::Query,
        record.query_text.as_str(),
    )
    .with_suggested_sql(suggested)
    .with_estimated_improvement("Filters can use indexes and prune partitions again")
    .with_implementation_notes(
        "1. Apply the function to the constant instead\n2. Use a range predicate\n3. Consider a generated column for the expression",
    )
}

pub fn row_reduction(record: &QueryRecord) -> OptimizationSuggestion {
    let scanned = record.scan_rows_formatted();
    let suggested = format!(
        "-- Reduce the rows scanned\n\
         -- Current scan_rows: {}\n\
         -- 1. Add more selective WHERE conditions\n\
         -- 2. Filter on partition columns so partitions are pruned\n\
         -- 3. Cover the query with the sort key or an index\n\
         -- 4. Revisit the partitioning strategy",
        scanned
    );

    OptimizationSuggestion::new(
        "Reduce scanned rows",
        format!("Query scans {} rows, well above the threshold", scanned),
        Priority::High,
        Category::Query,
        record.query_text.as_str(),
    )
    .with_suggested_sql(suggested)
    .with_estimated_improvement("Could scan 50%-99% fewer rows")
    .with_implementation_notes(
        "1. Inspect the plan to find the dominant scan\n2. Add selective filters\n3. Create a composite index where it helps",
    )
}

pub fn cte_or_join(record: &QueryRecord) -> OptimizationSuggestion {
    let suggested = "-- CTE template\n\
                     WITH cte1 AS (\n    SELECT ... FROM table1 WHERE ...\n),\n\
                     cte2 AS (\n    SELECT ... FROM table2 WHERE ...\n)\n\
                     SELECT ... FROM cte1 JOIN cte2 ON ...;";

    OptimizationSuggestion::new(
        "Rewrite the subquery as a CTE or JOIN",
        "Derived-table subqueries can block predicate pushdown",
        Priority::Medium,
        Category::Query,
        record.query_text.as_str(),
    )
    .with_suggested_sql(suggested)
    .with_estimated_improvement("Estimated 20%-60% faster")
    .with_implementation_notes(
        "1. Check whether the subquery can become a JOIN\n2. A CTE keeps the query readable\n3. Compare timings before and after",
    )
}

pub fn memory_tuning(record: &QueryRecord) -> OptimizationSuggestion {
    OptimizationSuggestion::new(
        "Lower the memory footprint",
        format!("Query used {:.2} MB of memory", record.memory_used_mb()),
        Priority::Medium,
        Category::Config,
        record.query_text.as_str(),
    )
    .with_estimated_improvement("Fewer memory-limit failures under concurrency")
    .with_implementation_notes(
        "1. SET enable_spill = true to let large operators spill to disk\n2. Raise query_mem_limit for this workload only if spilling is too slow\n3. Shrink intermediate results with earlier filters or pre-aggregation",
    )
}

pub fn add_where_clause(record: &QueryRecord) -> OptimizationSuggestion {
    let sql = &record.query_text;
    let suggested = format!(
        "-- Bound the read with a filter and a limit\nSELECT ... FROM {} WHERE <predicate> LIMIT 1000;",
        first_table(sql)
    );

    OptimizationSuggestion::new(
        "Add a WHERE clause",
        "Query reads the whole table without any filter",
        Priority::High,
        Category::Query,
        sql.as_str(),
    )
    .with_suggested_sql(suggested)
    .with_estimated_improvement("Rows read drop to what the caller needs")
    .with_implementation_notes(
        "1. Filter on partition or sort-key columns first\n2. Add LIMIT for exploratory queries",
    )
}
