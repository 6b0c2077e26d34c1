//! Unit tests for the suggestion generator

#[cfg(test)]
mod suggester_tests {
    use crate::models::{QueryRecord, Severity};
    use crate::services::optimization_suggester::templates::index_candidate_columns;
    use crate::services::optimization_suggester::*;
    use crate::services::query_analyzer::{Problem, ProblemType, Thresholds, detect_problems};

    fn problem(problem_type: ProblemType) -> Problem {
        Problem::new(problem_type, Severity::Medium, "d", "s", "e")
    }

    fn manual(sql: &str) -> QueryRecord {
        QueryRecord::manual(sql)
    }

    #[test]
    fn test_select_star_scenario_references_table() {
        let r = manual("SELECT * FROM orders WHERE status = 'pending'");
        let problems = detect_problems(&r, None, &Thresholds::default());
        let suggestions = generate_suggestions(&r, &problems);

        assert_eq!(suggestions.len(), 1);
        let s = &suggestions[0];
        assert_eq!(s.category, Category::Query);
        assert_eq!(s.priority, Priority::Medium);
        assert!(s.suggested_sql.as_deref().unwrap().contains("FROM orders"));
        assert_eq!(s.original_sql, r.query_text);
    }

    #[test]
    fn test_like_scenario_rewrites_fragment() {
        let r = manual("SELECT id FROM t WHERE name LIKE '%smith'");
        let problems = detect_problems(&r, None, &Thresholds::default());
        let suggestions = generate_suggestions(&r, &problems);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].priority, Priority::High);
        assert_eq!(
            suggestions[0].suggested_sql.as_deref(),
            Some("SELECT id FROM t WHERE name LIKE 'smith'")
        );
    }

    #[test]
    fn test_like_rewrite_handles_case_and_double_quotes() {
        let r = manual("select id from t where a like   \"%x\" and b LIKE '%y'");
        let s = templates::like_optimization(&r);
        assert_eq!(
            s.suggested_sql.as_deref(),
            Some("select id from t where a LIKE \"x\" and b LIKE 'y'")
        );
    }

    #[test]
    fn test_clean_query_has_no_suggestions() {
        let mut r = manual("SELECT id FROM t WHERE id=1");
        r.execution_time = 0.2;
        r.scan_rows = 100;
        let problems = detect_problems(&r, None, &Thresholds::default());
        assert!(problems.is_empty());
        assert!(generate_suggestions(&r, &problems).is_empty());
    }

    #[test]
    fn test_category_per_problem_type() {
        let r = manual("SELECT * FROM t");
        let cases = [
            (ProblemType::FullTableScan, Category::Index, Priority::High),
            (ProblemType::SelectStar, Category::Query, Priority::Medium),
            (ProblemType::LikePrefixWildcard, Category::Query, Priority::High),
            (ProblemType::OrCondition, Category::Query, Priority::Low),
            (ProblemType::FunctionInWhere, Category::Query, Priority::Medium),
            (ProblemType::TooManyRows, Category::Query, Priority::High),
            (ProblemType::SubqueryInefficient, Category::Query, Priority::Medium),
            (ProblemType::MemoryIntensive, Category::Config, Priority::Medium),
            (ProblemType::NoWhereClause, Category::Query, Priority::High),
        ];
        for (pt, category, priority) in cases {
            let suggestions = generate_suggestions(&r, &[problem(pt)]);
            assert_eq!(suggestions.len(), 1, "{:?}", pt);
            assert_eq!(suggestions[0].category, category, "{:?}", pt);
            assert_eq!(suggestions[0].priority, priority, "{:?}", pt);
        }
    }

    #[test]
    fn test_unhandled_types_are_skipped() {
        let r = manual("SELECT * FROM t");
        let problems = [
            problem(ProblemType::NoIndex),
            problem(ProblemType::JoinInefficient),
            problem(ProblemType::OrderByExpensive),
            problem(ProblemType::GroupByExpensive),
            problem(ProblemType::LargeResultSet),
        ];
        assert!(generate_suggestions(&r, &problems).is_empty());
    }

    #[test]
    fn test_duplicates_are_not_collapsed() {
        let r = manual("SELECT * FROM t");
        let problems =
            [problem(ProblemType::TooManyRows), problem(ProblemType::NoIndex), problem(ProblemType::TooManyRows)];
        let suggestions = generate_suggestions(&r, &problems);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0], suggestions[1]);
    }

    #[test]
    fn test_index_suggestion_collects_columns() {
        let mut r = manual(
            "SELECT o.id FROM orders o JOIN customers c ON o.customer_id = c.id \
             WHERE o.status = 'paid' AND o.amount > 10 ORDER BY o.created_at DESC",
        );
        r.execution_time = 12.0;
        let s = templates::index_optimization(&r);

        assert_eq!(
            s.suggested_sql.as_deref().unwrap().lines().last(),
            Some("CREATE INDEX idx_optimization ON orders (status, amount, created_at, customer_id, id);")
        );
        assert!(s.estimated_improvement.as_deref().unwrap().contains("50%-90%"));
        assert!(s.description.contains("12.00s"));
    }

    #[test]
    fn test_index_suggestion_placeholder_without_columns() {
        let s = templates::index_optimization(&manual("SELECT 1"));
        assert!(s.suggested_sql.as_deref().unwrap().contains("your_table (<columns>)"));
    }

    #[test]
    fn test_index_candidate_columns_deduplicated() {
        let cols = index_candidate_columns("SELECT * FROM t WHERE a = 1 AND b = 2 ORDER BY a, c");
        assert_eq!(cols, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_row_reduction_mentions_scan_rows() {
        let mut r = manual("SELECT * FROM t");
        r.scan_rows = 42_000_000;
        let s = templates::row_reduction(&r);
        assert!(s.description.contains("42.00 M"));
        assert!(s.suggested_sql.as_deref().unwrap().contains("42.00 M"));
    }

    #[test]
    fn test_memory_suggestion_has_no_sql() {
        let mut r = manual("SELECT * FROM t");
        r.memory_used = 768 * 1024 * 1024;
        let s = templates::memory_tuning(&r);
        assert!(s.suggested_sql.is_none());
        assert!(s.description.contains("768.00 MB"));
    }

    #[test]
    fn test_or_suggestion_notes_mutual_exclusion() {
        let s = templates::or_replacement(&manual("SELECT * FROM t WHERE a = 1 OR b = 2"));
        assert!(s.suggested_sql.as_deref().unwrap().contains("UNION ALL"));
        assert!(s.implementation_notes.as_deref().unwrap().contains("mutually exclusive"));
    }
}
