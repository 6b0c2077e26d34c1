use std::fmt::Write;

use crate::models::{Severity, format_bytes, format_rows};
use crate::services::analyzer_service::{DiagnosisReport, QueryDiagnosis};
use crate::utils::truncate_chars;

use super::MAX_DETAILED_QUERIES;

const SUMMARY_TITLE_CHARS: usize = 60;
const TOP_TABLES: usize = 10;

pub fn render(report: &DiagnosisReport) -> String {
    let mut out = String::with_capacity(8 * 1024);

    out.push_str("# Slow Query Analysis Report\n\n");
    write_metadata(&mut out, report);
    write_statistics(&mut out, report);
    write_queries(&mut out, report);
    write_summary(&mut out, report);

    out.push_str("---\n\n*Generated by slowlog*\n");
    out
}

fn write_metadata(out: &mut String, report: &DiagnosisReport) {
    let meta = &report.metadata;
    let _ = writeln!(out, "- **Report time**: {}", meta.generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "- **Source**: {}", meta.source);
    let _ = writeln!(out, "- **Time range**: last {} hours", meta.time_range_hours);
    let _ = writeln!(out, "- **Slow query threshold**: {}s", meta.threshold_seconds);
    if let Some(db) = &meta.database {
        let _ = writeln!(out, "- **Database**: {}", db);
    }
    if let Some(user) = &meta.user {
        let _ = writeln!(out, "- **User**: {}", user);
    }
    if let Some(pattern) = &meta.pattern {
        let _ = writeln!(out, "- **Pattern**: `{}`", pattern);
    }
    out.push('\n');
}

fn write_statistics(out: &mut String, report: &DiagnosisReport) {
    let stats = &report.statistics;
    out.push_str("## Statistics\n\n");
    let _ = writeln!(out, "- **Slow queries**: {}", stats.total_queries);
    let _ = writeln!(out, "- **Average execution time**: {:.2}s", stats.avg_execution_time);
    let _ = writeln!(out, "- **Max execution time**: {:.2}s", stats.max_execution_time);
    let _ = writeln!(out, "- **Total scan rows**: {}", format_rows(stats.total_scan_rows));
    let _ = writeln!(out, "- **Total scan bytes**: {}", format_bytes(stats.total_scan_bytes));
    let _ = writeln!(out, "- **Problems found**: {}", report.total_problems());
    out.push('\n');

    out.push_str("### Severity Distribution\n\n");
    for severity in Severity::all() {
        let _ = writeln!(out, "- **{}**: {}", severity, stats.count_for(severity));
    }
    out.push('\n');

    let tables = report.top_tables(TOP_TABLES);
    if !tables.is_empty() {
        out.push_str("### Most Affected Tables\n\n");
        for (table, count) in tables {
            let _ = writeln!(out, "- `{}`: {} queries", table, count);
        }
        out.push('\n');
    }
}

fn write_queries(out: &mut String, report: &DiagnosisReport) {
    out.push_str("## Slow Queries\n\n");
    if report.slow_queries.len() > MAX_DETAILED_QUERIES {
        let _ = writeln!(
            out,
            "Showing the {} slowest of {} queries.\n",
            MAX_DETAILED_QUERIES,
            report.slow_queries.len()
        );
    }

    for (i, diagnosis) in report.slow_queries.iter().take(MAX_DETAILED_QUERIES).enumerate() {
        write_query(out, i + 1, diagnosis);
    }
}

fn write_query(out: &mut String, index: usize, diagnosis: &QueryDiagnosis) {
    let q = &diagnosis.query;

    let _ = writeln!(out, "### {}. Query {}\n", index, q.query_id);
    let _ = writeln!(
        out,
        "- **Database**: {} | **User**: {} | **Severity**: {}\n",
        q.database, q.user, diagnosis.severity
    );
    let _ = writeln!(out, "```sql\n{}\n```\n", q.query_text.trim());

    out.push_str("**Metrics**\n\n");
    let _ = writeln!(out, "- Execution time: {:.2}s", q.execution_time);
    let _ = writeln!(out, "- Scan rows: {}", q.scan_rows_formatted());
    let _ = writeln!(out, "- Scan bytes: {}", q.scan_bytes_formatted());
    let _ = writeln!(out, "- Memory used: {:.2} MB\n", q.memory_used_mb());

    if !diagnosis.problems.is_empty() {
        out.push_str("**Problems**\n\n");
        for p in &diagnosis.problems {
            let _ = writeln!(out, "- **[{}] {}**: {}", p.severity, p.problem_type.label(), p.description);
            let _ = writeln!(out, "  - Evidence: `{}`", p.evidence);
            let _ = writeln!(out, "  - Suggestion: {}", p.suggestion);
        }
        out.push('\n');
    }

    if !diagnosis.suggestions.is_empty() {
        out.push_str("**Optimization Suggestions**\n\n");
        for (n, s) in diagnosis.suggestions.iter().enumerate() {
            let _ = writeln!(out, "{}. **{}** ({} / {})", n + 1, s.title, s.priority, s.category);
            let _ = writeln!(out, "   {}", s.description);
            if let Some(improvement) = &s.estimated_improvement {
                let _ = writeln!(out, "   - Estimated improvement: {}", improvement);
            }
            if let Some(notes) = &s.implementation_notes {
                let _ = writeln!(out, "   - Notes: {}", notes);
            }
            if let Some(sql) = &s.suggested_sql {
                let _ = writeln!(out, "\n```sql\n{}\n```", sql);
            }
        }
        out.push('\n');
    }

    if let Some(plan) = &diagnosis.execution_plan {
        let _ = writeln!(out, "<details><summary>Execution plan</summary>\n\n```\n{}\n```\n\n</details>\n", plan.as_text());
    }
}

fn write_summary(out: &mut String, report: &DiagnosisReport) {
    out.push_str("## Suggestion Summary\n\n");

    let mut suggestions: Vec<_> = report.all_suggestions().collect();
    if suggestions.is_empty() {
        out.push_str("No optimization suggestions.\n\n");
        return;
    }
    // stable: equal priorities keep report order
    suggestions.sort_by(|a, b| b.1.priority.cmp(&a.1.priority));

    out.push_str("| Priority | Category | Query | Title | Estimated improvement |\n");
    out.push_str("|----------|----------|-------|-------|-----------------------|\n");
    for (query_id, s) in suggestions {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            s.priority,
            s.category,
            query_id,
            truncate_chars(&s.title, SUMMARY_TITLE_CHARS).replace('|', "\\|"),
            s.estimated_improvement.as_deref().unwrap_or("-").replace('|', "\\|")
        );
    }
    out.push('\n');
}
