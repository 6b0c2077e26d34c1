//! Self-contained HTML report (inline CSS, no scripts)

use minijinja::{AutoEscape, Environment};
use serde::Serialize;

use crate::models::{Severity, format_bytes, format_rows};
use crate::services::analyzer_service::{DiagnosisReport, QueryDiagnosis};
use crate::services::optimization_suggester::Priority;
use crate::utils::{AnalyzerError, AnalyzerResult, truncate_chars};

use super::MAX_DETAILED_QUERIES;

const SUMMARY_TITLE_CHARS: usize = 80;
const TOP_TABLES: usize = 10;
const TEMPLATE_NAME: &str = "report.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Slow Query Analysis Report</title>
<style>
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0; background: #f5f6f8; color: #24292f; }
.container { max-width: 1200px; margin: 0 auto; padding: 24px; }
h1 { margin-top: 0; }
.meta { color: #57606a; margin-bottom: 24px; }
.stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 12px; margin-bottom: 24px; }
.stat-card { background: #fff; border-radius: 8px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
.stat-card .value { font-size: 24px; font-weight: 600; }
.stat-card .label { color: #57606a; font-size: 13px; }
.severity-critical { border-left: 4px solid #cf222e; }
.severity-high { border-left: 4px solid #fb8500; }
.severity-medium { border-left: 4px solid #d4a72c; }
.severity-low { border-left: 4px solid #2da44e; }
.query-card { background: #fff; border-radius: 8px; padding: 16px 20px; margin-bottom: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
.query-card h3 { margin: 0 0 8px 0; }
.badge { display: inline-block; padding: 2px 8px; border-radius: 10px; font-size: 12px; font-weight: 600; color: #fff; }
.badge-critical { background: #cf222e; } .badge-high { background: #fb8500; }
.badge-medium { background: #d4a72c; } .badge-low { background: #2da44e; }
pre { background: #f6f8fa; padding: 12px; border-radius: 6px; overflow-x: auto; white-space: pre-wrap; }
table { width: 100%; border-collapse: collapse; background: #fff; }
th, td { text-align: left; padding: 8px 10px; border-bottom: 1px solid #d0d7de; }
th { background: #f6f8fa; }
.problem { margin: 6px 0; }
.evidence { color: #57606a; font-family: monospace; font-size: 12px; }
.suggestion { border-top: 1px dashed #d0d7de; padding-top: 8px; margin-top: 8px; }
</style>
</head>
<body>
<div class="container">
<h1>Slow Query Analysis Report</h1>
<div class="meta">Report time: {{ meta.generated_at }} &middot; Source: {{ meta.source }} &middot; Time range: last {{ meta.time_range_hours }} hours &middot; Threshold: {{ meta.threshold }}
{%- if meta.database %} &middot; Database: {{ meta.database }}{% endif %}
{%- if meta.user %} &middot; User: {{ meta.user }}{% endif %}
{%- if meta.pattern %} &middot; Pattern: <code>{{ meta.pattern }}</code>{% endif %}</div>

<h2>Statistics</h2>
<div class="stats-grid">
{% for card in stats %}
<div class="stat-card"><div class="value">{{ card.value }}</div><div class="label">{{ card.label }}</div></div>
{% endfor %}
</div>
<h2>Severity Distribution</h2>
<div class="stats-grid">
{% for card in severities %}
<div class="stat-card severity-{{ card.class }}"><div class="value">{{ card.value }}</div><div class="label">{{ card.label }}</div></div>
{% endfor %}
</div>
{% if tables %}
<h2>Most Affected Tables</h2>
<table>
<tr><th>Table</th><th>Slow queries</th></tr>
{% for table in tables %}
<tr><td>{{ table.name }}</td><td>{{ table.count }}</td></tr>
{% endfor %}
</table>
{% endif %}

<h2>Slow Queries</h2>
{% if total_queries > queries | length %}
<p class="meta">Showing the {{ queries | length }} slowest of {{ total_queries }} queries.</p>
{% endif %}
{% for q in queries %}
<div class="query-card severity-{{ q.class }}">
<h3>{{ loop.index }}. Query {{ q.query_id }} <span class="badge badge-{{ q.class }}">{{ q.severity }}</span></h3>
<div class="meta">Database: {{ q.database }} &middot; User: {{ q.user }} &middot; Time: {{ q.execution_time }} &middot; Rows: {{ q.scan_rows }} &middot; Bytes: {{ q.scan_bytes }} &middot; Memory: {{ q.memory }}</div>
<pre><code>{{ q.sql }}</code></pre>
{% if q.problems %}
<h4>Problems</h4>
{% for p in q.problems %}
<div class="problem"><span class="badge badge-{{ p.class }}">{{ p.severity }}</span> <strong>{{ p.label }}</strong>: {{ p.description }}<div class="evidence">{{ p.evidence }}</div></div>
{% endfor %}
{% endif %}
{% if q.suggestions %}
<h4>Optimization Suggestions</h4>
{% for s in q.suggestions %}
<div class="suggestion"><span class="badge badge-{{ s.class }}">{{ s.priority }}</span> <strong>{{ s.title }}</strong> <em>{{ s.category }}</em>
<p>{{ s.description }}</p>
{% if s.improvement %}
<p>Estimated improvement: {{ s.improvement }}</p>
{% endif %}
{% if s.notes %}
<p>Notes: {{ s.notes }}</p>
{% endif %}
{% if s.sql %}
<pre><code>{{ s.sql }}</code></pre>
{% endif %}
</div>
{% endfor %}
{% endif %}
{% if q.plan %}
<details><summary>Execution plan</summary><pre>{{ q.plan }}</pre></details>
{% endif %}
</div>
{% endfor %}

<h2>Suggestion Summary</h2>
{% if summary %}
<table>
<tr><th>Priority</th><th>Category</th><th>Query</th><th>Title</th><th>Estimated improvement</th></tr>
{% for row in summary %}
<tr><td><span class="badge badge-{{ row.class }}">{{ row.priority }}</span></td><td>{{ row.category }}</td><td>{{ row.query_id }}</td><td>{{ row.title }}</td><td>{{ row.improvement }}</td></tr>
{% endfor %}
</table>
{% else %}
<p>No optimization suggestions.</p>
{% endif %}
<p class="meta">Generated by slowlog</p>
</div>
</body>
</html>
"#;

#[derive(Serialize)]
struct ReportView<'a> {
    meta: MetaView<'a>,
    stats: Vec<StatCard>,
    severities: Vec<StatCard>,
    tables: Vec<TableRow<'a>>,
    total_queries: usize,
    queries: Vec<QueryView<'a>>,
    summary: Vec<SummaryRow<'a>>,
}

#[derive(Serialize)]
struct MetaView<'a> {
    generated_at: String,
    source: &'a str,
    time_range_hours: u64,
    threshold: String,
    database: Option<&'a str>,
    user: Option<&'a str>,
    pattern: Option<&'a str>,
}

#[derive(Serialize)]
struct StatCard {
    class: &'static str,
    value: String,
    label: &'static str,
}

#[derive(Serialize)]
struct TableRow<'a> {
    name: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct QueryView<'a> {
    query_id: &'a str,
    class: &'static str,
    severity: &'static str,
    database: &'a str,
    user: &'a str,
    execution_time: String,
    scan_rows: String,
    scan_bytes: String,
    memory: String,
    sql: &'a str,
    problems: Vec<ProblemView<'a>>,
    suggestions: Vec<SuggestionView<'a>>,
    plan: Option<String>,
}

#[derive(Serialize)]
struct ProblemView<'a> {
    class: &'static str,
    severity: &'static str,
    label: &'static str,
    description: &'a str,
    evidence: &'a str,
}

#[derive(Serialize)]
struct SuggestionView<'a> {
    class: &'static str,
    priority: &'static str,
    title: &'a str,
    category: &'static str,
    description: &'a str,
    improvement: Option<&'a str>,
    notes: Option<&'a str>,
    sql: Option<&'a str>,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    class: &'static str,
    priority: &'static str,
    category: &'static str,
    query_id: &'a str,
    title: String,
    improvement: &'a str,
}

/// Render the report through the HTML template; every value is escaped on output
pub fn render(report: &DiagnosisReport) -> AnalyzerResult<String> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template(TEMPLATE_NAME, TEMPLATE).map_err(template_error)?;

    env.get_template(TEMPLATE_NAME)
        .and_then(|tmpl| tmpl.render(build_view(report)))
        .map_err(template_error)
}

fn template_error(err: minijinja::Error) -> AnalyzerError {
    AnalyzerError::Report(format!("HTML template: {}", err))
}

fn build_view(report: &DiagnosisReport) -> ReportView<'_> {
    let meta = &report.metadata;
    let stats = &report.statistics;

    let stat = |value: String, label| StatCard { class: "", value, label };
    let stat_cards = vec![
        stat(stats.total_queries.to_string(), "Slow queries"),
        stat(format!("{:.2}s", stats.avg_execution_time), "Average execution time"),
        stat(format!("{:.2}s", stats.max_execution_time), "Max execution time"),
        stat(format_rows(stats.total_scan_rows), "Total scan rows"),
        stat(format_bytes(stats.total_scan_bytes), "Total scan bytes"),
        stat(report.total_problems().to_string(), "Problems found"),
    ];

    let severities = Severity::all()
        .into_iter()
        .map(|severity| StatCard {
            class: severity_class(severity),
            value: stats.count_for(severity).to_string(),
            label: severity.as_str(),
        })
        .collect();

    let mut suggestions: Vec<_> = report.all_suggestions().collect();
    // stable: equal priorities keep report order
    suggestions.sort_by(|a, b| b.1.priority.cmp(&a.1.priority));

    ReportView {
        meta: MetaView {
            generated_at: meta.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            source: &meta.source,
            time_range_hours: meta.time_range_hours,
            threshold: format!("{}s", meta.threshold_seconds),
            database: meta.database.as_deref(),
            user: meta.user.as_deref(),
            pattern: meta.pattern.as_deref(),
        },
        stats: stat_cards,
        severities,
        tables: report
            .top_tables(TOP_TABLES)
            .into_iter()
            .map(|(name, count)| TableRow { name, count })
            .collect(),
        total_queries: report.slow_queries.len(),
        queries: report.slow_queries.iter().take(MAX_DETAILED_QUERIES).map(query_view).collect(),
        summary: suggestions
            .into_iter()
            .map(|(query_id, s)| SummaryRow {
                class: priority_class(s.priority),
                priority: s.priority.as_str(),
                category: s.category.as_str(),
                query_id,
                title: truncate_chars(&s.title, SUMMARY_TITLE_CHARS),
                improvement: s.estimated_improvement.as_deref().unwrap_or("-"),
            })
            .collect(),
    }
}

fn query_view(diagnosis: &QueryDiagnosis) -> QueryView<'_> {
    let q = &diagnosis.query;
    QueryView {
        query_id: &q.query_id,
        class: severity_class(diagnosis.severity),
        severity: diagnosis.severity.as_str(),
        database: &q.database,
        user: &q.user,
        execution_time: format!("{:.2}s", q.execution_time),
        scan_rows: q.scan_rows_formatted(),
        scan_bytes: q.scan_bytes_formatted(),
        memory: format!("{:.2} MB", q.memory_used_mb()),
        sql: q.query_text.trim(),
        problems: diagnosis
            .problems
            .iter()
            .map(|p| ProblemView {
                class: severity_class(p.severity),
                severity: p.severity.as_str(),
                label: p.problem_type.label(),
                description: &p.description,
                evidence: &p.evidence,
            })
            .collect(),
        suggestions: diagnosis
            .suggestions
            .iter()
            .map(|s| SuggestionView {
                class: priority_class(s.priority),
                priority: s.priority.as_str(),
                title: &s.title,
                category: s.category.as_str(),
                description: &s.description,
                improvement: s.estimated_improvement.as_deref(),
                notes: s.implementation_notes.as_deref(),
                sql: s.suggested_sql.as_deref(),
            })
            .collect(),
        plan: diagnosis.execution_plan.as_ref().map(|plan| plan.as_text().into_owned()),
    }
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical",
        Severity::High => "high",
        Severity::Medium => "medium",
        Severity::Low => "low",
    }
}

fn priority_class(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}
