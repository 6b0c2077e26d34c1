// Slow Query Analyzer Service
// Purpose: Collect slow queries, diagnose each one and hand the result to the report writer
// Design: Detection and suggestion steps are pure; only the source and the writer do I/O

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::config::Config;
use crate::models::{QueryRecord, QueryType, Severity};
use crate::services::optimization_suggester::{Category, OptimizationSuggestion, generate_suggestions};
use crate::services::query_analyzer::{ExecutionPlan, Problem, Thresholds, detect_problems};
use crate::services::report::ReportGenerator;
use crate::services::slow_query_collector::{
    CollectOptions, QueryLogSource, QueryStatistics, filter_by_pattern, get_query_statistics,
    group_by_table,
};
use crate::utils::{AnalyzerResult, StringExt};

// ========================================
// Request / result types
// ========================================

/// Per-run overrides; `None` falls back to the configuration
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub time_range_hours: Option<u64>,
    pub min_execution_time: Option<f64>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: NaiveDateTime,
    pub source: String,
    pub time_range_hours: u64,
    pub threshold_seconds: f64,
    pub database: Option<String>,
    pub user: Option<String>,
    pub pattern: Option<String>,
}

/// One slow query with everything found about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDiagnosis {
    #[serde(flatten)]
    pub query: QueryRecord,
    pub severity: Severity,
    pub problems: Vec<Problem>,
    pub suggestions: Vec<OptimizationSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_plan: Option<ExecutionPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub metadata: ReportMetadata,
    pub statistics: QueryStatistics,
    /// Slow query count per referenced table
    #[serde(default)]
    pub table_counts: BTreeMap<String, usize>,
    pub slow_queries: Vec<QueryDiagnosis>,
}

impl DiagnosisReport {
    pub fn total_problems(&self) -> usize {
        self.slow_queries.iter().map(|q| q.problems.len()).sum()
    }

    /// Every suggestion paired with the query it belongs to, in report order
    pub fn all_suggestions(&self) -> impl Iterator<Item = (&str, &OptimizationSuggestion)> {
        self.slow_queries
            .iter()
            .flat_map(|q| q.suggestions.iter().map(move |s| (q.query.query_id.as_str(), s)))
    }

    /// Tables with the most slow queries, busiest first
    pub fn top_tables(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut tables: Vec<(&str, usize)> =
            self.table_counts.iter().map(|(t, n)| (t.as_str(), *n)).collect();
        tables.sort_by(|a, b| b.1.cmp(&a.1));
        tables.truncate(limit);
        tables
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Report { path: PathBuf, report: DiagnosisReport },
    NoSlowQueries,
}

/// Result of analyzing one ad-hoc statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlAnalysis {
    pub sql: String,
    pub problems: Vec<Problem>,
    pub suggestions: Vec<OptimizationSuggestion>,
}

// ========================================
// Analyzer
// ========================================

pub struct SlowQueryAnalyzer {
    source: Box<dyn QueryLogSource>,
    reporter: ReportGenerator,
    thresholds: Thresholds,
    slow_query_threshold: f64,
    time_range_hours: u64,
    max_records: usize,
    suggest_indexes: bool,
    include_query_plans: bool,
}

impl SlowQueryAnalyzer {
    pub fn new(source: Box<dyn QueryLogSource>, config: &Config) -> Self {
        Self {
            source,
            reporter: ReportGenerator::new(&config.output),
            thresholds: config.optimization.thresholds(),
            slow_query_threshold: config.analysis.slow_query_threshold,
            time_range_hours: config.analysis.time_range_hours,
            max_records: config.analysis.max_records,
            suggest_indexes: config.optimization.suggest_indexes,
            include_query_plans: config.output.include_query_plans,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    fn collect_options(&self, request: &AnalysisRequest) -> CollectOptions {
        CollectOptions {
            time_range_hours: request.time_range_hours.unwrap_or(self.time_range_hours),
            min_execution_time: request.min_execution_time.unwrap_or(self.slow_query_threshold),
            database: request.database.clean(),
            user: request.user.clean(),
            limit: self.max_records,
        }
    }

    /// Run a full analysis and write the report
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalyzerResult<AnalysisOutcome> {
        let options = self.collect_options(request);
        tracing::info!(
            "Starting slow query analysis - time range: {}h, threshold: {}s, source: {}",
            options.time_range_hours,
            options.min_execution_time,
            self.source.name()
        );

        let mut records = self.source.fetch(&options).await?;

        let pattern = request.pattern.clean();
        if let Some(pattern) = &pattern {
            records = filter_by_pattern(records, pattern);
        }

        if records.is_empty() {
            tracing::info!("No slow queries found");
            return Ok(AnalysisOutcome::NoSlowQueries);
        }

        let plans = if self.include_query_plans {
            self.fetch_plans(&records).await
        } else {
            HashMap::new()
        };

        let metadata = ReportMetadata {
            generated_at: Local::now().naive_local(),
            source: self.source.name().to_string(),
            time_range_hours: options.time_range_hours,
            threshold_seconds: options.min_execution_time,
            database: options.database,
            user: options.user,
            pattern,
        };

        let report = self.build_report(metadata, &records, &plans);
        tracing::info!(
            "Diagnosed {} slow queries, {} problems found",
            report.slow_queries.len(),
            report.total_problems()
        );

        let path = self.reporter.generate(&report)?;
        tracing::info!("Analysis finished, report written to {}", path.display());

        Ok(AnalysisOutcome::Report { path, report })
    }

    /// Best-effort EXPLAIN for every query that can be explained
    async fn fetch_plans(&self, records: &[QueryRecord]) -> HashMap<String, ExecutionPlan> {
        let mut plans = HashMap::new();
        for record in records {
            if !matches!(record.query_type(), QueryType::Select | QueryType::Insert) {
                continue;
            }
            match self.source.explain(&record.query_text).await {
                Ok(plan) if !plan.trim().is_empty() => {
                    plans.insert(record.query_id.clone(), ExecutionPlan::Text(plan));
                },
                Ok(_) => {},
                Err(e) => {
                    tracing::debug!("No execution plan for query {}: {}", record.query_id, e);
                },
            }
        }
        tracing::debug!("Fetched {} execution plans", plans.len());
        plans
    }

    /// Detect problems and generate suggestions for each record
    ///
    /// Plans are keyed by query id; records without one are checked without
    /// the plan pass.
    pub fn diagnose(
        &self,
        records: &[QueryRecord],
        plans: &HashMap<String, ExecutionPlan>,
    ) -> Vec<QueryDiagnosis> {
        records
            .iter()
            .map(|record| {
                let plan = plans.get(&record.query_id);
                let problems = detect_problems(record, plan, &self.thresholds);
                let suggestions = self.suggestions_for(record, &problems);
                QueryDiagnosis {
                    query: record.clone(),
                    severity: record.severity(),
                    problems,
                    suggestions,
                    execution_plan: plan.cloned(),
                }
            })
            .collect()
    }

    pub fn build_report(
        &self,
        metadata: ReportMetadata,
        records: &[QueryRecord],
        plans: &HashMap<String, ExecutionPlan>,
    ) -> DiagnosisReport {
        DiagnosisReport {
            metadata,
            statistics: get_query_statistics(records),
            table_counts: group_by_table(records)
                .into_iter()
                .map(|(table, queries)| (table, queries.len()))
                .collect(),
            slow_queries: self.diagnose(records, plans),
        }
    }

    fn suggestions_for(&self, record: &QueryRecord, problems: &[Problem]) -> Vec<OptimizationSuggestion> {
        let mut suggestions = generate_suggestions(record, problems);
        if !self.suggest_indexes {
            suggestions.retain(|s| s.category != Category::Index);
        }
        suggestions
    }

    /// The `limit` slowest queries in the window
    pub async fn get_top_slow_queries(
        &self,
        limit: usize,
        time_range_hours: Option<u64>,
        database: Option<String>,
    ) -> AnalyzerResult<Vec<QueryRecord>> {
        let request = AnalysisRequest { time_range_hours, database, ..Default::default() };
        let options = self.collect_options(&request);

        let mut records = self.source.fetch(&options).await?;
        records.truncate(limit);
        Ok(records)
    }

    /// Analyze one statement without any runtime metrics
    ///
    /// Only the lexical checks can fire since every metric is zero.
    pub fn analyze_specific_sql(&self, sql: &str) -> SqlAnalysis {
        let record = QueryRecord::manual(sql);
        let problems = detect_problems(&record, None, &self.thresholds);
        let suggestions = self.suggestions_for(&record, &problems);

        SqlAnalysis { sql: sql.to_string(), problems, suggestions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::query_analyzer::ProblemType;
    use crate::services::report::ReportFormat;
    use crate::utils::AnalyzerError;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::sync::Mutex;

    struct StubSource {
        records: Vec<QueryRecord>,
        plan: Option<String>,
        seen: Mutex<Vec<CollectOptions>>,
    }

    impl StubSource {
        fn new(records: Vec<QueryRecord>) -> Self {
            Self { records, plan: None, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl QueryLogSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch(&self, options: &CollectOptions) -> AnalyzerResult<Vec<QueryRecord>> {
            self.seen.lock().unwrap().push(options.clone());
            Ok(self.records.clone())
        }

        async fn explain(&self, _sql: &str) -> AnalyzerResult<String> {
            self.plan.clone().ok_or_else(|| AnalyzerError::query("no plan"))
        }
    }

    fn record(id: &str, sql: &str, secs: f64) -> QueryRecord {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        QueryRecord {
            query_id: id.to_string(),
            query_text: sql.to_string(),
            database: "sales".to_string(),
            user: "etl".to_string(),
            execution_time: secs,
            scan_rows: 0,
            scan_bytes: 0,
            memory_used: 0,
            cpu_time: 0.0,
            start_time: start,
            end_time: start + Duration::seconds(20),
            peak_memory: 0,
            rows_returned: 0,
        }
    }

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.output.report_dir = dir.to_path_buf();
        config.output.report_format = ReportFormat::Json;
        config
    }

    #[tokio::test]
    async fn test_analyze_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new(vec![
            record("q1", "SELECT * FROM orders WHERE status = 'pending'", 12.0),
            record("q2", "SELECT id FROM users WHERE name LIKE '%smith'", 2.0),
        ]);
        let analyzer = SlowQueryAnalyzer::new(Box::new(source), &config(dir.path()));

        let outcome = analyzer.analyze(&AnalysisRequest::default()).await.unwrap();
        let AnalysisOutcome::Report { path, report } = outcome else {
            panic!("expected a report");
        };

        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        assert_eq!(report.statistics.total_queries, 2);
        assert_eq!(report.slow_queries[0].severity, Severity::Critical);
        assert_eq!(
            report.slow_queries[0].problems.iter().map(|p| p.problem_type).collect::<Vec<_>>(),
            vec![ProblemType::FullTableScan, ProblemType::SelectStar]
        );
        assert_eq!(report.slow_queries[1].suggestions.len(), 1);
        assert_eq!(report.metadata.source, "stub");
        assert_eq!(report.top_tables(5), vec![("orders", 1), ("users", 1)]);
    }

    #[tokio::test]
    async fn test_analyze_without_queries() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = SlowQueryAnalyzer::new(Box::new(StubSource::new(vec![])), &config(dir.path()));
        let outcome = analyzer.analyze(&AnalysisRequest::default()).await.unwrap();
        assert_eq!(outcome, AnalysisOutcome::NoSlowQueries);
    }

    #[tokio::test]
    async fn test_pattern_filter_can_empty_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new(vec![record("q1", "SELECT * FROM orders WHERE a = 1", 3.0)]);
        let analyzer = SlowQueryAnalyzer::new(Box::new(source), &config(dir.path()));
        let request = AnalysisRequest { pattern: Some("inventory".into()), ..Default::default() };
        let outcome = analyzer.analyze(&request).await.unwrap();
        assert_eq!(outcome, AnalysisOutcome::NoSlowQueries);
    }

    #[tokio::test]
    async fn test_request_overrides_reach_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new(vec![record("q1", "SELECT * FROM orders WHERE a = 1", 3.0)]);
        let analyzer = SlowQueryAnalyzer::new(Box::new(source), &config(dir.path()));
        let request = AnalysisRequest {
            time_range_hours: Some(6),
            min_execution_time: Some(2.0),
            database: Some(" sales ".into()),
            user: Some("".into()),
            pattern: None,
        };
        let options = analyzer.collect_options(&request);
        assert_eq!(options.time_range_hours, 6);
        assert_eq!(options.min_execution_time, 2.0);
        assert_eq!(options.database.as_deref(), Some("sales"));
        assert_eq!(options.user, None);
        assert_eq!(options.limit, 1000);
    }

    #[tokio::test]
    async fn test_plans_feed_the_plan_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = StubSource::new(vec![record("q1", "SELECT id FROM t WHERE id = 1", 2.0)]);
        source.plan = Some("0:OLAP_SCAN_NODE".to_string());
        let analyzer = SlowQueryAnalyzer::new(Box::new(source), &config(dir.path()));

        let AnalysisOutcome::Report { report, .. } =
            analyzer.analyze(&AnalysisRequest::default()).await.unwrap()
        else {
            panic!("expected a report");
        };
        let diagnosis = &report.slow_queries[0];
        assert!(diagnosis.execution_plan.is_some());
        assert_eq!(diagnosis.problems.len(), 1);
        assert_eq!(diagnosis.problems[0].problem_type, ProblemType::FullTableScan);
        assert_eq!(diagnosis.problems[0].severity, Severity::Medium);
    }

    #[test]
    fn test_index_suggestions_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.optimization.suggest_indexes = false;
        let analyzer = SlowQueryAnalyzer::new(Box::new(StubSource::new(vec![])), &cfg);

        let records = vec![record("q1", "SELECT * FROM orders WHERE a = 1", 15.0)];
        let diagnoses = analyzer.diagnose(&records, &HashMap::new());
        assert_eq!(diagnoses[0].problems.len(), 2);
        assert_eq!(diagnoses[0].suggestions.len(), 1);
        assert_eq!(diagnoses[0].suggestions[0].category, Category::Query);
    }

    #[test]
    fn test_analyze_specific_sql() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = SlowQueryAnalyzer::new(Box::new(StubSource::new(vec![])), &config(dir.path()));
        let analysis = analyzer.analyze_specific_sql("SELECT name FROM customers");
        assert_eq!(analysis.problems.len(), 1);
        assert_eq!(analysis.problems[0].problem_type, ProblemType::NoWhereClause);
        assert_eq!(analysis.suggestions.len(), 1);
        assert!(analysis.suggestions[0].suggested_sql.as_deref().unwrap().contains("customers"));
    }

    #[tokio::test]
    async fn test_top_slow_queries_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new(vec![
            record("a", "SELECT * FROM t WHERE x = 1", 9.0),
            record("b", "SELECT * FROM t WHERE x = 2", 7.0),
            record("c", "SELECT * FROM t WHERE x = 3", 5.0),
        ]);
        let analyzer = SlowQueryAnalyzer::new(Box::new(source), &config(dir.path()));
        let top = analyzer.get_top_slow_queries(2, Some(48), None).await.unwrap();
        assert_eq!(top.iter().map(|r| r.query_id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
