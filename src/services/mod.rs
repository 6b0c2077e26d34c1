pub mod analyzer_service;
pub mod mysql_client;
pub mod optimization_suggester;
pub mod query_analyzer;
pub mod report;
pub mod slow_query_collector;

pub use analyzer_service::{
    AnalysisOutcome, AnalysisRequest, DiagnosisReport, QueryDiagnosis, ReportMetadata,
    SlowQueryAnalyzer, SqlAnalysis,
};
pub use mysql_client::MySQLClient;
pub use optimization_suggester::{Category, OptimizationSuggestion, Priority, generate_suggestions};
pub use query_analyzer::{ExecutionPlan, Problem, ProblemDetector, ProblemType, Thresholds, detect_problems};
pub use report::{ReportFormat, ReportGenerator};
pub use slow_query_collector::{
    CollectOptions, JsonFileSource, QueryLogSource, QueryStatistics, StarRocksQueryLog,
    filter_by_pattern, get_query_statistics, group_by_table,
};
