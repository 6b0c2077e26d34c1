// Slow Query Collector
// Purpose: Pull executed queries from StarRocks (or an exported JSON file)
// and provide the aggregate helpers the report needs

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};
use mysql_async::{Params, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::models::{QueryRecord, Severity};
use crate::services::mysql_client::{MySQLClient, NULL_VALUE};
use crate::services::query_analyzer::extract_tables;
use crate::utils::{AnalyzerError, AnalyzerResult, group_by_many};

/// Statements shorter than this are skipped (e.g. `SELECT 1` health checks)
const MIN_QUERY_TEXT_LEN: usize = 10;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Filters for one collection run
#[derive(Debug, Clone, PartialEq)]
pub struct CollectOptions {
    pub time_range_hours: u64,
    /// Minimum execution time in seconds
    pub min_execution_time: f64,
    pub database: Option<String>,
    pub user: Option<String>,
    pub limit: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self { time_range_hours: 24, min_execution_time: 1.0, database: None, user: None, limit: 1000 }
    }
}

impl CollectOptions {
    /// Start of the look-back window relative to `now`, clamped to the
    /// earliest representable time for ranges reaching past it
    pub fn window_start(&self, now: NaiveDateTime) -> NaiveDateTime {
        i64::try_from(self.time_range_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// Whether a record passes every filter except the time window
    fn accepts(&self, record: &QueryRecord) -> bool {
        record.execution_time >= self.min_execution_time
            && record.query_text.trim().len() > MIN_QUERY_TEXT_LEN
            && self.database.as_ref().is_none_or(|db| &record.database == db)
            && self.user.as_ref().is_none_or(|user| &record.user == user)
    }
}

/// Where query records come from
#[async_trait]
pub trait QueryLogSource: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &str;

    /// Slow queries matching `options`, slowest first
    async fn fetch(&self, options: &CollectOptions) -> AnalyzerResult<Vec<QueryRecord>>;

    /// Execution plan text for `sql`
    async fn explain(&self, sql: &str) -> AnalyzerResult<String>;
}

// ========================================
// StarRocks query log
// ========================================

/// Reads `information_schema.query_log` over the MySQL protocol
pub struct StarRocksQueryLog {
    client: MySQLClient,
}

impl StarRocksQueryLog {
    pub fn new(client: MySQLClient) -> Self {
        Self { client }
    }

    /// Build the collection statement and its positional parameters
    fn build_query(options: &CollectOptions, now: NaiveDateTime) -> (String, Vec<Value>) {
        let mut sql = String::from(
            "SELECT query_id, query_text, database, user, \
             query_time_seconds AS execution_time, scan_rows, scan_bytes, \
             memory_used_bytes AS memory_used, cpu_time_ns / 1000000000 AS cpu_time, \
             start_time, end_time, peak_memory_bytes AS peak_memory, rows_returned \
             FROM information_schema.query_log \
             WHERE start_time >= ? AND query_time_seconds >= ? \
             AND query_text IS NOT NULL AND LENGTH(query_text) > ?",
        );
        let mut params: Vec<Value> = vec![
            Value::from(options.window_start(now).format("%Y-%m-%d %H:%M:%S").to_string()),
            Value::from(options.min_execution_time),
            Value::from(MIN_QUERY_TEXT_LEN as u64),
        ];

        if let Some(database) = &options.database {
            sql.push_str(" AND database = ?");
            params.push(Value::from(database.as_str()));
        }
        if let Some(user) = &options.user {
            sql.push_str(" AND user = ?");
            params.push(Value::from(user.as_str()));
        }

        sql.push_str(&format!(" ORDER BY query_time_seconds DESC LIMIT {}", options.limit));
        (sql, params)
    }
}

#[async_trait]
impl QueryLogSource for StarRocksQueryLog {
    fn name(&self) -> &str {
        "starrocks"
    }

    async fn fetch(&self, options: &CollectOptions) -> AnalyzerResult<Vec<QueryRecord>> {
        let now = Local::now().naive_local();
        let (sql, params) = Self::build_query(options, now);
        tracing::debug!("Collecting slow queries: {}", sql);

        let (columns, rows) = self.client.query_with_params(&sql, Params::Positional(params)).await?;
        let records = rows_to_records(&columns, &rows);

        tracing::info!("Collected {} slow queries from {}", records.len(), self.name());
        Ok(records)
    }

    async fn explain(&self, sql: &str) -> AnalyzerResult<String> {
        let (_, rows) = self.client.query_raw(&format!("EXPLAIN {}", sql)).await?;
        let plan = rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(plan)
    }
}

/// Map a string result set onto query records
///
/// Rows that fail to parse or validate are skipped with a warning.
pub fn rows_to_records(columns: &[String], rows: &[Vec<String>]) -> Vec<QueryRecord> {
    let col_idx: HashMap<&str, usize> =
        columns.iter().enumerate().map(|(i, col)| (col.as_str(), i)).collect();

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row_to_record(&col_idx, row) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping query log row: {}", e),
        }
    }
    records
}

fn row_to_record(col_idx: &HashMap<&str, usize>, row: &[String]) -> AnalyzerResult<QueryRecord> {
    let field = |name: &str| -> Option<&str> {
        col_idx
            .get(name)
            .and_then(|&i| row.get(i))
            .map(String::as_str)
            .filter(|v| *v != NULL_VALUE)
    };

    let query_id = field("query_id").unwrap_or_default().to_string();
    let query_text = field("query_text")
        .ok_or_else(|| AnalyzerError::invalid_record(&query_id, "missing query_text"))?
        .to_string();

    let timestamp = |name: &str| -> AnalyzerResult<NaiveDateTime> {
        let raw = field(name)
            .ok_or_else(|| AnalyzerError::invalid_record(&query_id, format!("missing {}", name)))?;
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
            AnalyzerError::invalid_record(&query_id, format!("invalid {} '{}': {}", name, raw, e))
        })
    };

    let record = QueryRecord {
        query_id: query_id.clone(),
        query_text,
        database: field("database").unwrap_or_default().to_string(),
        user: field("user").unwrap_or_default().to_string(),
        execution_time: parse_f64(field("execution_time")),
        scan_rows: parse_u64(field("scan_rows")),
        scan_bytes: parse_u64(field("scan_bytes")),
        memory_used: parse_u64(field("memory_used")),
        cpu_time: parse_f64(field("cpu_time")),
        start_time: timestamp("start_time")?,
        end_time: timestamp("end_time")?,
        peak_memory: parse_u64(field("peak_memory")),
        rows_returned: parse_u64(field("rows_returned")),
    };

    record.validate()?;
    Ok(record)
}

fn parse_f64(value: Option<&str>) -> f64 {
    value.and_then(|v| v.trim().parse::<f64>().ok()).unwrap_or(0.0)
}

/// Integer metrics may come back as decimals (e.g. "1024.0")
fn parse_u64(value: Option<&str>) -> u64 {
    let Some(v) = value.map(str::trim) else {
        return 0;
    };
    v.parse::<u64>()
        .ok()
        .or_else(|| v.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))
        .unwrap_or(0)
}

// ========================================
// Offline JSON export
// ========================================

/// Reads a JSON array of query records, e.g. an earlier export
///
/// The time window is anchored on the newest `end_time` in the file rather
/// than the wall clock, so old exports stay analyzable.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> AnalyzerResult<Vec<QueryRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<QueryRecord> = serde_json::from_str(&content)?;
        Ok(records)
    }
}

#[async_trait]
impl QueryLogSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch(&self, options: &CollectOptions) -> AnalyzerResult<Vec<QueryRecord>> {
        let loaded = self.load().await?;
        let total = loaded.len();

        let Some(anchor) = loaded.iter().map(|r| r.end_time).max() else {
            return Ok(Vec::new());
        };
        let window_start = options.window_start(anchor);

        let mut records: Vec<QueryRecord> = loaded
            .into_iter()
            .filter(|record| match record.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Skipping record from {}: {}", self.path.display(), e);
                    false
                },
            })
            .filter(|record| record.start_time >= window_start && options.accepts(record))
            .collect();

        records.sort_by(|a, b| b.execution_time.total_cmp(&a.execution_time));
        records.truncate(options.limit);

        tracing::info!(
            "Collected {} of {} records from {}",
            records.len(),
            total,
            self.path.display()
        );
        Ok(records)
    }

    async fn explain(&self, _sql: &str) -> AnalyzerResult<String> {
        Err(AnalyzerError::query("EXPLAIN is not available for an offline JSON source"))
    }
}

// ========================================
// Aggregates
// ========================================

/// Summary figures over a set of slow queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryStatistics {
    pub total_queries: usize,
    pub avg_execution_time: f64,
    pub max_execution_time: f64,
    pub total_scan_rows: u64,
    pub total_scan_bytes: u64,
    pub severity_distribution: BTreeMap<Severity, usize>,
}

impl QueryStatistics {
    pub fn count_for(&self, severity: Severity) -> usize {
        self.severity_distribution.get(&severity).copied().unwrap_or(0)
    }
}

pub fn get_query_statistics(records: &[QueryRecord]) -> QueryStatistics {
    if records.is_empty() {
        return QueryStatistics::default();
    }

    let total_time: f64 = records.iter().map(|r| r.execution_time).sum();
    let max_time = records.iter().map(|r| r.execution_time).fold(0.0_f64, f64::max);

    let mut severity_distribution = BTreeMap::new();
    for record in records {
        *severity_distribution.entry(record.severity()).or_insert(0) += 1;
    }

    QueryStatistics {
        total_queries: records.len(),
        avg_execution_time: total_time / records.len() as f64,
        max_execution_time: max_time,
        total_scan_rows: records.iter().map(|r| r.scan_rows).fold(0, u64::saturating_add),
        total_scan_bytes: records.iter().map(|r| r.scan_bytes).fold(0, u64::saturating_add),
        severity_distribution,
    }
}

/// Keep queries whose text contains `pattern`, ignoring case
pub fn filter_by_pattern(records: Vec<QueryRecord>, pattern: &str) -> Vec<QueryRecord> {
    let needle = pattern.trim().to_uppercase();
    if needle.is_empty() {
        return records;
    }

    let filtered: Vec<QueryRecord> = records
        .into_iter()
        .filter(|r| r.query_text.to_uppercase().contains(&needle))
        .collect();

    tracing::info!("Pattern '{}' kept {} queries", pattern, filtered.len());
    filtered
}

/// Group queries by every table they reference
pub fn group_by_table(records: &[QueryRecord]) -> BTreeMap<String, Vec<QueryRecord>> {
    group_by_many(records, |r| extract_tables(&r.query_text))
}
