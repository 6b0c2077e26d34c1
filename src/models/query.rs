//! Query record and severity models
//!
//! A `QueryRecord` is one row of the StarRocks query log: the SQL text plus
//! its timing and resource metrics. Records are read-only once built; every
//! derived value (formatted counts, severity) is computed on demand.

use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{AnalyzerError, AnalyzerResult};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

// ============================================================================
// Severity
// ============================================================================

/// Severity level shared by query ratings and problems
///
/// Ordering follows urgency: `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Severity {
    /// Bucket a query's overall severity by execution time (seconds)
    pub fn from_execution_time(seconds: f64) -> Self {
        if seconds >= 10.0 {
            Severity::Critical
        } else if seconds >= 5.0 {
            Severity::High
        } else if seconds >= 1.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// All levels from most to least severe
    pub fn all() -> [Severity; 4] {
        [Severity::Critical, Severity::High, Severity::Medium, Severity::Low]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Query Type
// ============================================================================

/// Statement kind, detected from the leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
    Show,
    Explain,
    Other,
}

impl QueryType {
    pub fn from_sql(sql: &str) -> Self {
        let sql = sql.trim_start().to_uppercase();
        let keyword = sql.split(|c: char| !c.is_ascii_alphabetic()).next().unwrap_or("");

        match keyword {
            "SELECT" => QueryType::Select,
            "INSERT" => QueryType::Insert,
            "UPDATE" => QueryType::Update,
            "DELETE" => QueryType::Delete,
            "CREATE" => QueryType::Create,
            "ALTER" => QueryType::Alter,
            "DROP" => QueryType::Drop,
            "SHOW" => QueryType::Show,
            "EXPLAIN" => QueryType::Explain,
            _ => QueryType::Other,
        }
    }
}

// ============================================================================
// Query Record
// ============================================================================

/// One executed query with its metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query_id: String,
    pub query_text: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub user: String,
    /// Execution time in seconds
    pub execution_time: f64,
    #[serde(default)]
    pub scan_rows: u64,
    #[serde(default)]
    pub scan_bytes: u64,
    /// Memory used in bytes
    #[serde(default)]
    pub memory_used: u64,
    /// CPU time in seconds
    #[serde(default)]
    pub cpu_time: f64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub peak_memory: u64,
    #[serde(default)]
    pub rows_returned: u64,
}

impl QueryRecord {
    /// Build a synthetic record for ad-hoc analysis of a single statement
    ///
    /// All metrics are zero, so only the lexical passes can fire.
    pub fn manual(sql: &str) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            query_id: "manual_analysis".to_string(),
            query_text: sql.to_string(),
            database: String::new(),
            user: "manual".to_string(),
            execution_time: 0.0,
            scan_rows: 0,
            scan_bytes: 0,
            memory_used: 0,
            cpu_time: 0.0,
            start_time: now,
            end_time: now + Duration::seconds(1),
            peak_memory: 0,
            rows_returned: 0,
        }
    }

    /// Check the record invariants: non-negative duration, end >= start
    pub fn validate(&self) -> AnalyzerResult<()> {
        if self.execution_time.is_nan() || self.execution_time < 0.0 {
            return Err(AnalyzerError::invalid_record(
                &self.query_id,
                format!("execution_time must be >= 0, got {}", self.execution_time),
            ));
        }
        if self.end_time < self.start_time {
            return Err(AnalyzerError::invalid_record(
                &self.query_id,
                format!("end_time {} is before start_time {}", self.end_time, self.start_time),
            ));
        }
        Ok(())
    }

    pub fn execution_time_ms(&self) -> f64 {
        self.execution_time * 1000.0
    }

    pub fn memory_used_mb(&self) -> f64 {
        self.memory_used as f64 / MIB as f64
    }

    pub fn scan_rows_formatted(&self) -> String {
        format_rows(self.scan_rows)
    }

    pub fn scan_bytes_formatted(&self) -> String {
        format_bytes(self.scan_bytes)
    }

    /// Overall severity, bucketed by execution time
    pub fn severity(&self) -> Severity {
        Severity::from_execution_time(self.execution_time)
    }

    pub fn query_type(&self) -> QueryType {
        QueryType::from_sql(&self.query_text)
    }
}

/// Format a row count with K/M/B suffixes (e.g. "12.35 M")
pub fn format_rows(rows: u64) -> String {
    if rows >= 1_000_000_000 {
        format!("{:.2} B", rows as f64 / 1_000_000_000.0)
    } else if rows >= 1_000_000 {
        format!("{:.2} M", rows as f64 / 1_000_000.0)
    } else if rows >= 1_000 {
        format!("{:.2} K", rows as f64 / 1_000.0)
    } else {
        rows.to_string()
    }
}

/// Format bytes to human-readable string
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GIB {
        format!("{:.2} GB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(execution_time: f64) -> QueryRecord {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        QueryRecord {
            query_id: "q1".to_string(),
            query_text: "SELECT 1".to_string(),
            database: "sales".to_string(),
            user: "etl".to_string(),
            execution_time,
            scan_rows: 0,
            scan_bytes: 0,
            memory_used: 0,
            cpu_time: 0.0,
            start_time: start,
            end_time: start + Duration::seconds(12),
            peak_memory: 0,
            rows_returned: 0,
        }
    }

    #[test]
    fn test_severity_buckets() {
        assert_eq!(record(12.0).severity(), Severity::Critical);
        assert_eq!(record(10.0).severity(), Severity::Critical);
        assert_eq!(record(9.99).severity(), Severity::High);
        assert_eq!(record(5.0).severity(), Severity::High);
        assert_eq!(record(1.0).severity(), Severity::Medium);
        assert_eq!(record(0.2).severity(), Severity::Low);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    #[test]
    fn test_format_rows() {
        assert_eq!(format_rows(999), "999");
        assert_eq!(format_rows(12_345), "12.35 K");
        assert_eq!(format_rows(25_000_000), "25.00 M");
        assert_eq!(format_rows(3_500_000_000), "3.50 B");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * MIB), "5.00 MB");
        assert_eq!(format_bytes(3 * GIB / 2), "1.50 GB");
    }

    #[test]
    fn test_validate_rejects_negative_duration() {
        let r = record(-1.0);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_reversed_timestamps() {
        let mut r = record(1.0);
        r.end_time = r.start_time - Duration::seconds(1);
        assert!(matches!(r.validate(), Err(AnalyzerError::InvalidRecord { .. })));
    }

    #[test]
    fn test_manual_record_is_valid() {
        let r = QueryRecord::manual("SELECT * FROM t");
        assert!(r.validate().is_ok());
        assert_eq!(r.query_id, "manual_analysis");
        assert_eq!(r.severity(), Severity::Low);
    }

    #[test]
    fn test_query_type_detection() {
        assert_eq!(QueryType::from_sql("  select * from t"), QueryType::Select);
        assert_eq!(QueryType::from_sql("INSERT INTO t VALUES (1)"), QueryType::Insert);
        assert_eq!(QueryType::from_sql("EXPLAIN SELECT 1"), QueryType::Explain);
        assert_eq!(QueryType::from_sql("WITH x AS (SELECT 1) SELECT * FROM x"), QueryType::Other);
        assert_eq!(QueryType::from_sql(""), QueryType::Other);
    }

    #[test]
    fn test_record_deserialize_defaults() {
        let json = r#"{
            "query_id": "q9",
            "query_text": "SELECT 1",
            "execution_time": 2.5,
            "start_time": "2024-05-01T10:00:00",
            "end_time": "2024-05-01T10:00:03"
        }"#;
        let r: QueryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.scan_rows, 0);
        assert_eq!(r.database, "");
        assert_eq!(r.severity(), Severity::Medium);
    }
}
