//! Scan-volume rule (P002)

use super::*;
use crate::models::{format_bytes, format_rows};

/// P002: Scan volume and memory
/// Condition: scan_rows > max_scan_rows, scan_bytes > max_scan_bytes,
/// memory_used > 512 MiB; each check fires independently
pub struct P002ScanVolume;

impl DetectionPass for P002ScanVolume {
    fn id(&self) -> &str {
        "P002"
    }
    fn name(&self) -> &str {
        "Scan volume"
    }

    fn evaluate(&self, context: &DetectionContext) -> Result<Vec<Problem>, DetectError> {
        let record = context.record;
        let thresholds = context.thresholds;
        let mut problems = Vec::new();

        if record.scan_rows > thresholds.max_scan_rows {
            problems.push(Problem::new(
                ProblemType::TooManyRows,
                Severity::High,
                format!("Too many rows scanned: {}", record.scan_rows_formatted()),
                "Add selective WHERE conditions or indexes to reduce scanned rows",
                format!(
                    "scan_rows: {} (limit {})",
                    record.scan_rows,
                    format_rows(thresholds.max_scan_rows)
                ),
            ));
        }

        if record.scan_bytes > thresholds.max_scan_bytes {
            problems.push(Problem::new(
                ProblemType::TooManyRows,
                Severity::High,
                format!("Scanned data volume is too large: {}", record.scan_bytes_formatted()),
                "Select only the needed columns and filter on partition keys",
                format!(
                    "scan_bytes: {} (limit {})",
                    record.scan_bytes,
                    format_bytes(thresholds.max_scan_bytes)
                ),
            ));
        }

        if record.memory_used > defaults::MEMORY_INTENSIVE_BYTES {
            problems.push(Problem::new(
                ProblemType::MemoryIntensive,
                Severity::Medium,
                format!("High memory usage: {:.2} MB", record.memory_used_mb()),
                "Simplify the query, raise the memory limit or enable spilling",
                format!("memory_used: {:.2} MB", record.memory_used_mb()),
            ));
        }

        Ok(problems)
    }
}
