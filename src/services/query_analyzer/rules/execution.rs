//! Execution-time rule (P001)

use super::*;

/// P001: Long execution time
/// Condition: execution_time >= 5s; >= 10s is critical
///
/// Reported as a full table scan, the most common cause of a long runtime.
pub struct P001ExecutionTime;

impl DetectionPass for P001ExecutionTime {
    fn id(&self) -> &str {
        "P001"
    }
    fn name(&self) -> &str {
        "Execution time"
    }

    fn evaluate(&self, context: &DetectionContext) -> Result<Vec<Problem>, DetectError> {
        let secs = context.record.execution_time;

        let problem = if secs >= defaults::CRITICAL_EXECUTION_SECS {
            Some(Problem::new(
                ProblemType::FullTableScan,
                Severity::Critical,
                format!("Query execution time is too long: {:.2}s", secs),
                "Check for full table scans; consider adding indexes or rewriting the query",
                format!("execution_time: {:.2}s", secs),
            ))
        } else if secs >= defaults::HIGH_EXECUTION_SECS {
            Some(Problem::new(
                ProblemType::FullTableScan,
                Severity::High,
                format!("Query execution time is high: {:.2}s", secs),
                "Review the query plan to see whether it needs tuning",
                format!("execution_time: {:.2}s", secs),
            ))
        } else {
            None
        };

        Ok(problem.into_iter().collect())
    }
}
