//! Problem detector
//!
//! Runs a fixed set of detection passes over one query record (plus an
//! optional execution plan) and returns every problem found. Detection is
//! pure: the same record, plan and thresholds always give the same list.

pub mod extract;
pub mod models;
pub mod patterns;
pub mod rules;
pub mod scanner;
pub mod thresholds;


use once_cell::sync::Lazy;

pub use extract::{extract_join_columns, extract_order_columns, extract_tables, extract_where_columns};
pub use models::{ExecutionPlan, Problem, ProblemType};
pub use rules::{DetectError, DetectionContext, DetectionPass, get_all_passes};
pub use thresholds::Thresholds;

use crate::models::QueryRecord;

static DEFAULT_DETECTOR: Lazy<ProblemDetector> = Lazy::new(ProblemDetector::new);

/// Detect problems with the default pass registry
pub fn detect_problems(
    record: &QueryRecord,
    plan: Option<&ExecutionPlan>,
    thresholds: &Thresholds,
) -> Vec<Problem> {
    DEFAULT_DETECTOR.detect(record, plan, thresholds)
}

/// Ordered collection of detection passes
pub struct ProblemDetector {
    passes: Vec<Box<dyn DetectionPass>>,
}

impl Default for ProblemDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemDetector {
    pub fn new() -> Self {
        Self { passes: get_all_passes() }
    }

    /// Build a detector over a custom pass list
    pub fn with_passes(passes: Vec<Box<dyn DetectionPass>>) -> Self {
        Self { passes }
    }

    /// Run every applicable pass in order and concatenate the findings
    ///
    /// A failing pass is logged and contributes nothing; later passes still run.
    pub fn detect(
        &self,
        record: &QueryRecord,
        plan: Option<&ExecutionPlan>,
        thresholds: &Thresholds,
    ) -> Vec<Problem> {
        let context = DetectionContext { record, plan, thresholds };
        let mut problems = Vec::new();

        for pass in &self.passes {
            if !pass.applicable_to(&context) {
                continue;
            }
            match pass.evaluate(&context) {
                Ok(found) => problems.extend(found),
                Err(e) => {
                    tracing::warn!(
                        "Detection pass {} ({}) failed for query {}: {}",
                        pass.id(),
                        pass.name(),
                        record.query_id,
                        e
                    );
                },
            }
        }

        tracing::debug!("Query {}: {} problem(s) detected", record.query_id, problems.len());
        problems
    }
}
