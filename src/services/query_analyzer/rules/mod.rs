//! Detection passes
//!
//! Each pass is an independent rule object. Passes never see each other's
//! output; the detector concatenates their findings in registry order.

pub mod execution;
pub mod plan;
pub mod scan_volume;
pub mod structure;

use thiserror::Error;

use super::models::{ExecutionPlan, Problem, ProblemType};
use super::scanner::ScanError;
use super::thresholds::{Thresholds, defaults};
use crate::models::{QueryRecord, Severity};

// ============================================================================
// Pass Trait and Types
// ============================================================================

/// Failure inside one pass; the detector logs it and moves on
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("SQL text could not be scanned: {0}")]
    Scan(#[from] ScanError),
}

/// Everything a pass may look at
pub struct DetectionContext<'a> {
    pub record: &'a QueryRecord,
    pub plan: Option<&'a ExecutionPlan>,
    pub thresholds: &'a Thresholds,
}

/// Detection pass trait
pub trait DetectionPass: Send + Sync {
    /// Pass ID (e.g., "P001")
    fn id(&self) -> &str;

    /// Pass name
    fn name(&self) -> &str;

    /// Whether the pass has anything to look at
    fn applicable_to(&self, _context: &DetectionContext) -> bool {
        true
    }

    /// Evaluate the pass and return every problem it finds
    fn evaluate(&self, context: &DetectionContext) -> Result<Vec<Problem>, DetectError>;
}

/// All passes, in evaluation order
pub fn get_all_passes() -> Vec<Box<dyn DetectionPass>> {
    vec![
        Box::new(execution::P001ExecutionTime),
        Box::new(scan_volume::P002ScanVolume),
        Box::new(structure::P003StatementStructure),
        Box::new(plan::P004PlanScan),
    ]
}
