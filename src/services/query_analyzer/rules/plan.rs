//! Execution-plan rule (P004)

use super::*;
use crate::services::query_analyzer::patterns;

/// P004: Scan operator in plan
/// Condition: plan text mentions OLAP_SCAN or FULL_SCAN
pub struct P004PlanScan;

impl DetectionPass for P004PlanScan {
    fn id(&self) -> &str {
        "P004"
    }
    fn name(&self) -> &str {
        "Execution plan scan"
    }

    fn applicable_to(&self, context: &DetectionContext) -> bool {
        context.plan.is_some()
    }

    fn evaluate(&self, context: &DetectionContext) -> Result<Vec<Problem>, DetectError> {
        let Some(plan) = context.plan else {
            return Ok(Vec::new());
        };

        let problems = patterns::plan_scan_marker(&plan.as_text())
            .map(|marker| {
                Problem::new(
                    ProblemType::FullTableScan,
                    Severity::Medium,
                    "Execution plan contains a full table scan",
                    "Check partition pruning and filter conditions",
                    marker,
                )
            })
            .into_iter()
            .collect();

        Ok(problems)
    }
}
