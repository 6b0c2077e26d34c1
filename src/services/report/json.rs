use crate::services::analyzer_service::DiagnosisReport;
use crate::utils::AnalyzerResult;

/// Pretty-printed JSON, the machine-readable form of the report
pub fn render(report: &DiagnosisReport) -> AnalyzerResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
