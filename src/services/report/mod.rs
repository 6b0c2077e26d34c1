//! Report rendering and writing
//!
//! Renderers are pure `&DiagnosisReport -> String` functions. Only
//! [`ReportGenerator::generate`] touches the filesystem.

pub mod html;
pub mod json;
pub mod markdown;


use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::OutputConfig;
use crate::services::analyzer_service::DiagnosisReport;
use crate::utils::{AnalyzerError, AnalyzerResult};

/// Number of queries rendered in detail by the text reports
pub const MAX_DETAILED_QUERIES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    #[serde(alias = "md")]
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "markdown",
            ReportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(ReportFormat::Html),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            other => Err(AnalyzerError::config(format!(
                "Unknown report format '{}', expected html, markdown or json",
                other
            ))),
        }
    }
}

/// Render a report in the given format
pub fn render(report: &DiagnosisReport, format: ReportFormat) -> AnalyzerResult<String> {
    match format {
        ReportFormat::Html => html::render(report),
        ReportFormat::Markdown => Ok(markdown::render(report)),
        ReportFormat::Json => json::render(report),
    }
}

/// Writes rendered reports into the configured directory
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    report_dir: PathBuf,
    format: ReportFormat,
}

impl ReportGenerator {
    pub fn new(config: &OutputConfig) -> Self {
        Self { report_dir: config.report_dir.clone(), format: config.report_format }
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// File name for a report generated now
    pub fn file_name(&self) -> String {
        format!(
            "slow_query_report_{}.{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            self.format.extension()
        )
    }

    /// Render `report` and write it, returning the file path
    pub fn generate(&self, report: &DiagnosisReport) -> AnalyzerResult<PathBuf> {
        let content = render(report, self.format)?;

        std::fs::create_dir_all(&self.report_dir).map_err(|e| {
            AnalyzerError::Report(format!(
                "Failed to create report directory {}: {}",
                self.report_dir.display(),
                e
            ))
        })?;

        let path = self.report_dir.join(self.file_name());
        std::fs::write(&path, content).map_err(|e| {
            AnalyzerError::Report(format!("Failed to write report {}: {}", path.display(), e))
        })?;

        tracing::info!("Generated {} report: {}", self.format, path.display());
        Ok(path)
    }
}
