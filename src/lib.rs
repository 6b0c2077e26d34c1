//! Slow Query Analyzer Library
//!
//! Collects slow queries from a StarRocks cluster, detects common anti-patterns
//! and writes a report with optimization suggestions.

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{CommandLineArgs, Config};
pub use models::{QueryRecord, Severity};
pub use services::{AnalysisOutcome, AnalysisRequest, SlowQueryAnalyzer};
pub use utils::{AnalyzerError, AnalyzerResult};
