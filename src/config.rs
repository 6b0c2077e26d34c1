use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::query_analyzer::Thresholds;
use crate::services::query_analyzer::thresholds::defaults;
use crate::services::report::ReportFormat;
use crate::utils::StringExt;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub optimization: OptimizationConfig,
    pub logging: LoggingConfig,
}

/// StarRocks FE connection (MySQL protocol)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Default schema for the session (default: information_schema)
    pub database: String,
    /// Upper bound of the connection pool
    pub max_connections: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum execution time in seconds for a query to count as slow
    pub slow_query_threshold: f64,
    /// Look-back window in hours (accepts 24, "24h", "2d")
    #[serde(alias = "analysis_time_range", deserialize_with = "deserialize_hours")]
    pub time_range_hours: u64,
    /// Maximum records fetched from the query log per run
    pub max_records: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_dir: PathBuf,
    pub report_format: ReportFormat,
    /// Fetch EXPLAIN output for every slow query (best effort)
    pub include_query_plans: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub max_scan_rows: u64,
    pub max_scan_bytes: u64,
    /// Emit index suggestions
    pub suggest_indexes: bool,
}

impl OptimizationConfig {
    /// Detection thresholds for one analysis run
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.max_scan_rows, self.max_scan_bytes)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log file path; a daily rolling file is written next to it when set
    pub file: Option<String>,
}

/// Command line arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "slowlog")]
#[command(version, about = "Slow query analyzer for StarRocks")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<String>,

    /// Look-back window (overrides config file, e.g., "24", "12h", "2d")
    #[arg(short = 't', long, value_name = "HOURS")]
    pub time_range: Option<String>,

    /// Slow query threshold in seconds (overrides config file)
    #[arg(long, value_name = "SECONDS")]
    pub threshold: Option<f64>,

    /// Only analyze queries from this database
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Only analyze queries from this user
    #[arg(short = 'u', long, value_name = "USER")]
    pub user: Option<String>,

    /// Only analyze queries whose text contains this pattern (case-insensitive)
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Report format: html, markdown or json (overrides config file)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Report output directory (overrides config file)
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<String>,

    /// Analyze a single SQL statement instead of the query log
    #[arg(long, value_name = "SQL", conflicts_with_all = ["top", "input"])]
    pub sql: Option<String>,

    /// Print the N slowest queries instead of writing a report
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Read query records from a JSON file instead of the query log
    #[arg(long, value_name = "PATH")]
    pub input: Option<String>,

    /// StarRocks FE host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// StarRocks FE query port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Logging level (overrides config file, e.g., "info,slow_query_analyzer=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load(cli_args: &CommandLineArgs) -> Result<Self, anyhow::Error> {
        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            tracing::info!("Loading configuration from {}", config_path);
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_DB_HOST / APP_DB_PORT / APP_DB_USER / APP_DB_PASSWORD: FE connection
    /// - APP_SLOW_QUERY_THRESHOLD: Slow query threshold in seconds
    /// - APP_TIME_RANGE: Look-back window (accepts "24", "24h", "2d")
    /// - APP_REPORT_DIR: Report output directory
    /// - APP_REPORT_FORMAT: html, markdown or json
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,slow_query_analyzer=debug")
    fn apply_env_overrides(&mut self) {
        if let Some(host) = env_var("APP_DB_HOST") {
            self.database.host = host;
            tracing::info!("Override database.host from env: {}", self.database.host);
        }

        if let Some(port) = env_var("APP_DB_PORT") {
            match port.parse() {
                Ok(val) => {
                    self.database.port = val;
                    tracing::info!("Override database.port from env: {}", self.database.port);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_DB_PORT '{}': {} (keep {})",
                    port,
                    e,
                    self.database.port
                ),
            }
        }

        if let Some(user) = env_var("APP_DB_USER") {
            self.database.user = user;
            tracing::info!("Override database.user from env: {}", self.database.user);
        }

        if let Some(password) = env_var("APP_DB_PASSWORD") {
            self.database.password = password;
            tracing::info!("Override database.password from env");
        }

        if let Some(threshold) = env_var("APP_SLOW_QUERY_THRESHOLD") {
            match threshold.parse() {
                Ok(val) => {
                    self.analysis.slow_query_threshold = val;
                    tracing::info!(
                        "Override analysis.slow_query_threshold from env: {}",
                        self.analysis.slow_query_threshold
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_SLOW_QUERY_THRESHOLD '{}': {} (keep {})",
                    threshold,
                    e,
                    self.analysis.slow_query_threshold
                ),
            }
        }

        if let Some(range) = env_var("APP_TIME_RANGE") {
            match parse_hours(&range) {
                Ok(val) => {
                    self.analysis.time_range_hours = val;
                    tracing::info!(
                        "Override analysis.time_range_hours from env: {}",
                        self.analysis.time_range_hours
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_TIME_RANGE '{}': {} (keep {})",
                    range,
                    e,
                    self.analysis.time_range_hours
                ),
            }
        }

        if let Some(dir) = env_var("APP_REPORT_DIR") {
            self.output.report_dir = PathBuf::from(dir);
            tracing::info!("Override output.report_dir from env: {}", self.output.report_dir.display());
        }

        if let Some(format) = env_var("APP_REPORT_FORMAT") {
            match format.parse::<ReportFormat>() {
                Ok(val) => {
                    self.output.report_format = val;
                    tracing::info!("Override output.report_format from env: {}", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_REPORT_FORMAT '{}': {} (keep {})",
                    format,
                    e,
                    self.output.report_format
                ),
            }
        }

        if let Some(level) = env_var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = args.host.clean() {
            self.database.host = host;
            tracing::info!("Override database.host from CLI: {}", self.database.host);
        }

        if let Some(port) = args.port {
            self.database.port = port;
            tracing::info!("Override database.port from CLI: {}", self.database.port);
        }

        if let Some(threshold) = args.threshold {
            self.analysis.slow_query_threshold = threshold;
            tracing::info!(
                "Override analysis.slow_query_threshold from CLI: {}",
                self.analysis.slow_query_threshold
            );
        }

        if let Some(range) = &args.time_range {
            match parse_hours(range) {
                Ok(val) => {
                    self.analysis.time_range_hours = val;
                    tracing::info!(
                        "Override analysis.time_range_hours from CLI: {}",
                        self.analysis.time_range_hours
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid --time-range '{}': {} (keep {})",
                    range,
                    e,
                    self.analysis.time_range_hours
                ),
            }
        }

        if let Some(format) = &args.format {
            match format.parse::<ReportFormat>() {
                Ok(val) => {
                    self.output.report_format = val;
                    tracing::info!("Override output.report_format from CLI: {}", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid --format '{}': {} (keep {})",
                    format,
                    e,
                    self.output.report_format
                ),
            }
        }

        if let Some(dir) = args.report_dir.clean() {
            self.output.report_dir = PathBuf::from(dir);
            tracing::info!("Override output.report_dir from CLI: {}", self.output.report_dir.display());
        }

        if let Some(level) = args.log_level.clean() {
            self.logging.level = level;
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database.host.trim().is_empty() {
            anyhow::bail!("database.host cannot be empty");
        }
        if self.database.port == 0 {
            anyhow::bail!("database.port cannot be 0");
        }
        if !self.analysis.slow_query_threshold.is_finite() || self.analysis.slow_query_threshold < 0.0 {
            anyhow::bail!(
                "analysis.slow_query_threshold must be >= 0, got {}",
                self.analysis.slow_query_threshold
            );
        }
        if self.analysis.time_range_hours == 0 {
            anyhow::bail!("analysis.time_range_hours must be > 0");
        }
        if self.analysis.time_range_hours > MAX_TIME_RANGE_HOURS {
            anyhow::bail!(
                "analysis.time_range_hours must be <= {}, got {}",
                MAX_TIME_RANGE_HOURS,
                self.analysis.time_range_hours
            );
        }
        if self.analysis.max_records == 0 {
            anyhow::bail!("analysis.max_records must be > 0");
        }
        if self.optimization.max_scan_rows == 0 {
            anyhow::bail!("optimization.max_scan_rows must be > 0");
        }
        if self.optimization.max_scan_bytes == 0 {
            anyhow::bail!("optimization.max_scan_bytes must be > 0");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        possible_paths
            .iter()
            .find(|path| Path::new(path).exists())
            .map(|path| path.to_string())
    }

    pub fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9030,
            user: "root".to_string(),
            password: String::new(),
            database: "information_schema".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { slow_query_threshold: 1.0, time_range_hours: 24, max_records: 1000 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("./reports"),
            report_format: ReportFormat::Html,
            include_query_plans: true,
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            max_scan_rows: defaults::MAX_SCAN_ROWS,
            max_scan_bytes: defaults::MAX_SCAN_BYTES,
            suggest_indexes: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file: None }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().clean()
}

/// Longest accepted look-back window, one hundred years
pub const MAX_TIME_RANGE_HOURS: u64 = 24 * 365 * 100;

/// Parse a look-back window into hours: "24", "24h", "2d", "1w"
pub fn parse_hours(input: &str) -> Result<u64, String> {
    let s = input.trim().to_lowercase();
    if let Ok(val) = s.parse::<u64>() {
        return Ok(val);
    }

    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit.trim() {
        "h" | "hr" | "hour" | "hours" => Ok(n),
        "d" | "day" | "days" => n.checked_mul(24).ok_or_else(|| "time range too large".to_string()),
        "w" | "week" | "weeks" => {
            n.checked_mul(24 * 7).ok_or_else(|| "time range too large".to_string())
        },
        unit => Err(format!("unsupported unit: {}", unit)),
    }
}

// Accept a number of hours or a human-friendly string
fn deserialize_hours<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of hours or a string like '24h' or '2d'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_hours(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_hours("24"), Ok(24));
        assert_eq!(parse_hours("12h"), Ok(12));
        assert_eq!(parse_hours("2d"), Ok(48));
        assert_eq!(parse_hours("1 week"), Ok(168));
        assert!(parse_hours("h").is_err());
        assert!(parse_hours("5m").is_err());
    }

    #[test]
    fn test_parse_hours_rejects_overflow() {
        assert_eq!(parse_hours("999999999999999999w"), Err("time range too large".to_string()));
        assert_eq!(parse_hours("999999999999999999d"), Err("time range too large".to_string()));
        assert_eq!(parse_hours("10000000000"), Ok(10_000_000_000));
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.port, 9030);
        assert_eq!(config.analysis.time_range_hours, 24);
        assert_eq!(config.output.report_format, ReportFormat::Html);
        assert_eq!(config.optimization.thresholds(), Thresholds::default());
    }

    #[test]
    fn test_from_toml_partial_sections() {
        let toml_str = r#"
            [database]
            host = "fe.internal"

            [analysis]
            slow_query_threshold = 2.5
            time_range_hours = "3d"

            [output]
            report_format = "markdown"
            include_query_plans = false

            [optimization]
            max_scan_rows = 500
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.host, "fe.internal");
        assert_eq!(config.database.port, 9030);
        assert_eq!(config.analysis.slow_query_threshold, 2.5);
        assert_eq!(config.analysis.time_range_hours, 72);
        assert_eq!(config.output.report_format, ReportFormat::Markdown);
        assert!(!config.output.include_query_plans);
        assert_eq!(config.optimization.thresholds(), Thresholds::new(500, defaults::MAX_SCAN_BYTES));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.database.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.slow_query_threshold = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.time_range_hours = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.time_range_hours = MAX_TIME_RANGE_HOURS;
        assert!(config.validate().is_ok());
        config.analysis.time_range_hours = 10_000_000_000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.optimization.max_scan_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = Config::default();
        let args = CommandLineArgs {
            threshold: Some(3.0),
            time_range: Some("2d".to_string()),
            format: Some("json".to_string()),
            host: Some("  ".to_string()),
            port: Some(9031),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.analysis.slow_query_threshold, 3.0);
        assert_eq!(config.analysis.time_range_hours, 48);
        assert_eq!(config.output.report_format, ReportFormat::Json);
        assert_eq!(config.database.host, "127.0.0.1");
        assert_eq!(config.database.port, 9031);
    }

    #[test]
    fn test_cli_invalid_format_keeps_previous() {
        let mut config = Config::default();
        let args = CommandLineArgs { format: Some("pdf".to_string()), ..Default::default() };
        config.apply_cli_overrides(&args);
        assert_eq!(config.output.report_format, ReportFormat::Html);
    }
}
