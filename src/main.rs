use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slow_query_analyzer::config::{CommandLineArgs, Config, LoggingConfig};
use slow_query_analyzer::models::QueryRecord;
use slow_query_analyzer::services::{
    AnalysisOutcome, AnalysisRequest, JsonFileSource, MySQLClient, QueryLogSource,
    SlowQueryAnalyzer, SqlAnalysis, StarRocksQueryLog,
};
use slow_query_analyzer::utils::{StringExt, clean_optional_string, truncate_chars};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args = CommandLineArgs::parse();
    let config = Config::load(&args)?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(&config.logging);
    tracing::info!("slowlog starting up");

    // The pool is lazy, so `--sql` never opens a connection
    let mut client = None;
    let source: Box<dyn QueryLogSource> = match clean_optional_string(args.input.as_ref()) {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => {
            let mysql = MySQLClient::connect(&config.database)?;
            client = Some(mysql.clone());
            Box::new(StarRocksQueryLog::new(mysql))
        },
    };

    let analyzer = SlowQueryAnalyzer::new(source, &config);

    if let Some(sql) = args.sql.clean() {
        print_sql_analysis(&analyzer.analyze_specific_sql(&sql));
    } else if let Some(limit) = args.top {
        let records = analyzer
            .get_top_slow_queries(limit, None, args.database.clean())
            .await?;
        print_top_queries(&records);
    } else {
        let request = AnalysisRequest {
            database: args.database.clean(),
            user: args.user.clean(),
            pattern: args.pattern.clean(),
            ..Default::default()
        };
        match analyzer.analyze(&request).await? {
            AnalysisOutcome::Report { path, report } => {
                println!(
                    "Analyzed {} slow queries, found {} problems",
                    report.slow_queries.len(),
                    report.total_problems()
                );
                println!("Report: {}", path.display());
            },
            AnalysisOutcome::NoSlowQueries => {
                println!("No slow queries found in the last {} hours", config.analysis.time_range_hours);
            },
        }
    }

    drop(analyzer);
    if let Some(client) = client {
        client.disconnect().await?;
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let log_filter = tracing_subscriber::EnvFilter::new(&logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    let Some(log_file) = &logging.file else {
        // stdout carries the command output, logs go to stderr
        let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        registry.with(console).init();
        return None;
    };

    let log_path = std::path::Path::new(log_file);
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_dir = log_path
        .parent()
        .and_then(|p| p.to_str())
        .filter(|p| !p.is_empty())
        .unwrap_or("logs");
    let file_name = log_path.file_name().and_then(|n| n.to_str()).unwrap_or("slowlog.log");
    // Rolling appender adds the date suffix itself
    let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

    let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    registry
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Some(guard)
}

fn print_sql_analysis(analysis: &SqlAnalysis) {
    println!("SQL: {}", analysis.sql.trim());
    println!();

    if analysis.problems.is_empty() {
        println!("No problems found.");
        return;
    }

    println!("Problems ({}):", analysis.problems.len());
    for p in &analysis.problems {
        println!("  [{}] {}: {}", p.severity, p.problem_type.label(), p.description);
        println!("      evidence: {}", p.evidence);
    }

    if !analysis.suggestions.is_empty() {
        println!();
        println!("Suggestions ({}):", analysis.suggestions.len());
        for s in &analysis.suggestions {
            println!("  [{} / {}] {}", s.priority, s.category, s.title);
            println!("      {}", s.description);
            if let Some(sql) = &s.suggested_sql {
                for line in sql.lines() {
                    println!("      | {}", line);
                }
            }
        }
    }
}

fn print_top_queries(records: &[QueryRecord]) {
    if records.is_empty() {
        println!("No slow queries found.");
        return;
    }

    println!("{:<4} {:<10} {:<10} {:<16} {:<12} SQL", "#", "TIME", "SEVERITY", "DATABASE", "SCAN ROWS");
    for (i, r) in records.iter().enumerate() {
        println!(
            "{:<4} {:<10} {:<10} {:<16} {:<12} {}",
            i + 1,
            format!("{:.2}s", r.execution_time),
            r.severity().as_str(),
            truncate_chars(&r.database, 13),
            r.scan_rows_formatted(),
            truncate_chars(&r.query_text.split_whitespace().collect::<Vec<_>>().join(" "), 80)
        );
    }
}
