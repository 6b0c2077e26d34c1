use crate::config::DatabaseConfig;
use crate::utils::{AnalyzerError, AnalyzerResult};
use mysql_async::{OptsBuilder, Pool, PoolConstraints, PoolOpts, prelude::Queryable};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

/// Rendering of SQL NULL in string result sets
pub const NULL_VALUE: &str = "NULL";

/// Thin client over a mysql_async pool talking to a StarRocks FE
#[derive(Clone)]
pub struct MySQLClient {
    pool: Arc<Pool>,
}

impl MySQLClient {
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Build a small pool from the `[database]` section
    ///
    /// No connection is opened until the first query.
    pub fn connect(config: &DatabaseConfig) -> AnalyzerResult<Self> {
        let constraints = PoolConstraints::new(1, config.max_connections.max(1)).ok_or_else(|| {
            AnalyzerError::config("Failed to create pool constraints: invalid min/max values")
        })?;

        let opts = OptsBuilder::default()
            .ip_or_hostname(config.host.as_str())
            .tcp_port(config.port)
            .user(Some(config.user.as_str()))
            .pass(if config.password.is_empty() { None } else { Some(config.password.as_str()) })
            .db_name(if config.database.is_empty() { None } else { Some(config.database.as_str()) })
            .prefer_socket(false)
            .tcp_keepalive(Some(30_000_u32))
            .tcp_nodelay(true)
            .pool_opts(
                PoolOpts::default()
                    .with_constraints(constraints)
                    .with_inactive_connection_ttl(Duration::from_secs(300))
                    .with_ttl_check_interval(Duration::from_secs(60)),
            );

        tracing::info!(
            "Created MySQL connection pool for {}@{}:{}",
            config.user,
            config.host,
            config.port
        );

        Ok(Self::from_pool(Pool::new(opts)))
    }

    /// Execute a query and return results as (column_names, rows)
    pub async fn query_raw(&self, sql: &str) -> AnalyzerResult<(Vec<String>, Vec<Vec<String>>)> {
        let mut conn = self.pool.get_conn().await.map_err(|e| {
            tracing::error!("Failed to get connection from pool: {}", e);
            AnalyzerError::connection(format!("Failed to get connection: {}", e))
        })?;

        let rows: Vec<mysql_async::Row> = conn.query(sql).await.map_err(|e| {
            tracing::error!("MySQL query execution failed: {}", e);
            AnalyzerError::query(format!("SQL execution failed: {}", e))
        })?;

        tracing::debug!("Query returned {} rows", rows.len());
        drop(conn);

        Ok(process_query_result(rows))
    }

    /// Execute a prepared statement with positional parameters
    pub async fn query_with_params<P>(
        &self,
        sql: &str,
        params: P,
    ) -> AnalyzerResult<(Vec<String>, Vec<Vec<String>>)>
    where
        P: Into<mysql_async::Params> + Send,
    {
        let mut conn = self.pool.get_conn().await.map_err(|e| {
            tracing::error!("Failed to get connection from pool: {}", e);
            AnalyzerError::connection(format!("Failed to get connection: {}", e))
        })?;

        let rows: Vec<mysql_async::Row> = conn.exec(sql, params.into()).await.map_err(|e| {
            tracing::error!("MySQL statement execution failed: {}", e);
            AnalyzerError::query(format!("SQL execution failed: {}", e))
        })?;

        tracing::debug!("Statement returned {} rows", rows.len());
        drop(conn);

        Ok(process_query_result(rows))
    }

    /// Close every pooled connection
    pub async fn disconnect(self) -> AnalyzerResult<()> {
        match Arc::try_unwrap(self.pool) {
            Ok(pool) => pool.disconnect().await.map_err(|e| {
                AnalyzerError::connection(format!("Failed to close connection pool: {}", e))
            }),
            // other clones still hold the pool; it closes when the last one drops
            Err(_) => Ok(()),
        }
    }
}

fn process_query_result(rows: Vec<mysql_async::Row>) -> (Vec<String>, Vec<Vec<String>>) {
    let Some(first) = rows.first() else {
        return (Vec::new(), Vec::new());
    };

    let columns: Vec<String> =
        first.columns_ref().iter().map(|col| col.name_str().to_string()).collect();
    let col_count = columns.len();

    let result_rows = rows
        .iter()
        .map(|row| {
            (0..col_count)
                .map(|idx| row.as_ref(idx).map(value_to_string).unwrap_or_else(|| NULL_VALUE.to_string()))
                .collect()
        })
        .collect();

    (columns, result_rows)
}

fn value_to_string(value: &mysql_async::Value) -> String {
    match value {
        mysql_async::Value::NULL => NULL_VALUE.to_string(),
        mysql_async::Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        mysql_async::Value::Int(i) => i.to_string(),
        mysql_async::Value::UInt(u) => u.to_string(),
        mysql_async::Value::Float(f) => f.to_string(),
        mysql_async::Value::Double(d) => d.to_string(),
        mysql_async::Value::Date(year, month, day, hour, minute, second, micro) => {
            let mut s = String::with_capacity(26);
            let _ = write!(
                s,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if *micro > 0 {
                let _ = write!(s, ".{:06}", micro);
            }
            s
        },
        mysql_async::Value::Time(_neg, days, hours, minutes, seconds, _micro) => {
            let total_hours = days * 24 + (*hours as u32);
            format!("{}:{:02}:{:02}", total_hours, minutes, seconds)
        },
    }
}
