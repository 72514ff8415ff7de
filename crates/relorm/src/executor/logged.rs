use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::Level;

use super::Executor;
use crate::config::LogConfig;
use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// Wraps an executor with `tracing` output, slow query warnings and an optional timeout.
///
/// ```ignore
/// let db = LoggedExecutor::with_config(
///     SqliteExecutor::open_in_memory()?,
///     LogConfig::new().level(Level::INFO).with_slow_query_threshold(Duration::from_millis(50)),
/// );
/// ```
#[derive(Debug)]
pub struct LoggedExecutor<E> {
    inner: E,
    config: LogConfig,
}

impl<E: Executor> LoggedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self::with_config(inner, LogConfig::default())
    }

    pub fn with_config(inner: E, config: LogConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    async fn timed<T, F>(&self, sql: &str, param_count: usize, future: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>> + Send,
        T: Send,
    {
        let start = Instant::now();
        let result = match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| OrmError::Timeout(timeout))?,
            None => future.await,
        };
        if result.is_ok() {
            self.report(sql, param_count, start.elapsed());
        }
        result
    }

    fn report(&self, sql: &str, param_count: usize, elapsed: Duration) {
        let sql = self.config.truncate_sql(sql);
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        match self.config.slow_query_threshold {
            Some(threshold) if elapsed > threshold => tracing::warn!(
                target: "relorm.sql",
                param_count,
                duration_ms,
                sql = %sql,
                "slow query"
            ),
            _ => emit_at_level!(
                self.config.level,
                target: "relorm.sql",
                param_count,
                duration_ms,
                sql = %sql,
            ),
        }
    }
}

#[async_trait]
impl<E: Executor> Executor for LoggedExecutor<E> {
    fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect()
    }

    async fn query(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        self.timed(sql, bindings.len(), self.inner.query(ctx, sql, bindings))
            .await
    }

    async fn execute(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        self.timed(sql, bindings.len(), self.inner.execute(ctx, sql, bindings))
            .await
    }
}
