//! Runtime configuration: default dialect, relationship strictness and SQL logging.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::builder::{Builder, UnknownRelation};
use crate::dialect::{Dialect, DialectKind};
use crate::error::{OrmError, OrmResult};
use crate::executor::{Executor, LoggedExecutor};
use crate::model::Model;

/// How [`LoggedExecutor`] reports statements.
///
/// Events go to the `relorm.sql` target. Failed statements are returned, never logged.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Tracing event level for executed statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Statements slower than this are reported at `WARN`.
    pub slow_query_threshold: Option<Duration>,
    /// Cancel statements running longer than this.
    pub query_timeout: Option<Duration>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            slow_query_threshold: None,
            query_timeout: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Set the query timeout. Timed out statements fail with [`OrmError::Timeout`].
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

/// Truncate to at most `max_bytes` without splitting a UTF-8 character.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Top-level settings, loadable from serde sources or the environment.
///
/// | variable | field |
/// |---|---|
/// | `RELORM_DIALECT` | `dialect` (`sqlite`, `mysql`, `postgres`) |
/// | `RELORM_STRICT_RELATIONS` | `unknown_relation` (`true` = error, `false` = skip) |
/// | `RELORM_LOG_LEVEL` | `log_level` |
/// | `RELORM_SLOW_QUERY_MS` | `slow_query_ms` |
/// | `RELORM_QUERY_TIMEOUT_MS` | `query_timeout_ms` |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    pub dialect: DialectKind,
    pub unknown_relation: UnknownRelation,
    pub log_level: Option<String>,
    pub max_sql_length: Option<usize>,
    pub slow_query_ms: Option<u64>,
    pub query_timeout_ms: Option<u64>,
}

impl OrmConfig {
    pub fn from_env() -> OrmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup("RELORM_DIALECT") {
            config.dialect = v.parse()?;
        }
        if let Some(v) = lookup("RELORM_STRICT_RELATIONS") {
            config.unknown_relation = if parse_bool("RELORM_STRICT_RELATIONS", &v)? {
                UnknownRelation::Error
            } else {
                UnknownRelation::Skip
            };
        }
        if let Some(v) = lookup("RELORM_LOG_LEVEL") {
            parse_level(&v)?;
            config.log_level = Some(v);
        }
        if let Some(v) = lookup("RELORM_SLOW_QUERY_MS") {
            config.slow_query_ms = Some(parse_u64("RELORM_SLOW_QUERY_MS", &v)?);
        }
        if let Some(v) = lookup("RELORM_QUERY_TIMEOUT_MS") {
            config.query_timeout_ms = Some(parse_u64("RELORM_QUERY_TIMEOUT_MS", &v)?);
        }
        Ok(config)
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect.dialect()
    }

    /// Model query carrying this configuration's relationship policy.
    pub fn query<M: Model>(&self) -> Builder<M> {
        M::query().unknown_relation(self.unknown_relation)
    }

    pub fn log_config(&self) -> OrmResult<LogConfig> {
        let mut log = LogConfig::default();
        if let Some(level) = &self.log_level {
            log = log.level(parse_level(level)?);
        }
        if let Some(len) = self.max_sql_length {
            log = log.max_sql_length(len);
        }
        if let Some(ms) = self.slow_query_ms {
            log = log.with_slow_query_threshold(Duration::from_millis(ms));
        }
        if let Some(ms) = self.query_timeout_ms {
            log = log.with_query_timeout(Duration::from_millis(ms));
        }
        Ok(log)
    }

    /// Wrap `executor` with SQL logging configured from these settings.
    pub fn logged<E: Executor>(&self, executor: E) -> OrmResult<LoggedExecutor<E>> {
        Ok(LoggedExecutor::with_config(executor, self.log_config()?))
    }
}

fn parse_bool(key: &str, value: &str) -> OrmResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(OrmError::Other(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

fn parse_u64(key: &str, value: &str) -> OrmResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| OrmError::Other(format!("{key}: expected an integer, got '{value}'")))
}

fn parse_level(value: &str) -> OrmResult<Level> {
    Level::from_str(value.trim())
        .map_err(|_| OrmError::Other(format!("unknown log level '{value}'")))
}
