//! In-process SQLite via `rusqlite`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, params_from_iter};

use super::Executor;
use crate::context::Context;
use crate::dialect::{Dialect, Sqlite};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::{TIMESTAMP_FORMAT, Value};

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sql::Null),
            Value::Bool(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::Int(v) => ToSqlOutput::Owned(Sql::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(Sql::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            Value::Uuid(v) => ToSqlOutput::Owned(Sql::Text(v.hyphenated().to_string())),
            Value::Timestamp(v) => {
                ToSqlOutput::Owned(Sql::Text(v.format(TIMESTAMP_FORMAT).to_string()))
            }
            Value::Json(v) => ToSqlOutput::Owned(Sql::Text(v.to_string())),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Int(v),
            ValueRef::Real(v) => Value::Float(v),
            ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
        }
    }
}

/// [`Executor`] over a single `rusqlite` connection.
///
/// Statements run synchronously on the calling task while holding the connection lock.
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Ok(Self::new(Connection::open(path)?))
    }

    pub fn open_in_memory() -> OrmResult<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Run several `;`-separated statements without bindings (schema setup, fixtures).
    pub fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        Ok(self.lock()?.execute_batch(sql)?)
    }

    fn lock(&self) -> OrmResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| OrmError::Other("sqlite connection mutex poisoned".to_string()))
    }

    fn run_query(&self, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut rows = stmt.query(params_from_iter(bindings.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|i| row.get_ref(i).map(Value::from))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            out.push(Row::new(columns.clone(), values));
        }
        Ok(out)
    }

    fn run_execute(&self, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        let conn = self.lock()?;
        let affected = conn.execute(sql, params_from_iter(bindings.iter()))?;
        Ok(affected as u64)
    }
}

#[async_trait]
impl Executor for SqliteExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &Sqlite
    }

    async fn query(&self, _ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        tracing::debug!(target: "relorm.sql", sql, param_count = bindings.len());
        self.run_query(sql, bindings)
    }

    async fn execute(&self, _ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        tracing::debug!(target: "relorm.sql", sql, param_count = bindings.len());
        self.run_execute(sql, bindings)
    }
}
