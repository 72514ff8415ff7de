//! The database boundary.
//!
//! An [`Executor`] runs SQL with positional bindings and reports the dialect it speaks.
//! Builders compile against `executor.dialect()`, so the same builder runs unchanged on
//! SQLite and Postgres.
//!
//! Implementations:
//! - `tokio_postgres::Client` / `tokio_postgres::Transaction` (Postgres)
//! - [`SqliteExecutor`] over `rusqlite` (feature `sqlite`)
//! - [`LoggedExecutor`] wrapping any of the above with `tracing` output

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;

mod logged;
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use logged::LoggedExecutor;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

/// Runs SQL. The context is the builder's; executors may read it (tracing ids, tenancy).
#[async_trait]
pub trait Executor: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Run a row-returning statement.
    async fn query(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<u64>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for &E {
    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    async fn query(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        (**self).query(ctx, sql, bindings).await
    }

    async fn execute(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        (**self).execute(ctx, sql, bindings).await
    }
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    async fn query(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        (**self).query(ctx, sql, bindings).await
    }

    async fn execute(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        (**self).execute(ctx, sql, bindings).await
    }
}
