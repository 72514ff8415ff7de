//! Convenient imports for typical `relorm` usage.
//!
//! ```ignore
//! use relorm::prelude::*;
//! ```

pub use crate::{
    BelongsTo, Builder, Context, Dialect, DialectKind, DynModel, Executor, FromRow, HasMany,
    HasOne, Model, MySql, OrmError, OrmResult, Postgres, Scope, Sqlite, ToValue, Value, from,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteExecutor;
