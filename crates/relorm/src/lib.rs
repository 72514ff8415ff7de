//! # relorm
//!
//! An immutable SQL query builder with pluggable dialects, scopes and batched relationship
//! loading.
//!
//! ## Features
//!
//! - **Dialect independent**: one builder renders SQLite, MySQL or Postgres SQL
//! - **Immutable builders**: every method returns a new builder; the receiver never changes
//! - **Parameterized**: values always travel as bindings, in placeholder order
//! - **Scopes**: reusable query transformations, global ones applied on every query
//! - **Relationships**: `HasOne` / `HasMany` / `BelongsTo`, `where_has` filters and
//!   dotted-path eager loading with one query per path segment
//!
//! ## Query Builder
//!
//! ```ignore
//! use relorm::prelude::*;
//!
//! // SELECT "users".* FROM "users" WHERE "age" > ? AND "deleted_at" IS NULL LIMIT 10
//! let (sql, bindings) = Builder::table("users")
//!     .and_where("age", ">", 18)
//!     .where_null("deleted_at")
//!     .limit(10)
//!     .to_sql(&Sqlite)?;
//! ```
//!
//! ## Models
//!
//! ```ignore
//! #[derive(Debug, Clone, Model)]
//! #[orm(table = "foos")]
//! struct Foo {
//!     #[orm(id)]
//!     id: i64,
//!     bar: HasOne<Bar>,
//! }
//!
//! let foos = Foo::query()
//!     .where_has("bar", |q| q.and_where("id", ">", 3))
//!     .with("bar")
//!     .get(&db)
//!     .await?;
//! ```

pub mod builder;
pub mod condition;
pub mod config;
pub mod context;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod fragment;
pub mod ident;
pub mod model;
pub mod prelude;
pub mod relation;
pub mod row;
pub mod value;

pub use builder::{Builder, JoinKind, Scope, SortDir, UnknownRelation};
pub use condition::{Conditions, Logic, Predicate};
pub use config::{LogConfig, OrmConfig};
pub use context::Context;
pub use dialect::{ColumnType, Dialect, DialectKind, MySql, Postgres, Sqlite};
pub use error::{OrmError, OrmResult};
pub use executor::{Executor, LoggedExecutor};
pub use fragment::{Compile, Compiled, Compiler, Fragment};
pub use ident::Ident;
pub use model::{DynModel, FieldMeta, Model, ModelMeta, from};
pub use relation::{
    BelongsTo, ForeignKey, HasMany, HasOne, RelatedIndex, Relation, RelationKeys, RelationKind,
    RelationMeta, initialize_relation, initialize_relations, load, load_dyn, load_missing,
};
pub use row::{FromRow, Row};
pub use value::{FromValue, ToValue, Value};

#[cfg(feature = "sqlite")]
pub use executor::SqliteExecutor;

// Re-export derive macros
#[cfg(feature = "derive")]
pub use relorm_derive::{FromRow, Model};
