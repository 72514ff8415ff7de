//! Immutable SELECT builder.
//!
//! Every method takes `&self` and returns a new [`Builder`]. Clause containers sit behind
//! `Arc`s; a method clones the builder (cheap reference bumps) and copies only the clause it
//! modifies via [`Arc::make_mut`]. Any builder obtained along a chain stays valid and can be
//! extended independently:
//!
//! ```ignore
//! use relorm::{Builder, Sqlite};
//!
//! let base = Builder::table("foos").and_where("active", "=", true);
//! let recent = base.order_by_desc("created_at").limit(10);
//! let named = base.and_where("name", "LIKE", "a%");
//!
//! assert_eq!(
//!     base.to_sql(&Sqlite)?.0,
//!     r#"SELECT "foos".* FROM "foos" WHERE "active" = ?"#
//! );
//! ```
//!
//! `Builder<()>` is untyped and addresses a table by name. `Builder<M>` for a
//! [`Model`](crate::Model) starts from the model's table and global scopes and adds
//! relationship filters, eager loading and typed fetching (see `typed.rs`).

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::condition::Conditions;
use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::fragment::{Compile, Compiled, Compiler, Fragment};
use crate::row::{FromRow, Row};
use crate::value::{FromValue, Value};

mod clauses;
mod conditions;
mod scope;
mod typed;

pub use clauses::{JoinKind, SortDir};
pub use scope::Scope;
pub use typed::UnknownRelation;

use clauses::{GroupBy, Join, Joins, Limit, OrderBy, SelectList, prefixed, table_ref};
use scope::ScopeSet;

/// A deferred construction error, raised when the builder is compiled.
#[derive(Debug, Clone)]
pub(crate) enum BuildError {
    MissingRelationship { model: String, relation: String },
    MissingField { model: String, field: String },
    CompositeKey { model: String, relation: String },
    UnsupportedKey(String),
    Invalid(String),
}

impl BuildError {
    pub(crate) fn from_error(err: &OrmError) -> Self {
        match err.root() {
            OrmError::MissingRelationship { model, relation } => BuildError::MissingRelationship {
                model: model.clone(),
                relation: relation.clone(),
            },
            OrmError::MissingField { model, field } => BuildError::MissingField {
                model: model.clone(),
                field: field.clone(),
            },
            OrmError::CompositeKey { model, relation } => BuildError::CompositeKey {
                model: model.clone(),
                relation: relation.clone(),
            },
            OrmError::UnsupportedKey(msg) => BuildError::UnsupportedKey(msg.clone()),
            other => BuildError::Invalid(other.to_string()),
        }
    }

    pub(crate) fn to_error(&self) -> OrmError {
        match self {
            BuildError::MissingRelationship { model, relation } => {
                OrmError::missing_relationship(model.as_str(), relation.as_str())
            }
            BuildError::MissingField { model, field } => {
                OrmError::missing_field(model.as_str(), field.as_str())
            }
            BuildError::CompositeKey { model, relation } => OrmError::CompositeKey {
                model: model.clone(),
                relation: relation.clone(),
            },
            BuildError::UnsupportedKey(msg) => OrmError::UnsupportedKey(msg.clone()),
            BuildError::Invalid(msg) => OrmError::InvalidCondition(msg.clone()),
        }
    }
}

/// What a builder selects FROM.
#[derive(Debug, Clone)]
enum Source {
    /// `"bars"` or `"bars AS b"`.
    Table(Arc<str>),
    /// `(<sub>) AS alias`
    Sub(Fragment, Arc<str>),
}

impl Source {
    /// The name rows of this source are addressed by.
    fn name(&self) -> &str {
        match self {
            Source::Table(table) => table,
            Source::Sub(_, alias) => alias,
        }
    }

    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        match self {
            Source::Table(table) => Ok(Compiled::new(
                format!("FROM {}", table_ref(c, table)?),
                Vec::new(),
            )),
            Source::Sub(sub, alias) => {
                let mut out = Compiled::new("FROM", Vec::new());
                out.push(" ", Fragment::group(sub.clone()).compile(c)?);
                out.push(" ", Compiled::new(format!("AS {}", c.ident(alias)?), Vec::new()));
                Ok(out)
            }
        }
    }
}

/// Immutable SELECT query builder, optionally bound to a model type `M`.
pub struct Builder<M = ()> {
    from: Option<Source>,
    select: Arc<SelectList>,
    joins: Arc<Joins>,
    wheres: Arc<Conditions>,
    group_by: Arc<GroupBy>,
    havings: Arc<Conditions>,
    order_by: Arc<OrderBy>,
    limit: Limit,
    scopes: Arc<ScopeSet>,
    context: Context,
    /// Relationship paths to eager load after fetching.
    eager: Arc<Vec<String>>,
    unknown_relation: UnknownRelation,
    build_error: Option<BuildError>,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Builder<M> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            select: self.select.clone(),
            joins: self.joins.clone(),
            wheres: self.wheres.clone(),
            group_by: self.group_by.clone(),
            havings: self.havings.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            scopes: self.scopes.clone(),
            context: self.context.clone(),
            eager: self.eager.clone(),
            unknown_relation: self.unknown_relation,
            build_error: self.build_error.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Builder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("model", &std::any::type_name::<M>())
            .field("from", &self.from)
            .field("select", &self.select)
            .field("joins", &self.joins)
            .field("wheres", &self.wheres)
            .field("group_by", &self.group_by)
            .field("havings", &self.havings)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("scopes", &self.scopes)
            .field("eager", &self.eager)
            .finish()
    }
}

impl Default for Builder<()> {
    fn default() -> Self {
        Self::empty()
    }
}

impl Builder<()> {
    /// Untyped builder with no FROM table (`SELECT *`, raw selects, ...).
    pub fn empty() -> Self {
        Self {
            from: None,
            select: Arc::default(),
            joins: Arc::default(),
            wheres: Arc::default(),
            group_by: Arc::default(),
            havings: Arc::default(),
            order_by: Arc::default(),
            limit: Limit::default(),
            scopes: Arc::default(),
            context: Context::new(),
            eager: Arc::default(),
            unknown_relation: UnknownRelation::default(),
            build_error: None,
            _model: PhantomData,
        }
    }

    /// Untyped builder over `table` (`"bars"` or `"bars AS b"`).
    pub fn table(table: &str) -> Self {
        Self::empty().from(table)
    }
}

impl<M> Builder<M> {
    /// Reinterpret the builder for another model type. Clauses are kept as-is.
    pub(crate) fn cast<N>(self) -> Builder<N> {
        Builder {
            from: self.from,
            select: self.select,
            joins: self.joins,
            wheres: self.wheres,
            group_by: self.group_by,
            havings: self.havings,
            order_by: self.order_by,
            limit: self.limit,
            scopes: self.scopes,
            context: self.context,
            eager: self.eager,
            unknown_relation: self.unknown_relation,
            build_error: self.build_error,
            _model: PhantomData,
        }
    }

    /// Drop the model binding.
    pub fn untyped(&self) -> Builder {
        self.clone().cast()
    }

    pub(crate) fn with_build_error(&self, err: BuildError) -> Self {
        let mut next = self.clone();
        if next.build_error.is_none() {
            next.build_error = Some(err);
        }
        next
    }

    /// The FROM table reference (or subquery alias), if any.
    pub fn table_name(&self) -> Option<&str> {
        self.from.as_ref().map(Source::name)
    }

    /// Replace the FROM table.
    pub fn from(&self, table: &str) -> Self {
        let mut next = self.clone();
        next.from = Some(Source::Table(Arc::from(table)));
        next
    }

    /// Select from a derived table: `FROM (<sub>) AS alias`.
    pub fn from_sub(&self, sub: impl Into<Fragment>, alias: &str) -> Self {
        let mut next = self.clone();
        next.from = Some(Source::Sub(sub.into(), Arc::from(alias)));
        next
    }

    // ==================== Context ====================

    /// Caller-scoped values, readable from scope functions.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn with_context(&self, context: Context) -> Self {
        let mut next = self.clone();
        next.context = context;
        next
    }

    // ==================== SELECT ====================

    /// Replace the select list with plain columns.
    pub fn select(&self, columns: &[&str]) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.select).columns =
            columns.iter().map(|c| Fragment::ident(*c)).collect();
        next
    }

    /// Append one column to the select list.
    pub fn add_select(&self, column: &str) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.select)
            .columns
            .push(Fragment::ident(column));
        next
    }

    /// Append a raw select expression (`COUNT(*) AS total`, `? AS flag`).
    pub fn select_raw(&self, sql: &str, bindings: Vec<Value>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.select)
            .columns
            .push(Fragment::raw_with(sql, bindings));
        next
    }

    /// Append `(SELECT ...) AS alias` to the select list.
    pub fn select_sub(&self, sub: impl Into<Fragment>, alias: &str) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.select).columns.push(Fragment::join(
            vec![
                Fragment::group(sub.into()),
                Fragment::raw("AS"),
                Fragment::ident(alias),
            ],
            " ",
        ));
        next
    }

    pub fn distinct(&self) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.select).distinct = true;
        next
    }

    // ==================== JOIN ====================

    fn push_join(&self, kind: JoinKind, table: &str, on: Conditions) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.joins).0.push(Join {
            kind,
            table: table.to_string(),
            on,
        });
        next
    }

    /// `INNER JOIN table ON first op second`
    pub fn join(&self, table: &str, first: &str, op: &str, second: &str) -> Self {
        self.push_join(
            JoinKind::Inner,
            table,
            Conditions::new().where_column(first, op, second),
        )
    }

    pub fn left_join(&self, table: &str, first: &str, op: &str, second: &str) -> Self {
        self.push_join(
            JoinKind::Left,
            table,
            Conditions::new().where_column(first, op, second),
        )
    }

    pub fn right_join(&self, table: &str, first: &str, op: &str, second: &str) -> Self {
        self.push_join(
            JoinKind::Right,
            table,
            Conditions::new().where_column(first, op, second),
        )
    }

    pub fn cross_join(&self, table: &str) -> Self {
        self.push_join(JoinKind::Cross, table, Conditions::new())
    }

    /// Join with an arbitrary ON condition list.
    pub fn join_on(
        &self,
        kind: JoinKind,
        table: &str,
        on: impl FnOnce(Conditions) -> Conditions,
    ) -> Self {
        self.push_join(kind, table, on(Conditions::new()))
    }

    // ==================== GROUP BY / ORDER BY / LIMIT ====================

    pub fn group_by(&self, columns: &[&str]) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.group_by)
            .0
            .extend(columns.iter().map(|c| Fragment::ident(*c)));
        next
    }

    pub fn order_by(&self, column: &str) -> Self {
        self.push_order(Fragment::ident(column), SortDir::Asc)
    }

    pub fn order_by_desc(&self, column: &str) -> Self {
        self.push_order(Fragment::ident(column), SortDir::Desc)
    }

    /// Raw ORDER BY expression, e.g. `lower(name)`.
    pub fn order_by_raw(&self, sql: &str, bindings: Vec<Value>) -> Self {
        self.push_order(Fragment::raw_with(sql, bindings), SortDir::Asc)
    }

    fn push_order(&self, expr: Fragment, dir: SortDir) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.order_by).0.push((expr, dir));
        next
    }

    /// Remove every ORDER BY entry.
    pub fn unordered(&self) -> Self {
        let mut next = self.clone();
        next.order_by = Arc::default();
        next
    }

    pub fn limit(&self, n: u64) -> Self {
        let mut next = self.clone();
        next.limit.limit = Some(n);
        next
    }

    pub fn offset(&self, n: u64) -> Self {
        let mut next = self.clone();
        next.limit.offset = Some(n);
        next
    }

    // ==================== Scopes ====================

    /// Attach a local scope. Local scopes run in attachment order.
    pub fn with_scope(&self, scope: Scope) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.scopes).local.push(scope);
        next
    }

    /// Remove local scopes named `name`.
    pub fn without_scope(&self, name: &str) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.scopes)
            .local
            .retain(|s| s.name() != name);
        next
    }

    /// Attach a global scope (normally declared by the model type).
    pub fn with_global_scope(&self, scope: Scope) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.scopes).global.push(scope);
        next
    }

    pub(crate) fn with_global_scopes(&self, scopes: Vec<Scope>) -> Self {
        if scopes.is_empty() {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.scopes).global.extend(scopes);
        next
    }

    /// Opt out of the global scope named `name` for this query.
    pub fn without_global_scope(&self, name: &str) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.scopes)
            .suppressed
            .push(name.to_string());
        next
    }

    /// Opt out of every global scope for this query.
    pub fn without_global_scopes(&self) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.scopes).suppress_all = true;
        next
    }

    // ==================== Compilation ====================

    /// Copy of this builder with every active scope applied and the scope set cleared.
    pub(crate) fn scoped(&self) -> Builder<M> {
        if self.scopes.is_empty() {
            return self.clone();
        }
        let mut base = self.clone();
        let set = std::mem::take(Arc::make_mut(&mut base.scopes));
        let mut untyped: Builder = base.cast();
        for scope in set.active() {
            untyped = scope.apply(untyped);
        }
        untyped.cast()
    }

    fn render(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        if let Some(err) = &self.build_error {
            return Err(err.to_error());
        }
        let mut out = self.select.compile_for(c, self.table_name())?;
        if let Some(source) = &self.from {
            out.push(" ", source.compile(c)?);
        }
        out.push(" ", self.joins.compile(c)?);
        out.push(" ", prefixed(c, "WHERE", &self.wheres)?);
        out.push(" ", self.group_by.compile(c)?);
        out.push(" ", prefixed(c, "HAVING", &self.havings)?);
        out.push(" ", self.order_by.compile(c)?);
        out.push(" ", self.limit.compile(c)?);
        Ok(out)
    }

    /// Render SQL and positional bindings for `dialect`.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> OrmResult<(String, Vec<Value>)> {
        let mut c = Compiler::new(dialect);
        Ok(self.compile(&mut c)?.into_parts())
    }

    // ==================== Execution ====================

    /// Run the query and return raw rows.
    pub async fn fetch_rows(&self, executor: &dyn Executor) -> OrmResult<Vec<Row>> {
        let (sql, bindings) = self.to_sql(executor.dialect())?;
        executor.query(&self.context, &sql, &bindings).await
    }

    /// Run the query and map each row with [`FromRow`].
    pub async fn fetch_as<T: FromRow>(&self, executor: &dyn Executor) -> OrmResult<Vec<T>> {
        let rows = self.fetch_rows(executor).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Run the query and return a single scalar from the first column of the first row.
    pub async fn fetch_scalar<T: FromValue>(
        &self,
        executor: &dyn Executor,
    ) -> OrmResult<Option<T>> {
        let rows = self.fetch_rows(executor).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let (Some(column), Some(value)) = (row.columns().first(), row.values().first()) else {
            return Ok(None);
        };
        T::from_value(value)
            .map(Some)
            .map_err(|e| OrmError::decode(column.as_str(), e))
    }
}

impl<M> Compile for Builder<M> {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        self.scoped().render(c)
    }
}

impl<M: 'static> From<Builder<M>> for Fragment {
    fn from(builder: Builder<M>) -> Self {
        Fragment::Node(Arc::new(builder))
    }
}

impl<M: 'static> From<&Builder<M>> for Fragment {
    fn from(builder: &Builder<M>) -> Self {
        Fragment::Node(Arc::new(builder.clone()))
    }
}

#[cfg(test)]
mod tests;
