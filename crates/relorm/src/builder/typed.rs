//! Model-bound builder methods: relationship filters, eager loading and typed fetching.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clauses::{Limit, SelectList};
use super::conditions::Clause;
use super::{BuildError, Builder};
use crate::condition::Logic;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::fragment::Fragment;
use crate::model::{DynModel, Model};
use crate::relation::{initialize_relations, load_path};
use crate::value::ToValue;

/// What `where_has` does with a relationship name the model does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRelation {
    /// Record a construction error, returned when the builder is compiled.
    #[default]
    Error,
    /// Leave the query unfiltered.
    Skip,
}

impl<M: Model> Builder<M> {
    /// Builder over `M`'s table with `M`'s global scopes attached.
    pub fn new() -> Self {
        Builder::table(M::meta().table)
            .with_global_scopes(M::scopes())
            .cast()
    }

    /// Policy for unknown relationship names in `where_has` and friends.
    pub fn unknown_relation(&self, policy: UnknownRelation) -> Self {
        let mut next = self.clone();
        next.unknown_relation = policy;
        next
    }

    // ==================== Relationship filters ====================

    /// `WHERE EXISTS (<correlated subquery over relation>)`, refined by `f`.
    ///
    /// ```ignore
    /// // SELECT "foos".* FROM "foos"
    /// // WHERE EXISTS (SELECT "bars".* FROM "bars" WHERE "foo_id" = "foos"."id" AND "id" = ?)
    /// Foo::query().where_has("bar", |q| q.and_where("id", "=", 7));
    /// ```
    pub fn where_has(&self, relation: &str, f: impl FnOnce(Builder) -> Builder) -> Self {
        self.has(Clause::Where, Logic::And, relation, f)
    }

    pub fn or_where_has(&self, relation: &str, f: impl FnOnce(Builder) -> Builder) -> Self {
        self.has(Clause::Where, Logic::Or, relation, f)
    }

    pub fn having_has(&self, relation: &str, f: impl FnOnce(Builder) -> Builder) -> Self {
        self.has(Clause::Having, Logic::And, relation, f)
    }

    fn has(
        &self,
        clause: Clause,
        logic: Logic,
        relation: &str,
        f: impl FnOnce(Builder) -> Builder,
    ) -> Self {
        let meta = M::meta();
        let Some(declared) = meta.find_relation(relation) else {
            return match self.unknown_relation {
                UnknownRelation::Skip => self.clone(),
                UnknownRelation::Error => self.with_build_error(BuildError::MissingRelationship {
                    model: meta.type_name.to_string(),
                    relation: relation.to_string(),
                }),
            };
        };
        let sub = match declared.subquery(meta) {
            Ok(sub) => sub,
            Err(e) => return self.with_build_error(BuildError::from_error(&e)),
        };
        let sub = f(sub.with_context(self.context.clone()));
        self.map_conditions(clause, |c| match logic {
            Logic::And => c.where_exists(sub),
            Logic::Or => c.or_where_exists(sub),
        })
    }

    // ==================== Eager loading ====================

    /// Load the dotted relationship `path` after fetching (`"bar"`, `"bar.foo.bar"`).
    pub fn with(&self, path: &str) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.eager).push(path.to_string());
        next
    }

    pub fn eager_paths(&self) -> &[String] {
        &self.eager
    }

    // ==================== Fetching ====================

    /// Fetch every matching model, initialize its relationships and load eager paths.
    pub async fn get(&self, executor: &dyn Executor) -> OrmResult<Vec<M>> {
        let rows = self.fetch_rows(executor).await?;
        let mut models = rows
            .iter()
            .map(M::from_row)
            .collect::<OrmResult<Vec<M>>>()?;
        for model in models.iter_mut() {
            initialize_relations(model)?;
        }
        for path in self.eager.iter() {
            let working = models
                .iter_mut()
                .map(|m| m as &mut dyn DynModel)
                .collect();
            load_path(&self.context, executor, working, path, false).await?;
        }
        Ok(models)
    }

    /// First matching model (`LIMIT 1`).
    pub async fn first(&self, executor: &dyn Executor) -> OrmResult<Option<M>> {
        Ok(self.limit(1).get(executor).await?.into_iter().next())
    }

    /// Model by primary key.
    pub async fn find(
        &self,
        executor: &dyn Executor,
        id: impl ToValue + Send,
    ) -> OrmResult<Option<M>> {
        let meta = M::meta();
        let pk = meta.primary_key_for("find").map_err(|e| match e {
            OrmError::CompositeKey { model, .. } => {
                OrmError::UnsupportedKey(format!("find() on {model} needs a single primary key"))
            }
            other => other,
        })?;
        let column = format!("{}.{}", meta.table, pk);
        self.and_where(&column, "=", id).first(executor).await
    }

    /// `SELECT COUNT(*)` over the same filters.
    ///
    /// DISTINCT and grouped queries are counted through a derived table so the result is the
    /// number of rows the query itself would return.
    pub async fn count(&self, executor: &dyn Executor) -> OrmResult<i64> {
        Ok(self
            .count_query()
            .fetch_scalar::<i64>(executor)
            .await?
            .unwrap_or(0))
    }

    pub(crate) fn count_query(&self) -> Builder {
        let mut q = self.scoped().untyped().unordered();
        q.limit = Limit::default();
        if q.select.distinct || !q.group_by.0.is_empty() {
            return Builder::empty()
                .with_context(q.context.clone())
                .select_raw("COUNT(*) AS count", Vec::new())
                .from_sub(q, "sub");
        }
        q.select = Arc::new(SelectList {
            distinct: false,
            columns: vec![Fragment::raw("COUNT(*) AS count")],
        });
        q
    }

    /// Whether any row matches.
    pub async fn exists(&self, executor: &dyn Executor) -> OrmResult<bool> {
        let rows = self.untyped().limit(1).fetch_rows(executor).await?;
        Ok(!rows.is_empty())
    }
}
