//! Relationships between models and their batched loading.
//!
//! A model declares relationship fields of type [`HasOne<R>`], [`HasMany<R>`] or
//! [`BelongsTo<R>`]. Each field goes through three states:
//!
//! - **uninitialized**: freshly constructed, no join keys
//! - **initialized**: join keys resolved from metadata and the owner's key value captured
//!   (done for every fetched model, or lazily by [`load`])
//! - **loaded**: the related value has been fetched; an empty result still counts as loaded
//!
//! Loading always runs over the whole batch of sibling relationships (the same field on
//! every parent being resolved) and issues exactly one query for that batch.

use std::any::Any;
use std::fmt;

use async_trait::async_trait;

use crate::builder::{Builder, Scope};
use crate::context::Context;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::model::{DynModel, Model, ModelMeta};
use crate::value::Value;

mod batch;
mod belongs_to;
mod has_many;
mod has_one;
mod index;
mod load;

pub use belongs_to::BelongsTo;
pub use has_many::HasMany;
pub use has_one::HasOne;
pub use index::RelatedIndex;
pub use load::{load, load_dyn, load_missing};

pub(crate) use load::load_path;

/// Relationship cardinality and key ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Related row holds the foreign key; at most one match.
    HasOne,
    /// Related rows hold the foreign key; any number of matches.
    HasMany,
    /// This row holds the foreign key, pointing at the related primary key.
    BelongsTo,
}

/// Declared relationship on a model type.
#[derive(Clone)]
pub struct RelationMeta {
    /// Rust field name; also the name used in paths and `where_has`.
    pub name: &'static str,
    pub kind: RelationKind,
    related: fn() -> &'static ModelMeta,
    related_scopes: fn() -> Vec<Scope>,
    /// Override of the owner-side key (`HasOne` / `HasMany`).
    pub local: Option<&'static str>,
    /// Override of the foreign key column.
    pub foreign: Option<&'static str>,
    /// Override of the referenced key on the related model (`BelongsTo`).
    pub owner: Option<&'static str>,
}

impl RelationMeta {
    fn new<R: Model>(name: &'static str, kind: RelationKind) -> Self {
        Self {
            name,
            kind,
            related: R::meta,
            related_scopes: R::scopes,
            local: None,
            foreign: None,
            owner: None,
        }
    }

    pub fn has_one<R: Model>(name: &'static str) -> Self {
        Self::new::<R>(name, RelationKind::HasOne)
    }

    pub fn has_many<R: Model>(name: &'static str) -> Self {
        Self::new::<R>(name, RelationKind::HasMany)
    }

    pub fn belongs_to<R: Model>(name: &'static str) -> Self {
        Self::new::<R>(name, RelationKind::BelongsTo)
    }

    pub fn local(mut self, column: &'static str) -> Self {
        self.local = Some(column);
        self
    }

    pub fn foreign(mut self, column: &'static str) -> Self {
        self.foreign = Some(column);
        self
    }

    pub fn owner(mut self, column: &'static str) -> Self {
        self.owner = Some(column);
        self
    }

    pub fn related(&self) -> &'static ModelMeta {
        (self.related)()
    }

    pub fn related_scopes(&self) -> Vec<Scope> {
        (self.related_scopes)()
    }

    /// Resolve the join columns for this relationship declared on `parent`.
    ///
    /// Without overrides the referenced side is the single primary key of the model that
    /// owns it, and the foreign key is `<snake type name>_<that key>`.
    pub fn resolve(&self, parent: &ModelMeta) -> OrmResult<RelationKeys> {
        let related = self.related();
        let (parent_key, related_key) = match self.kind {
            RelationKind::BelongsTo => {
                let related_key = match self.owner {
                    Some(k) => k.to_string(),
                    None => related.primary_key_for(self.name)?.to_string(),
                };
                let parent_key = match self.foreign {
                    Some(k) => k.to_string(),
                    None => format!("{}_{}", related.key_prefix(), related_key),
                };
                (parent_key, related_key)
            }
            RelationKind::HasOne | RelationKind::HasMany => {
                let parent_key = match self.local {
                    Some(k) => k.to_string(),
                    None => parent.primary_key_for(self.name)?.to_string(),
                };
                let related_key = match self.foreign {
                    Some(k) => k.to_string(),
                    None => format!("{}_{}", parent.key_prefix(), parent_key),
                };
                (parent_key, related_key)
            }
        };
        if !parent.has_column(&parent_key) {
            return Err(OrmError::missing_field(parent.type_name, parent_key));
        }
        if !related.has_column(&related_key) {
            return Err(OrmError::missing_field(related.type_name, related_key));
        }
        Ok(RelationKeys {
            relation: self.name,
            kind: self.kind,
            parent_table: parent.table,
            parent_key,
            related_table: related.table,
            related_key,
        })
    }

    /// Correlated subquery over the related table, for `EXISTS (...)` filters.
    pub fn subquery(&self, parent: &ModelMeta) -> OrmResult<Builder> {
        Ok(self.resolve(parent)?.correlated(self.related_scopes()))
    }

    pub fn foreign_key(&self, parent: &ModelMeta) -> OrmResult<ForeignKey> {
        Ok(self.resolve(parent)?.foreign_key())
    }
}

impl fmt::Debug for RelationMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationMeta")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("local", &self.local)
            .field("foreign", &self.foreign)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Resolved join columns of one relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationKeys {
    pub relation: &'static str,
    pub kind: RelationKind,
    pub parent_table: &'static str,
    /// Column on the declaring model.
    pub parent_key: String,
    pub related_table: &'static str,
    /// Column on the related model.
    pub related_key: String,
}

impl RelationKeys {
    /// `SELECT related.* FROM related WHERE related_key = parent_table.parent_key`
    pub fn correlated(&self, related_scopes: Vec<Scope>) -> Builder {
        Builder::table(self.related_table)
            .with_global_scopes(related_scopes)
            .where_column(
                &self.related_key,
                "=",
                &format!("{}.{}", self.parent_table, self.parent_key),
            )
    }

    pub fn foreign_key(&self) -> ForeignKey {
        match self.kind {
            RelationKind::BelongsTo => ForeignKey {
                table: self.parent_table.to_string(),
                column: self.parent_key.clone(),
                references_table: self.related_table.to_string(),
                references_column: self.related_key.clone(),
            },
            RelationKind::HasOne | RelationKind::HasMany => ForeignKey {
                table: self.related_table.to_string(),
                column: self.related_key.clone(),
                references_table: self.parent_table.to_string(),
                references_column: self.parent_key.clone(),
            },
        }
    }
}

/// `table.column REFERENCES references_table(references_column)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

/// Object-safe view of a relationship field.
pub trait Relation: Send + Sync + 'static {
    fn kind(&self) -> RelationKind;

    /// Set the join keys and the owner's key value. A loaded value survives re-initialization
    /// unless the keys or the owner's key value changed.
    fn initialize(&mut self, keys: RelationKeys, parent_value: Value);

    fn keys(&self) -> Option<&RelationKeys>;

    fn parent_value(&self) -> &Value;

    fn is_initialized(&self) -> bool {
        self.keys().is_some()
    }

    fn is_loaded(&self) -> bool;

    /// Correlated subquery over the related table. Requires initialization.
    fn subquery(&self) -> OrmResult<Builder>;

    fn foreign_keys(&self) -> Vec<ForeignKey>;

    /// The loader able to resolve a batch of relationships of this concrete type.
    fn loader(&self) -> Box<dyn RelationLoader>;

    /// Loaded related models, for walking the next path segment.
    fn related_mut(&mut self) -> Vec<&mut dyn DynModel>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Resolves a batch of sibling relationships with one query.
#[async_trait]
pub trait RelationLoader: Send + Sync {
    async fn load(
        &self,
        ctx: &Context,
        executor: &dyn Executor,
        batch: &mut [&mut dyn Relation],
    ) -> OrmResult<()>;
}

/// Shared state of the three relationship containers.
#[derive(Debug, Clone)]
pub(crate) struct RelationState {
    pub(crate) keys: Option<RelationKeys>,
    pub(crate) parent_value: Value,
    pub(crate) loaded: bool,
}

impl Default for RelationState {
    fn default() -> Self {
        Self {
            keys: None,
            parent_value: Value::Null,
            loaded: false,
        }
    }
}

impl RelationState {
    pub(crate) fn loaded() -> Self {
        Self {
            loaded: true,
            ..Self::default()
        }
    }

    /// Returns true when a previously loaded value went stale and must be dropped.
    pub(crate) fn initialize(&mut self, keys: RelationKeys, parent_value: Value) -> bool {
        let stale = self.loaded
            && self.keys.is_some()
            && (self.keys.as_ref() != Some(&keys)
                || self.parent_value.index_key() != parent_value.index_key());
        self.keys = Some(keys);
        self.parent_value = parent_value;
        if stale {
            self.loaded = false;
        }
        stale
    }

    pub(crate) fn require_keys(&self) -> OrmResult<&RelationKeys> {
        self.keys.as_ref().ok_or_else(|| {
            OrmError::UnsupportedKey("relationship used before initialization".to_string())
        })
    }

    pub(crate) fn subquery<R: Model>(&self) -> OrmResult<Builder> {
        Ok(self.require_keys()?.correlated(R::scopes()))
    }

    pub(crate) fn foreign_keys(&self) -> Vec<ForeignKey> {
        self.keys.iter().map(RelationKeys::foreign_key).collect()
    }
}

/// Resolve keys and capture key values for every relationship of `model`.
pub fn initialize_relations(model: &mut dyn DynModel) -> OrmResult<()> {
    let meta = model.model_meta();
    for relation in &meta.relations {
        initialize_with(model, meta, relation)?;
    }
    Ok(())
}

/// Initialize the single relationship `name` of `model`.
pub fn initialize_relation(model: &mut dyn DynModel, name: &str) -> OrmResult<()> {
    let meta = model.model_meta();
    let relation = meta
        .find_relation(name)
        .ok_or_else(|| OrmError::missing_relationship(meta.type_name, name))?;
    initialize_with(model, meta, relation)
}

fn initialize_with(
    model: &mut dyn DynModel,
    meta: &'static ModelMeta,
    relation: &'static RelationMeta,
) -> OrmResult<()> {
    let keys = relation.resolve(meta)?;
    let value = model
        .column_value(&keys.parent_key)
        .ok_or_else(|| OrmError::missing_field(meta.type_name, keys.parent_key.as_str()))?;
    model
        .relation_mut(relation.name)
        .ok_or_else(|| OrmError::missing_relationship(meta.type_name, relation.name))?
        .initialize(keys, value);
    Ok(())
}
