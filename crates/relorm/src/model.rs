//! Model metadata and model traits.
//!
//! A model type describes itself once through a [`ModelMeta`] (normally generated by
//! `#[derive(Model)]` and cached in a `OnceLock`). The builder, the relationship engine and
//! the DDL-facing helpers all read that descriptor instead of inspecting values at runtime.

use heck::ToSnakeCase;

use crate::builder::{Builder, Scope};
use crate::dialect::ColumnType;
use crate::error::{OrmError, OrmResult};
use crate::relation::{ForeignKey, Relation, RelationKind, RelationMeta};
use crate::row::FromRow;
use crate::value::Value;

/// Column-level metadata for one model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Rust field name.
    pub name: &'static str,
    /// Database column name.
    pub column: &'static str,
    pub primary: bool,
    pub auto_increment: bool,
    pub readonly: bool,
    pub unique: bool,
    pub index: bool,
    /// Explicit column type tag (`#[orm(type = "..")]`).
    pub type_override: Option<&'static str>,
}

impl FieldMeta {
    pub fn new(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            primary: false,
            auto_increment: false,
            readonly: false,
            unique: false,
            index: false,
            type_override: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn type_override(mut self, tag: &'static str) -> Self {
        self.type_override = Some(tag);
        self
    }

    /// The explicit column type, if one was declared.
    pub fn column_type(&self) -> OrmResult<Option<ColumnType>> {
        self.type_override.map(str::parse).transpose()
    }
}

/// Per-type metadata: table, columns and relationships.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    pub type_name: &'static str,
    pub table: &'static str,
    pub fields: Vec<FieldMeta>,
    pub relations: Vec<RelationMeta>,
}

impl ModelMeta {
    pub fn new(type_name: &'static str, table: &'static str) -> Self {
        Self {
            type_name,
            table,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: RelationMeta) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.column)
    }

    pub fn column(&self, column: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.column == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column(column).is_some()
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &FieldMeta> + '_ {
        self.fields.iter().filter(|f| f.primary)
    }

    /// The single primary key column. `relation` names the relationship asking, for errors.
    pub fn primary_key_for(&self, relation: &str) -> OrmResult<&'static str> {
        let mut keys = self.primary_keys();
        match (keys.next(), keys.next()) {
            (Some(pk), None) => Ok(pk.column),
            (Some(_), Some(_)) => Err(OrmError::CompositeKey {
                model: self.type_name.to_string(),
                relation: relation.to_string(),
            }),
            (None, _) => Err(OrmError::UnsupportedKey(format!(
                "{} has no primary key; relationship '{relation}' needs an explicit key",
                self.type_name
            ))),
        }
    }

    pub fn find_relation(&self, name: &str) -> Option<&RelationMeta> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Foreign keys owned by this model's table (its `BelongsTo` relations).
    pub fn foreign_keys(&self) -> OrmResult<Vec<ForeignKey>> {
        self.relations
            .iter()
            .filter(|r| r.kind == RelationKind::BelongsTo)
            .map(|r| r.foreign_key(self))
            .collect()
    }

    /// Snake-cased type name, the prefix of derived foreign key columns (`Foo` -> `foo`).
    pub fn key_prefix(&self) -> String {
        self.type_name.to_snake_case()
    }
}

/// Object-safe view of a model instance, used by the relationship engine.
pub trait DynModel: Send + Sync + 'static {
    fn model_meta(&self) -> &'static ModelMeta;

    /// Current value of `column`, or `None` if the model has no such column.
    fn column_value(&self, column: &str) -> Option<Value>;

    fn relation(&self, name: &str) -> Option<&dyn Relation>;

    fn relation_mut(&mut self, name: &str) -> Option<&mut dyn Relation>;
}

/// A mapped table. Usually derived with `#[derive(Model)]`.
pub trait Model: DynModel + FromRow + Clone {
    fn meta() -> &'static ModelMeta;

    /// Global scopes applied to every query over this model.
    fn scopes() -> Vec<Scope> {
        Vec::new()
    }

    /// A builder over this model's table with its global scopes.
    fn query() -> Builder<Self> {
        Builder::new()
    }
}

/// `Builder` over `M`'s table.
pub fn from<M: Model>() -> Builder<M> {
    Builder::new()
}
