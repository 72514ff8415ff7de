use std::any::Any;

use super::batch::{BatchLoader, Batched};
use super::{ForeignKey, Relation, RelationKeys, RelationKind, RelationLoader, RelationState};
use crate::builder::Builder;
use crate::error::OrmResult;
use crate::model::{DynModel, Model};
use crate::value::Value;

/// The row this model points at through its own foreign key column.
///
/// By default `BelongsTo<Foo>` reads `foo_id` on this model and matches it against the
/// primary key of `Foo`; `#[orm(foreign = "..")]` and `#[orm(owner = "..")]` override the
/// two columns.
#[derive(Debug, Clone)]
pub struct BelongsTo<R> {
    pub(crate) state: RelationState,
    value: Option<Box<R>>,
}

impl<R> Default for BelongsTo<R> {
    fn default() -> Self {
        Self {
            state: RelationState::default(),
            value: None,
        }
    }
}

impl<R> BelongsTo<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(value: Option<R>) -> Self {
        Self {
            state: RelationState::loaded(),
            value: value.map(Box::new),
        }
    }

    pub fn get(&self) -> Option<&R> {
        self.value.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.value.as_deref_mut()
    }

    /// `None` until loaded; `Some(None)` when loaded without a match.
    pub fn value(&self) -> Option<Option<&R>> {
        self.state.loaded.then(|| self.value.as_deref())
    }

    pub fn is_loaded(&self) -> bool {
        self.state.loaded
    }

    pub fn into_inner(self) -> Option<R> {
        self.value.map(|b| *b)
    }
}

impl<R: Model> Relation for BelongsTo<R> {
    fn kind(&self) -> RelationKind {
        RelationKind::BelongsTo
    }

    fn initialize(&mut self, keys: RelationKeys, parent_value: Value) {
        if self.state.initialize(keys, parent_value) {
            self.value = None;
        }
    }

    fn keys(&self) -> Option<&RelationKeys> {
        self.state.keys.as_ref()
    }

    fn parent_value(&self) -> &Value {
        &self.state.parent_value
    }

    fn is_loaded(&self) -> bool {
        self.state.loaded
    }

    fn subquery(&self) -> OrmResult<Builder> {
        self.state.subquery::<R>()
    }

    fn foreign_keys(&self) -> Vec<ForeignKey> {
        self.state.foreign_keys()
    }

    fn loader(&self) -> Box<dyn RelationLoader> {
        Box::new(BatchLoader::<Self>::new())
    }

    fn related_mut(&mut self) -> Vec<&mut dyn DynModel> {
        self.value
            .iter_mut()
            .map(|m| &mut **m as &mut dyn DynModel)
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<R: Model> Batched for BelongsTo<R> {
    type Related = R;

    fn state(&self) -> &RelationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RelationState {
        &mut self.state
    }

    fn assign(&mut self, matches: &[R]) {
        self.value = matches.first().cloned().map(Box::new);
    }
}
