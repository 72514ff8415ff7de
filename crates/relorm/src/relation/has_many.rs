use std::any::Any;

use super::batch::{BatchLoader, Batched};
use super::{ForeignKey, Relation, RelationKeys, RelationKind, RelationLoader, RelationState};
use crate::builder::Builder;
use crate::error::OrmResult;
use crate::model::{DynModel, Model};
use crate::value::Value;

/// Any number of related rows holding a foreign key to this model.
#[derive(Debug, Clone)]
pub struct HasMany<R> {
    pub(crate) state: RelationState,
    value: Vec<R>,
}

impl<R> Default for HasMany<R> {
    fn default() -> Self {
        Self {
            state: RelationState::default(),
            value: Vec::new(),
        }
    }
}

impl<R> HasMany<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(value: Vec<R>) -> Self {
        Self {
            state: RelationState::loaded(),
            value,
        }
    }

    /// Related rows; empty when not loaded or when nothing matched.
    pub fn get(&self) -> &[R] {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut Vec<R> {
        &mut self.value
    }

    /// `None` until loaded.
    pub fn value(&self) -> Option<&[R]> {
        self.state.loaded.then_some(self.value.as_slice())
    }

    pub fn is_loaded(&self) -> bool {
        self.state.loaded
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.value.iter()
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn into_inner(self) -> Vec<R> {
        self.value
    }
}

impl<'a, R> IntoIterator for &'a HasMany<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.value.iter()
    }
}

impl<R: Model> Relation for HasMany<R> {
    fn kind(&self) -> RelationKind {
        RelationKind::HasMany
    }

    fn initialize(&mut self, keys: RelationKeys, parent_value: Value) {
        if self.state.initialize(keys, parent_value) {
            self.value.clear();
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
            .map(|m| m as &mut dyn DynModel)
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<R: Model> Batched for HasMany<R> {
    type Related = R;

    fn state(&self) -> &RelationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RelationState {
        &mut self.state
    }

    fn assign(&mut self, matches: &[R]) {
        self.value = matches.to_vec();
    }
}
