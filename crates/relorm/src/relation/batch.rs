//! The batching algorithm shared by every relationship container.

use std::collections::HashSet;
use std::marker::PhantomData;

use async_trait::async_trait;

use super::{Relation, RelationKeys, RelationLoader, RelationState, RelatedIndex};
use crate::builder::Builder;
use crate::context::Context;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::model::Model;
use crate::value::Value;

/// A relationship container that the batch loader can fill.
pub(crate) trait Batched: Relation + Sized {
    type Related: Model;

    fn state(&self) -> &RelationState;

    fn state_mut(&mut self) -> &mut RelationState;

    /// Store the rows matching this container's key. `matches` may be empty.
    fn assign(&mut self, matches: &[Self::Related]);
}

/// [`RelationLoader`] for containers of type `T`.
pub(crate) struct BatchLoader<T>(PhantomData<fn() -> T>);

impl<T> BatchLoader<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<T: Batched> RelationLoader for BatchLoader<T> {
    async fn load(
        &self,
        ctx: &Context,
        executor: &dyn Executor,
        batch: &mut [&mut dyn Relation],
    ) -> OrmResult<()> {
        let mut members: Vec<&mut T> = Vec::with_capacity(batch.len());
        for relation in batch.iter_mut() {
            let member = relation.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
                OrmError::Other(format!(
                    "relationship batch mixes container types (expected {})",
                    std::any::type_name::<T>()
                ))
            })?;
            members.push(member);
        }
        let Some(first) = members.first() else {
            return Ok(());
        };
        let keys = first.state().require_keys()?.clone();
        for member in &members {
            if member.state().require_keys()? != &keys {
                return Err(OrmError::Other(format!(
                    "relationship batch mixes relationships ('{}' and others)",
                    keys.relation
                )));
            }
        }

        let values: Vec<Value> = members
            .iter()
            .map(|m| m.state().parent_value.clone())
            .collect();
        let index = fetch_index::<T::Related>(ctx, executor, &keys, values).await?;

        tracing::trace!(
            target: "relorm.load",
            relation = keys.relation,
            table = keys.related_table,
            batch = members.len(),
            rows = index.len(),
            "resolved relationship batch"
        );

        for member in members {
            let matches = match member.state().parent_value.index_key() {
                Some(key) => index.by_key(&key),
                None => &[],
            };
            member.assign(matches);
            member.state_mut().loaded = true;
        }
        Ok(())
    }
}

/// One query for every distinct non-NULL key value, indexed by the related key column.
pub(crate) async fn fetch_index<R: Model>(
    ctx: &Context,
    executor: &dyn Executor,
    keys: &RelationKeys,
    values: Vec<Value>,
) -> OrmResult<RelatedIndex<R>> {
    let mut seen = HashSet::new();
    let values: Vec<Value> = values
        .into_iter()
        .filter(|v| v.index_key().is_some_and(|k| seen.insert(k)))
        .collect();
    if values.is_empty() {
        return Ok(RelatedIndex::new());
    }

    let rows = Builder::<R>::new()
        .with_context(ctx.clone())
        .where_in(&keys.related_key, values)
        .get(executor)
        .await?;
    RelatedIndex::build(rows, &keys.related_key)
}
