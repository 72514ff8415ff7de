//! Dotted-path relationship loading (`"bar.foo.bar"`).

use super::{Relation, initialize_relation};
use crate::context::Context;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::model::DynModel;

/// Load the relationship `path` on every model in `models`.
///
/// Each dotted segment is resolved with one query for the whole working set, then the loaded
/// related models become the working set of the next segment.
///
/// ```ignore
/// let mut foos = Foo::query().get(&db).await?;
/// relorm::load(&Context::new(), &db, &mut foos, "bar.foo.bar").await?;
/// ```
pub async fn load<M: DynModel>(
    ctx: &Context,
    executor: &dyn Executor,
    models: &mut [M],
    path: &str,
) -> OrmResult<()> {
    let working = models.iter_mut().map(|m| m as &mut dyn DynModel).collect();
    load_path(ctx, executor, working, path, false).await
}

/// Like [`load`], but relationships that are already loaded are not fetched again.
pub async fn load_missing<M: DynModel>(
    ctx: &Context,
    executor: &dyn Executor,
    models: &mut [M],
    path: &str,
) -> OrmResult<()> {
    let working = models.iter_mut().map(|m| m as &mut dyn DynModel).collect();
    load_path(ctx, executor, working, path, true).await
}

/// [`load`] / [`load_missing`] over trait objects.
///
/// Each segment is resolved with a single loader, so every model in `models` must declare the
/// relationship named by that segment with the same related type and keys. In practice that
/// means models of one type seen through `dyn DynModel`. A model that does not declare the
/// segment fails with a missing relationship error.
pub async fn load_dyn(
    ctx: &Context,
    executor: &dyn Executor,
    models: Vec<&mut dyn DynModel>,
    path: &str,
    only_missing: bool,
) -> OrmResult<()> {
    load_path(ctx, executor, models, path, only_missing).await
}

fn segments(path: &str) -> OrmResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(OrmError::invalid_condition(format!(
            "invalid relationship path '{path}'"
        )));
    }
    Ok(segments)
}

pub(crate) async fn load_path(
    ctx: &Context,
    executor: &dyn Executor,
    models: Vec<&mut dyn DynModel>,
    path: &str,
    only_missing: bool,
) -> OrmResult<()> {
    let mut working = models;
    for segment in segments(path)? {
        if working.is_empty() {
            break;
        }

        let mut batch: Vec<&mut dyn Relation> = Vec::with_capacity(working.len());
        for model in working {
            initialize_relation(&mut *model, segment)?;
            let type_name = model.model_meta().type_name;
            let relation = model
                .relation_mut(segment)
                .ok_or_else(|| OrmError::missing_relationship(type_name, segment))?;
            batch.push(relation);
        }

        {
            let total = batch.len();
            let mut pending: Vec<&mut dyn Relation> = batch
                .iter_mut()
                .filter(|r| !(only_missing && r.is_loaded()))
                .map(|r| &mut **r)
                .collect();
            if let Some(first) = pending.first() {
                let loader = first.loader();
                tracing::trace!(
                    target: "relorm.load",
                    path,
                    relation = segment,
                    batch = pending.len(),
                    skipped = total - pending.len(),
                    "loading relationship"
                );
                loader
                    .load(ctx, executor, &mut pending)
                    .await
                    .map_err(|e| OrmError::loading(segment, e))?;
            }
        }

        working = batch
            .into_iter()
            .flat_map(|r| r.related_mut())
            .collect();
    }
    Ok(())
}
