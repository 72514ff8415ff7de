//! Caller-scoped values threaded through builders, scopes and executors.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A typed map of caller-supplied values (a tenant id, the current user, ...).
///
/// Cloning is cheap. `with` returns a new context and never touches the original.
///
/// ```ignore
/// #[derive(Clone)]
/// struct TenantId(i64);
///
/// let ctx = Context::new().with(TenantId(7));
/// assert_eq!(ctx.get::<TenantId>().map(|t| t.0), Some(7));
/// ```
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a value, replacing any previous value of the same type.
    pub fn with<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut values = self.values.clone();
        Arc::make_mut(&mut values).insert(TypeId::of::<T>(), Arc::new(value));
        Self { values }
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct UserId(i64);

    #[test]
    fn with_does_not_touch_original() {
        let base = Context::new();
        let ctx = base.with(UserId(7));
        assert!(base.get::<UserId>().is_none());
        assert_eq!(ctx.get::<UserId>(), Some(&UserId(7)));

        let replaced = ctx.with(UserId(8));
        assert_eq!(ctx.get::<UserId>(), Some(&UserId(7)));
        assert_eq!(replaced.get::<UserId>(), Some(&UserId(8)));
        assert_eq!(replaced.len(), 1);
    }
}
