//! Named query modifiers.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::Builder;

/// A named, reusable `Builder -> Builder` function.
///
/// Scopes run when the builder is compiled, never when they are attached, so compiling the
/// same builder twice applies each scope exactly once per compile.
///
/// ```ignore
/// let active = Scope::new("active", |q| q.and_where("deleted_at", "=", Value::Null));
/// let tenant = Scope::new("tenant", |q| match q.context().get::<TenantId>() {
///     Some(t) => q.and_where("tenant_id", "=", t.0),
///     None => q,
/// });
/// ```
#[derive(Clone)]
pub struct Scope {
    name: Cow<'static, str>,
    apply: Arc<dyn Fn(Builder) -> Builder + Send + Sync>,
}

impl Scope {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        apply: impl Fn(Builder) -> Builder + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, builder: Builder) -> Builder {
        (self.apply)(builder)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scope").field(&self.name).finish()
    }
}

/// Scopes attached to one builder.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScopeSet {
    /// Explicit per-query scopes, in attachment order.
    pub(crate) local: Vec<Scope>,
    /// Scopes declared by the model type.
    pub(crate) global: Vec<Scope>,
    /// Global scope names opted out of for this query.
    pub(crate) suppressed: Vec<String>,
    pub(crate) suppress_all: bool,
}

impl ScopeSet {
    pub(crate) fn is_empty(&self) -> bool {
        self.local.is_empty() && self.global.is_empty()
    }

    /// Local scopes, then the global scopes not suppressed.
    pub(crate) fn active(&self) -> impl Iterator<Item = &Scope> {
        let globals = self.global.iter().filter(|s| {
            !self.suppress_all && !self.suppressed.iter().any(|n| n.as_str() == s.name())
        });
        self.local.iter().chain(globals)
    }
}
