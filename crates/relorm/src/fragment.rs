//! The SQL fragment tree.
//!
//! Everything the builder renders is a [`Fragment`] or something implementing [`Compile`].
//! Compilation walks children left to right, appending SQL text and bindings in the same
//! order, so the n-th placeholder in the output always corresponds to the n-th binding.
//!
//! Placeholder numbering lives in the [`Compiler`], not in the fragments: a sub-builder
//! compiled inside an `EXISTS (...)` continues the parent's `$n` sequence on Postgres.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::value::{ToValue, Value};

/// Rendered SQL text plus its positional bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compiled {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl Compiled {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Append `other`, inserting `separator` when both sides have text.
    pub fn push(&mut self, separator: &str, other: Compiled) {
        if other.sql.is_empty() {
            return;
        }
        if !self.sql.is_empty() {
            self.sql.push_str(separator);
        }
        self.sql.push_str(&other.sql);
        self.bindings.extend(other.bindings);
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.bindings)
    }
}

/// Compilation state: the target dialect and the number of placeholders emitted so far.
pub struct Compiler<'d> {
    dialect: &'d dyn Dialect,
    placeholders: usize,
}

impl<'d> Compiler<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            placeholders: 0,
        }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Next binding placeholder (`?` or `$n`).
    pub fn placeholder(&mut self) -> String {
        self.placeholders += 1;
        self.dialect.placeholder(self.placeholders)
    }

    /// Validate and quote an identifier.
    pub fn ident(&self, raw: &str) -> OrmResult<String> {
        Ok(Ident::parse(raw)?.render(self.dialect))
    }
}

impl fmt::Debug for Compiler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("dialect", &self.dialect.name())
            .field("placeholders", &self.placeholders)
            .finish()
    }
}

/// Anything that renders to SQL text plus bindings.
pub trait Compile: Send + Sync + fmt::Debug {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled>;
}

/// A node of the SQL AST.
#[derive(Debug, Clone)]
pub enum Fragment {
    /// Dialect-quoted identifier (`table.column`, `table.*`).
    Ident(String),
    /// Literal SQL text; each `?` is replaced by the next binding's placeholder.
    Raw { sql: String, bindings: Vec<Value> },
    /// One bound value.
    Literal(Value),
    /// Parenthesized child. Renders nothing when the child is empty.
    Group(Box<Fragment>),
    /// Children joined by `separator`, skipping empty ones.
    Join {
        parts: Vec<Fragment>,
        separator: Cow<'static, str>,
    },
    /// Any other compilable node (conditions, sub-builders).
    Node(Arc<dyn Compile>),
}

impl Fragment {
    pub fn ident(name: impl Into<String>) -> Self {
        Fragment::Ident(name.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Fragment::Raw {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }

    pub fn raw_with(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Fragment::Raw {
            sql: sql.into(),
            bindings,
        }
    }

    pub fn literal(value: impl ToValue) -> Self {
        Fragment::Literal(value.to_value())
    }

    pub fn group(inner: Fragment) -> Self {
        Fragment::Group(Box::new(inner))
    }

    pub fn join(parts: Vec<Fragment>, separator: impl Into<Cow<'static, str>>) -> Self {
        Fragment::Join {
            parts,
            separator: separator.into(),
        }
    }

    /// Join with no separator.
    pub fn concat(parts: Vec<Fragment>) -> Self {
        Fragment::join(parts, "")
    }

    pub fn node(node: impl Compile + 'static) -> Self {
        Fragment::Node(Arc::new(node))
    }

    /// Compile against `dialect` with fresh placeholder numbering.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> OrmResult<(String, Vec<Value>)> {
        let mut c = Compiler::new(dialect);
        Ok(self.compile(&mut c)?.into_parts())
    }
}

impl Compile for Fragment {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        match self {
            Fragment::Ident(name) => Ok(Compiled::new(c.ident(name)?, Vec::new())),
            Fragment::Raw { sql, bindings } => compile_raw(c, sql, bindings),
            Fragment::Literal(value) => Ok(Compiled::new(c.placeholder(), vec![value.clone()])),
            Fragment::Group(inner) => {
                let inner = inner.compile(c)?;
                if inner.is_empty() {
                    return Ok(inner);
                }
                Ok(Compiled::new(format!("({})", inner.sql), inner.bindings))
            }
            Fragment::Join { parts, separator } => {
                let mut out = Compiled::default();
                for part in parts {
                    out.push(separator, part.compile(c)?);
                }
                Ok(out)
            }
            Fragment::Node(node) => node.compile(c),
        }
    }
}

/// Rewrite `?` markers to dialect placeholders while bindings remain.
///
/// Markers beyond the binding count are kept verbatim (`?` is an operator on Postgres jsonb).
fn compile_raw(c: &mut Compiler<'_>, sql: &str, bindings: &[Value]) -> OrmResult<Compiled> {
    let mut out = String::with_capacity(sql.len() + bindings.len() * 2);
    let mut used = 0;
    for ch in sql.chars() {
        if ch == '?' && used < bindings.len() {
            out.push_str(&c.placeholder());
            used += 1;
        } else {
            out.push(ch);
        }
    }
    if used != bindings.len() {
        return Err(OrmError::invalid_condition(format!(
            "raw SQL has {used} placeholder(s) but {} binding(s): {sql}",
            bindings.len()
        )));
    }
    Ok(Compiled::new(out, bindings.to_vec()))
}

impl From<Value> for Fragment {
    fn from(value: Value) -> Self {
        Fragment::Literal(value)
    }
}
