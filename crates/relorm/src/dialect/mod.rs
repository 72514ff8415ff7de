//! SQL dialects.
//!
//! A [`Dialect`] owns the handful of primitives that differ between databases: identifier
//! quoting, binding placeholders, column type names, the auto-increment and current-timestamp
//! keywords and inline literal escaping. Everything above it (fragments, conditions, builders)
//! composes those primitives the same way for every database.
//!
//! There is no process-wide "current" dialect: callers pass one to
//! [`Builder::to_sql`](crate::Builder::to_sql), and executors report the one they speak.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

/// Abstract column types understood by every dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Text,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    Date,
    DateTime,
    Blob,
    Json,
    Enum(Vec<String>),
}

impl ColumnType {
    /// Tag as written in `#[orm(type = "..")]`.
    pub fn tag(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Int8 => "int8",
            ColumnType::Int16 => "int16",
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::UInt8 => "uint8",
            ColumnType::UInt16 => "uint16",
            ColumnType::UInt32 => "uint32",
            ColumnType::UInt64 => "uint64",
            ColumnType::Float32 => "float32",
            ColumnType::Float64 => "float64",
            ColumnType::Bool => "bool",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Blob => "blob",
            ColumnType::Json => "json",
            ColumnType::Enum(_) => "enum",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Enum(variants) => write!(f, "enum({})", variants.join(",")),
            other => f.write_str(other.tag()),
        }
    }
}

impl FromStr for ColumnType {
    type Err = OrmError;

    /// Parses the tags produced by [`ColumnType::tag`]; enums are written `enum(a,b,c)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("enum(") {
            let Some(body) = rest.strip_suffix(')') else {
                return Err(unknown_column_type(s));
            };
            // Keep the caller's casing for the variants themselves.
            let body = &s[5..5 + body.len()];
            let variants = body
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            return Ok(ColumnType::Enum(variants));
        }
        let ty = match lower.as_str() {
            "string" | "varchar" => ColumnType::String,
            "text" => ColumnType::Text,
            "int8" => ColumnType::Int8,
            "int16" => ColumnType::Int16,
            "int32" | "int" => ColumnType::Int32,
            "int64" => ColumnType::Int64,
            "uint8" => ColumnType::UInt8,
            "uint16" => ColumnType::UInt16,
            "uint32" | "uint" => ColumnType::UInt32,
            "uint64" => ColumnType::UInt64,
            "float32" => ColumnType::Float32,
            "float64" | "float" => ColumnType::Float64,
            "bool" | "boolean" => ColumnType::Bool,
            "date" => ColumnType::Date,
            "datetime" | "timestamp" => ColumnType::DateTime,
            "blob" | "bytes" => ColumnType::Blob,
            "json" => ColumnType::Json,
            _ => return Err(unknown_column_type(s)),
        };
        Ok(ty)
    }
}

/// A column type tag no dialect can map.
fn unknown_column_type(tag: &str) -> OrmError {
    OrmError::UnsupportedType {
        dialect: "any",
        ty: tag.to_string(),
    }
}

/// Database-specific SQL primitives.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Short dialect name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Quote one identifier segment (no dots).
    fn quote_ident(&self, segment: &str) -> String;

    /// Placeholder for the `index`-th binding (1-based).
    fn placeholder(&self, index: usize) -> String;

    fn current_timestamp(&self) -> &'static str;

    fn auto_increment(&self) -> &'static str;

    fn column_type(&self, ty: &ColumnType) -> OrmResult<String>;

    /// Render `value` as inline SQL text. Used for DDL defaults only, never for query bindings.
    fn escape_literal(&self, value: &Value) -> OrmResult<String>;

    /// LIMIT argument meaning "no limit", used when only OFFSET is set.
    fn limit_all(&self) -> &'static str;

    /// Quote a possibly dotted identifier segment by segment; `*` passes through.
    fn quote_path(&self, raw: &str) -> String {
        raw.split('.')
            .map(|seg| {
                if seg == "*" {
                    seg.to_string()
                } else {
                    self.quote_ident(seg)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Selectable dialect, e.g. from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Sqlite,
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
}

static SQLITE: Sqlite = Sqlite;
static MYSQL: MySql = MySql;
static POSTGRES: Postgres = Postgres;

impl DialectKind {
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Sqlite => &SQLITE,
            DialectKind::MySql => &MYSQL,
            DialectKind::Postgres => &POSTGRES,
        }
    }
}

impl FromStr for DialectKind {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DialectKind::Sqlite),
            "mysql" | "mariadb" => Ok(DialectKind::MySql),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            other => Err(OrmError::Other(format!("unknown dialect '{other}'"))),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dialect().name())
    }
}

// ==================== Shared helpers ====================

/// Quote with `q`, doubling any embedded `q`.
pub(crate) fn quote_with(segment: &str, q: char) -> String {
    let mut out = String::with_capacity(segment.len() + 2);
    out.push(q);
    for c in segment.chars() {
        if c == q {
            out.push(q);
        }
        out.push(c);
    }
    out.push(q);
    out
}

/// Single-quoted string literal with `'` doubled.
pub(crate) fn quote_string(s: &str) -> String {
    quote_with(s, '\'')
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

pub(crate) fn float_literal(dialect: &'static str, v: f64) -> OrmResult<String> {
    if v.is_finite() {
        Ok(v.to_string())
    } else {
        Err(OrmError::UnsupportedType {
            dialect,
            ty: format!("non-finite float literal {v}"),
        })
    }
}

pub(crate) fn timestamp_literal(v: &chrono::DateTime<chrono::Utc>) -> String {
    quote_string(&v.format(crate::value::TIMESTAMP_FORMAT).to_string())
}

#[cfg(test)]
mod tests;
