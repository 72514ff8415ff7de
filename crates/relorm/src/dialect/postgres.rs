use super::{ColumnType, Dialect, float_literal, hex, quote_string, quote_with, timestamp_literal};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// PostgreSQL: `"ident"` quoting and numbered `$n` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_ident(&self, segment: &str) -> String {
        quote_with(segment, '"')
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn current_timestamp(&self) -> &'static str {
        "now()"
    }

    fn auto_increment(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY"
    }

    fn column_type(&self, ty: &ColumnType) -> OrmResult<String> {
        let s = match ty {
            ColumnType::String => "VARCHAR(255)",
            ColumnType::Text => "TEXT",
            ColumnType::Int8 | ColumnType::Int16 | ColumnType::UInt8 => "SMALLINT",
            ColumnType::Int32 | ColumnType::UInt16 => "INTEGER",
            ColumnType::Int64 | ColumnType::UInt32 => "BIGINT",
            ColumnType::UInt64 => "NUMERIC(20)",
            ColumnType::Float32 => "REAL",
            ColumnType::Float64 => "DOUBLE PRECISION",
            ColumnType::Bool => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "TIMESTAMPTZ",
            ColumnType::Blob => "BYTEA",
            ColumnType::Json => "JSONB",
            // Postgres enums are named types created separately (CREATE TYPE).
            ColumnType::Enum(_) => {
                return Err(OrmError::UnsupportedType {
                    dialect: self.name(),
                    ty: ty.to_string(),
                });
            }
        };
        Ok(s.to_string())
    }

    fn escape_literal(&self, value: &Value) -> OrmResult<String> {
        Ok(match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => float_literal(self.name(), *v)?,
            Value::Text(v) => quote_string(v),
            Value::Bytes(v) => format!("'\\x{}'::bytea", hex(v)),
            Value::Uuid(v) => format!("{}::uuid", quote_string(&v.hyphenated().to_string())),
            Value::Timestamp(v) => format!("{}::timestamptz", timestamp_literal(v)),
            Value::Json(v) => format!("{}::jsonb", quote_string(&v.to_string())),
        })
    }

    fn limit_all(&self) -> &'static str {
        "ALL"
    }
}
