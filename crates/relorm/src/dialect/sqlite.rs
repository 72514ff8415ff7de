use super::{ColumnType, Dialect, float_literal, hex, quote_string, quote_with, timestamp_literal};
use crate::error::OrmResult;
use crate::value::Value;

/// SQLite: `"ident"` quoting and anonymous `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_ident(&self, segment: &str) -> String {
        quote_with(segment, '"')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn auto_increment(&self) -> &'static str {
        "AUTOINCREMENT"
    }

    fn column_type(&self, ty: &ColumnType) -> OrmResult<String> {
        let s = match ty {
            ColumnType::String | ColumnType::Text | ColumnType::Enum(_) => "TEXT",
            ColumnType::Int8
            | ColumnType::Int16
            | ColumnType::Int32
            | ColumnType::Int64
            | ColumnType::UInt8
            | ColumnType::UInt16
            | ColumnType::UInt32
            | ColumnType::UInt64 => "INTEGER",
            ColumnType::Float32 | ColumnType::Float64 => "REAL",
            ColumnType::Bool => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "TIMESTAMP",
            ColumnType::Blob => "BLOB",
            ColumnType::Json => "TEXT",
        };
        Ok(s.to_string())
    }

    fn escape_literal(&self, value: &Value) -> OrmResult<String> {
        Ok(match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => if *v { "1" } else { "0" }.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => float_literal(self.name(), *v)?,
            Value::Text(v) => quote_string(v),
            Value::Bytes(v) => format!("X'{}'", hex(v)),
            Value::Uuid(v) => quote_string(&v.hyphenated().to_string()),
            Value::Timestamp(v) => timestamp_literal(v),
            Value::Json(v) => quote_string(&v.to_string()),
        })
    }

    fn limit_all(&self) -> &'static str {
        "-1"
    }
}
