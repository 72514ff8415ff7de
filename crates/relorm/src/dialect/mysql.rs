use super::{ColumnType, Dialect, float_literal, hex, quote_with, timestamp_literal};
use crate::error::OrmResult;
use crate::value::Value;

/// MySQL / MariaDB: backtick quoting and anonymous `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl MySql {
    /// MySQL treats backslash as an escape inside string literals by default.
    fn string(s: &str) -> String {
        quote_with(&s.replace('\\', "\\\\"), '\'')
    }
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_ident(&self, segment: &str) -> String {
        quote_with(segment, '`')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn auto_increment(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn column_type(&self, ty: &ColumnType) -> OrmResult<String> {
        let s = match ty {
            ColumnType::String => "VARCHAR(255)",
            ColumnType::Text => "TEXT",
            ColumnType::Int8 => "TINYINT",
            ColumnType::Int16 => "SMALLINT",
            ColumnType::Int32 => "INT",
            ColumnType::Int64 => "BIGINT",
            ColumnType::UInt8 => "TINYINT UNSIGNED",
            ColumnType::UInt16 => "SMALLINT UNSIGNED",
            ColumnType::UInt32 => "INT UNSIGNED",
            ColumnType::UInt64 => "BIGINT UNSIGNED",
            ColumnType::Float32 => "FLOAT",
            ColumnType::Float64 => "DOUBLE",
            ColumnType::Bool => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "DATETIME",
            ColumnType::Blob => "BLOB",
            ColumnType::Json => "JSON",
            ColumnType::Enum(variants) => {
                let list = variants
                    .iter()
                    .map(|v| Self::string(v))
                    .collect::<Vec<_>>()
                    .join(",");
                return Ok(format!("ENUM({list})"));
            }
        };
        Ok(s.to_string())
    }

    fn escape_literal(&self, value: &Value) -> OrmResult<String> {
        Ok(match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => if *v { "1" } else { "0" }.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => float_literal(self.name(), *v)?,
            Value::Text(v) => Self::string(v),
            Value::Bytes(v) => format!("X'{}'", hex(v)),
            Value::Uuid(v) => Self::string(&v.hyphenated().to_string()),
            Value::Timestamp(v) => timestamp_literal(v),
            Value::Json(v) => Self::string(&v.to_string()),
        })
    }

    fn limit_all(&self) -> &'static str {
        "18446744073709551615"
    }
}
