//! `tokio-postgres` support: [`Value`] as a Postgres parameter / column type and
//! [`Executor`] for `Client` and `Transaction`.

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

use super::Executor;
use crate::context::Context;
use crate::dialect::{Dialect, Postgres};
use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;

type BoxError = Box<dyn Error + Sync + Send>;

fn is_text(ty: &Type) -> bool {
    [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty)
}

/// Column types [`Value`] encodes to and decodes from.
fn is_supported(ty: &Type) -> bool {
    is_text(ty)
        || [
            Type::BOOL,
            Type::INT2,
            Type::INT4,
            Type::INT8,
            Type::OID,
            Type::FLOAT4,
            Type::FLOAT8,
            Type::BYTEA,
            Type::UUID,
            Type::TIMESTAMPTZ,
            Type::TIMESTAMP,
            Type::DATE,
            Type::JSON,
            Type::JSONB,
        ]
        .contains(ty)
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => {
                if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::OID {
                    u32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*v as f64).to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::BOOL {
                    (*v != 0).to_sql(ty, out)
                } else if is_text(ty) {
                    v.to_string().to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Text(v) => {
                if *ty == Type::UUID {
                    Uuid::parse_str(v)?.to_sql(ty, out)
                } else if *ty == Type::JSON || *ty == Type::JSONB {
                    serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out)
                } else {
                    v.as_str().to_sql(ty, out)
                }
            }
            Value::Bytes(v) => v.as_slice().to_sql(ty, out),
            Value::Uuid(v) => {
                if is_text(ty) {
                    v.hyphenated().to_string().to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Timestamp(v) => {
                if *ty == Type::TIMESTAMP {
                    v.naive_utc().to_sql(ty, out)
                } else if *ty == Type::DATE {
                    v.date_naive().to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        is_supported(ty)
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = if *ty == Type::BOOL {
            Value::Bool(bool::from_sql(ty, raw)?)
        } else if *ty == Type::INT2 {
            Value::Int(i64::from(i16::from_sql(ty, raw)?))
        } else if *ty == Type::INT4 {
            Value::Int(i64::from(i32::from_sql(ty, raw)?))
        } else if *ty == Type::INT8 {
            Value::Int(i64::from_sql(ty, raw)?)
        } else if *ty == Type::OID {
            Value::Int(i64::from(u32::from_sql(ty, raw)?))
        } else if *ty == Type::FLOAT4 {
            Value::Float(f64::from(f32::from_sql(ty, raw)?))
        } else if *ty == Type::FLOAT8 {
            Value::Float(f64::from_sql(ty, raw)?)
        } else if is_text(ty) {
            Value::Text(String::from_sql(ty, raw)?)
        } else if *ty == Type::BYTEA {
            Value::Bytes(Vec::<u8>::from_sql(ty, raw)?)
        } else if *ty == Type::UUID {
            Value::Uuid(Uuid::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMPTZ {
            Value::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMP {
            Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?.and_utc())
        } else if *ty == Type::DATE {
            let date = NaiveDate::from_sql(ty, raw)?;
            match date.and_hms_opt(0, 0, 0) {
                Some(v) => Value::Timestamp(v.and_utc()),
                None => return Err(format!("invalid date {date}").into()),
            }
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            Value::Json(serde_json::Value::from_sql(ty, raw)?)
        } else {
            return Err(format!("unsupported column type {ty}").into());
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(ty: &Type) -> bool {
        is_supported(ty)
    }
}

fn params(bindings: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    bindings.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn decode_rows(rows: &[tokio_postgres::Row]) -> OrmResult<Vec<Row>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    rows.iter()
        .map(|row| {
            let values = (0..columns.len())
                .map(|i| {
                    row.try_get::<_, Value>(i)
                        .map_err(|e| crate::OrmError::decode(columns[i].as_str(), e.to_string()))
                })
                .collect::<OrmResult<Vec<_>>>()?;
            Ok(Row::new(columns.clone(), values))
        })
        .collect()
}

/// Implements [`Executor`] for a tokio-postgres client-like type.
macro_rules! impl_pg_executor {
    ($ty:ty) => {
        #[async_trait]
        impl Executor for $ty {
            fn dialect(&self) -> &dyn Dialect {
                &Postgres
            }

            async fn query(
                &self,
                _ctx: &Context,
                sql: &str,
                bindings: &[Value],
            ) -> OrmResult<Vec<Row>> {
                tracing::debug!(target: "relorm.sql", sql, param_count = bindings.len());
                let rows = <$ty>::query(self, sql, &params(bindings)).await?;
                decode_rows(&rows)
            }

            async fn execute(
                &self,
                _ctx: &Context,
                sql: &str,
                bindings: &[Value],
            ) -> OrmResult<u64> {
                tracing::debug!(target: "relorm.sql", sql, param_count = bindings.len());
                Ok(<$ty>::execute(self, sql, &params(bindings)).await?)
            }
        }
    };
}

impl_pg_executor!(tokio_postgres::Client);
impl_pg_executor!(tokio_postgres::Transaction<'_>);
