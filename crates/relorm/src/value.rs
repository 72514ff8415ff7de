//! Dialect-neutral SQL values.
//!
//! [`Value`] is what every binding produced by the fragment compiler carries and what every
//! executor decodes result columns into. [`ToValue`] / [`FromValue`] convert between Rust types
//! and values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dynamically-typed SQL value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::Uuid(_) => "UUID",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Json(_) => "JSON",
        }
    }

    /// Normalized grouping key used to match join-key values across representations.
    ///
    /// `Null` has no key. Booleans and integral floats collapse onto the integer form, UUIDs
    /// use their hyphenated text, and timestamps (or text that parses as one) use the UTC text
    /// form SQLite stores, so a value matches itself read back from any executor.
    pub fn index_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(v) => Some(i64::from(*v).to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    Some((*v as i64).to_string())
                } else {
                    Some(v.to_string())
                }
            }
            Value::Text(v) => Some(match timestamp_text(v) {
                Some(ts) => timestamp_key(&ts),
                None => v.clone(),
            }),
            Value::Bytes(v) => Some(String::from_utf8_lossy(v).into_owned()),
            Value::Uuid(v) => Some(v.hyphenated().to_string()),
            Value::Timestamp(v) => Some(timestamp_key(v)),
            Value::Json(v) => Some(v.to_string()),
        }
    }
}

/// Convert a Rust value into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Decode a Rust value from a [`Value`].
///
/// The error string is wrapped into [`crate::OrmError::Decode`] together with the column name.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch<T>(expected: &str, value: &Value) -> Result<T, String> {
    Err(format!("expected {expected}, got {}", value.type_name()))
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! int_to_value {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }
        )*
    };
}

int_to_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for u64 {
    fn to_value(&self) -> Value {
        match i64::try_from(*self) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Text(self.to_string()),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl ToValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.and_utc())
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            other => mismatch("BOOLEAN", other),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Bool(v) => Ok(i64::from(*v)),
            other => mismatch("INTEGER", other),
        }
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self, String> {
                    let v = i64::from_value(value)?;
                    <$t>::try_from(v).map_err(|_| format!("{v} out of range for {}", stringify!($t)))
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => mismatch("FLOAT", other),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            Value::Uuid(v) => Ok(v.hyphenated().to_string()),
            other => mismatch("TEXT", other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            Value::Text(v) => Ok(v.clone().into_bytes()),
            other => mismatch("BLOB", other),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Uuid(v) => Ok(*v),
            Value::Text(v) => Uuid::parse_str(v).map_err(|e| e.to_string()),
            Value::Bytes(v) => Uuid::from_slice(v).map_err(|e| e.to_string()),
            other => mismatch("UUID", other),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            Value::Text(v) => parse_timestamp(v),
            other => mismatch("TIMESTAMP", other),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        DateTime::<Utc>::from_value(value).map(|v| v.naive_utc())
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(v) => serde_json::from_str(v).map_err(|e| e.to_string()),
            other => mismatch("JSON", other),
        }
    }
}

/// Text format timestamps are bound and keyed with.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

fn timestamp_key(v: &DateTime<Utc>) -> String {
    v.format(TIMESTAMP_FORMAT).to_string()
}

/// `s` as a timestamp, when it looks like one.
fn timestamp_text(s: &str) -> Option<DateTime<Utc>> {
    let looks_like_date = s.len() >= 10
        && s.as_bytes()[..4].iter().all(u8::is_ascii_digit)
        && s.as_bytes()[4] == b'-';
    if !looks_like_date {
        return None;
    }
    parse_timestamp(s).ok()
}

/// Parse the textual timestamp forms SQLite and MySQL hand back.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(v) = DateTime::parse_from_rfc3339(s) {
        return Ok(v.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(v) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(v.and_utc());
        }
    }
    if let Ok(v) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(v) = v.and_hms_opt(0, 0, 0) {
            return Ok(v.and_utc());
        }
    }
    Err(format!("invalid timestamp '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_key_drops_null() {
        assert_eq!(Value::Null.index_key(), None);
        assert_eq!(None::<i64>.to_value().index_key(), None);
    }

    #[test]
    fn index_key_groups_equivalent_representations() {
        let id = Uuid::new_v4();
        assert_eq!(
            Value::Uuid(id).index_key(),
            Value::Text(id.to_string()).index_key()
        );
        assert_eq!(Value::Int(7).index_key(), Value::Text("7".into()).index_key());
        assert_eq!(Value::Float(7.0).index_key(), Value::Int(7).index_key());
        assert_eq!(Some(3_i32).to_value().index_key(), Some("3".to_string()));
    }

    #[test]
    fn index_key_matches_sqlite_storage_forms() {
        assert_eq!(Value::Bool(true).index_key(), Value::Int(1).index_key());
        assert_eq!(Value::Bool(false).index_key(), Value::Int(0).index_key());

        let ts = DateTime::parse_from_rfc3339("2024-05-06T07:08:09.250+02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            Value::Timestamp(ts).index_key(),
            Some("2024-05-06 05:08:09.250".to_string())
        );
        assert_eq!(
            Value::Timestamp(ts).index_key(),
            Value::Text("2024-05-06 05:08:09.250".into()).index_key()
        );
        assert_eq!(
            Value::Timestamp(ts).index_key(),
            Value::Text("2024-05-06T07:08:09.25+02:00".into()).index_key()
        );
        assert_eq!(
            Value::Text("2024-05-06 extra".into()).index_key(),
            Some("2024-05-06 extra".to_string())
        );
    }

    #[test]
    fn decode_numeric_widening() {
        assert_eq!(i32::from_value(&Value::Int(12)).unwrap(), 12);
        assert!(u8::from_value(&Value::Int(300)).is_err());
        assert_eq!(f64::from_value(&Value::Int(2)).unwrap(), 2.0);
        assert!(bool::from_value(&Value::Int(1)).unwrap());
    }

    #[test]
    fn decode_text_timestamps() {
        let ts = DateTime::<Utc>::from_value(&Value::Text("2024-03-01 10:20:30".into())).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:20:30+00:00");
        assert!(DateTime::<Utc>::from_value(&Value::Text("yesterday".into())).is_err());
    }

    #[test]
    fn decode_option_null() {
        assert_eq!(Option::<String>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(&Value::Text("a".into())).unwrap(),
            Some("a".to_string())
        );
    }
}
