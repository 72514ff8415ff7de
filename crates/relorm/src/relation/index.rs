use std::collections::HashMap;

use crate::error::{OrmError, OrmResult};
use crate::model::DynModel;
use crate::value::Value;

/// Related rows grouped by join-key value.
///
/// Keys go through [`Value::index_key`], so `Int(1)` and `Text("1")` (or a UUID and its
/// text form) land in the same group. Rows whose key is NULL are dropped.
#[derive(Debug, Clone)]
pub struct RelatedIndex<R> {
    groups: HashMap<String, Vec<R>>,
    rows: usize,
}

impl<R> Default for RelatedIndex<R> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
            rows: 0,
        }
    }
}

impl<R> RelatedIndex<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `row` under `key`. Returns false (and drops the row) when the key is NULL.
    pub fn insert(&mut self, key: &Value, row: R) -> bool {
        let Some(key) = key.index_key() else {
            return false;
        };
        self.groups.entry(key).or_default().push(row);
        self.rows += 1;
        true
    }

    /// First row for `key`, for single-valued relationships.
    pub fn first(&self, key: &Value) -> Option<&R> {
        self.all(key).first()
    }

    /// Every row for `key`, in fetch order.
    pub fn all(&self, key: &Value) -> &[R] {
        match key.index_key() {
            Some(k) => self.by_key(&k),
            None => &[],
        }
    }

    pub(crate) fn by_key(&self, key: &str) -> &[R] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of rows indexed.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.groups.len()
    }
}

impl<R: DynModel> RelatedIndex<R> {
    /// Index `rows` by their `column` value.
    pub fn build(rows: Vec<R>, column: &str) -> OrmResult<Self> {
        let mut index = Self::new();
        for row in rows {
            let key = row.column_value(column).ok_or_else(|| {
                OrmError::missing_field(row.model_meta().type_name, column)
            })?;
            index.insert(&key, row);
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn groups_by_normalized_key() {
        let mut index = RelatedIndex::new();
        assert!(index.insert(&Value::Int(1), "a"));
        assert!(index.insert(&Value::Text("1".into()), "b"));
        assert!(index.insert(&Value::Int(2), "c"));
        assert!(!index.insert(&Value::Null, "dropped"));

        assert_eq!(index.len(), 3);
        assert_eq!(index.key_count(), 2);
        assert_eq!(index.all(&Value::Int(1)), &["a", "b"]);
        assert_eq!(index.first(&Value::Text("2".into())), Some(&"c"));
        assert!(index.all(&Value::Int(3)).is_empty());
        assert!(index.all(&Value::Null).is_empty());
    }

    #[test]
    fn uuid_matches_its_text_form() {
        let id = Uuid::new_v4();
        let mut index = RelatedIndex::new();
        index.insert(&Value::Text(id.to_string()), 1);
        assert_eq!(index.first(&Value::Uuid(id)), Some(&1));
    }
}
