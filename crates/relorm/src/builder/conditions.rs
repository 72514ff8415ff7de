//! WHERE / HAVING methods. Each one delegates to [`Conditions`] on a copy of the clause.

use std::sync::Arc;

use super::Builder;
use crate::condition::Conditions;
use crate::fragment::Fragment;
use crate::value::{ToValue, Value};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Clause {
    Where,
    Having,
}

impl<M> Builder<M> {
    /// Copy the builder and rewrite one condition list.
    pub(crate) fn map_conditions(
        &self,
        clause: Clause,
        f: impl FnOnce(Conditions) -> Conditions,
    ) -> Self {
        let mut next = self.clone();
        let slot = match clause {
            Clause::Where => &mut next.wheres,
            Clause::Having => &mut next.havings,
        };
        let conditions = Arc::make_mut(slot);
        *conditions = f(std::mem::take(conditions));
        next
    }

    // ==================== WHERE ====================

    /// `WHERE column op ?`. A NULL value renders `IS NULL` / `IS NOT NULL` for `=` / `!=`.
    pub fn and_where(&self, column: &str, op: &str, value: impl ToValue) -> Self {
        self.map_conditions(Clause::Where, |c| c.and_where(column, op, value))
    }

    pub fn or_where(&self, column: &str, op: &str, value: impl ToValue) -> Self {
        self.map_conditions(Clause::Where, |c| c.or_where(column, op, value))
    }

    pub fn where_null(&self, column: &str) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_null(column))
    }

    pub fn where_not_null(&self, column: &str) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_not_null(column))
    }

    pub fn where_between(&self, column: &str, low: impl ToValue, high: impl ToValue) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_between(column, low, high))
    }

    pub fn where_in<I, T>(&self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        self.map_conditions(Clause::Where, |c| c.where_in(column, values))
    }

    pub fn or_where_in<I, T>(&self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        self.map_conditions(Clause::Where, |c| c.or_where_in(column, values))
    }

    pub fn where_not_in<I, T>(&self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        self.map_conditions(Clause::Where, |c| c.where_not_in(column, values))
    }

    /// `column IN (SELECT ...)`
    pub fn where_in_sub(&self, column: &str, sub: impl Into<Fragment>) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_in_sub(column, sub))
    }

    pub fn where_not_in_sub(&self, column: &str, sub: impl Into<Fragment>) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_not_in_sub(column, sub))
    }

    pub fn where_exists(&self, sub: impl Into<Fragment>) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_exists(sub))
    }

    pub fn or_where_exists(&self, sub: impl Into<Fragment>) -> Self {
        self.map_conditions(Clause::Where, |c| c.or_where_exists(sub))
    }

    pub fn where_not_exists(&self, sub: impl Into<Fragment>) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_not_exists(sub))
    }

    /// `column op other_column`
    pub fn where_column(&self, column: &str, op: &str, other: &str) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_column(column, op, other))
    }

    pub fn or_where_column(&self, column: &str, op: &str, other: &str) -> Self {
        self.map_conditions(Clause::Where, |c| c.or_where_column(column, op, other))
    }

    /// `(SELECT ...) op ?`
    pub fn where_subquery(&self, sub: impl Into<Fragment>, op: &str, value: impl ToValue) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_subquery(sub, op, value))
    }

    pub fn or_where_subquery(
        &self,
        sub: impl Into<Fragment>,
        op: &str,
        value: impl ToValue,
    ) -> Self {
        self.map_conditions(Clause::Where, |c| c.or_where_subquery(sub, op, value))
    }

    pub fn where_raw(&self, sql: &str, bindings: Vec<Value>) -> Self {
        self.map_conditions(Clause::Where, |c| c.where_raw(sql, bindings))
    }

    pub fn or_where_raw(&self, sql: &str, bindings: Vec<Value>) -> Self {
        self.map_conditions(Clause::Where, |c| c.or_where_raw(sql, bindings))
    }

    /// AND-linked parenthesized group.
    pub fn where_group(&self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        self.map_conditions(Clause::Where, |c| c.and_group(f))
    }

    /// OR-linked parenthesized group.
    pub fn or_where_group(&self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        self.map_conditions(Clause::Where, |c| c.or_group(f))
    }

    // ==================== HAVING ====================

    pub fn having(&self, column: &str, op: &str, value: impl ToValue) -> Self {
        self.map_conditions(Clause::Having, |c| c.and_where(column, op, value))
    }

    pub fn or_having(&self, column: &str, op: &str, value: impl ToValue) -> Self {
        self.map_conditions(Clause::Having, |c| c.or_where(column, op, value))
    }

    pub fn having_in<I, T>(&self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        self.map_conditions(Clause::Having, |c| c.where_in(column, values))
    }

    pub fn having_column(&self, column: &str, op: &str, other: &str) -> Self {
        self.map_conditions(Clause::Having, |c| c.where_column(column, op, other))
    }

    pub fn having_exists(&self, sub: impl Into<Fragment>) -> Self {
        self.map_conditions(Clause::Having, |c| c.where_exists(sub))
    }

    pub fn having_subquery(&self, sub: impl Into<Fragment>, op: &str, value: impl ToValue) -> Self {
        self.map_conditions(Clause::Having, |c| c.where_subquery(sub, op, value))
    }

    /// Raw HAVING, e.g. `COUNT(*) > ?`.
    pub fn having_raw(&self, sql: &str, bindings: Vec<Value>) -> Self {
        self.map_conditions(Clause::Having, |c| c.where_raw(sql, bindings))
    }

    pub fn or_having_raw(&self, sql: &str, bindings: Vec<Value>) -> Self {
        self.map_conditions(Clause::Having, |c| c.or_where_raw(sql, bindings))
    }

    pub fn having_group(&self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        self.map_conditions(Clause::Having, |c| c.and_group(f))
    }

    pub fn or_having_group(&self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        self.map_conditions(Clause::Having, |c| c.or_group(f))
    }
}
