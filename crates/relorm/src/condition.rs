//! Ordered predicate lists for WHERE / HAVING / JOIN ON.
//!
//! [`Conditions`] is a sequence of predicates, each linked to the previous one with AND or OR.
//! A predicate has an optional left-hand side (column or sub-builder), an optional operator
//! and an optional right-hand side (bound value, column, value list, sub-builder or nested
//! group). Malformed predicates are kept as-is and rejected when compiled.
//!
//! # Example
//! ```ignore
//! use relorm::{Conditions, Sqlite};
//!
//! let c = Conditions::new()
//!     .and_where("status", "=", "active")
//!     .or_group(|g| g.and_where("role", "=", "admin").and_where("deleted_at", "=", None::<i64>));
//! // "status" = ? OR ("role" = ? AND "deleted_at" IS NULL)
//! ```

use crate::error::{OrmError, OrmResult};
use crate::fragment::{Compile, Compiled, Compiler, Fragment};
use crate::value::{ToValue, Value};

/// Linkage of a predicate to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    fn keyword(self) -> &'static str {
        match self {
            Logic::And => " AND ",
            Logic::Or => " OR ",
        }
    }
}

const OPERATORS: &[&str] = &[
    "=",
    "!=",
    "<>",
    "<",
    "<=",
    ">",
    ">=",
    "LIKE",
    "NOT LIKE",
    "ILIKE",
    "NOT ILIKE",
    "IN",
    "NOT IN",
    "IS",
    "IS NOT",
    "BETWEEN",
    "NOT BETWEEN",
    "EXISTS",
    "NOT EXISTS",
];

/// One entry of a [`Conditions`] list.
#[derive(Debug, Clone)]
pub struct Predicate {
    logic: Logic,
    column: Option<Fragment>,
    operator: Option<String>,
    value: Option<Fragment>,
}

impl Predicate {
    pub fn new(
        logic: Logic,
        column: Option<Fragment>,
        operator: Option<&str>,
        value: Option<Fragment>,
    ) -> Self {
        Self {
            logic,
            column,
            operator: operator.map(|op| op.trim().to_ascii_uppercase()),
            value,
        }
    }

    pub fn logic(&self) -> Logic {
        self.logic
    }

    fn operator(&self) -> OrmResult<Option<&str>> {
        match self.operator.as_deref() {
            None | Some("") => Ok(None),
            Some(op) if OPERATORS.contains(&op) => Ok(Some(op)),
            Some(op) => Err(OrmError::invalid_condition(format!(
                "unsupported operator '{op}'"
            ))),
        }
    }
}

impl Compile for Predicate {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        let op = self.operator()?;
        match (&self.column, op, &self.value) {
            (Some(_), None, _) => Err(OrmError::invalid_condition(
                "operator must be set when column is set",
            )),
            (Some(column), Some(op), None) => {
                let null_check = match op {
                    "=" | "IS" => "IS NULL",
                    "!=" | "<>" | "IS NOT" => "IS NOT NULL",
                    other => {
                        return Err(OrmError::invalid_condition(format!(
                            "operator '{other}' requires a value"
                        )));
                    }
                };
                let mut out = column.compile(c)?;
                out.sql.push(' ');
                out.sql.push_str(null_check);
                Ok(out)
            }
            (Some(column), Some(op), Some(value)) => {
                let mut out = column.compile(c)?;
                out.sql.push(' ');
                out.sql.push_str(op);
                out.push(" ", value.compile(c)?);
                Ok(out)
            }
            (None, Some(op), Some(value)) => {
                let mut out = Compiled::new(op, Vec::new());
                out.push(" ", value.compile(c)?);
                Ok(out)
            }
            (None, None, Some(value)) => value.compile(c),
            (None, _, None) => Err(OrmError::invalid_condition("predicate has no value")),
        }
    }
}

/// An ordered list of AND/OR-linked predicates.
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    predicates: Vec<Predicate>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Append a predicate.
    pub fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    fn compare(self, logic: Logic, column: &str, op: &str, value: Value) -> Self {
        let value = (!value.is_null()).then_some(Fragment::Literal(value));
        self.push(Predicate::new(
            logic,
            Some(Fragment::ident(column)),
            Some(op),
            value,
        ))
    }

    // ==================== Comparisons ====================

    /// `column op ?`. A NULL value renders `IS NULL` / `IS NOT NULL` for `=` / `!=`.
    pub fn and_where(self, column: &str, op: &str, value: impl ToValue) -> Self {
        self.compare(Logic::And, column, op, value.to_value())
    }

    pub fn or_where(self, column: &str, op: &str, value: impl ToValue) -> Self {
        self.compare(Logic::Or, column, op, value.to_value())
    }

    pub fn where_null(self, column: &str) -> Self {
        self.compare(Logic::And, column, "=", Value::Null)
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.compare(Logic::And, column, "!=", Value::Null)
    }

    /// `column BETWEEN ? AND ?`
    pub fn where_between(self, column: &str, low: impl ToValue, high: impl ToValue) -> Self {
        let range = Fragment::join(vec![Fragment::literal(low), Fragment::literal(high)], " AND ");
        self.push(Predicate::new(
            Logic::And,
            Some(Fragment::ident(column)),
            Some("BETWEEN"),
            Some(range),
        ))
    }

    // ==================== Column to column ====================

    /// `column op other_column`, both sides quoted as identifiers.
    pub fn where_column(self, column: &str, op: &str, other: &str) -> Self {
        self.push(Predicate::new(
            Logic::And,
            Some(Fragment::ident(column)),
            Some(op),
            Some(Fragment::ident(other)),
        ))
    }

    pub fn or_where_column(self, column: &str, op: &str, other: &str) -> Self {
        self.push(Predicate::new(
            Logic::Or,
            Some(Fragment::ident(column)),
            Some(op),
            Some(Fragment::ident(other)),
        ))
    }

    // ==================== IN ====================

    fn in_list<I, T>(self, logic: Logic, column: &str, negated: bool, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        let list: Vec<Fragment> = values.into_iter().map(Fragment::literal).collect();
        if list.is_empty() {
            // Empty IN matches nothing; empty NOT IN matches everything.
            let sql = if negated { "1 = 1" } else { "1 = 0" };
            return self.push(Predicate::new(logic, None, None, Some(Fragment::raw(sql))));
        }
        let op = if negated { "NOT IN" } else { "IN" };
        self.push(Predicate::new(
            logic,
            Some(Fragment::ident(column)),
            Some(op),
            Some(Fragment::group(Fragment::join(list, ", "))),
        ))
    }

    /// `column IN (?, ?, ...)`
    pub fn where_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        self.in_list(Logic::And, column, false, values)
    }

    pub fn or_where_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        self.in_list(Logic::Or, column, false, values)
    }

    pub fn where_not_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        self.in_list(Logic::And, column, true, values)
    }

    /// `column IN (SELECT ...)`
    pub fn where_in_sub(self, column: &str, sub: impl Into<Fragment>) -> Self {
        self.push(Predicate::new(
            Logic::And,
            Some(Fragment::ident(column)),
            Some("IN"),
            Some(Fragment::group(sub.into())),
        ))
    }

    pub fn where_not_in_sub(self, column: &str, sub: impl Into<Fragment>) -> Self {
        self.push(Predicate::new(
            Logic::And,
            Some(Fragment::ident(column)),
            Some("NOT IN"),
            Some(Fragment::group(sub.into())),
        ))
    }

    // ==================== EXISTS ====================

    fn exists(self, logic: Logic, negated: bool, sub: Fragment) -> Self {
        let op = if negated { "NOT EXISTS" } else { "EXISTS" };
        self.push(Predicate::new(
            logic,
            None,
            Some(op),
            Some(Fragment::group(sub)),
        ))
    }

    /// `EXISTS (SELECT ...)`
    pub fn where_exists(self, sub: impl Into<Fragment>) -> Self {
        self.exists(Logic::And, false, sub.into())
    }

    pub fn or_where_exists(self, sub: impl Into<Fragment>) -> Self {
        self.exists(Logic::Or, false, sub.into())
    }

    pub fn where_not_exists(self, sub: impl Into<Fragment>) -> Self {
        self.exists(Logic::And, true, sub.into())
    }

    pub fn or_where_not_exists(self, sub: impl Into<Fragment>) -> Self {
        self.exists(Logic::Or, true, sub.into())
    }

    // ==================== Sub-builder comparison ====================

    /// `(SELECT ...) op ?`
    pub fn where_subquery(self, sub: impl Into<Fragment>, op: &str, value: impl ToValue) -> Self {
        let value = value.to_value();
        let value = (!value.is_null()).then_some(Fragment::Literal(value));
        self.push(Predicate::new(
            Logic::And,
            Some(Fragment::group(sub.into())),
            Some(op),
            value,
        ))
    }

    pub fn or_where_subquery(
        self,
        sub: impl Into<Fragment>,
        op: &str,
        value: impl ToValue,
    ) -> Self {
        let value = value.to_value();
        let value = (!value.is_null()).then_some(Fragment::Literal(value));
        self.push(Predicate::new(
            Logic::Or,
            Some(Fragment::group(sub.into())),
            Some(op),
            value,
        ))
    }

    // ==================== Raw / groups ====================

    /// Raw SQL; `?` markers take `bindings` in order.
    pub fn where_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.push(Predicate::new(
            Logic::And,
            None,
            None,
            Some(Fragment::raw_with(sql, bindings)),
        ))
    }

    pub fn or_where_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.push(Predicate::new(
            Logic::Or,
            None,
            None,
            Some(Fragment::raw_with(sql, bindings)),
        ))
    }

    /// Parenthesized nested group, AND-linked.
    pub fn and_group(self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        let group = f(Conditions::new());
        self.push(Predicate::new(
            Logic::And,
            None,
            None,
            Some(Fragment::group(Fragment::node(group))),
        ))
    }

    /// Parenthesized nested group, OR-linked.
    pub fn or_group(self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        let group = f(Conditions::new());
        self.push(Predicate::new(
            Logic::Or,
            None,
            None,
            Some(Fragment::group(Fragment::node(group))),
        ))
    }
}

impl Compile for Conditions {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        let mut out = Compiled::default();
        for predicate in &self.predicates {
            out.push(predicate.logic.keyword(), predicate.compile(c)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Postgres, Sqlite};

    fn sqlite(c: &Conditions) -> OrmResult<(String, Vec<Value>)> {
        Fragment::node(c.clone()).to_sql(&Sqlite)
    }

    #[test]
    fn comparison_binds_value() {
        let c = Conditions::new().and_where("column", "=", "value");
        let (sql, bindings) = sqlite(&c).unwrap();
        assert_eq!(sql, r#""column" = ?"#);
        assert_eq!(bindings, vec![Value::Text("value".into())]);
    }

    #[test]
    fn null_renders_is_null() {
        let c = Conditions::new()
            .and_where("a", "=", Value::Null)
            .and_where("b", "!=", None::<i64>)
            .or_where("c", "<>", Value::Null);
        let (sql, bindings) = sqlite(&c).unwrap();
        assert_eq!(sql, r#""a" IS NULL AND "b" IS NOT NULL OR "c" IS NOT NULL"#);
        assert!(bindings.is_empty());
    }

    #[test]
    fn null_with_other_operator_is_an_error() {
        let c = Conditions::new().and_where("a", ">", Value::Null);
        assert!(sqlite(&c).unwrap_err().is_invalid_condition());
    }

    #[test]
    fn column_without_operator_is_an_error() {
        let c = Conditions::new().push(Predicate::new(
            Logic::And,
            Some(Fragment::ident("a")),
            None,
            Some(Fragment::literal(1)),
        ));
        let err = sqlite(&c).unwrap_err();
        assert!(err.to_string().contains("operator must be set when column is set"));
    }

    #[test]
    fn unknown_operator_is_an_error() {
        let c = Conditions::new().and_where("a", "= 1 OR 1 =", 1);
        assert!(sqlite(&c).unwrap_err().is_invalid_condition());
    }

    #[test]
    fn in_lists() {
        let c = Conditions::new()
            .where_in("id", [1, 2, 3])
            .where_not_in("status", ["x"]);
        let (sql, bindings) = Fragment::node(c).to_sql(&Postgres).unwrap();
        assert_eq!(sql, r#""id" IN ($1, $2, $3) AND "status" NOT IN ($4)"#);
        assert_eq!(bindings.len(), 4);
    }

    #[test]
    fn empty_in_lists() {
        let empty: Vec<i64> = Vec::new();
        let c = Conditions::new()
            .where_in("id", empty.clone())
            .where_not_in("id", empty);
        assert_eq!(sqlite(&c).unwrap().0, "1 = 0 AND 1 = 1");
    }

    #[test]
    fn nested_groups_keep_binding_order() {
        let c = Conditions::new()
            .and_where("a", "=", 1)
            .or_group(|g| g.and_where("b", "=", 2).or_where("c", ">", 3))
            .and_where("d", "<", 4);
        let (sql, bindings) = Fragment::node(c).to_sql(&Postgres).unwrap();
        assert_eq!(sql, r#""a" = $1 OR ("b" = $2 OR "c" > $3) AND "d" < $4"#);
        assert_eq!(
            bindings,
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
        );
    }

    #[test]
    fn empty_group_is_skipped() {
        let c = Conditions::new()
            .and_where("a", "=", 1)
            .and_group(|g| g)
            .and_where("b", "=", 2);
        assert_eq!(sqlite(&c).unwrap().0, r#""a" = ? AND "b" = ?"#);
    }

    #[test]
    fn column_comparison_and_raw() {
        let c = Conditions::new()
            .where_column("foo_id", "=", "foos.id")
            .where_raw("lower(name) = ?", vec![Value::Text("x".into())])
            .where_between("age", 18, 30);
        let (sql, bindings) = sqlite(&c).unwrap();
        assert_eq!(
            sql,
            r#""foo_id" = "foos"."id" AND lower(name) = ? AND "age" BETWEEN ? AND ?"#
        );
        assert_eq!(bindings.len(), 3);
    }

    #[test]
    fn operator_is_normalized() {
        let c = Conditions::new().and_where("name", " like ", "a%");
        assert_eq!(sqlite(&c).unwrap().0, r#""name" LIKE ?"#);
    }
}
