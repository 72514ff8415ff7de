//! Clause containers: select list, joins, group by, order by, limit/offset.
//!
//! Each container renders its whole clause including the keyword, or nothing when empty.

use crate::condition::Conditions;
use crate::error::OrmResult;
use crate::fragment::{Compile, Compiled, Compiler, Fragment};

/// Render a table reference: `table` or `table AS alias` (case-insensitive `as`).
pub(crate) fn table_ref(c: &Compiler<'_>, raw: &str) -> OrmResult<String> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    match parts.as_slice() {
        [table, kw, alias] if kw.eq_ignore_ascii_case("as") => {
            Ok(format!("{} AS {}", c.ident(table)?, c.ident(alias)?))
        }
        [table, alias] => Ok(format!("{} AS {}", c.ident(table)?, c.ident(alias)?)),
        _ => c.ident(raw.trim()),
    }
}

/// The name a table reference is addressed by: the alias when one is given.
pub(crate) fn table_name(raw: &str) -> &str {
    raw.split_whitespace().last().unwrap_or(raw)
}

// ==================== SELECT ====================

#[derive(Debug, Clone, Default)]
pub(crate) struct SelectList {
    pub(crate) distinct: bool,
    pub(crate) columns: Vec<Fragment>,
}

impl SelectList {
    /// `SELECT [DISTINCT] cols`; with no columns, selects `"table".*` (or `*` without a table).
    pub(crate) fn compile_for(
        &self,
        c: &mut Compiler<'_>,
        table: Option<&str>,
    ) -> OrmResult<Compiled> {
        let mut out = Compiled::new(
            if self.distinct {
                "SELECT DISTINCT"
            } else {
                "SELECT"
            },
            Vec::new(),
        );
        let columns = if self.columns.is_empty() {
            let star = match table {
                Some(t) => format!("{}.*", table_name(t)),
                None => "*".to_string(),
            };
            Fragment::ident(star).compile(c)?
        } else {
            Fragment::join(self.columns.clone(), ", ").compile(c)?
        };
        out.push(" ", columns);
        Ok(out)
    }
}

// ==================== JOIN ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) table: String,
    pub(crate) on: Conditions,
}

impl Compile for Join {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        let mut out = Compiled::new(
            format!("{} {}", self.kind.keyword(), table_ref(c, &self.table)?),
            Vec::new(),
        );
        let on = self.on.compile(c)?;
        if !on.is_empty() {
            out.sql.push_str(" ON");
            out.push(" ", on);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Joins(pub(crate) Vec<Join>);

impl Compile for Joins {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        let mut out = Compiled::default();
        for join in &self.0 {
            out.push(" ", join.compile(c)?);
        }
        Ok(out)
    }
}

// ==================== GROUP BY ====================

#[derive(Debug, Clone, Default)]
pub(crate) struct GroupBy(pub(crate) Vec<Fragment>);

impl Compile for GroupBy {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        if self.0.is_empty() {
            return Ok(Compiled::default());
        }
        let mut out = Compiled::new("GROUP BY", Vec::new());
        out.push(" ", Fragment::join(self.0.clone(), ", ").compile(c)?);
        Ok(out)
    }
}

// ==================== ORDER BY ====================

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct OrderBy(pub(crate) Vec<(Fragment, SortDir)>);

impl Compile for OrderBy {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        if self.0.is_empty() {
            return Ok(Compiled::default());
        }
        let mut items = Compiled::default();
        for (expr, dir) in &self.0 {
            let mut item = expr.compile(c)?;
            if *dir == SortDir::Desc {
                item.sql.push_str(" DESC");
            }
            items.push(", ", item);
        }
        let mut out = Compiled::new("ORDER BY", Vec::new());
        out.push(" ", items);
        Ok(out)
    }
}

// ==================== LIMIT / OFFSET ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Limit {
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl Compile for Limit {
    fn compile(&self, c: &mut Compiler<'_>) -> OrmResult<Compiled> {
        let sql = match (self.limit, self.offset) {
            (None, None) => String::new(),
            (Some(n), None) => format!("LIMIT {n}"),
            (Some(n), Some(m)) => format!("LIMIT {n} OFFSET {m}"),
            (None, Some(m)) => format!("LIMIT {} OFFSET {m}", c.dialect().limit_all()),
        };
        Ok(Compiled::new(sql, Vec::new()))
    }
}

/// `KEYWORD conditions`, or nothing when the conditions render empty.
pub(crate) fn prefixed(
    c: &mut Compiler<'_>,
    keyword: &str,
    conditions: &Conditions,
) -> OrmResult<Compiled> {
    let body = conditions.compile(c)?;
    if body.is_empty() {
        return Ok(body);
    }
    let mut out = Compiled::new(keyword, Vec::new());
    out.push(" ", body);
    Ok(out)
}
