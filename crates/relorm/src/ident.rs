//! Safe SQL identifier handling.
//!
//! This module provides [`Ident`] which represents a SQL identifier (schema/table/column),
//! supporting dotted notation, quoted parts and a trailing `*`.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL
//! - `*` is only accepted as the last part (`users.*`)
//!
//! Rendering goes through a [`Dialect`], which quotes every part in its own style.
//!
//! # Example
//! ```ignore
//! use relorm::{Ident, Postgres};
//!
//! let c = Ident::parse("foos.id")?;
//! assert_eq!(c.render(&Postgres), r#""foos"."id""#);
//! # Ok::<(), relorm::OrmError>(())
//! ```

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
    /// `*` wildcard (last part only).
    Star,
}

/// A SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table.column`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Wildcard: `users.*` or `*`
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(invalid("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(invalid("Identifier cannot contain NUL character"));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                if matches!(parts.last(), Some(IdentPart::Star)) {
                    return Err(invalid(format!("'*' must be the last part of '{s}'")));
                }
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(invalid("Trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(invalid(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'*') {
                chars.next();
                parts.push(IdentPart::Star);
                continue;
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            // Escaped quote: ""
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => return Err(invalid("Unclosed quoted identifier")),
                    }
                }
                if name.is_empty() {
                    return Err(invalid("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(invalid(format!(
                        "Invalid character '{c}' in identifier '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(invalid("Empty identifier segment"));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        if parts.is_empty() {
            return Err(invalid("Empty identifier"));
        }

        Ok(Self { parts })
    }

    /// Whether the identifier ends in `*`.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.parts.last(), Some(IdentPart::Star))
    }

    /// Render the identifier with the dialect's quoting.
    pub fn render(&self, dialect: &dyn Dialect) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) | IdentPart::Quoted(s) => {
                    out.push_str(&dialect.quote_ident(s))
                }
                IdentPart::Star => out.push('*'),
            }
        }
        out
    }
}

fn invalid(message: impl Into<String>) -> OrmError {
    OrmError::InvalidIdentifier(message.into())
}
