//! Attribute parsing for Model derive macro.
//!
//! Handles parsing of struct-level and field-level `#[orm(...)]` attributes.

use heck::ToSnakeCase;
use syn::meta::ParseNestedMeta;
use syn::{DeriveInput, LitStr, Result};

/// Struct-level `#[orm(table = "...", scopes = "path::to::fn")]`.
#[derive(Default)]
pub(crate) struct StructAttrs {
    pub table: Option<String>,
    /// Function returning the model's global scopes.
    pub scopes: Option<syn::Path>,
}

/// Field-level `#[orm(...)]`.
#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub id: bool,
    pub column: Option<String>,
    pub auto_increment: bool,
    pub readonly: bool,
    pub unique: bool,
    pub index: bool,
    pub ty: Option<String>,
    pub skip: bool,
    pub local: Option<String>,
    pub foreign: Option<String>,
    pub owner: Option<String>,
}

impl FieldAttrs {
    /// Whether any column-only attribute is set.
    pub fn has_column_attrs(&self) -> bool {
        self.id
            || self.column.is_some()
            || self.auto_increment
            || self.readonly
            || self.unique
            || self.index
            || self.ty.is_some()
    }

    /// Whether any relationship key override is set.
    pub fn has_relation_attrs(&self) -> bool {
        self.local.is_some() || self.foreign.is_some() || self.owner.is_some()
    }
}

fn string_value(meta: &ParseNestedMeta) -> Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

pub(crate) fn struct_attrs(input: &DeriveInput) -> Result<StructAttrs> {
    let mut out = StructAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                out.table = Some(string_value(&meta)?);
            } else if meta.path.is_ident("scopes") {
                let lit: LitStr = meta.value()?.parse()?;
                out.scopes = Some(lit.parse()?);
            } else {
                return Err(meta.error("unknown struct attribute; expected `table` or `scopes`"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

pub(crate) fn field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("id") {
                out.id = true;
            } else if path.is_ident("auto_increment") {
                out.auto_increment = true;
            } else if path.is_ident("readonly") {
                out.readonly = true;
            } else if path.is_ident("unique") {
                out.unique = true;
            } else if path.is_ident("index") {
                out.index = true;
            } else if path.is_ident("skip") {
                out.skip = true;
            } else if path.is_ident("column") {
                out.column = Some(string_value(&meta)?);
            } else if path.is_ident("type") {
                out.ty = Some(string_value(&meta)?);
            } else if path.is_ident("local") {
                out.local = Some(string_value(&meta)?);
            } else if path.is_ident("foreign") {
                out.foreign = Some(string_value(&meta)?);
            } else if path.is_ident("owner") {
                out.owner = Some(string_value(&meta)?);
            } else {
                return Err(meta.error("unknown field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

/// `BlogPost` -> `blog_posts`, `Category` -> `categories`, `Person` -> `people`.
pub(crate) fn default_table_name(type_name: &str) -> String {
    let snake = type_name.to_snake_case();
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", pluralizer::pluralize(last, 2, false)),
        None => pluralizer::pluralize(&snake, 2, false),
    }
}
