//! Derive macros for relorm
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Model)]` macros.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod from_row;
mod model;

/// Derive `FromRow` for a plain result struct.
///
/// # Example
///
/// ```ignore
/// use relorm::FromRow;
///
/// #[derive(FromRow)]
/// struct Total {
///     user_id: i64,
///     #[orm(column = "n")]
///     total: i64,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(skip)]` - Fill the field with `Default::default()`
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Model`, `DynModel` and `FromRow` for a struct.
///
/// # Example
///
/// ```ignore
/// use relorm::{BelongsTo, HasMany, Model};
///
/// #[derive(Debug, Clone, Model)]
/// #[orm(table = "posts")]
/// struct Post {
///     #[orm(id, auto_increment)]
///     id: i64,
///     user_id: i64,
///     title: String,
///     user: BelongsTo<User>,
///     #[orm(foreign = "post_id")]
///     comments: HasMany<Comment>,
/// }
/// ```
///
/// # Attributes
///
/// Struct level:
/// - `#[orm(table = "name")]` - Table name (defaults to the pluralized snake_case type name)
/// - `#[orm(scopes = "path::to::fn")]` - Function returning the model's global scopes
///
/// Column fields:
/// - `#[orm(id)]` - Part of the primary key
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(auto_increment)]`, `#[orm(readonly)]`, `#[orm(unique)]`, `#[orm(index)]`
/// - `#[orm(type = "int64")]` - Column type override
/// - `#[orm(skip)]` - Not a column; filled with `Default::default()`
///
/// Relationship fields (`HasOne<R>`, `HasMany<R>`, `BelongsTo<R>`):
/// - `#[orm(local = "col")]`, `#[orm(foreign = "col")]`, `#[orm(owner = "col")]`
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
