//! Model derive macro implementation
//!
//! Generates `FromRow`, `DynModel` and `Model` for a struct with named fields. Fields of
//! type `HasOne<R>` / `HasMany<R>` / `BelongsTo<R>` become relationships named after the
//! field; every other field is a column unless marked `#[orm(skip)]`.

mod attrs;

pub(crate) use attrs::field_attrs;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result};

use crate::common::syn_types::relation_type;
use attrs::{default_table_name, struct_attrs};

struct Column<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    column: String,
    meta: TokenStream,
}

struct RelationField<'a> {
    ident: &'a syn::Ident,
    meta: TokenStream,
}

pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> Result<&'a syn::punctuated::Punctuated<syn::Field, syn::Token![,]>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{derive} can only be derived for structs"),
        )),
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let struct_attrs = struct_attrs(&input)?;
    let type_name = name.to_string();
    let table = struct_attrs
        .table
        .unwrap_or_else(|| default_table_name(&type_name));
    let fields = named_fields(&input, "Model")?;

    let mut columns: Vec<Column> = Vec::with_capacity(fields.len());
    let mut relations: Vec<RelationField> = Vec::new();
    let mut skipped: Vec<&syn::Ident> = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = field_attrs(field)?;
        let field_name = ident.to_string();

        if attrs.skip {
            skipped.push(ident);
            continue;
        }

        if let Some((kind, related)) = relation_type(&field.ty) {
            if attrs.has_column_attrs() {
                return Err(syn::Error::new_spanned(
                    field,
                    "column attributes cannot be used on a relationship field",
                ));
            }
            let ctor = format_ident!("{}", kind.constructor());
            let local = attrs.local.map(|c| quote!(.local(#c)));
            let foreign = attrs.foreign.map(|c| quote!(.foreign(#c)));
            let owner = attrs.owner.map(|c| quote!(.owner(#c)));
            relations.push(RelationField {
                ident,
                meta: quote! {
                    relorm::RelationMeta::#ctor::<#related>(#field_name)
                        #local #foreign #owner
                },
            });
            continue;
        }

        if attrs.has_relation_attrs() {
            return Err(syn::Error::new_spanned(
                field,
                "`local`, `foreign` and `owner` only apply to HasOne, HasMany and BelongsTo fields",
            ));
        }

        let column = attrs.column.clone().unwrap_or_else(|| field_name.clone());
        let primary = attrs.id.then(|| quote!(.primary()));
        let auto_increment = attrs.auto_increment.then(|| quote!(.auto_increment()));
        let readonly = attrs.readonly.then(|| quote!(.readonly()));
        let unique = attrs.unique.then(|| quote!(.unique()));
        let index = attrs.index.then(|| quote!(.index()));
        let type_override = attrs.ty.as_ref().map(|t| quote!(.type_override(#t)));
        columns.push(Column {
            ident,
            ty: &field.ty,
            meta: quote! {
                relorm::FieldMeta::new(#field_name, #column)
                    #primary #auto_increment #readonly #unique #index #type_override
            },
            column,
        });
    }

    if columns.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "Model requires at least one column field",
        ));
    }

    // FromRow
    let column_extracts = columns.iter().map(|c| {
        let ident = c.ident;
        let ty = c.ty;
        let column = &c.column;
        quote!(#ident: row.try_get::<#ty>(#column)?)
    });
    let default_fields = relations
        .iter()
        .map(|r| r.ident)
        .chain(skipped.iter().copied())
        .map(|ident| quote!(#ident: ::core::default::Default::default()));

    // DynModel
    let value_arms = columns.iter().map(|c| {
        let ident = c.ident;
        let column = &c.column;
        quote!(#column => ::core::option::Option::Some(relorm::ToValue::to_value(&self.#ident)))
    });
    let relation_arms = relations.iter().map(|r| {
        let ident = r.ident;
        let name = ident.to_string();
        quote!(#name => ::core::option::Option::Some(&self.#ident))
    });
    let relation_mut_arms = relations.iter().map(|r| {
        let ident = r.ident;
        let name = ident.to_string();
        quote!(#name => ::core::option::Option::Some(&mut self.#ident))
    });

    // Model
    let field_metas = columns.iter().map(|c| &c.meta);
    let relation_metas = relations.iter().map(|r| &r.meta);
    let scopes_fn = struct_attrs.scopes.map(|path| {
        quote! {
            fn scopes() -> ::std::vec::Vec<relorm::Scope> {
                #path()
            }
        }
    });

    Ok(quote! {
        impl relorm::FromRow for #name {
            fn from_row(row: &relorm::Row) -> relorm::OrmResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#column_extracts,)*
                    #(#default_fields,)*
                })
            }
        }

        impl relorm::DynModel for #name {
            fn model_meta(&self) -> &'static relorm::ModelMeta {
                <Self as relorm::Model>::meta()
            }

            fn column_value(&self, column: &str) -> ::core::option::Option<relorm::Value> {
                match column {
                    #(#value_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn relation(&self, name: &str) -> ::core::option::Option<&dyn relorm::Relation> {
                match name {
                    #(#relation_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn relation_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn relorm::Relation> {
                match name {
                    #(#relation_mut_arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl relorm::Model for #name {
            fn meta() -> &'static relorm::ModelMeta {
                static META: ::std::sync::OnceLock<relorm::ModelMeta> =
                    ::std::sync::OnceLock::new();
                META.get_or_init(|| {
                    relorm::ModelMeta::new(#type_name, #table)
                        #(.field(#field_metas))*
                        #(.relation(#relation_metas))*
                })
            }

            #scopes_fn
        }
    })
}
