//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::model::{field_attrs, named_fields};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = named_fields(&input, "FromRow")?;

    let mut field_extracts = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let attrs = field_attrs(field)?;
        if attrs.skip {
            field_extracts.push(quote!(#field_name: ::core::default::Default::default()));
            continue;
        }
        let ty = &field.ty;
        let column = attrs.column.unwrap_or_else(|| field_name.to_string());
        field_extracts.push(quote!(#field_name: row.try_get::<#ty>(#column)?));
    }

    Ok(quote! {
        impl #impl_generics relorm::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &relorm::Row) -> relorm::OrmResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
