//! Type helper utilities for syn type analysis.

/// Relationship container recognized on a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    HasOne,
    HasMany,
    BelongsTo,
}

impl RelationType {
    /// Name of the `RelationMeta` constructor for this container.
    pub fn constructor(self) -> &'static str {
        match self {
            RelationType::HasOne => "has_one",
            RelationType::HasMany => "has_many",
            RelationType::BelongsTo => "belongs_to",
        }
    }
}

/// Extract the single generic argument of the last path segment (`Foo<T>` -> `T`).
fn single_generic(seg: &syn::PathSegment) -> Option<&syn::Type> {
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Recognize `HasOne<R>`, `HasMany<R>` and `BelongsTo<R>` (any path prefix) and return the
/// container kind with the related type `R`.
pub fn relation_type(ty: &syn::Type) -> Option<(RelationType, &syn::Type)> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    let kind = match seg.ident.to_string().as_str() {
        "HasOne" => RelationType::HasOne,
        "HasMany" => RelationType::HasMany,
        "BelongsTo" => RelationType::BelongsTo,
        _ => return None,
    };
    Some((kind, single_generic(seg)?))
}
