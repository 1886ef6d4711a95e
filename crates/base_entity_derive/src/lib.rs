//! `#[base_entity]` injects the columns every table in the service shares
//! (`id`, `created_at`, `updated_at`) and wires the active model into the
//! DAO stamping traits.
//!
//! ```ignore
//! #[base_entity]
//! #[sea_orm::model]
//! #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
//! #[sea_orm(table_name = "posts")]
//! pub struct Model {
//!     pub title: String,
//! }
//! ```
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    Expr, ExprLit, Field, Fields, FieldsNamed, Ident, ItemStruct, Lit, LitStr, Meta, Path, Token,
    parse_macro_input, parse_quote, parse_str, punctuated::Punctuated,
};

const DEFAULT_TRAITS_PATH: &str = "crate::db::dao::base_traits";

struct Options {
    traits: Path,
    active_model: Ident,
    id: Ident,
    created_at: Ident,
    updated_at: Ident,
}

impl Options {
    fn parse(args: Punctuated<Meta, Token![,]>) -> syn::Result<Self> {
        let mut options = Self {
            traits: parse_str(DEFAULT_TRAITS_PATH)?,
            active_model: ident("ActiveModel"),
            id: ident("id"),
            created_at: ident("created_at"),
            updated_at: ident("updated_at"),
        };

        for meta in args {
            let (key, value) = key_value(meta)?;
            match key.to_string().as_str() {
                "traits" => options.traits = value.parse()?,
                "active_model" => options.active_model = Ident::new(&value.value(), value.span()),
                "id" => options.id = Ident::new(&value.value(), value.span()),
                "created_at" => options.created_at = Ident::new(&value.value(), value.span()),
                "updated_at" => options.updated_at = Ident::new(&value.value(), value.span()),
                other => {
                    return Err(syn::Error::new_spanned(
                        key,
                        format!("unsupported base_entity option `{other}`"),
                    ));
                }
            }
        }

        Ok(options)
    }

    fn injected_fields(&self) -> [(Ident, Field); 3] {
        let id = &self.id;
        let created_at = &self.created_at;
        let updated_at = &self.updated_at;
        [
            (
                id.clone(),
                parse_quote! {
                    #[sea_orm(primary_key, auto_increment = false)]
                    pub #id: uuid::Uuid
                },
            ),
            (
                created_at.clone(),
                parse_quote! {
                    #[sea_orm(default_expr = "Expr::current_timestamp()")]
                    pub #created_at: sea_orm::entity::prelude::DateTimeWithTimeZone
                },
            ),
            (
                updated_at.clone(),
                parse_quote! {
                    #[sea_orm(default_expr = "Expr::current_timestamp()")]
                    pub #updated_at: sea_orm::entity::prelude::DateTimeWithTimeZone
                },
            ),
        ]
    }
}

#[proc_macro_attribute]
pub fn base_entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated<Meta, Token![,]>::parse_terminated);
    let mut input = parse_macro_input!(item as ItemStruct);

    match expand(args, &mut input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(
    args: Punctuated<Meta, Token![,]>,
    input: &mut ItemStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let options = Options::parse(args)?;

    let Fields::Named(fields) = &mut input.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "base_entity only supports structs with named fields",
        ));
    };
    prepend_missing(fields, options.injected_fields());

    let traits = &options.traits;
    let active_model = &options.active_model;
    let id = &options.id;
    let created_at = &options.created_at;
    let updated_at = &options.updated_at;
    let created_at_column = Ident::new(&pascal_case(&created_at.to_string()), Span::call_site());

    Ok(quote! {
        #input

        impl #traits::HasIdActiveModel for #active_model {
            fn set_id(&mut self, id: uuid::Uuid) {
                self.#id = sea_orm::ActiveValue::Set(id);
            }
        }

        impl #traits::TimestampedActiveModel for #active_model {
            fn set_created_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone) {
                self.#created_at = sea_orm::ActiveValue::Set(ts);
            }

            fn set_updated_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone) {
                self.#updated_at = sea_orm::ActiveValue::Set(ts);
            }
        }

        impl #traits::HasCreatedAtColumn for Entity {
            fn created_at_column() -> Column {
                Column::#created_at_column
            }
        }
    })
}

/// Injected columns go first so they lead the generated table definition.
fn prepend_missing(fields: &mut FieldsNamed, injected: [(Ident, Field); 3]) {
    let declared = |name: &Ident| {
        fields
            .named
            .iter()
            .any(|field| field.ident.as_ref() == Some(name))
    };

    let mut merged: Punctuated<Field, Token![,]> = injected
        .into_iter()
        .filter(|(name, _)| !declared(name))
        .map(|(_, field)| field)
        .collect();
    merged.extend(fields.named.iter().cloned());
    fields.named = merged;
}

fn key_value(meta: Meta) -> syn::Result<(Ident, LitStr)> {
    let Meta::NameValue(pair) = meta else {
        return Err(syn::Error::new_spanned(
            meta,
            "expected `key = \"value\"`",
        ));
    };
    let Some(key) = pair.path.get_ident().cloned() else {
        return Err(syn::Error::new_spanned(pair.path, "expected a plain option name"));
    };
    match pair.value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) => Ok((key, value)),
        other => Err(syn::Error::new_spanned(other, "option values must be string literals")),
    }
}

fn ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}

fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
