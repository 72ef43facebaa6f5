//! Implementation of the `#[derive(Record)]` macro.
//!
//! This macro generates an implementation of the `Record` trait, field id
//! constants, and a `schema()` constructor describing the annotated fields.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::{parse_field_attrs, FieldDomain};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut descriptors: Vec<TokenStream> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        // Unannotated fields are not part of the record.
        let Some(domain) = attrs.domain else {
            continue;
        };

        let id = attrs.rename.unwrap_or_else(|| field_name.to_string());
        if seen.contains(&id) {
            return Err(Error::new(
                attrs.span,
                format!("duplicate field id '{id}'"),
            ));
        }
        seen.push(id.clone());

        let const_name = format_ident!("{}", to_screaming_snake_case(&id));
        field_constants.push(quote! {
            /// Field id constant.
            pub const #const_name: &'static str = #id;
        });

        let value_expr = match domain {
            FieldDomain::String => {
                quote! { ::tabview_engine::Value::String(&self.#field_name) }
            }
            FieldDomain::Number | FieldDomain::Currency => {
                quote! { ::tabview_engine::Value::Number(::tabview_engine::Number::from(self.#field_name)) }
            }
            FieldDomain::Date | FieldDomain::DateTime => {
                quote! {
                    ::tabview_engine::Value::Timestamp(
                        ::tabview_engine::IntoTimestamp::to_timestamp(&self.#field_name)
                    )
                }
            }
            FieldDomain::Collection => {
                quote! {
                    ::tabview_engine::Value::Collection(
                        self.#field_name
                            .iter()
                            .map(|item| ::std::borrow::Cow::Borrowed(::std::convert::AsRef::<str>::as_ref(item)))
                            .collect()
                    )
                }
            }
            FieldDomain::Bool => {
                quote! { ::tabview_engine::Value::Bool(self.#field_name) }
            }
        };
        field_matches.push(quote! {
            #id => #value_expr,
        });

        let variant = format_ident!("{}", domain.variant());
        let label = attrs.label.map(|label| quote! { .with_label(#label) });
        descriptors.push(quote! {
            ::tabview_engine::FieldDescriptor::new(#id, ::tabview_engine::DataDomain::#variant) #label
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*

            /// Schema describing the annotated fields, in declaration order.
            pub fn schema() -> ::tabview_engine::Schema {
                ::tabview_engine::Schema::new(vec![#(#descriptors),*])
            }
        }

        impl #impl_generics ::tabview_engine::Record for #struct_name #ty_generics #where_clause {
            fn field_value(&self, field: &str) -> ::tabview_engine::Value<'_> {
                match field {
                    #(#field_matches)*
                    _ => ::tabview_engine::Value::None,
                }
            }
        }
    };

    Ok(expanded)
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == '.' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
