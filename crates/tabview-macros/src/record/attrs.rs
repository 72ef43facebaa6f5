//! Attribute parsing for the Record derive macro.
//!
//! This module provides parsers for the `#[field(...)]` attributes used by
//! the `Record` derive macro.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, ExprLit, Ident, Lit, LitStr, Meta, Result, Token,
};

/// The data domain of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDomain {
    String,
    Number,
    Currency,
    Date,
    DateTime,
    Collection,
    Bool,
}

impl FieldDomain {
    /// Parses a domain from an identifier or a string literal.
    pub fn parse(name: &str, span: Span) -> Result<Self> {
        match name {
            "String" | "string" => Ok(FieldDomain::String),
            "Number" | "number" => Ok(FieldDomain::Number),
            "Currency" | "currency" => Ok(FieldDomain::Currency),
            "Date" | "date" => Ok(FieldDomain::Date),
            "DateTime" | "Datetime" | "datetime" => Ok(FieldDomain::DateTime),
            "Collection" | "collection" => Ok(FieldDomain::Collection),
            "Bool" | "Boolean" | "boolean" | "bool" => Ok(FieldDomain::Bool),
            other => Err(Error::new(
                span,
                format!(
                    "unknown field domain: '{}'. Expected one of: String, Number, Currency, Date, DateTime, Collection, Bool",
                    other
                ),
            )),
        }
    }

    /// Name of the matching `tabview_engine::DataDomain` variant.
    pub fn variant(self) -> &'static str {
        match self {
            FieldDomain::String => "String",
            FieldDomain::Number => "Number",
            FieldDomain::Currency => "Currency",
            FieldDomain::Date => "Date",
            FieldDomain::DateTime => "Datetime",
            FieldDomain::Collection => "Collection",
            FieldDomain::Bool => "Boolean",
        }
    }
}

/// Field-level attributes from `#[field(...)]`.
#[derive(Debug, Clone)]
pub struct FieldAttr {
    pub domain: Option<FieldDomain>,
    /// Exclude the field from the record and the schema.
    pub skip: bool,
    /// Field id used by views (default: the Rust field name).
    pub rename: Option<String>,
    /// Display label for the schema.
    pub label: Option<String>,
    pub span: Span,
}

impl Default for FieldAttr {
    fn default() -> Self {
        FieldAttr {
            domain: None,
            skip: false,
            rename: None,
            label: None,
            span: Span::call_site(),
        }
    }
}

fn string_literal<'a>(value: &'a Expr, what: &str) -> Result<&'a LitStr> {
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s),
        other => Err(Error::new(
            other.span(),
            format!("{what} must be a string literal"),
        )),
    }
}

impl Parse for FieldAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                // Domain identifier: field(String), field(Date), etc.
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        attr.domain = Some(domain_from_ident(ident)?);
                        attr.span = ident.span();
                    } else {
                        return Err(Error::new(
                            p.span(),
                            "expected a field domain or skip",
                        ));
                    }
                }

                Meta::NameValue(nv) => {
                    if nv.path.is_ident("rename") {
                        attr.rename = Some(string_literal(&nv.value, "rename")?.value());
                    } else if nv.path.is_ident("label") {
                        attr.label = Some(string_literal(&nv.value, "label")?.value());
                    } else if nv.path.is_ident("domain") {
                        let s = string_literal(&nv.value, "domain")?;
                        attr.domain = Some(FieldDomain::parse(&s.value(), s.span())?);
                        attr.span = s.span();
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename, label or domain",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown field attribute. Expected a domain, skip, rename = \"...\", label = \"...\" or domain = \"...\"",
                    ));
                }
            }
        }

        if attr.skip && (attr.domain.is_some() || attr.rename.is_some() || attr.label.is_some()) {
            return Err(Error::new(
                attr.span,
                "skip cannot be combined with other field attributes",
            ));
        }

        Ok(attr)
    }
}

fn domain_from_ident(ident: &Ident) -> Result<FieldDomain> {
    FieldDomain::parse(&ident.to_string(), ident.span())
}

/// Extract `#[field(...)]` attributes from a field's attributes.
pub fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttr> {
    for attr in attrs {
        if attr.path().is_ident("field") {
            return attr.parse_args::<FieldAttr>();
        }
    }
    Ok(FieldAttr::default())
}
