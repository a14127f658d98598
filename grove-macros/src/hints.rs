// #[export(...)] parsing: every hint becomes an `ExportHint` constructor
// expression. Type checks happen at registration, in `ExportBuilder`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{parenthesized, Attribute, Expr, Ident, LitStr, Meta, Token};

const KNOWN_HINTS: &str = "range, exp_easing, enum_values, flags, file, global_file, dir, global_dir, \
                           multiline, placeholder, password, color_no_alpha, node_type, resource_type";

/// Hint expression of type `Option<ExportHint>` for one `#[export]` attribute.
pub(crate) fn parse_export_attr(attr: &Attribute) -> syn::Result<TokenStream> {
    if matches!(attr.meta, Meta::Path(_)) {
        return Ok(quote! { ::std::option::Option::None });
    }
    let mut hint: Option<TokenStream> = None;
    attr.parse_nested_meta(|meta| {
        let parsed = parse_hint(&meta)?;
        if hint.is_some() {
            return Err(meta.error("only one hint per exported member"));
        }
        hint = Some(parsed);
        Ok(())
    })?;
    Ok(match hint {
        Some(h) => quote! { ::std::option::Option::Some(#h) },
        None => quote! { ::std::option::Option::None },
    })
}

fn parse_hint(meta: &ParseNestedMeta) -> syn::Result<TokenStream> {
    let hint = quote! { ::grove::runtime::ExportHint };
    let name = meta.path.get_ident().map(Ident::to_string).unwrap_or_default();
    let tokens = match name.as_str() {
        "range" => parse_range(meta)?,
        "exp_easing" => {
            let mut attenuation = false;
            let mut positive_only = false;
            if meta.input.peek(syn::token::Paren) {
                let content;
                parenthesized!(content in meta.input);
                for flag in Punctuated::<Ident, Token![,]>::parse_terminated(&content)? {
                    match flag.to_string().as_str() {
                        "attenuation" => attenuation = true,
                        "positive_only" => positive_only = true,
                        _ => {
                            return Err(syn::Error::new_spanned(
                                &flag,
                                "exp_easing accepts `attenuation` and `positive_only`",
                            ));
                        }
                    }
                }
            }
            quote! { #hint::ExpEasing { attenuation: #attenuation, positive_only: #positive_only } }
        }
        "enum_values" => {
            let cases = parse_cases(meta)?;
            quote! { #hint::Enum(::std::vec![#(#cases),*]) }
        }
        "flags" => {
            let cases = parse_cases(meta)?;
            quote! { #hint::Flags(::std::vec![#(#cases),*]) }
        }
        "file" => {
            let filters = parse_filters(meta)?;
            quote! { #hint::File(::std::vec![#(::std::string::String::from(#filters)),*]) }
        }
        "global_file" => {
            let filters = parse_filters(meta)?;
            quote! { #hint::GlobalFile(::std::vec![#(::std::string::String::from(#filters)),*]) }
        }
        "dir" => quote! { #hint::Dir },
        "global_dir" => quote! { #hint::GlobalDir },
        "multiline" => quote! { #hint::Multiline },
        "password" => quote! { #hint::Password },
        "color_no_alpha" => quote! { #hint::ColorNoAlpha },
        "placeholder" => {
            let text: LitStr = meta.value()?.parse()?;
            quote! { #hint::Placeholder(::std::string::String::from(#text)) }
        }
        "node_type" => {
            let class: LitStr = meta.value()?.parse()?;
            quote! { #hint::NodeType(::std::string::String::from(#class)) }
        }
        "resource_type" => {
            let class: LitStr = meta.value()?.parse()?;
            quote! { #hint::ResourceType(::std::string::String::from(#class)) }
        }
        _ => return Err(meta.error(format!("unknown export hint `{name}`; expected one of {KNOWN_HINTS}"))),
    };
    Ok(tokens)
}

/// `range(min, max[, step][, or_greater][, or_less])`
fn parse_range(meta: &ParseNestedMeta) -> syn::Result<TokenStream> {
    let content;
    parenthesized!(content in meta.input);
    let mut numbers: Vec<Expr> = Vec::new();
    let mut or_greater = false;
    let mut or_less = false;
    for item in Punctuated::<Expr, Token![,]>::parse_terminated(&content)? {
        match &item {
            Expr::Path(p) if p.path.is_ident("or_greater") => or_greater = true,
            Expr::Path(p) if p.path.is_ident("or_less") => or_less = true,
            _ => numbers.push(item),
        }
    }
    if !(2..=3).contains(&numbers.len()) {
        return Err(meta.error(
            "range takes `min, max` and an optional `step`.\n\n\
             Example: #[export(range(0, 100, 5, or_greater))]",
        ));
    }
    let min = &numbers[0];
    let max = &numbers[1];
    let step = match numbers.get(2) {
        Some(step) => quote! { ::std::option::Option::Some((#step) as f64) },
        None => quote! { ::std::option::Option::None },
    };
    Ok(quote! {
        ::grove::runtime::ExportHint::Range {
            min: (#min) as f64,
            max: (#max) as f64,
            step: #step,
            or_greater: #or_greater,
            or_less: #or_less,
        }
    })
}

/// `("Idle", "Run:4")` -> `(String, Option<i64>)` tuple expressions.
fn parse_cases(meta: &ParseNestedMeta) -> syn::Result<Vec<TokenStream>> {
    let content;
    parenthesized!(content in meta.input);
    let lits = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
    if lits.is_empty() {
        return Err(meta.error("expected at least one case, e.g. (\"Idle\", \"Run:4\")"));
    }
    lits.iter()
        .map(|lit| {
            let (name, value) = parse_case(&lit.value()).ok_or_else(|| {
                syn::Error::new_spanned(lit, "expected `Name` or `Name:value` with an integer value")
            })?;
            let value = match value {
                Some(v) => quote! { ::std::option::Option::Some(#v) },
                None => quote! { ::std::option::Option::None },
            };
            Ok(quote! { (::std::string::String::from(#name), #value) })
        })
        .collect()
}

pub(crate) fn parse_case(case: &str) -> Option<(String, Option<i64>)> {
    match case.rsplit_once(':') {
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), Some(value.trim().parse::<i64>().ok()?)))
        }
        None if !case.trim().is_empty() => Some((case.trim().to_string(), None)),
        None => None,
    }
}

/// `file` or `file("*.png", "*.jpg")`
fn parse_filters(meta: &ParseNestedMeta) -> syn::Result<Vec<LitStr>> {
    if !meta.input.peek(syn::token::Paren) {
        return Ok(Vec::new());
    }
    let content;
    parenthesized!(content in meta.input);
    Ok(Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(attr: Attribute) -> syn::Result<String> {
        parse_export_attr(&attr).map(|t| t.to_string())
    }

    #[test]
    fn bare_export_has_no_hint() {
        let out = expand(parse_quote!(#[export])).unwrap();
        assert!(out.contains("None"));
        assert!(!out.contains("ExportHint"));
    }

    #[test]
    fn range_with_step_and_flags() {
        let out = expand(parse_quote!(#[export(range(0, 100, 5, or_greater))])).unwrap();
        assert!(out.contains("Range"));
        assert!(out.contains("or_greater : true"));
        assert!(out.contains("or_less : false"));
        assert!(expand(parse_quote!(#[export(range(1))])).is_err());
    }

    #[test]
    fn string_valued_hints() {
        let out = expand(parse_quote!(#[export(placeholder = "Name")])).unwrap();
        assert!(out.contains("Placeholder"));
        let out = expand(parse_quote!(#[export(file("*.png", "*.jpg"))])).unwrap();
        assert!(out.contains("File"));
        assert!(out.contains("\"*.jpg\""));
        let out = expand(parse_quote!(#[export(global_file)])).unwrap();
        assert!(out.contains("GlobalFile"));
    }

    #[test]
    fn unknown_and_duplicate_hints_fail() {
        let err = expand(parse_quote!(#[export(slider)])).unwrap_err();
        assert!(err.to_string().contains("unknown export hint `slider`"));
        assert!(expand(parse_quote!(#[export(multiline, password)])).is_err());
    }

    #[test]
    fn enum_cases() {
        assert_eq!(parse_case("Idle"), Some(("Idle".to_string(), None)));
        assert_eq!(parse_case("Run:4"), Some(("Run".to_string(), Some(4))));
        assert_eq!(parse_case("Back:-1"), Some(("Back".to_string(), Some(-1))));
        assert_eq!(parse_case("Run:fast"), None);
        assert_eq!(parse_case(":3"), None);
        assert!(expand(parse_quote!(#[export(enum_values("A", "B:x"))])).is_err());
        let out = expand(parse_quote!(#[export(flags("Fire:1", "Water:2"))])).unwrap();
        assert!(out.contains("Flags"));
    }
}
