// #[derive(ExportEnum)]: EngineEnum impl plus the variant codec and export
// impls, for fieldless user enums.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse2, Data, DeriveInput, Fields};

use crate::naming::unraw;

pub fn expand_export_enum(item: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(item)?;
    let name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(name, "ExportEnum can only be derived for enums"));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&input.generics, "ExportEnum enums cannot be generic"));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(name, "ExportEnum needs at least one variant"));
    }
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ExportEnum variants cannot carry data; use explicit discriminants instead",
            ));
        }
    }

    let engine_name = unraw(name);
    let variants: Vec<&syn::Ident> = data.variants.iter().map(|v| &v.ident).collect();
    let case_names: Vec<String> = variants.iter().map(|v| unraw(v)).collect();

    Ok(quote! {
        impl ::grove::runtime::EngineEnum for #name {
            const ENGINE_NAME: &'static str = #engine_name;

            fn ord(self) -> i64 {
                self as i64
            }

            fn try_from_ord(ord: i64) -> ::std::option::Option<Self> {
                #(
                    if ord == #name::#variants as i64 {
                        return ::std::option::Option::Some(#name::#variants);
                    }
                )*
                ::std::option::Option::None
            }

            fn cases() -> &'static [(&'static str, i64)] {
                const CASES: &[(&str, i64)] = &[#((#case_names, #name::#variants as i64)),*];
                CASES
            }
        }

        ::grove::runtime::engine_enum_codec!(#name);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cases_follow_declaration_order() {
        let out = expand_export_enum(quote! {
            enum FireMode { Single = 0, Burst = 3, Auto }
        })
        .unwrap()
        .to_string();
        let single = out.find("(\"Single\" , FireMode :: Single as i64)").unwrap();
        let auto = out.find("(\"Auto\" , FireMode :: Auto as i64)").unwrap();
        assert!(single < auto);
        assert!(out.contains("ENGINE_NAME : & 'static str = \"FireMode\""));
        assert!(out.contains("engine_enum_codec ! (FireMode)"));
    }

    #[test]
    fn data_carrying_enums_and_structs_are_rejected() {
        assert!(expand_export_enum(quote! { enum Shape { Circle(f64) } }).is_err());
        assert!(expand_export_enum(quote! { struct Mode; }).is_err());
        assert!(expand_export_enum(quote! { enum Never {} }).is_err());
    }
}
