// Core gclass macro expansion: parses #[gclass(base = Type)] structs with
// #[export] / #[group] / #[init] fields and generates the GodotClass impls,
// constructor, export list, member accessors and inventory registration.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{parse2, Expr, Fields, Ident, ItemStruct, LitStr, Meta, Token, Type};

use crate::hints;
use crate::naming::{to_snake_case, unraw};

/// Field attributes consumed by the macro.
const FIELD_ATTRS: &[&str] = &["export", "group", "subgroup", "init"];

// ---------------------------------------------------------------------------
// Attribute parsing
// ---------------------------------------------------------------------------

/// Parsed #[gclass(...)] attributes.
struct GClassArgs {
    base: syn::Path,
    /// Registered under this name instead of the struct name.
    rename: Option<LitStr>,
}

fn parse_gclass_args(attr: TokenStream) -> syn::Result<GClassArgs> {
    let metas = syn::parse::Parser::parse2(Punctuated::<Meta, Token![,]>::parse_terminated, attr)?;

    let mut base: Option<syn::Path> = None;
    let mut rename: Option<LitStr> = None;
    for meta in &metas {
        let Meta::NameValue(nv) = meta else {
            return Err(syn::Error::new_spanned(meta, "expected `base = Type` or `rename = \"Name\"`"));
        };
        if nv.path.is_ident("base") {
            match &nv.value {
                Expr::Path(expr_path) => base = Some(expr_path.path.clone()),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "`base` must be a type path, not a string literal.\n\n\
                         Example: #[gclass(base = Node3D)]",
                    ));
                }
            }
        } else if nv.path.is_ident("rename") {
            match &nv.value {
                Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) => rename = Some(s.clone()),
                other => return Err(syn::Error::new_spanned(other, "`rename` must be a string literal")),
            }
        } else {
            return Err(syn::Error::new_spanned(&nv.path, "unknown #[gclass] argument"));
        }
    }
    let base = base.ok_or_else(|| {
        syn::Error::new(
            Span::call_site(),
            "#[gclass] requires a `base` attribute naming the engine parent class.\n\n\
             Example:\n\
             \x20   #[gclass(base = Node3D)]\n\
             \x20   pub struct Turret { ... }\n\n\
             Common bases: Node, Node2D, Node3D, Resource, RefCounted",
        )
    })?;
    Ok(GClassArgs { base, rename })
}

/// `#[group("Name")]`, `#[group("Name", prefix = "p_")]`, `#[group("")]`.
struct GroupArgs {
    name: LitStr,
    prefix: Option<LitStr>,
}

impl Parse for GroupArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: LitStr = input.parse()?;
        let mut prefix = None;
        if input.parse::<Option<Token![,]>>()?.is_some() && !input.is_empty() {
            let key: Ident = input.parse()?;
            if key != "prefix" {
                return Err(syn::Error::new_spanned(key, "expected `prefix = \"...\"`"));
            }
            input.parse::<Token![=]>()?;
            prefix = Some(input.parse()?);
            input.parse::<Option<Token![,]>>()?;
        }
        Ok(GroupArgs { name, prefix })
    }
}

/// `#[init(val = expr)]`
fn parse_init(attr: &syn::Attribute) -> syn::Result<Expr> {
    let mut value = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("val") {
            value = Some(meta.value()?.parse::<Expr>()?);
            Ok(())
        } else {
            Err(meta.error("expected `val = <expression>`"))
        }
    })?;
    value.ok_or_else(|| syn::Error::new_spanned(attr, "expected #[init(val = <expression>)]"))
}

// ---------------------------------------------------------------------------
// Field classification
// ---------------------------------------------------------------------------

enum Marker {
    Group(GroupArgs),
    Subgroup(GroupArgs),
}

struct ClassField {
    ident: Ident,
    ty: Type,
    /// Group / subgroup markers preceding this field, in order.
    markers: Vec<Marker>,
    /// `Some(hint)` for exported fields.
    export: Option<TokenStream>,
    init: Option<Expr>,
    is_base: bool,
}

fn is_base_type(ty: &Type) -> bool {
    match ty {
        Type::Path(tp) => tp.path.segments.last().is_some_and(|s| s.ident == "Base"),
        _ => false,
    }
}

fn classify(field: &syn::Field) -> syn::Result<ClassField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    let mut class_field = ClassField {
        ident,
        ty: field.ty.clone(),
        markers: Vec::new(),
        export: None,
        init: None,
        is_base: is_base_type(&field.ty),
    };
    for attr in &field.attrs {
        let path = attr.path();
        if path.is_ident("export") {
            class_field.export = Some(hints::parse_export_attr(attr)?);
        } else if path.is_ident("group") {
            class_field.markers.push(Marker::Group(attr.parse_args()?));
        } else if path.is_ident("subgroup") {
            class_field.markers.push(Marker::Subgroup(attr.parse_args()?));
        } else if path.is_ident("init") {
            class_field.init = Some(parse_init(attr)?);
        }
    }
    if class_field.is_base && (class_field.export.is_some() || class_field.init.is_some()) {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "the `Base<Self>` field is set by the engine and cannot be exported or initialised",
        ));
    }
    Ok(class_field)
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

pub fn expand_gclass(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args = parse_gclass_args(attr)?;
    let mut input: ItemStruct = parse2(item)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&input.generics, "#[gclass] structs cannot be generic"));
    }
    let named = match &mut input.fields {
        Fields::Named(f) => &mut f.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[gclass] requires a struct with named fields.\n\n\
                 Example:\n\
                 \x20   #[gclass(base = Node3D)]\n\
                 \x20   pub struct Turret {\n\
                 \x20       base: Base<Turret>,\n\
                 \x20       #[export]\n\
                 \x20       yaw: f64,\n\
                 \x20   }",
            ));
        }
    };

    let mut fields: Vec<ClassField> = Vec::new();
    for field in named.iter_mut() {
        fields.push(classify(field)?);
        field
            .attrs
            .retain(|a| !FIELD_ATTRS.iter().any(|name| a.path().is_ident(name)));
    }
    if fields.iter().filter(|f| f.is_base).count() > 1 {
        return Err(syn::Error::new_spanned(&input.ident, "at most one `Base<Self>` field is allowed"));
    }

    let struct_name = &input.ident;
    let base = &args.base;
    let class_name = args
        .rename
        .as_ref()
        .map(LitStr::value)
        .unwrap_or_else(|| unraw(struct_name));
    let snake = to_snake_case(&unraw(struct_name));

    let create_fn = format_ident!("__grove_create_{}", snake);
    let exports_fn = format_ident!("__grove_exports_{}", snake);
    let get_fn = format_ident!("__grove_get_{}", snake);
    let set_fn = format_ident!("__grove_set_{}", snake);
    let info_fn = format_ident!("__grove_info_{}", snake);

    // --- 1. Class traits ---
    let class_impls = quote! {
        impl ::grove::runtime::GodotClass for #struct_name {
            const CLASS_NAME: &'static str = #class_name;
            const MEMORY: ::grove::runtime::Memory = <#base as ::grove::runtime::GodotClass>::MEMORY;
            const INSTANTIABLE: bool = true;

            fn inherits(class_name: &str) -> bool {
                class_name == #class_name || <#base as ::grove::runtime::GodotClass>::inherits(class_name)
            }
        }

        impl ::grove::runtime::HasParent for #struct_name {
            type Parent = #base;
        }
    };

    // --- 2. Constructor ---
    let field_inits = fields.iter().map(|f| {
        let ident = &f.ident;
        if f.is_base {
            quote! { #ident: init.base(), }
        } else if let Some(expr) = &f.init {
            quote! { #ident: #expr, }
        } else {
            quote! { #ident: ::std::default::Default::default(), }
        }
    });

    // --- 3. Export list, in declaration order ---
    let export_stmts = fields.iter().flat_map(|f| {
        let markers = f.markers.iter().map(|m| {
            let (method, args) = match m {
                Marker::Group(g) => (quote!(group), g),
                Marker::Subgroup(g) => (quote!(subgroup), g),
            };
            let name = &args.name;
            let prefix = args.prefix.as_ref().map(LitStr::value).unwrap_or_default();
            quote! { builder.#method(#name, #prefix); }
        });
        let member = f.export.as_ref().map(|hint| {
            let name = unraw(&f.ident);
            let ty = &f.ty;
            quote! {
                builder.member(
                    #name,
                    <#ty as ::grove::runtime::ExportType>::export_info(),
                    #hint,
                );
            }
        });
        markers.chain(member).collect::<Vec<_>>()
    });

    // --- 4. Member accessors ---
    let exported: Vec<&ClassField> = fields.iter().filter(|f| f.export.is_some()).collect();
    let get_arms = exported.iter().map(|f| {
        let ident = &f.ident;
        let name = unraw(ident);
        quote! { #name => ::std::option::Option::Some(::grove::runtime::ToVariant::to_variant(&this.#ident)), }
    });
    let set_arms = exported.iter().map(|f| {
        let ident = &f.ident;
        let name = unraw(ident);
        quote! { #name => this.#ident = ::grove::runtime::FromVariant::from_variant(value)?, }
    });

    Ok(quote! {
        #input

        #class_impls

        #[doc(hidden)]
        fn #create_fn(
            init: &::grove::runtime::InstanceInit<'_>,
        ) -> ::std::boxed::Box<dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync> {
            ::std::boxed::Box::new(#struct_name {
                #(#field_inits)*
            })
        }

        #[doc(hidden)]
        fn #exports_fn() -> ::grove::runtime::GroveResult<::grove::runtime::ExportList> {
            let mut builder = ::grove::runtime::ExportBuilder::new(#class_name);
            #(#export_stmts)*
            builder.build()
        }

        #[doc(hidden)]
        #[allow(unused_variables)]
        fn #get_fn(
            data: &(dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync),
            name: &str,
        ) -> ::std::option::Option<::grove::runtime::Variant> {
            let this = data.downcast_ref::<#struct_name>()?;
            match name {
                #(#get_arms)*
                _ => ::std::option::Option::None,
            }
        }

        #[doc(hidden)]
        #[allow(unused_variables, unreachable_code)]
        fn #set_fn(
            data: &mut (dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync),
            name: &str,
            value: &::grove::runtime::Variant,
        ) -> ::grove::runtime::GroveResult<bool> {
            let ::std::option::Option::Some(this) = data.downcast_mut::<#struct_name>() else {
                return ::std::result::Result::Ok(false);
            };
            match name {
                #(#set_arms)*
                _ => return ::std::result::Result::Ok(false),
            }
            ::std::result::Result::Ok(true)
        }

        #[doc(hidden)]
        fn #info_fn() -> ::grove::runtime::ExtensionClassInfo {
            ::grove::runtime::ExtensionClassInfo {
                name: #class_name,
                base: <#base as ::grove::runtime::GodotClass>::CLASS_NAME,
                create: #create_fn,
                exports: #exports_fn,
                get_property: #get_fn,
                set_property: #set_fn,
            }
        }

        ::grove::__inventory::submit! {
            ::grove::runtime::ClassRegistration { info: #info_fn }
        }
    })
}
