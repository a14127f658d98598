// #[gclass_impl] macro: generates dispatch thunks and method metadata for
// #[func] / #[vfunc] methods on a #[gclass] struct.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse2, FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat, PathArguments, ReturnType,
    Type,
};

use crate::naming::{to_snake_case, unraw, virtual_name};

// ---------------------------------------------------------------------------
// Parsed method info
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Receiver {
    None,
    Ref,
    Mut,
}

struct ParamInfo {
    ident: Ident,
    ty: Type,
}

enum ReturnKind {
    Unit,
    Value(Type),
    /// `GroveResult<T>` / `Result<T, GroveError>`: unwrapped with `?`.
    Fallible(Option<Type>),
}

struct FuncMethod {
    method_ident: Ident,
    engine_name: String,
    is_virtual: bool,
    receiver: Receiver,
    params: Vec<ParamInfo>,
    ret: ReturnKind,
}

// ---------------------------------------------------------------------------
// Main expansion
// ---------------------------------------------------------------------------

pub fn expand_gclass_impl(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "#[gclass_impl] takes no arguments"));
    }
    let mut input: ItemImpl = parse2(item)?;
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(path, "#[gclass_impl] goes on an inherent impl block"));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&input.generics, "#[gclass_impl] blocks cannot be generic"));
    }

    let self_ty = (*input.self_ty).clone();
    let struct_name = match &self_ty {
        Type::Path(tp) => tp
            .path
            .segments
            .last()
            .ok_or_else(|| syn::Error::new_spanned(&self_ty, "expected type name"))?
            .ident
            .clone(),
        _ => return Err(syn::Error::new_spanned(&self_ty, "expected type name")),
    };

    // Collect #[func] / #[vfunc] info, strip the attrs from the emitted impl.
    let mut funcs: Vec<FuncMethod> = Vec::new();
    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            if let Some(func) = parse_func(method)? {
                funcs.push(func);
            }
            method
                .attrs
                .retain(|a| !a.path().is_ident("func") && !a.path().is_ident("vfunc"));
        }
    }

    let snake = to_snake_case(&unraw(&struct_name));
    let methods_fn = format_ident!("__grove_methods_{}", snake);

    let mut thunks: Vec<TokenStream> = Vec::new();
    let mut infos: Vec<TokenStream> = Vec::new();
    for func in &funcs {
        let thunk_ident = format_ident!("__grove_thunk_{}_{}", snake, unraw(&func.method_ident));
        thunks.push(gen_thunk(&self_ty, &thunk_ident, func));
        infos.push(gen_func_info(&thunk_ident, func));
    }

    Ok(quote! {
        #input

        const _: () = {
            #(#thunks)*

            fn #methods_fn() -> ::std::vec::Vec<::grove::runtime::FuncInfo> {
                ::std::vec![#(#infos),*]
            }

            ::grove::__inventory::submit! {
                ::grove::runtime::ClassMethodsRegistration {
                    class: <#self_ty as ::grove::runtime::GodotClass>::CLASS_NAME,
                    methods: #methods_fn,
                }
            }
        };
    })
}

// ---------------------------------------------------------------------------
// Method parsing
// ---------------------------------------------------------------------------

fn parse_func(method: &ImplItemFn) -> syn::Result<Option<FuncMethod>> {
    let func_attr = method
        .attrs
        .iter()
        .find(|a| a.path().is_ident("func") || a.path().is_ident("vfunc"));
    let Some(attr) = func_attr else {
        return Ok(None);
    };
    let is_virtual = attr.path().is_ident("vfunc");
    let sig = &method.sig;

    if sig.asyncness.is_some() || !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(sig, "#[func] methods cannot be async or generic"));
    }

    let mut rename: Option<LitStr> = None;
    if !matches!(attr.meta, syn::Meta::Path(_)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `rename = \"name\"`"))
            }
        })?;
    }

    let mut receiver = Receiver::None;
    let mut params = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(r) => {
                if r.reference.is_none() {
                    return Err(syn::Error::new_spanned(r, "use `&self` or `&mut self`; instances are not moved out"));
                }
                receiver = if r.mutability.is_some() { Receiver::Mut } else { Receiver::Ref };
            }
            FnArg::Typed(pat_type) => {
                let ident = match &*pat_type.pat {
                    Pat::Ident(pi) => pi.ident.clone(),
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "#[func] parameters must be simple identifiers",
                        ));
                    }
                };
                params.push(ParamInfo {
                    ident,
                    ty: (*pat_type.ty).clone(),
                });
            }
        }
    }
    if is_virtual && receiver == Receiver::None {
        return Err(syn::Error::new_spanned(sig, "#[vfunc] methods need a `&self` or `&mut self` receiver"));
    }

    let ret = match &sig.output {
        ReturnType::Default => ReturnKind::Unit,
        ReturnType::Type(_, ty) => classify_return(ty),
    };

    let method_name = unraw(&sig.ident);
    let engine_name = match rename {
        Some(lit) => lit.value(),
        None if is_virtual => virtual_name(&method_name),
        None => method_name,
    };

    Ok(Some(FuncMethod {
        method_ident: sig.ident.clone(),
        engine_name,
        is_virtual,
        receiver,
        params,
        ret,
    }))
}

fn classify_return(ty: &Type) -> ReturnKind {
    if let Type::Tuple(t) = ty {
        if t.elems.is_empty() {
            return ReturnKind::Unit;
        }
    }
    let Type::Path(tp) = ty else {
        return ReturnKind::Value(ty.clone());
    };
    let Some(last) = tp.path.segments.last() else {
        return ReturnKind::Value(ty.clone());
    };
    if last.ident != "GroveResult" && last.ident != "Result" {
        return ReturnKind::Value(ty.clone());
    }
    let ok = match &last.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|a| match a {
            GenericArgument::Type(t) => Some(t.clone()),
            _ => None,
        }),
        _ => None,
    };
    match ok {
        Some(Type::Tuple(t)) if t.elems.is_empty() => ReturnKind::Fallible(None),
        other => ReturnKind::Fallible(other),
    }
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

fn gen_thunk(self_ty: &Type, thunk_ident: &Ident, func: &FuncMethod) -> TokenStream {
    let method = &func.method_ident;
    let argc = func.params.len();
    let arg_reads = func.params.iter().enumerate().map(|(i, p)| {
        let ident = &p.ident;
        let ty = &p.ty;
        quote! { let #ident: #ty = call.arg(#i)?; }
    });
    let arg_idents: Vec<&Ident> = func.params.iter().map(|p| &p.ident).collect();

    let invoke = match func.receiver {
        Receiver::None => quote! { <#self_ty>::#method(#(#arg_idents),*) },
        Receiver::Ref => quote! {{
            let this = call.bind::<#self_ty>()?;
            this.#method(#(#arg_idents),*)
        }},
        Receiver::Mut => quote! {{
            let mut this = call.bind_mut::<#self_ty>()?;
            this.#method(#(#arg_idents),*)
        }},
    };
    let finish = match &func.ret {
        ReturnKind::Unit => quote! {
            #invoke;
            ::std::result::Result::Ok(::grove::runtime::Variant::Nil)
        },
        ReturnKind::Value(_) => quote! {
            let ret = #invoke;
            ::std::result::Result::Ok(::grove::runtime::ToVariant::to_variant(&ret))
        },
        ReturnKind::Fallible(None) => quote! {
            #invoke?;
            ::std::result::Result::Ok(::grove::runtime::Variant::Nil)
        },
        ReturnKind::Fallible(Some(_)) => quote! {
            let ret = #invoke?;
            ::std::result::Result::Ok(::grove::runtime::ToVariant::to_variant(&ret))
        },
    };

    quote! {
        fn #thunk_ident(
            call: &::grove::runtime::DispatchCall<'_>,
        ) -> ::grove::runtime::GroveResult<::grove::runtime::Variant> {
            call.expect_args(#argc)?;
            #(#arg_reads)*
            #finish
        }
    }
}

fn gen_func_info(thunk_ident: &Ident, func: &FuncMethod) -> TokenStream {
    let name = &func.engine_name;
    let kind = if func.is_virtual {
        quote! { ::grove::runtime::FuncKind::Virtual }
    } else {
        quote! { ::grove::runtime::FuncKind::Func }
    };

    let mut flags = vec![quote! { ::grove::ffi::METHOD_FLAGS_DEFAULT }];
    match func.receiver {
        Receiver::None => flags.push(quote! { ::grove::ffi::METHOD_FLAG_STATIC }),
        Receiver::Ref => flags.push(quote! { ::grove::ffi::METHOD_FLAG_CONST }),
        Receiver::Mut => {}
    }
    if func.is_virtual {
        flags.push(quote! { ::grove::ffi::METHOD_FLAG_VIRTUAL });
    }

    let args = func.params.iter().map(|p| {
        let arg_name = unraw(&p.ident);
        let ty = &p.ty;
        quote! { ::grove::runtime::PropertyInfo::of::<#ty>(#arg_name) }
    });
    let ret = match &func.ret {
        ReturnKind::Unit | ReturnKind::Fallible(None) => quote! { ::std::option::Option::None },
        ReturnKind::Value(ty) | ReturnKind::Fallible(Some(ty)) => {
            quote! { ::std::option::Option::Some(::grove::runtime::PropertyInfo::of::<#ty>("")) }
        }
    };

    quote! {
        ::grove::runtime::FuncInfo {
            name: #name,
            kind: #kind,
            flags: #(#flags)|*,
            thunk: #thunk_ident,
            args: ::std::vec![#(#args),*],
            ret: #ret,
        }
    }
}
