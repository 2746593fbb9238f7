//! Handler-related macros.
//!
//! This module contains:
//! - `#[handler]` - declares a `RequestHandler` / `EventHandler` impl so that
//!   scanning its module binds it

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{GenericArgument, ItemImpl, PathArguments, Type, parse_macro_input};

/// The contract named by the implemented trait.
enum Declared {
    Request { payload: Type, result: Type },
    Event { payload: Type },
}

/// Implementation of the `#[handler]` macro.
pub fn handler_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[handler] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let input = parse_macro_input!(item as ItemImpl);
    match declaration(&input) {
        Ok(submit) => TokenStream::from(quote! {
            #input
            #submit
        }),
        Err(err) => {
            let err = err.to_compile_error();
            TokenStream::from(quote! {
                #input
                #err
            })
        }
    }
}

fn declaration(input: &ItemImpl) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[handler] cannot declare a generic impl; use `declare_handler!` for each concrete instantiation",
        ));
    }

    let Some((None, path, _)) = &input.trait_ else {
        return Err(syn::Error::new_spanned(
            &input.self_ty,
            "#[handler] must be placed on `impl RequestHandler<P, R> for T` or `impl EventHandler<E> for T`",
        ));
    };

    let handler = &input.self_ty;
    let declared = contract(path)?;
    let expanded = match declared {
        Declared::Request { payload, result } => quote! {
            ::herald::inventory::submit! {
                ::herald::ContractDeclaration::request::<#handler, #payload, #result>(
                    ::core::module_path!()
                )
            }
        },
        Declared::Event { payload } => quote! {
            ::herald::inventory::submit! {
                ::herald::ContractDeclaration::event::<#handler, #payload>(::core::module_path!())
            }
        },
    };
    Ok(expanded)
}

fn contract(path: &syn::Path) -> syn::Result<Declared> {
    let Some(segment) = path.segments.last() else {
        return Err(syn::Error::new_spanned(path, "expected a handler trait"));
    };

    let args: Vec<&Type> = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    match (segment.ident.to_string().as_str(), args.as_slice()) {
        ("RequestHandler", [payload, result]) => Ok(Declared::Request {
            payload: (*payload).clone(),
            result: (*result).clone(),
        }),
        ("EventHandler", [payload]) => Ok(Declared::Event {
            payload: (*payload).clone(),
        }),
        ("RequestHandler", _) => Err(syn::Error::new_spanned(
            segment,
            "expected `RequestHandler<Payload, Result>`",
        )),
        ("EventHandler", _) => Err(syn::Error::new_spanned(
            segment,
            "expected `EventHandler<Event>`",
        )),
        (other, _) => Err(syn::Error::new_spanned(
            segment,
            format!("#[handler] does not recognise trait `{other}`"),
        )),
    }
}
