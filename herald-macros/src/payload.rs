//! Payload derives.
//!
//! This module contains:
//! - `#[derive(Event)]` - implements the `Event` marker trait
//! - `#[derive(Dispatchable)]` - implements `Dispatchable<R>` for every
//!   `#[dispatchable(result = R)]` attribute

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Type, parse_macro_input};

/// Implementation of `#[derive(Event)]`.
pub fn derive_event_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::herald::Event for #name #ty_generics #where_clause {}
    };

    TokenStream::from(expanded)
}

/// Implementation of `#[derive(Dispatchable)]`.
pub fn derive_dispatchable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let results = match result_types(&input) {
        Ok(results) => results,
        Err(err) => return err.to_compile_error().into(),
    };

    if results.is_empty() {
        return syn::Error::new_spanned(
            name,
            "#[derive(Dispatchable)] needs at least one #[dispatchable(result = Type)] attribute",
        )
        .to_compile_error()
        .into();
    }

    let impls = results.iter().map(|result| {
        quote! {
            impl #impl_generics ::herald::Dispatchable<#result> for #name #ty_generics #where_clause {}
        }
    });

    TokenStream::from(quote! { #(#impls)* })
}

fn result_types(input: &DeriveInput) -> syn::Result<Vec<Type>> {
    let mut results = Vec::new();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("dispatchable")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("result") {
                results.push(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown attribute, expected `result = Type`"))
            }
        })?;
    }
    Ok(results)
}
