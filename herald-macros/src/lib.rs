//! Procedural macros for Herald.
//!
//! Generated code refers to the runtime through the `::herald` facade, so the
//! macros are meant to be used via `herald` with its `macros` feature.

use proc_macro::TokenStream;

mod handler;
mod payload;

/// Derive macro for implementing the `Event` trait.
///
/// ```rust,ignore
/// #[derive(Clone, Event)]
/// struct UserCreatedEvent { id: u64 }
/// ```
#[proc_macro_derive(Event)]
pub fn derive_event(input: TokenStream) -> TokenStream {
    payload::derive_event_impl(input)
}

/// Derive macro for implementing `Dispatchable<R>`, once per
/// `#[dispatchable(result = R)]`.
///
/// ```rust,ignore
/// #[derive(Dispatchable)]
/// #[dispatchable(result = String)]
/// struct GreetRequest;
/// ```
#[proc_macro_derive(Dispatchable, attributes(dispatchable))]
pub fn derive_dispatchable(input: TokenStream) -> TokenStream {
    payload::derive_dispatchable_impl(input)
}

/// Declare a handler impl for scanning.
///
/// Place it on `impl RequestHandler<P, R> for T` or `impl EventHandler<E> for T`.
/// `T` must implement `Default`.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct GreetHandler;
///
/// #[herald::handler]
/// impl RequestHandler<GreetRequest, String> for GreetHandler {
///     async fn handle(&self, _: GreetRequest, _: CancellationToken) -> Result<String, BoxError> {
///         Ok("hello".into())
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    handler::handler_impl(attr, item)
}
