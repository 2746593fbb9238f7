//! # Handler Contracts
//!
//! One trait per contract shape:
//!
//! - [`RequestHandler<D, R>`]: answers a [`Dispatchable<R>`] of type `D`.
//!   Exactly one implementation is expected per `(D, R)` pair.
//! - [`EventHandler<E>`]: subscribes to an [`Event`] of type `E`. Any number
//!   of implementations may coexist.
//!
//! Handlers are resolved fresh for every dispatch (transient lifetime), so
//! implementations must not keep mutable state across calls. Shared state
//! belongs behind an `Arc` captured by the handler's factory.
//!
//! Both traits use native `async fn` for static dispatch. The runtime stores
//! them behind the object-safe [`ErasedRequestHandler`] and
//! [`ErasedEventHandler`] wrappers.
//!
//! [`ErasedRequestHandler`]: crate::ErasedRequestHandler
//! [`ErasedEventHandler`]: crate::ErasedEventHandler

use crate::{
    error::BoxError,
    message::{Dispatchable, Event},
};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Handles one dispatchable type and produces its result.
///
/// The cancellation token is advisory: the runtime never interrupts a
/// handler, it is up to the handler to observe the token.
///
/// # Example
///
/// ```rust,ignore
/// struct GreetHandler;
///
/// impl RequestHandler<GreetRequest, String> for GreetHandler {
///     async fn handle(&self, request: GreetRequest, _cancel: CancellationToken) -> Result<String, BoxError> {
///         Ok(format!("hello {}", request.name))
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle `{D}` requests returning `{R}`",
    label = "missing `RequestHandler<{D}, {R}>` implementation",
    note = "Request handlers must implement `handle` for the dispatchable type `{D}`."
)]
pub trait RequestHandler<D, R>: Send + Sync + 'static
where
    D: Dispatchable<R>,
    R: Send + 'static,
{
    /// Process the request.
    fn handle(
        &self,
        request: D,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R, BoxError>> + Send;
}

// Blanket impl for closures
impl<F, D, R, Fut> RequestHandler<D, R> for F
where
    D: Dispatchable<R>,
    R: Send + 'static,
    F: Fn(D, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, BoxError>> + Send,
{
    fn handle(
        &self,
        request: D,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R, BoxError>> + Send {
        (self)(request, cancel)
    }
}

/// Subscribes to one event type.
///
/// Subscribers receive the event by shared reference: the same value is seen
/// by every subscriber of one dispatch, concurrently.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `EventHandler<{E}>`",
    label = "missing `EventHandler` implementation",
    note = "Event handlers must implement `handle` for the specific event type `{E}`."
)]
pub trait EventHandler<E: Event>: Send + Sync + 'static {
    /// React to the event.
    fn handle(
        &self,
        event: &E,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}
