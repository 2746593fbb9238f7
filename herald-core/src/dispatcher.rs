//! Dispatcher core traits.
//!
//! Host code that only needs to send requests or publish events can depend on
//! these traits instead of a concrete dispatcher.

use crate::{
    error::{AggregateHandlerExecutionError, RequestError},
    message::{Dispatchable, Event},
};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Routes a dispatchable to its single handler and returns the result.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot dispatch requests",
    label = "missing `Dispatch` implementation",
    note = "Use `RequestDispatcher` or `Herald`, or implement `Dispatch` for a test double."
)]
pub trait Dispatch: Send + Sync {
    /// Dispatch `request` to the handler bound for its runtime type and `R`.
    fn dispatch_with<R, D>(
        &self,
        request: D,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R, RequestError>> + Send
    where
        D: Dispatchable<R>,
        R: Send + 'static;
}

/// Delivers an event to every subscriber of its type.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot publish events",
    label = "missing `Publish` implementation",
    note = "Use `EventDispatcher` or `Herald`, or implement `Publish` for a test double."
)]
pub trait Publish: Send + Sync {
    /// Publish `event` to all subscribers concurrently and wait for them.
    fn publish_with<E: Event>(
        &self,
        event: E,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), AggregateHandlerExecutionError>> + Send;
}
