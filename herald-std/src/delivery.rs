//! Event delivery strategies.
//!
//! A strategy decides how the subscribers of one event are run. Both
//! strategies shipped here run every subscriber concurrently, wait for all of
//! them, and report one outcome per subscriber in subscriber order.
//!
//! | Strategy | Scheduling | Panics |
//! |---|---|---|
//! | [`SpawnedDelivery`] (default) | one `tokio` task per subscriber, in-task without a runtime | caught by the task |
//! | [`ConcurrentDelivery`] | polled together inside the caller's task | caught with `catch_unwind` |

use futures::{FutureExt, future::join_all};
use herald_core::{CancellationToken, ErasedEventHandler, HandlerAbort, HandlerExecutionError};
use std::{any::Any, future::Future, panic::AssertUnwindSafe, sync::Arc};
use tokio::runtime::Handle;
use tracing::debug;

/// An event shared read-only by every subscriber.
pub type SharedEvent = Arc<dyn Any + Send + Sync>;

/// Runs the subscribers of one event.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid DeliveryStrategy",
    label = "missing `DeliveryStrategy` implementation",
    note = "Use `SpawnedDelivery` or `ConcurrentDelivery`, or implement `DeliveryStrategy`."
)]
pub trait DeliveryStrategy: Send + Sync + 'static {
    /// Invoke every handler with `event` and wait for all of them.
    ///
    /// The returned vector has one entry per handler, in the order given.
    fn deliver(
        &self,
        event: SharedEvent,
        handlers: Vec<Arc<dyn ErasedEventHandler>>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Vec<Result<(), HandlerExecutionError>>> + Send;
}

/// One `tokio` task per subscriber.
///
/// Spawns onto the current Tokio runtime. Outside of one (another executor,
/// `futures::executor::block_on`) it falls back to [`ConcurrentDelivery`].
/// If the dispatching future is dropped, the spawned tasks keep running to
/// completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnedDelivery;

impl DeliveryStrategy for SpawnedDelivery {
    async fn deliver(
        &self,
        event: SharedEvent,
        handlers: Vec<Arc<dyn ErasedEventHandler>>,
        cancel: CancellationToken,
    ) -> Vec<Result<(), HandlerExecutionError>> {
        let Ok(runtime) = Handle::try_current() else {
            debug!("No Tokio runtime, delivering on the caller's task");
            return ConcurrentDelivery.deliver(event, handlers, cancel).await;
        };

        let tasks: Vec<_> = handlers
            .iter()
            .map(|handler| {
                let handler = Arc::clone(handler);
                let event = Arc::clone(&event);
                let cancel = cancel.clone();
                runtime.spawn(async move { handler.handle_erased(&*event, cancel).await })
            })
            .collect();

        join_all(tasks)
            .await
            .into_iter()
            .zip(&handlers)
            .map(|(joined, handler)| {
                let implementation = handler.implementation();
                match joined {
                    Ok(outcome) => {
                        outcome.map_err(|err| HandlerExecutionError::new(implementation, err))
                    }
                    Err(err) if err.is_panic() => Err(HandlerExecutionError::new(
                        implementation,
                        HandlerAbort::Panicked(panic_message(&*err.into_panic())),
                    )),
                    Err(_) => Err(HandlerExecutionError::new(
                        implementation,
                        HandlerAbort::Aborted,
                    )),
                }
            })
            .collect()
    }
}

/// All subscribers polled together with `join_all` on the caller's task.
///
/// Does not need a runtime to spawn on; subscribers only make progress while
/// the dispatch is being awaited.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentDelivery;

impl DeliveryStrategy for ConcurrentDelivery {
    async fn deliver(
        &self,
        event: SharedEvent,
        handlers: Vec<Arc<dyn ErasedEventHandler>>,
        cancel: CancellationToken,
    ) -> Vec<Result<(), HandlerExecutionError>> {
        let futures = handlers.iter().map(|handler| {
            let implementation = handler.implementation();
            let caught = AssertUnwindSafe(handler.handle_erased(&*event, cancel.clone()))
                .catch_unwind();
            async move {
                match caught.await {
                    Ok(outcome) => {
                        outcome.map_err(|err| HandlerExecutionError::new(implementation, err))
                    }
                    Err(panic) => Err(HandlerExecutionError::new(
                        implementation,
                        HandlerAbort::Panicked(panic_message(&*panic)),
                    )),
                }
            }
        });

        join_all(futures).await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
