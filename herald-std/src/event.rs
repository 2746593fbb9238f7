//! Event dispatch: every subscriber, concurrently, failures aggregated.

use crate::{
    container::{ServiceContainer, ServiceProvider},
    delivery::{DeliveryStrategy, SharedEvent, SpawnedDelivery},
};
use herald_core::{
    AggregateHandlerExecutionError, AnyEvent, CancellationToken, Contract, ContractMismatch, Event,
    HandlerExecutionError, HandlerInstance, Publish, TypeKey,
};
use std::sync::Arc;
use tracing::{Instrument, debug, warn};

/// Delivers each event to every subscriber bound for its type.
///
/// Subscribers run concurrently and the call returns once all of them have
/// finished. One failure never stops the others; every failure is reported
/// in the returned [`AggregateHandlerExecutionError`].
///
/// # Example
///
/// ```rust,ignore
/// let events = EventDispatcher::new(Arc::new(services.build()));
/// events.dispatch(UserCreatedEvent { id: 7 }).await?;
/// ```
pub struct EventDispatcher<P = ServiceContainer, S = SpawnedDelivery> {
    services: Arc<P>,
    delivery: S,
}

impl<P, S: Clone> Clone for EventDispatcher<P, S> {
    fn clone(&self) -> Self {
        Self {
            services: Arc::clone(&self.services),
            delivery: self.delivery.clone(),
        }
    }
}

impl<P: ServiceProvider> EventDispatcher<P> {
    /// Create a dispatcher that spawns one task per subscriber, or delivers on
    /// the caller's task when no Tokio runtime is running.
    pub fn new(services: Arc<P>) -> Self {
        Self {
            services,
            delivery: SpawnedDelivery,
        }
    }
}

impl<P: ServiceProvider, S: DeliveryStrategy> EventDispatcher<P, S> {
    /// Replace the delivery strategy.
    pub fn with_delivery<T: DeliveryStrategy>(self, delivery: T) -> EventDispatcher<P, T> {
        EventDispatcher {
            services: self.services,
            delivery,
        }
    }

    /// The provider subscribers are resolved from.
    pub fn services(&self) -> &Arc<P> {
        &self.services
    }

    /// The delivery strategy in use.
    pub fn delivery(&self) -> &S {
        &self.delivery
    }

    /// Dispatch with a token that is never cancelled.
    pub async fn dispatch<E: Event>(&self, event: E) -> Result<(), AggregateHandlerExecutionError> {
        self.dispatch_with(event, CancellationToken::new()).await
    }

    /// Dispatch `event` to every subscriber, sharing one clone of `cancel`
    /// with each.
    ///
    /// Succeeds trivially when nothing subscribes to `E`.
    pub async fn dispatch_with<E: Event>(
        &self,
        event: E,
        cancel: CancellationToken,
    ) -> Result<(), AggregateHandlerExecutionError> {
        self.deliver(TypeKey::of::<E>(), Arc::new(event), cancel)
            .await
    }

    /// Dispatch a shared event, routed by the concrete type behind the `Arc`.
    pub async fn dispatch_dyn(
        &self,
        event: Arc<dyn Event>,
        cancel: CancellationToken,
    ) -> Result<(), AggregateHandlerExecutionError> {
        let key = (*event).event_type();
        self.deliver(key, AnyEvent::into_any_arc(event), cancel)
            .await
    }

    async fn deliver(
        &self,
        event: TypeKey,
        shared: SharedEvent,
        cancel: CancellationToken,
    ) -> Result<(), AggregateHandlerExecutionError> {
        let contract = Contract::Event { payload: event };
        let resolved = self.services.resolve_all(&contract);
        if resolved.is_empty() {
            debug!(event = %event, "No subscribers");
            return Ok(());
        }

        let attempted = resolved.len();
        let span = tracing::debug_span!("dispatch_event", event = %event, handlers = attempted);

        async move {
            // Instances that cannot honour the contract are failures in their
            // own right. Both kinds are reported in registration order.
            let mut failures = Vec::new();
            let mut handlers = Vec::with_capacity(attempted);
            let mut slots = Vec::with_capacity(attempted);
            for (slot, instance) in resolved.into_iter().enumerate() {
                let implementation = instance.implementation();
                match HandlerInstance::into_event(instance) {
                    Some(handler) => {
                        handlers.push(handler);
                        slots.push(slot);
                    }
                    None => failures.push((
                        slot,
                        HandlerExecutionError::new(implementation, ContractMismatch::new(contract)),
                    )),
                }
            }

            let outcomes = self.delivery.deliver(shared, handlers, cancel).await;
            failures.extend(
                slots
                    .into_iter()
                    .zip(outcomes)
                    .filter_map(|(slot, outcome)| outcome.err().map(|err| (slot, err))),
            );
            failures.sort_by_key(|(slot, _)| *slot);
            let failures: Vec<_> = failures.into_iter().map(|(_, err)| err).collect();

            if failures.is_empty() {
                debug!("All subscribers completed");
                return Ok(());
            }
            for failure in &failures {
                warn!(
                    handler = %failure.handler(),
                    error = %failure.error(),
                    "Event handler failed"
                );
            }
            Err(AggregateHandlerExecutionError::new(event, attempted, failures))
        }
        .instrument(span)
        .await
    }
}

impl<P: ServiceProvider, S: DeliveryStrategy> Publish for EventDispatcher<P, S> {
    fn publish_with<E: Event>(
        &self,
        event: E,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), AggregateHandlerExecutionError>> + Send {
        self.dispatch_with(event, cancel)
    }
}
