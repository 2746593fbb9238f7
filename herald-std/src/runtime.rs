//! The combined runtime: both dispatchers over one provider.

use crate::{
    catalog::{InventoryCatalog, TypeCatalog},
    container::{HandlerBinding, ServiceCollection, ServiceContainer, ServiceProvider},
    delivery::{DeliveryStrategy, SpawnedDelivery},
    event::EventDispatcher,
    request::RequestDispatcher,
    scan::{DispatcherOptions, configure_with},
};
use herald_core::{
    AggregateHandlerExecutionError, CancellationToken, ConfigurationError, Dispatch, Dispatchable,
    Event, Publish, RequestError,
};
use std::{borrow::Cow, sync::Arc};

/// Request and event dispatch sharing one frozen provider.
///
/// # Example
///
/// ```rust,ignore
/// let herald = Herald::builder()
///     .scan_crate_of::<GreetRequest>()
///     .build()?;
///
/// let greeting: String = herald.dispatch(GreetRequest).await?;
/// herald.publish(UserCreatedEvent { id: 1 }).await?;
/// ```
pub struct Herald<P = ServiceContainer, S = SpawnedDelivery> {
    requests: RequestDispatcher<P>,
    events: EventDispatcher<P, S>,
}

impl<P, S: Clone> Clone for Herald<P, S> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            events: self.events.clone(),
        }
    }
}

impl Herald {
    /// Start configuring a runtime backed by link-time declarations.
    pub fn builder() -> HeraldBuilder {
        HeraldBuilder::new()
    }
}

impl<P: ServiceProvider> Herald<P> {
    /// Build both dispatchers over an existing provider.
    pub fn from_provider(services: Arc<P>) -> Self {
        Self {
            requests: RequestDispatcher::new(Arc::clone(&services)),
            events: EventDispatcher::new(services),
        }
    }
}

impl<P: ServiceProvider, S: DeliveryStrategy> Herald<P, S> {
    /// Replace the event delivery strategy.
    pub fn with_delivery<T: DeliveryStrategy>(self, delivery: T) -> Herald<P, T> {
        Herald {
            requests: self.requests,
            events: self.events.with_delivery(delivery),
        }
    }

    /// The request dispatcher.
    pub fn requests(&self) -> &RequestDispatcher<P> {
        &self.requests
    }

    /// The event dispatcher.
    pub fn events(&self) -> &EventDispatcher<P, S> {
        &self.events
    }

    /// See [`RequestDispatcher::dispatch`].
    pub async fn dispatch<R, D>(&self, request: D) -> Result<R, RequestError>
    where
        D: Dispatchable<R>,
        R: Send + 'static,
    {
        self.requests.dispatch(request).await
    }

    /// See [`RequestDispatcher::dispatch_with`].
    pub async fn dispatch_with<R, D>(
        &self,
        request: D,
        cancel: CancellationToken,
    ) -> Result<R, RequestError>
    where
        D: Dispatchable<R>,
        R: Send + 'static,
    {
        self.requests.dispatch_with(request, cancel).await
    }

    /// See [`RequestDispatcher::dispatch_dyn`].
    pub async fn dispatch_dyn<R: Send + 'static>(
        &self,
        request: Box<dyn Dispatchable<R>>,
        cancel: CancellationToken,
    ) -> Result<R, RequestError> {
        self.requests.dispatch_dyn(request, cancel).await
    }

    /// See [`EventDispatcher::dispatch`].
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), AggregateHandlerExecutionError> {
        self.events.dispatch(event).await
    }

    /// See [`EventDispatcher::dispatch_with`].
    pub async fn publish_with<E: Event>(
        &self,
        event: E,
        cancel: CancellationToken,
    ) -> Result<(), AggregateHandlerExecutionError> {
        self.events.dispatch_with(event, cancel).await
    }

    /// See [`EventDispatcher::dispatch_dyn`].
    pub async fn publish_dyn(
        &self,
        event: Arc<dyn Event>,
        cancel: CancellationToken,
    ) -> Result<(), AggregateHandlerExecutionError> {
        self.events.dispatch_dyn(event, cancel).await
    }
}

impl<P: ServiceProvider, S: DeliveryStrategy> Dispatch for Herald<P, S> {
    fn dispatch_with<R, D>(
        &self,
        request: D,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R, RequestError>> + Send
    where
        D: Dispatchable<R>,
        R: Send + 'static,
    {
        self.requests.dispatch_with(request, cancel)
    }
}

impl<P: ServiceProvider, S: DeliveryStrategy> Publish for Herald<P, S> {
    fn publish_with<E: Event>(
        &self,
        event: E,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), AggregateHandlerExecutionError>> + Send {
        self.events.dispatch_with(event, cancel)
    }
}

// ============================================================================
// HeraldBuilder
// ============================================================================

/// Builder for [`Herald`].
///
/// Scanned modules and manual bindings end up in the same container. Manual
/// bindings are added after the scanned ones, so for a request contract they
/// take precedence.
pub struct HeraldBuilder<C = InventoryCatalog> {
    catalog: C,
    options: DispatcherOptions,
    manual: Vec<HandlerBinding>,
}

impl HeraldBuilder {
    /// Create a builder over link-time declarations.
    pub fn new() -> Self {
        Self {
            catalog: InventoryCatalog,
            options: DispatcherOptions::new(),
            manual: Vec::new(),
        }
    }
}

impl Default for HeraldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TypeCatalog> HeraldBuilder<C> {
    /// Use a different catalog for scanning.
    pub fn catalog<T: TypeCatalog>(self, catalog: T) -> HeraldBuilder<T> {
        HeraldBuilder {
            catalog,
            options: self.options,
            manual: self.manual,
        }
    }

    /// Scan a module path and everything nested below it.
    pub fn scan_module(mut self, path: impl Into<Cow<'static, str>>) -> Self {
        self.options.scan_module(path);
        self
    }

    /// Scan the module `T` is defined in.
    pub fn scan_module_of<T: ?Sized>(mut self) -> Self {
        self.options.scan_module_of::<T>();
        self
    }

    /// Scan the whole crate `T` is defined in.
    pub fn scan_crate_of<T: ?Sized>(mut self) -> Self {
        self.options.scan_crate_of::<T>();
        self
    }

    /// Add a binding by hand.
    pub fn bind(mut self, binding: HandlerBinding) -> Self {
        self.manual.push(binding);
        self
    }

    /// Scan, bind and freeze.
    ///
    /// With no module configured, only the manual bindings are used. Fails
    /// with [`ConfigurationError::NoModules`] if there is nothing to scan and
    /// nothing bound.
    ///
    /// This is the only entry point that may skip scanning. [`configure`] and
    /// [`configure_with`] always require at least one module, whatever the
    /// collection already holds.
    ///
    /// [`configure`]: crate::scan::configure
    pub fn build(self) -> Result<Herald, ConfigurationError> {
        let mut services = ServiceCollection::new();
        let scanning = self.options.module_set()?;
        if !scanning.is_empty() || self.manual.is_empty() {
            configure_with(&mut services, &self.catalog, &self.options)?;
        }
        for binding in self.manual {
            services.bind(binding);
        }
        Ok(Herald::from_provider(Arc::new(services.build())))
    }
}
