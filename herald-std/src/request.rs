//! Request dispatch: exactly one handler, one typed result.

use crate::container::{ServiceContainer, ServiceProvider};
use herald_core::{
    AnyPayload, CancellationToken, Contract, ContractMismatch, Dispatch, Dispatchable,
    RequestError, TypeKey, UnregisteredHandlerError,
};
use std::{any::Any, sync::Arc};
use tracing::{Instrument, debug};

/// Routes each dispatchable to the single handler bound for its runtime type
/// and requested result type.
///
/// The dispatcher holds nothing but the provider; every call resolves a fresh
/// handler instance.
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = RequestDispatcher::new(Arc::new(services.build()));
/// let greeting: String = dispatcher.dispatch(GreetRequest).await?;
/// ```
pub struct RequestDispatcher<P = ServiceContainer> {
    services: Arc<P>,
}

impl<P> Clone for RequestDispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            services: Arc::clone(&self.services),
        }
    }
}

impl<P: ServiceProvider> RequestDispatcher<P> {
    /// Create a dispatcher over a frozen provider.
    pub fn new(services: Arc<P>) -> Self {
        Self { services }
    }

    /// The provider handlers are resolved from.
    pub fn services(&self) -> &Arc<P> {
        &self.services
    }

    /// Dispatch with a token that is never cancelled.
    pub async fn dispatch<R, D>(&self, request: D) -> Result<R, RequestError>
    where
        D: Dispatchable<R>,
        R: Send + 'static,
    {
        self.dispatch_with(request, CancellationToken::new()).await
    }

    /// Dispatch `request`, handing `cancel` to the handler.
    ///
    /// Fails with [`RequestError::Unregistered`] when nothing is bound for
    /// `(D, R)`. A handler error is returned unchanged as
    /// [`RequestError::Execution`].
    pub async fn dispatch_with<R, D>(
        &self,
        request: D,
        cancel: CancellationToken,
    ) -> Result<R, RequestError>
    where
        D: Dispatchable<R>,
        R: Send + 'static,
    {
        self.route(TypeKey::of::<D>(), Box::new(request), cancel)
            .await
    }

    /// Dispatch a boxed payload, routed by the concrete type inside the box.
    pub async fn dispatch_dyn<R>(
        &self,
        request: Box<dyn Dispatchable<R>>,
        cancel: CancellationToken,
    ) -> Result<R, RequestError>
    where
        R: Send + 'static,
    {
        let payload = (*request).payload_type();
        self.route(payload, AnyPayload::into_any(request), cancel)
            .await
    }

    async fn route<R>(
        &self,
        payload: TypeKey,
        request: Box<dyn Any + Send>,
        cancel: CancellationToken,
    ) -> Result<R, RequestError>
    where
        R: Send + 'static,
    {
        let result = TypeKey::of::<R>();
        let contract = Contract::Request { payload, result };
        let span = tracing::debug_span!(
            "dispatch_request",
            payload = %payload,
            result = %result
        );

        async move {
            let handler = self
                .services
                .resolve_one(&contract)
                .ok_or_else(|| UnregisteredHandlerError::new(payload, result))?
                .into_request()
                .ok_or_else(|| ContractMismatch::new(contract))?;
            debug!(implementation = %handler.implementation(), "Resolved request handler");

            let output = handler
                .handle_erased(request, cancel)
                .await?
                .downcast::<R>()
                .map_err(|_| ContractMismatch::new(contract))?;
            Ok::<R, RequestError>(*output)
        }
        .instrument(span)
        .await
    }
}

impl<P: ServiceProvider> Dispatch for RequestDispatcher<P> {
    fn dispatch_with<R, D>(
        &self,
        request: D,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R, RequestError>> + Send
    where
        D: Dispatchable<R>,
        R: Send + 'static,
    {
        RequestDispatcher::dispatch_with(self, request, cancel)
    }
}
