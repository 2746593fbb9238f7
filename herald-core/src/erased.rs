//! Type-erased handlers.
//!
//! Handlers of different concrete types are stored in one table and called
//! uniformly. The payload crosses the erased boundary as `dyn Any` and is
//! downcast back to the concrete type inside the wrapper that knows it.

use crate::{
    contract::{Contract, TypeKey},
    error::{BoxError, ContractMismatch, RequestError},
    handler::{EventHandler, RequestHandler},
    message::{Dispatchable, Event},
};
use std::{any::Any, fmt, future::Future, marker::PhantomData, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

/// An owned, boxed, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe face of a [`RequestHandler`].
pub trait ErasedRequestHandler: Send + Sync {
    /// The concrete handler type behind this object.
    fn implementation(&self) -> TypeKey;

    /// The contract this handler answers.
    fn contract(&self) -> Contract;

    /// Run the handler on an erased payload, returning an erased result.
    fn handle_erased(
        &self,
        request: Box<dyn Any + Send>,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Box<dyn Any + Send>, RequestError>>;
}

/// Object-safe face of an [`EventHandler`].
pub trait ErasedEventHandler: Send + Sync {
    /// The concrete handler type behind this object.
    fn implementation(&self) -> TypeKey;

    /// The contract this handler subscribes under.
    fn contract(&self) -> Contract;

    /// Run the handler on an erased, shared event.
    fn handle_erased<'a>(
        &'a self,
        event: &'a (dyn Any + Send + Sync),
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

/// Bridges a typed [`RequestHandler<D, R>`] into [`ErasedRequestHandler`].
pub struct RequestHandlerWrapper<H, D, R> {
    handler: H,
    _contract: PhantomData<fn(D) -> R>,
}

impl<H, D, R> RequestHandlerWrapper<H, D, R> {
    /// Wrap a typed handler.
    pub const fn new(handler: H) -> Self {
        Self {
            handler,
            _contract: PhantomData,
        }
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.handler
    }
}

impl<H, D, R> ErasedRequestHandler for RequestHandlerWrapper<H, D, R>
where
    H: RequestHandler<D, R>,
    D: Dispatchable<R>,
    R: Send + 'static,
{
    fn implementation(&self) -> TypeKey {
        TypeKey::of::<H>()
    }

    fn contract(&self) -> Contract {
        Contract::request::<D, R>()
    }

    fn handle_erased(
        &self,
        request: Box<dyn Any + Send>,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Box<dyn Any + Send>, RequestError>> {
        Box::pin(async move {
            let request = request
                .downcast::<D>()
                .map_err(|_| ContractMismatch::new(self.contract()))?;
            let output = self
                .handler
                .handle(*request, cancel)
                .await
                .map_err(RequestError::Execution)?;
            Ok::<_, RequestError>(Box::new(output) as Box<dyn Any + Send>)
        })
    }
}

/// Bridges a typed [`EventHandler<E>`] into [`ErasedEventHandler`].
pub struct EventHandlerWrapper<H, E> {
    handler: H,
    _contract: PhantomData<fn(E)>,
}

impl<H, E> EventHandlerWrapper<H, E> {
    /// Wrap a typed handler.
    pub const fn new(handler: H) -> Self {
        Self {
            handler,
            _contract: PhantomData,
        }
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.handler
    }
}

impl<H, E> ErasedEventHandler for EventHandlerWrapper<H, E>
where
    H: EventHandler<E>,
    E: Event,
{
    fn implementation(&self) -> TypeKey {
        TypeKey::of::<H>()
    }

    fn contract(&self) -> Contract {
        Contract::event::<E>()
    }

    fn handle_erased<'a>(
        &'a self,
        event: &'a (dyn Any + Send + Sync),
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            let event = event
                .downcast_ref::<E>()
                .ok_or_else(|| ContractMismatch::new(self.contract()))?;
            self.handler.handle(event, cancel).await
        })
    }
}

/// A resolved handler instance, ready to be invoked.
#[derive(Clone)]
pub enum HandlerInstance {
    /// Bound under a request contract.
    Request(Arc<dyn ErasedRequestHandler>),
    /// Bound under an event contract.
    Event(Arc<dyn ErasedEventHandler>),
}

impl HandlerInstance {
    /// Wrap a typed request handler.
    pub fn request<H, D, R>(handler: H) -> Self
    where
        H: RequestHandler<D, R>,
        D: Dispatchable<R>,
        R: Send + 'static,
    {
        Self::Request(Arc::new(RequestHandlerWrapper::new(handler)))
    }

    /// Wrap a typed event handler.
    pub fn event<H, E>(handler: H) -> Self
    where
        H: EventHandler<E>,
        E: Event,
    {
        Self::Event(Arc::new(EventHandlerWrapper::new(handler)))
    }

    /// The concrete handler type.
    pub fn implementation(&self) -> TypeKey {
        match self {
            Self::Request(h) => h.implementation(),
            Self::Event(h) => h.implementation(),
        }
    }

    /// The contract the instance honours.
    pub fn contract(&self) -> Contract {
        match self {
            Self::Request(h) => h.contract(),
            Self::Event(h) => h.contract(),
        }
    }

    /// The request handler, if this is one.
    pub fn into_request(self) -> Option<Arc<dyn ErasedRequestHandler>> {
        match self {
            Self::Request(h) => Some(h),
            Self::Event(_) => None,
        }
    }

    /// The event handler, if this is one.
    pub fn into_event(self) -> Option<Arc<dyn ErasedEventHandler>> {
        match self {
            Self::Event(h) => Some(h),
            Self::Request(_) => None,
        }
    }
}

impl fmt::Debug for HandlerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerInstance")
            .field("contract", &self.contract())
            .field("implementation", &self.implementation())
            .finish()
    }
}
