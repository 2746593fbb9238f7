//! # herald - Type-Directed In-Process Dispatch
//!
//! `herald` routes typed payloads to the handlers registered for their type.
//! Two delivery modes share one registry:
//!
//! - **Requests**: a [`Dispatchable<R>`] goes to exactly one
//!   [`RequestHandler`], whose `R` comes back to the caller.
//! - **Events**: an [`Event`] goes to every [`EventHandler`] subscribed to its
//!   type, concurrently. The call completes once all of them have, and every
//!   failure is reported together.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! struct GreetRequest;
//! impl Dispatchable<String> for GreetRequest {}
//!
//! #[derive(Default)]
//! struct GreetHandler;
//!
//! impl RequestHandler<GreetRequest, String> for GreetHandler {
//!     async fn handle(&self, _: GreetRequest, _: CancellationToken) -> Result<String, BoxError> {
//!         Ok("hello".into())
//!     }
//! }
//!
//! herald::declare_handler!(GreetHandler: RequestHandler<GreetRequest, String>);
//!
//! let herald = Herald::builder().scan_crate_of::<GreetRequest>().build()?;
//! let greeting: String = herald.dispatch(GreetRequest).await?;
//! ```
//!
//! ## Registration
//!
//! Handlers are declared next to their impl, with [`declare_handler!`] or the
//! `#[handler]` attribute (feature `macros`). At startup [`configure`] scans a
//! set of modules for declarations and binds each contract into a
//! [`ServiceCollection`], which is then frozen. Bindings can also be added by
//! hand with [`HandlerBinding`].

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use herald_core::{
    // Errors
    AggregateHandlerExecutionError,
    // Payloads
    AnyEvent,
    AnyPayload,
    BoxError,
    // Erased handlers
    BoxFuture,
    CancellationToken,
    ConfigurationError,
    // Contracts
    Contract,
    ContractMismatch,
    // Dispatch traits
    Dispatch,
    Dispatchable,
    ErasedEventHandler,
    ErasedRequestHandler,
    Event,
    // Handlers
    EventHandler,
    EventHandlerWrapper,
    HandlerAbort,
    HandlerExecutionError,
    HandlerInstance,
    HeraldError,
    Lifetime,
    Publish,
    RequestError,
    RequestHandler,
    RequestHandlerWrapper,
    TypeKey,
    UnregisteredHandlerError,
};

// Registration
pub use herald_std::{
    ContractDeclaration,
    catalog::{
        InventoryCatalog, ModuleId, ModuleSet, StaticCatalog, TypeCatalog, TypeDescriptor,
    },
    container::{
        HandlerBinding, HandlerFactory, ServiceCollection, ServiceContainer, ServiceProvider,
    },
    declare_handler,
    scan::{DispatcherOptions, HandlerRegistry, configure, configure_with},
};

// Dispatch
pub use herald_std::{
    event::EventDispatcher,
    request::RequestDispatcher,
    runtime::{Herald, HeraldBuilder},
};

/// Delivery strategies for event fan-out.
pub mod delivery {
    pub use herald_std::delivery::{
        ConcurrentDelivery, DeliveryStrategy, SharedEvent, SpawnedDelivery,
    };
}

/// Testing utilities.
pub mod testing {
    pub use herald_std::testing::{FailingEventHandler, RecordingEventHandler, ReplyHandler};
}

/// Prelude module - common imports for Herald.
///
/// # Usage
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        AggregateHandlerExecutionError,
        BoxError,
        CancellationToken,
        ConfigurationError,
        // Traits
        Dispatch,
        Dispatchable,
        Event,
        EventHandler,
        // Runtime
        Herald,
        Publish,
        RequestError,
        RequestHandler,
    };
}

#[cfg(feature = "macros")]
pub use herald_macros::{Dispatchable, Event, handler};

pub use herald_std::inventory;
