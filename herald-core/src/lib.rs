//! # herald-core
//!
//! Core traits for the Herald type-directed dispatch runtime.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! crates that only declare payloads and handlers, without pulling in the
//! container and dispatchers from `herald-std`.
//!
//! # Two Delivery Modes
//!
//! ## Requests ([`Dispatchable`] / [`RequestHandler`])
//!
//! A dispatchable expects exactly one typed result from exactly one handler.
//! Routing uses the payload's runtime type together with the requested result
//! type, so a `Box<dyn Dispatchable<R>>` still reaches the handler of the
//! concrete type inside it.
//!
//! ## Events ([`Event`] / [`EventHandler`])
//!
//! An event is a notification with no result, delivered to zero or more
//! independent subscribers that run concurrently and share the event
//! read-only.
//!
//! # Contracts
//!
//! Every handler is bound under a [`Contract`], a value keyed by [`TypeKey`]s.
//! The runtime stores handlers behind the object-safe
//! [`ErasedRequestHandler`] / [`ErasedEventHandler`] wrappers and looks them up
//! by contract, never by reflection.
//!
//! # Error Types
//!
//! - [`HeraldError`] - Top-level error type
//! - [`ConfigurationError`] - Registration preconditions unmet
//! - [`RequestError`] - Request routing failure or handler passthrough
//! - [`AggregateHandlerExecutionError`] - Every failed subscriber of one event

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod contract;
mod dispatcher;
mod erased;
mod error;
mod handler;
mod message;

// Re-exports
pub use contract::{Contract, Lifetime, TypeKey};
pub use dispatcher::{Dispatch, Publish};
pub use erased::{
    BoxFuture, ErasedEventHandler, ErasedRequestHandler, EventHandlerWrapper, HandlerInstance,
    RequestHandlerWrapper,
};
pub use error::{
    AggregateHandlerExecutionError, BoxError, ConfigurationError, ContractMismatch, HandlerAbort,
    HandlerExecutionError, HeraldError, RequestError, UnregisteredHandlerError,
};
pub use handler::{EventHandler, RequestHandler};
pub use message::{AnyEvent, AnyPayload, Dispatchable, Event};
pub use tokio_util::sync::CancellationToken;
