//! Payload traits for requests and events.

use crate::contract::TypeKey;
use std::{any::Any, sync::Arc};

/// Object-safe access to a request payload's concrete type.
///
/// Implemented for every `Send + 'static` type. It lets the request dispatcher
/// route a `Box<dyn Dispatchable<R>>` by the type that was boxed rather than by
/// the box itself.
///
/// Call it through the trait object (`(*boxed).payload_type()`), otherwise
/// method resolution picks the blanket impl for the `Box`.
pub trait AnyPayload: Any + Send {
    /// The key of the concrete payload type.
    fn payload_type(&self) -> TypeKey;

    /// Erase the payload for hand-off to a type-erased handler.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + Send> AnyPayload for T {
    fn payload_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// A request-shaped payload that expects exactly one `R` back from exactly one
/// handler.
///
/// A type may be dispatchable for several result types; each `(Self, R)` pair
/// is routed independently.
///
/// # Example
///
/// ```rust,ignore
/// struct GreetRequest { name: String }
///
/// impl Dispatchable<String> for GreetRequest {}
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not dispatchable for a `{R}` result",
    label = "missing `Dispatchable<{R}>` implementation",
    note = "Add `impl Dispatchable<{R}> for {Self} {{}}` or `#[derive(Dispatchable)]` with `#[dispatchable(result = {R})]`."
)]
pub trait Dispatchable<R: Send + 'static>: AnyPayload {}

/// Object-safe access to an event payload's concrete type.
///
/// Implemented for every `Send + Sync + 'static` type.
pub trait AnyEvent: Any + Send + Sync {
    /// The key of the concrete event type.
    fn event_type(&self) -> TypeKey;

    /// Erase the event so it can be shared by every subscriber.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AnyEvent for T {
    fn event_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A notification-shaped payload with no result, delivered to zero or more
/// independent subscribers.
///
/// Events are shared read-only between subscribers, hence the `Sync` bound.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Event",
    label = "missing `Event` implementation",
    note = "Events must be `Send + Sync + 'static` and implement `Event` (or `#[derive(Event)]`)."
)]
pub trait Event: AnyEvent {}
