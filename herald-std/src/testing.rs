//! Testing utilities for Herald.
//!
//! Handler doubles that can be bound with a factory closure and inspected
//! afterwards. Clones share their recorded state, so keep one clone in the
//! test and hand the factory another.
//!
//! # Features
//!
//! - [`RecordingEventHandler`]: records every event it receives
//! - [`FailingEventHandler`]: fails every event with a fixed message
//! - [`ReplyHandler`]: answers every request with a fixed reply

use herald_core::{
    BoxError, CancellationToken, Dispatchable, Event, EventHandler, RequestHandler,
};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Recording Event Handler
// ============================================================================

/// An event handler that records all events it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingEventHandler::<UserCreated>::new();
/// let factory = recorder.clone();
/// services.bind(HandlerBinding::event::<_, UserCreated, _>(move || factory.clone()));
///
/// // Dispatch...
///
/// assert_eq!(recorder.count(), 1);
/// ```
pub struct RecordingEventHandler<E: Clone> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone> RecordingEventHandler<E> {
    /// Create a new, empty recorder.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a clone of the recorded events.
    pub fn events(&self) -> Vec<E> {
        lock(&self.events).clone()
    }

    /// Get the number of recorded events.
    pub fn count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Clear all recorded events.
    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl<E: Clone> Default for RecordingEventHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Clone for RecordingEventHandler<E> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<E: Event + Clone> EventHandler<E> for RecordingEventHandler<E> {
    async fn handle(&self, event: &E, _cancel: CancellationToken) -> Result<(), BoxError> {
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

// ============================================================================
// Failing Event Handler
// ============================================================================

/// An event handler that fails every event it receives.
///
/// Subscribes to any event type.
#[derive(Clone)]
pub struct FailingEventHandler {
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingEventHandler {
    /// Create a handler failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times it was invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<E: Event> EventHandler<E> for FailingEventHandler {
    async fn handle(&self, _event: &E, _cancel: CancellationToken) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.message.clone().into())
    }
}

// ============================================================================
// Reply Handler
// ============================================================================

/// A request handler that answers every request with a clone of one reply.
///
/// # Example
///
/// ```rust,ignore
/// let reply = ReplyHandler::new(String::from("hello"));
/// let factory = reply.clone();
/// services.bind(HandlerBinding::request::<_, GreetRequest, String, _>(move || factory.clone()));
///
/// // Dispatch...
///
/// assert_eq!(reply.call_count(), 1);
/// ```
pub struct ReplyHandler<R> {
    reply: R,
    calls: Arc<AtomicUsize>,
}

impl<R> ReplyHandler<R> {
    /// Create a handler answering with `reply`.
    pub fn new(reply: R) -> Self {
        Self {
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times it was invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<R: Clone> Clone for ReplyHandler<R> {
    fn clone(&self) -> Self {
        Self {
            reply: self.reply.clone(),
            calls: self.calls.clone(),
        }
    }
}

impl<D, R> RequestHandler<D, R> for ReplyHandler<R>
where
    D: Dispatchable<R>,
    R: Clone + Send + Sync + 'static,
{
    async fn handle(&self, _request: D, _cancel: CancellationToken) -> Result<R, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}
