#![allow(dead_code)]

use herald::{BoxError, CancellationToken, Dispatchable, Event, EventHandler, RequestHandler};
use lazy_static::lazy_static;
use std::sync::Mutex;

// ============================================================================
// Process-wide logs
// ============================================================================

// Scanned handlers are default-constructed per dispatch, so whatever they
// record has to live outside the instance.
lazy_static! {
    pub static ref AUDIT_LOG: Mutex<Vec<u64>> = Mutex::new(Vec::new());
    pub static ref WELCOME_LOG: Mutex<Vec<u64>> = Mutex::new(Vec::new());
}

pub fn logged(log: &Mutex<Vec<u64>>, id: u64) -> bool {
    log.lock().unwrap().contains(&id)
}

// ============================================================================
// Payloads
// ============================================================================

pub struct GreetRequest;
impl Dispatchable<String> for GreetRequest {}

/// Deliberately has no handler.
pub struct UnknownRequest;
impl Dispatchable<String> for UnknownRequest {}

#[derive(Clone, Debug, PartialEq)]
pub struct UserCreatedEvent {
    pub id: u64,
}
impl Event for UserCreatedEvent {}

/// Deliberately has no subscribers.
#[derive(Clone, Debug)]
pub struct OrphanEvent;
impl Event for OrphanEvent {}

// ============================================================================
// Scanned Handlers
// ============================================================================

#[derive(Default)]
pub struct GreetHandler;

impl RequestHandler<GreetRequest, String> for GreetHandler {
    async fn handle(&self, _: GreetRequest, _: CancellationToken) -> Result<String, BoxError> {
        Ok("hello".to_string())
    }
}

herald::declare_handler!(GreetHandler: RequestHandler<GreetRequest, String>);

#[derive(Default)]
pub struct AuditLogHandler;

impl EventHandler<UserCreatedEvent> for AuditLogHandler {
    async fn handle(&self, event: &UserCreatedEvent, _: CancellationToken) -> Result<(), BoxError> {
        AUDIT_LOG.lock().unwrap().push(event.id);
        Ok(())
    }
}

#[derive(Default)]
pub struct WelcomeLogHandler;

impl EventHandler<UserCreatedEvent> for WelcomeLogHandler {
    async fn handle(&self, event: &UserCreatedEvent, _: CancellationToken) -> Result<(), BoxError> {
        WELCOME_LOG.lock().unwrap().push(event.id);
        Ok(())
    }
}

herald::declare_handler!(AuditLogHandler: EventHandler<UserCreatedEvent>);
herald::declare_handler!(WelcomeLogHandler: EventHandler<UserCreatedEvent>);
