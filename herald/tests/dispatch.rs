use herald::{
    BoxError, CancellationToken, Dispatchable, Event, EventHandler, HandlerBinding, Herald,
    RequestError, RequestHandler,
    delivery::ConcurrentDelivery,
    testing::{FailingEventHandler, RecordingEventHandler, ReplyHandler},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

mod common;
use common::{
    AUDIT_LOG, GreetRequest, OrphanEvent, UnknownRequest, UserCreatedEvent, WELCOME_LOG, logged,
};

fn scanned() -> Herald {
    Herald::builder()
        .scan_module_of::<GreetRequest>()
        .build()
        .expect("scan common")
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_greet_request_returns_hello() {
    let herald = scanned();

    let reply: String = herald.dispatch(GreetRequest).await.unwrap();

    assert_eq!(reply, "hello");
}

#[tokio::test]
async fn test_unknown_request_names_the_payload() {
    let herald = scanned();

    let err = herald.dispatch::<String, _>(UnknownRequest).await.unwrap_err();

    assert!(err.is_unregistered());
    assert!(err.to_string().contains("UnknownRequest"));
}

#[tokio::test]
async fn test_handler_is_invoked_exactly_once() {
    let reply = ReplyHandler::new(String::from("once"));
    let factory = reply.clone();
    let herald = Herald::builder()
        .bind(HandlerBinding::request::<_, GreetRequest, String, _>(move || {
            factory.clone()
        }))
        .build()
        .unwrap();

    let answer: String = herald.dispatch(GreetRequest).await.unwrap();

    assert_eq!(answer, "once");
    assert_eq!(reply.call_count(), 1);
}

#[derive(Debug)]
struct Declined(&'static str);

impl std::fmt::Display for Declined {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "declined: {}", self.0)
    }
}

impl std::error::Error for Declined {}

struct Quote;
impl Dispatchable<u32> for Quote {}

struct DecliningHandler;

impl RequestHandler<Quote, u32> for DecliningHandler {
    async fn handle(&self, _: Quote, _: CancellationToken) -> Result<u32, BoxError> {
        Err(Box::new(Declined("market closed")))
    }
}

#[tokio::test]
async fn test_request_failure_is_passed_through() {
    let herald = Herald::builder()
        .bind(HandlerBinding::request::<_, Quote, u32, _>(|| DecliningHandler))
        .build()
        .unwrap();

    let err = herald.dispatch::<u32, _>(Quote).await.unwrap_err();

    assert!(matches!(err, RequestError::Execution(_)));
    let source = err.into_handler_error().unwrap();
    assert_eq!(source.downcast_ref::<Declined>().unwrap().0, "market closed");
}

#[tokio::test]
async fn test_boxed_request_routes_by_concrete_type() {
    let herald = scanned();

    let boxed: Box<dyn Dispatchable<String>> = Box::new(GreetRequest);
    let reply = herald
        .dispatch_dyn(boxed, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reply, "hello");
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_user_created_reaches_both_logs() {
    let herald = scanned();

    herald.publish(UserCreatedEvent { id: 4242 }).await.unwrap();

    assert!(logged(&AUDIT_LOG, 4242));
    assert!(logged(&WELCOME_LOG, 4242));
}

#[tokio::test]
async fn test_event_without_subscribers_is_a_no_op() {
    let herald = scanned();

    assert!(herald.publish(OrphanEvent).await.is_ok());
}

#[tokio::test]
async fn test_shared_event_routes_by_concrete_type() {
    let herald = scanned();

    let event: Arc<dyn Event> = Arc::new(UserCreatedEvent { id: 5151 });
    herald
        .publish_dyn(event, CancellationToken::new())
        .await
        .unwrap();

    assert!(logged(&AUDIT_LOG, 5151));
    assert!(logged(&WELCOME_LOG, 5151));
}

#[derive(Clone, Debug)]
struct Reindex;
impl Event for Reindex {}

struct Sleeper {
    millis: u64,
    finished: Arc<AtomicUsize>,
}

impl EventHandler<Reindex> for Sleeper {
    async fn handle(&self, _: &Reindex, _: CancellationToken) -> Result<(), BoxError> {
        tokio::time::sleep(Duration::from_millis(self.millis)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_publish_waits_for_the_slowest_subscriber() {
    let finished = Arc::new(AtomicUsize::new(0));
    let mut builder = Herald::builder();
    for millis in [10, 40, 80] {
        let finished = Arc::clone(&finished);
        builder = builder.bind(HandlerBinding::event::<_, Reindex, _>(move || Sleeper {
            millis,
            finished: Arc::clone(&finished),
        }));
    }
    let herald = builder.build().unwrap();

    let started = Instant::now();
    herald.publish(Reindex).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(finished.load(Ordering::SeqCst), 3);
    assert!(elapsed >= Duration::from_millis(80));
    assert!(elapsed < Duration::from_millis(130));
}

#[tokio::test]
async fn test_failing_subscriber_does_not_stop_siblings() {
    let before = RecordingEventHandler::<Reindex>::new();
    let after = RecordingEventHandler::<Reindex>::new();
    let (b, a) = (before.clone(), after.clone());
    let herald = Herald::builder()
        .bind(HandlerBinding::event::<_, Reindex, _>(move || b.clone()))
        .bind(HandlerBinding::event::<_, Reindex, _>(|| FailingEventHandler::new("disk full")))
        .bind(HandlerBinding::event::<_, Reindex, _>(move || a.clone()))
        .build()
        .unwrap();

    let err = herald.publish(Reindex).await.unwrap_err();

    assert_eq!(before.count(), 1);
    assert_eq!(after.count(), 1);
    assert_eq!(err.attempted(), 3);
    assert_eq!(err.failures().len(), 1);
}

#[tokio::test]
async fn test_aggregate_carries_every_failure() {
    let herald = Herald::builder()
        .bind(HandlerBinding::event::<_, Reindex, _>(|| FailingEventHandler::new("first")))
        .bind(HandlerBinding::event::<_, Reindex, _>(|| FailingEventHandler::new("second")))
        .bind(HandlerBinding::event::<_, Reindex, _>(|| FailingEventHandler::new("third")))
        .build()
        .unwrap()
        .with_delivery(ConcurrentDelivery);

    let err = herald.publish(Reindex).await.unwrap_err();

    let messages: Vec<String> = err
        .failures()
        .iter()
        .map(|failure| failure.error().to_string())
        .collect();
    assert_eq!(messages, ["first", "second", "third"]);
    assert!(err.to_string().starts_with("3 of 3 handlers failed"));
}
