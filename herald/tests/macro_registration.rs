#![cfg(feature = "macros")]

use herald::{
    BoxError, CancellationToken, ConfigurationError, Contract, Dispatchable, Event, EventHandler,
    HandlerRegistry, Herald, InventoryCatalog, ModuleId, ModuleSet, RequestHandler,
};
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Test: derive(Event) / derive(Dispatchable)
// ============================================================================

#[derive(Clone, Debug, herald::Event)]
struct OrderPlaced {
    total: u64,
}

#[derive(herald::Dispatchable)]
#[dispatchable(result = u64)]
#[dispatchable(result = String)]
struct PriceCheck {
    sku: &'static str,
}

#[test]
fn test_derives_implement_the_marker_traits() {
    fn assert_event<T: Event>() {}
    fn assert_dispatchable<T: Dispatchable<R>, R: Send + 'static>() {}

    assert_event::<OrderPlaced>();
    assert_dispatchable::<PriceCheck, u64>();
    assert_dispatchable::<PriceCheck, String>();
}

// ============================================================================
// Test: #[handler]
// ============================================================================

static PLACED_TOTAL: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Pricing;

#[herald::handler]
impl RequestHandler<PriceCheck, u64> for Pricing {
    async fn handle(&self, request: PriceCheck, _: CancellationToken) -> Result<u64, BoxError> {
        Ok(request.sku.len() as u64 * 100)
    }
}

#[herald::handler]
impl RequestHandler<PriceCheck, String> for Pricing {
    async fn handle(&self, request: PriceCheck, _: CancellationToken) -> Result<String, BoxError> {
        Ok(format!("{}: on sale", request.sku))
    }
}

#[derive(Default)]
struct Fulfilment;

#[herald::handler]
impl EventHandler<OrderPlaced> for Fulfilment {
    async fn handle(&self, event: &OrderPlaced, _: CancellationToken) -> Result<(), BoxError> {
        PLACED_TOTAL.fetch_add(event.total as usize, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_handler_attribute_declares_each_contract() {
    let modules = ModuleSet::from_iter([ModuleId::of::<Pricing>()]);

    let registry = HandlerRegistry::scan(&InventoryCatalog, &modules).unwrap();

    assert_eq!(registry.len(), 3);
    for contract in [
        Contract::request::<PriceCheck, u64>(),
        Contract::request::<PriceCheck, String>(),
        Contract::event::<OrderPlaced>(),
    ] {
        assert_eq!(registry.bindings_for(&contract).count(), 1, "{contract}");
    }
}

#[tokio::test]
async fn test_attribute_declared_handlers_dispatch() {
    let herald = Herald::builder()
        .scan_crate_of::<Pricing>()
        .build()
        .unwrap();

    let cents: u64 = herald.dispatch(PriceCheck { sku: "abc" }).await.unwrap();
    let label: String = herald.dispatch(PriceCheck { sku: "abc" }).await.unwrap();
    herald.publish(OrderPlaced { total: 12 }).await.unwrap();

    assert_eq!(cents, 300);
    assert_eq!(label, "abc: on sale");
    assert_eq!(PLACED_TOTAL.load(Ordering::SeqCst), 12);
}

#[test]
fn test_builder_without_modules_or_bindings_fails() {
    let err = Herald::builder().build().err();

    assert_eq!(err, Some(ConfigurationError::NoModules));
}
