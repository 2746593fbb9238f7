//! Service container backing handler resolution.
//!
//! Bindings are collected in a mutable [`ServiceCollection`] during startup
//! and frozen into an immutable, thread-safe [`ServiceContainer`]. Dispatchers
//! can only be built over the frozen container, so registration always
//! finishes before the first dispatch.

use herald_core::{
    Contract, Dispatchable, Event, EventHandler, HandlerInstance, Lifetime, RequestHandler,
    TypeKey,
};
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock},
};

/// Source of handler instances, consulted on every dispatch.
///
/// Implementations must be safe for concurrent reads.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid ServiceProvider",
    label = "missing `ServiceProvider` implementation",
    note = "Build a `ServiceContainer` from a `ServiceCollection`, or implement `ServiceProvider`."
)]
pub trait ServiceProvider: Send + Sync {
    /// Resolve the single instance bound for `contract`.
    ///
    /// When several implementations are bound, which one is returned is up to
    /// the provider. [`ServiceContainer`] returns the last registered.
    fn resolve_one(&self, contract: &Contract) -> Option<HandlerInstance>;

    /// Resolve every instance bound for `contract`, in registration order.
    fn resolve_all(&self, contract: &Contract) -> Vec<HandlerInstance>;
}

/// Produces handler instances for one binding.
pub type HandlerFactory = Arc<dyn Fn() -> HandlerInstance + Send + Sync>;

/// Associates a contract with a concrete implementation type.
#[derive(Clone)]
pub struct HandlerBinding {
    contract: Contract,
    implementation: TypeKey,
    lifetime: Lifetime,
    factory: HandlerFactory,
}

impl HandlerBinding {
    /// Bind `H` under `RequestHandler<D, R>`, constructing it with `factory`.
    pub fn request<H, D, R, F>(factory: F) -> Self
    where
        H: RequestHandler<D, R>,
        D: Dispatchable<R>,
        R: Send + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            contract: Contract::request::<D, R>(),
            implementation: TypeKey::of::<H>(),
            lifetime: Lifetime::Transient,
            factory: Arc::new(move || HandlerInstance::request::<H, D, R>(factory())),
        }
    }

    /// Bind `H` under `EventHandler<E>`, constructing it with `factory`.
    pub fn event<H, E, F>(factory: F) -> Self
    where
        H: EventHandler<E>,
        E: Event,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            contract: Contract::event::<E>(),
            implementation: TypeKey::of::<H>(),
            lifetime: Lifetime::Transient,
            factory: Arc::new(move || HandlerInstance::event::<H, E>(factory())),
        }
    }

    /// Set the instance lifetime. Bindings are transient by default.
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// The contract this binding satisfies.
    pub fn contract(&self) -> Contract {
        self.contract
    }

    /// The concrete handler type.
    pub fn implementation(&self) -> TypeKey {
        self.implementation
    }

    /// The instance lifetime.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Construct a new instance, ignoring the lifetime.
    pub fn instantiate(&self) -> HandlerInstance {
        (self.factory)()
    }

    fn same_as(&self, other: &Self) -> bool {
        self.contract == other.contract && self.implementation == other.implementation
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("contract", &self.contract)
            .field("implementation", &self.implementation)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ServiceCollection - for collecting bindings
// ============================================================================

/// Builder for constructing a [`ServiceContainer`].
///
/// # Example
/// ```ignore
/// let mut services = ServiceCollection::new();
/// services.bind(HandlerBinding::request::<GreetHandler, GreetRequest, String, _>(|| GreetHandler));
/// let container = Arc::new(services.build());
/// ```
#[derive(Debug, Default)]
pub struct ServiceCollection {
    bindings: Vec<HandlerBinding>,
}

impl ServiceCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding, even if an identical one exists.
    pub fn bind(&mut self, binding: HandlerBinding) -> &mut Self {
        self.bindings.push(binding);
        self
    }

    /// Append a binding unless the same implementation is already bound under
    /// the same contract. Returns whether it was added.
    pub fn try_bind(&mut self, binding: HandlerBinding) -> bool {
        if self.bindings.iter().any(|b| b.same_as(&binding)) {
            return false;
        }
        self.bindings.push(binding);
        true
    }

    /// Whether anything is bound under `contract`.
    pub fn contains(&self, contract: &Contract) -> bool {
        self.bindings.iter().any(|b| b.contract == *contract)
    }

    /// All bindings, in registration order.
    pub fn bindings(&self) -> &[HandlerBinding] {
        &self.bindings
    }

    /// Get the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Freeze the collection.
    pub fn build(self) -> ServiceContainer {
        let mut registrations: HashMap<Contract, Vec<Registration>> = HashMap::new();
        for binding in self.bindings {
            registrations
                .entry(binding.contract)
                .or_default()
                .push(Registration {
                    binding,
                    singleton: OnceLock::new(),
                });
        }
        ServiceContainer { registrations }
    }
}

// ============================================================================
// ServiceContainer - immutable, thread-safe binding table
// ============================================================================

struct Registration {
    binding: HandlerBinding,
    singleton: OnceLock<HandlerInstance>,
}

impl Registration {
    fn resolve(&self) -> HandlerInstance {
        match self.binding.lifetime {
            Lifetime::Transient => self.binding.instantiate(),
            Lifetime::Singleton => self
                .singleton
                .get_or_init(|| self.binding.instantiate())
                .clone(),
        }
    }
}

/// An immutable, thread-safe table of bindings.
///
/// Created by [`ServiceCollection::build`]. Share it via `Arc` between the
/// dispatchers.
pub struct ServiceContainer {
    registrations: HashMap<Contract, Vec<Registration>>,
}

impl ServiceContainer {
    /// Iterate over the bindings for `contract`, in registration order.
    pub fn bindings_for<'a>(
        &'a self,
        contract: &Contract,
    ) -> impl Iterator<Item = &'a HandlerBinding> + 'a {
        self.registrations
            .get(contract)
            .into_iter()
            .flatten()
            .map(|r| &r.binding)
    }

    /// Iterate over every contract with at least one binding.
    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.registrations.keys()
    }

    /// Get the total number of bindings.
    pub fn len(&self) -> usize {
        self.registrations.values().map(Vec::len).sum()
    }

    /// Check if the container is empty.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl ServiceProvider for ServiceContainer {
    fn resolve_one(&self, contract: &Contract) -> Option<HandlerInstance> {
        self.registrations
            .get(contract)
            .and_then(|regs| regs.last())
            .map(Registration::resolve)
    }

    fn resolve_all(&self, contract: &Contract) -> Vec<HandlerInstance> {
        self.registrations
            .get(contract)
            .map(|regs| regs.iter().map(Registration::resolve).collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("contracts", &self.registrations.len())
            .field("bindings", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{BoxError, CancellationToken};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Lookup;
    impl Dispatchable<&'static str> for Lookup {}

    struct Primary;
    impl RequestHandler<Lookup, &'static str> for Primary {
        async fn handle(&self, _: Lookup, _: CancellationToken) -> Result<&'static str, BoxError> {
            Ok("primary")
        }
    }

    struct Override;
    impl RequestHandler<Lookup, &'static str> for Override {
        async fn handle(&self, _: Lookup, _: CancellationToken) -> Result<&'static str, BoxError> {
            Ok("override")
        }
    }

    struct Saved;
    impl Event for Saved {}

    struct Audit;
    impl EventHandler<Saved> for Audit {
        async fn handle(&self, _: &Saved, _: CancellationToken) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct Notify;
    impl EventHandler<Saved> for Notify {
        async fn handle(&self, _: &Saved, _: CancellationToken) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn counted<H>(counter: &Arc<AtomicUsize>, make: fn() -> H) -> impl Fn() -> H + Send + Sync + 'static
    where
        H: 'static,
    {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            make()
        }
    }

    #[test]
    fn resolve_one_returns_the_last_binding() {
        let mut services = ServiceCollection::new();
        services
            .bind(HandlerBinding::request::<Primary, Lookup, &'static str, _>(|| Primary))
            .bind(HandlerBinding::request::<Override, Lookup, &'static str, _>(|| Override));
        let container = services.build();

        let resolved = container
            .resolve_one(&Contract::request::<Lookup, &'static str>())
            .unwrap();

        assert!(resolved.implementation().is::<Override>());
        assert_eq!(container.bindings_for(&Contract::request::<Lookup, &'static str>()).count(), 2);
    }

    #[test]
    fn resolve_all_keeps_registration_order() {
        let mut services = ServiceCollection::new();
        services
            .bind(HandlerBinding::event::<Audit, Saved, _>(|| Audit))
            .bind(HandlerBinding::event::<Notify, Saved, _>(|| Notify));
        let container = services.build();

        let resolved: Vec<_> = container
            .resolve_all(&Contract::event::<Saved>())
            .iter()
            .map(HandlerInstance::implementation)
            .collect();

        assert_eq!(resolved, vec![TypeKey::of::<Audit>(), TypeKey::of::<Notify>()]);
    }

    #[test]
    fn unbound_contracts_resolve_to_nothing() {
        let container = ServiceCollection::new().build();

        assert!(container.is_empty());
        assert!(container.resolve_one(&Contract::request::<Lookup, &'static str>()).is_none());
        assert!(container.resolve_all(&Contract::event::<Saved>()).is_empty());
    }

    #[test]
    fn transient_bindings_construct_per_resolution() {
        let built = Arc::new(AtomicUsize::new(0));
        let mut services = ServiceCollection::new();
        services.bind(HandlerBinding::event::<Audit, Saved, _>(counted(&built, || Audit)));
        let container = services.build();

        container.resolve_all(&Contract::event::<Saved>());
        container.resolve_all(&Contract::event::<Saved>());

        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn singleton_bindings_construct_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let mut services = ServiceCollection::new();
        services.bind(
            HandlerBinding::event::<Audit, Saved, _>(counted(&built, || Audit))
                .with_lifetime(Lifetime::Singleton),
        );
        let container = services.build();

        container.resolve_all(&Contract::event::<Saved>());
        container.resolve_all(&Contract::event::<Saved>());

        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn try_bind_skips_identical_bindings() {
        let mut services = ServiceCollection::new();

        assert!(services.try_bind(HandlerBinding::event::<Audit, Saved, _>(|| Audit)));
        assert!(!services.try_bind(HandlerBinding::event::<Audit, Saved, _>(|| Audit)));
        assert!(services.try_bind(HandlerBinding::event::<Notify, Saved, _>(|| Notify)));
        assert_eq!(services.len(), 2);
        assert!(services.contains(&Contract::event::<Saved>()));
    }
}
