//! Startup scanning and registration.
//!
//! [`configure`] is the single registration entry point: it scans the chosen
//! modules for declared handlers and binds each contract, transiently, into a
//! [`ServiceCollection`].

use crate::{
    catalog::{InventoryCatalog, ModuleId, ModuleSet, TypeCatalog},
    container::{HandlerBinding, ServiceCollection},
};
use herald_core::{ConfigurationError, Contract, TypeKey};
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashSet},
};
use tracing::{debug, info, warn};

/// Which modules the scanner looks at.
///
/// # Example
///
/// ```rust,ignore
/// configure(&mut services, |options| {
///     options
///         .scan_crate_of::<GreetRequest>()
///         .scan_module("billing::handlers");
/// })?;
/// ```
#[derive(Debug, Default)]
pub struct DispatcherOptions {
    modules: Vec<Cow<'static, str>>,
}

impl DispatcherOptions {
    /// Create options with nothing to scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a module path and everything nested below it.
    pub fn scan_module(&mut self, path: impl Into<Cow<'static, str>>) -> &mut Self {
        self.modules.push(path.into());
        self
    }

    /// Scan the module `T` is defined in.
    pub fn scan_module_of<T: ?Sized>(&mut self) -> &mut Self {
        self.scan_module(ModuleId::of::<T>().as_str().to_owned())
    }

    /// Scan the whole crate `T` is defined in.
    pub fn scan_crate_of<T: ?Sized>(&mut self) -> &mut Self {
        self.scan_module(ModuleId::crate_of::<T>().as_str().to_owned())
    }

    /// Validate the configured paths into a module set.
    pub fn module_set(&self) -> Result<ModuleSet, ConfigurationError> {
        self.modules
            .iter()
            .map(|path| ModuleId::parse(path.clone()))
            .collect()
    }
}

/// The bindings produced by one scan.
///
/// Holds the scan result only. Dispatch never reads it; it is copied into a
/// [`ServiceCollection`] with [`register_into`](Self::register_into).
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    bindings: Vec<HandlerBinding>,
}

impl HandlerRegistry {
    /// Scan `modules` through `catalog`.
    ///
    /// Each `(contract, implementation)` pair yields exactly one transient
    /// binding, however many times it was declared or however many of the
    /// modules overlap. Bindings are ordered by implementation type name.
    pub fn scan<C>(catalog: &C, modules: &ModuleSet) -> Result<Self, ConfigurationError>
    where
        C: TypeCatalog + ?Sized,
    {
        if modules.is_empty() {
            return Err(ConfigurationError::NoModules);
        }

        let mut seen: HashSet<(Contract, TypeKey)> = HashSet::new();
        let mut bindings = Vec::new();
        for descriptor in catalog.concrete_types(modules) {
            for binding in descriptor.bindings() {
                if !seen.insert((binding.contract(), binding.implementation())) {
                    continue;
                }
                debug!(
                    contract = %binding.contract(),
                    implementation = %binding.implementation(),
                    module = descriptor.module(),
                    "Binding handler"
                );
                bindings.push(binding.clone());
            }
        }
        // Stable: one implementation keeps its declaration order.
        bindings.sort_by_key(HandlerBinding::implementation);

        let registry = Self { bindings };
        for (contract, count) in registry.request_contract_counts() {
            if count > 1 {
                warn!(
                    %contract,
                    implementations = count,
                    "Multiple request handlers bound; the last registered will be used"
                );
            }
        }
        info!(
            modules = modules.len(),
            bindings = registry.len(),
            "Handler scan complete"
        );
        Ok(registry)
    }

    /// The scanned bindings.
    pub fn bindings(&self) -> &[HandlerBinding] {
        &self.bindings
    }

    /// Bindings registered under `contract`, in scan order.
    pub fn bindings_for<'a>(
        &'a self,
        contract: &'a Contract,
    ) -> impl Iterator<Item = &'a HandlerBinding> + 'a {
        self.bindings
            .iter()
            .filter(move |b| b.contract() == *contract)
    }

    /// Get the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the scan found nothing.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Copy every binding into `services`, skipping ones already present.
    ///
    /// Returns how many were added.
    pub fn register_into(&self, services: &mut ServiceCollection) -> usize {
        self.bindings
            .iter()
            .filter(|binding| services.try_bind((*binding).clone()))
            .count()
    }

    fn request_contract_counts(&self) -> BTreeMap<Contract, usize> {
        let mut counts = BTreeMap::new();
        for binding in self.bindings.iter().filter(|b| b.contract().is_request()) {
            *counts.entry(binding.contract()).or_insert(0) += 1;
        }
        counts
    }
}

/// Scan the configured modules for declared handlers and bind them into
/// `services`.
///
/// Fails with [`ConfigurationError::NoModules`] when no module was configured,
/// even if `services` already holds bindings added by hand. Only
/// [`HeraldBuilder::build`](crate::runtime::HeraldBuilder::build) accepts
/// manual bindings without a module. Calling it again with overlapping modules adds nothing twice.
///
/// # Example
///
/// ```rust,ignore
/// let mut services = ServiceCollection::new();
/// herald::configure(&mut services, |o| {
///     o.scan_crate_of::<GreetRequest>();
/// })?;
/// let dispatcher = RequestDispatcher::new(Arc::new(services.build()));
/// ```
pub fn configure<F>(services: &mut ServiceCollection, options: F) -> Result<(), ConfigurationError>
where
    F: FnOnce(&mut DispatcherOptions),
{
    let mut opts = DispatcherOptions::new();
    options(&mut opts);
    configure_with(services, &InventoryCatalog, &opts)
}

/// [`configure`] against an explicit catalog.
pub fn configure_with<C>(
    services: &mut ServiceCollection,
    catalog: &C,
    options: &DispatcherOptions,
) -> Result<(), ConfigurationError>
where
    C: TypeCatalog + ?Sized,
{
    let modules = options.module_set()?;
    let registry = HandlerRegistry::scan(catalog, &modules)?;
    let added = registry.register_into(services);
    debug!(added, skipped = registry.len() - added, "Registered scanned handlers");
    Ok(())
}
