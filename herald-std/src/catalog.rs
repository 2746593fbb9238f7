//! Static handler declarations and module-scoped enumeration.
//!
//! Rust has no runtime reflection, so handler types announce the contracts
//! they implement up front. A [`ContractDeclaration`] is submitted into a
//! link-time collection (via [`declare_handler!`](crate::declare_handler) or the
//! `#[handler]` attribute) tagged with the declaring module path. A
//! [`TypeCatalog`] then answers "which concrete types in these modules declare
//! which contracts".

use crate::container::HandlerBinding;
use herald_core::{
    ConfigurationError, Contract, Dispatchable, Event, EventHandler, RequestHandler, TypeKey,
};
use std::{
    any::type_name,
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    fmt,
};

// ============================================================================
// Declarations
// ============================================================================

/// One `impl RequestHandler<P, R> for H` or `impl EventHandler<E> for H`,
/// recorded at compile time.
///
/// Built in `const` context so it can be handed to `inventory::submit!`.
#[derive(Clone, Copy)]
pub struct ContractDeclaration {
    module: &'static str,
    declare: fn() -> HandlerBinding,
}

impl ContractDeclaration {
    /// Declare that `H` implements `RequestHandler<D, R>`, inside `module`.
    pub const fn request<H, D, R>(module: &'static str) -> Self
    where
        H: RequestHandler<D, R> + Default,
        D: Dispatchable<R>,
        R: Send + 'static,
    {
        Self {
            module,
            declare: declare_request::<H, D, R>,
        }
    }

    /// Declare that `H` implements `EventHandler<E>`, inside `module`.
    pub const fn event<H, E>(module: &'static str) -> Self
    where
        H: EventHandler<E> + Default,
        E: Event,
    {
        Self {
            module,
            declare: declare_event::<H, E>,
        }
    }

    /// The module path the handler was declared in.
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Produce the transient binding for this declaration.
    pub fn binding(&self) -> HandlerBinding {
        (self.declare)()
    }
}

impl fmt::Debug for ContractDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = self.binding();
        f.debug_struct("ContractDeclaration")
            .field("module", &self.module)
            .field("contract", &binding.contract())
            .field("implementation", &binding.implementation())
            .finish()
    }
}

fn declare_request<H, D, R>() -> HandlerBinding
where
    H: RequestHandler<D, R> + Default,
    D: Dispatchable<R>,
    R: Send + 'static,
{
    HandlerBinding::request::<H, D, R, _>(H::default)
}

fn declare_event<H, E>() -> HandlerBinding
where
    H: EventHandler<E> + Default,
    E: Event,
{
    HandlerBinding::event::<H, E, _>(H::default)
}

inventory::collect!(ContractDeclaration);

/// Declare the contracts a handler type implements so that scanning its
/// module picks it up.
///
/// The handler must implement `Default`; scanned bindings construct a fresh
/// instance per dispatch.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct GreetHandler;
///
/// impl RequestHandler<GreetRequest, String> for GreetHandler { /* ... */ }
///
/// declare_handler!(GreetHandler: RequestHandler<GreetRequest, String>);
///
/// // Several contracts at once
/// declare_handler!(AuditHandler: EventHandler<UserCreated>, EventHandler<UserDeleted>);
/// ```
#[macro_export]
macro_rules! declare_handler {
    ($handler:ty :) => {};
    ($handler:ty : RequestHandler<$payload:ty, $result:ty> $(, $($rest:tt)*)?) => {
        $crate::inventory::submit! {
            $crate::ContractDeclaration::request::<$handler, $payload, $result>(
                ::core::module_path!()
            )
        }
        $($crate::declare_handler!($handler : $($rest)*);)?
    };
    ($handler:ty : EventHandler<$event:ty> $(, $($rest:tt)*)?) => {
        $crate::inventory::submit! {
            $crate::ContractDeclaration::event::<$handler, $event>(::core::module_path!())
        }
        $($crate::declare_handler!($handler : $($rest)*);)?
    };
}

// ============================================================================
// Modules
// ============================================================================

/// A `::`-separated module path that scanning is restricted to.
///
/// A module contains itself and every module nested below it, so
/// `my_app::handlers` covers `my_app::handlers::users`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Cow<'static, str>);

impl ModuleId {
    /// Validate and wrap a module path.
    pub fn parse(path: impl Into<Cow<'static, str>>) -> Result<Self, ConfigurationError> {
        let path = path.into();
        let valid = !path.is_empty()
            && path
                .split("::")
                .all(|segment| !segment.is_empty() && !segment.contains(char::is_whitespace));
        if valid {
            Ok(Self(path))
        } else {
            Err(ConfigurationError::InvalidModule(path.into_owned()))
        }
    }

    /// The module `T` is defined in.
    pub fn of<T: ?Sized>() -> Self {
        let path = strip_generics(type_name::<T>());
        match path.rsplit_once("::") {
            Some((module, _)) => Self(Cow::Owned(module.to_owned())),
            None => Self(Cow::Owned(path.to_owned())),
        }
    }

    /// The root module of the crate `T` is defined in.
    pub fn crate_of<T: ?Sized>() -> Self {
        let path = strip_generics(type_name::<T>());
        let root = path.split("::").next().unwrap_or(path);
        Self(Cow::Owned(root.to_owned()))
    }

    /// The module path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `path` is this module or nested inside it.
    pub fn contains(&self, path: &str) -> bool {
        match path.strip_prefix(self.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with("::"),
            None => false,
        }
    }
}

fn strip_generics(name: &str) -> &str {
    name.split('<').next().unwrap_or(name)
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of modules to scan. Duplicates collapse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleSet {
    modules: BTreeSet<ModuleId>,
}

impl ModuleSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Returns whether it was new.
    pub fn insert(&mut self, module: ModuleId) -> bool {
        self.modules.insert(module)
    }

    /// Whether any module in the set contains `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.modules.iter().any(|m| m.contains(path))
    }

    /// Iterate over the modules in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleId> {
        self.modules.iter()
    }

    /// Get the number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<ModuleId> for ModuleSet {
    fn from_iter<I: IntoIterator<Item = ModuleId>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Catalogs
// ============================================================================

/// A concrete handler type and every contract it declared.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    implementation: TypeKey,
    module: &'static str,
    bindings: Vec<HandlerBinding>,
}

impl TypeDescriptor {
    /// The concrete handler type.
    pub fn implementation(&self) -> TypeKey {
        self.implementation
    }

    /// The module the type was declared in.
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// The contracts the type declared, in declaration order.
    pub fn declared_contracts(&self) -> impl Iterator<Item = Contract> + '_ {
        self.bindings.iter().map(HandlerBinding::contract)
    }

    /// One transient binding per declared contract.
    pub fn bindings(&self) -> &[HandlerBinding] {
        &self.bindings
    }
}

/// Enumerates concrete handler types inside a set of modules.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid TypeCatalog",
    label = "missing `TypeCatalog` implementation",
    note = "Use `InventoryCatalog` for link-time declarations or `StaticCatalog` for an explicit list."
)]
pub trait TypeCatalog {
    /// Every declared handler type whose module lies in `modules`, ordered by
    /// type name.
    fn concrete_types(&self, modules: &ModuleSet) -> Vec<TypeDescriptor>;
}

/// Catalog over every [`ContractDeclaration`] linked into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct InventoryCatalog;

impl TypeCatalog for InventoryCatalog {
    fn concrete_types(&self, modules: &ModuleSet) -> Vec<TypeDescriptor> {
        describe(inventory::iter::<ContractDeclaration>.into_iter(), modules)
    }
}

/// Catalog over an explicit list of declarations.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    declarations: Vec<ContractDeclaration>,
}

impl StaticCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration.
    pub fn declare(mut self, declaration: ContractDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }
}

impl TypeCatalog for StaticCatalog {
    fn concrete_types(&self, modules: &ModuleSet) -> Vec<TypeDescriptor> {
        describe(self.declarations.iter(), modules)
    }
}

fn describe<'a>(
    declarations: impl Iterator<Item = &'a ContractDeclaration>,
    modules: &ModuleSet,
) -> Vec<TypeDescriptor> {
    let mut types: BTreeMap<TypeKey, TypeDescriptor> = BTreeMap::new();
    for declaration in declarations.filter(|d| modules.contains(d.module)) {
        let binding = declaration.binding();
        types
            .entry(binding.implementation())
            .or_insert_with(|| TypeDescriptor {
                implementation: binding.implementation(),
                module: declaration.module,
                bindings: Vec::new(),
            })
            .bindings
            .push(binding);
    }
    types.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{BoxError, CancellationToken};

    mod shop {
        use super::*;

        pub struct Order;
        impl Event for Order {}

        pub struct Quote;
        impl Dispatchable<u64> for Quote {}

        #[derive(Default)]
        pub struct Ledger;

        impl EventHandler<Order> for Ledger {
            async fn handle(&self, _: &Order, _: CancellationToken) -> Result<(), BoxError> {
                Ok(())
            }
        }

        impl RequestHandler<Quote, u64> for Ledger {
            async fn handle(&self, _: Quote, _: CancellationToken) -> Result<u64, BoxError> {
                Ok(7)
            }
        }

        crate::declare_handler!(Ledger: EventHandler<Order>, RequestHandler<Quote, u64>);

        pub mod billing {
            use super::*;

            #[derive(Default)]
            pub struct Invoicer;

            impl EventHandler<Order> for Invoicer {
                async fn handle(&self, _: &Order, _: CancellationToken) -> Result<(), BoxError> {
                    Ok(())
                }
            }

            crate::declare_handler!(Invoicer: EventHandler<Order>);
        }
    }

    fn modules(paths: &[&'static str]) -> ModuleSet {
        paths.iter().map(|p| ModuleId::parse(*p).unwrap()).collect()
    }

    #[test]
    fn module_ids_reject_malformed_paths() {
        assert!(ModuleId::parse("app::handlers").is_ok());
        assert_eq!(
            ModuleId::parse(""),
            Err(ConfigurationError::InvalidModule(String::new()))
        );
        assert!(ModuleId::parse("app::").is_err());
        assert!(ModuleId::parse("app::::x").is_err());
        assert!(ModuleId::parse("app handlers").is_err());
    }

    #[test]
    fn modules_contain_nested_paths_only() {
        let module = ModuleId::parse("app::handlers").unwrap();

        assert!(module.contains("app::handlers"));
        assert!(module.contains("app::handlers::users"));
        assert!(!module.contains("app::handlers_v2"));
        assert!(!module.contains("app"));
    }

    #[test]
    fn module_of_a_type_is_its_parent_path() {
        let module = ModuleId::of::<shop::billing::Invoicer>();
        assert!(module.as_str().ends_with("catalog::tests::shop::billing"));

        let root = ModuleId::crate_of::<shop::Ledger>();
        assert_eq!(root.as_str(), "herald_std");

        let generic = ModuleId::of::<Vec<shop::Ledger>>();
        assert_eq!(generic.as_str(), "alloc::vec");
    }

    #[test]
    fn inventory_catalog_groups_contracts_by_type() {
        let shop = ModuleId::of::<shop::Ledger>();
        let types = InventoryCatalog.concrete_types(&ModuleSet::from_iter([shop]));

        assert_eq!(types.len(), 2);
        let ledger = types
            .iter()
            .find(|t| t.implementation().is::<shop::Ledger>())
            .unwrap();
        let contracts: Vec<_> = ledger.declared_contracts().collect();
        assert_eq!(contracts.len(), 2);
        assert!(contracts.contains(&Contract::event::<shop::Order>()));
        assert!(contracts.contains(&Contract::request::<shop::Quote, u64>()));
    }

    #[test]
    fn catalog_filters_by_module() {
        let billing = ModuleId::of::<shop::billing::Invoicer>();
        let types = InventoryCatalog.concrete_types(&ModuleSet::from_iter([billing]));

        assert_eq!(types.len(), 1);
        assert!(types[0].implementation().is::<shop::billing::Invoicer>());

        let elsewhere = InventoryCatalog.concrete_types(&modules(&["no_such_crate"]));
        assert!(elsewhere.is_empty());
    }

    #[test]
    fn static_catalog_uses_only_its_declarations() {
        let catalog = StaticCatalog::new()
            .declare(ContractDeclaration::event::<shop::Ledger, shop::Order>("app::shop"));

        let types = catalog.concrete_types(&modules(&["app"]));

        assert_eq!(types.len(), 1);
        assert_eq!(types[0].module(), "app::shop");
        assert_eq!(
            types[0].declared_contracts().collect::<Vec<_>>(),
            vec![Contract::event::<shop::Order>()]
        );
    }
}
