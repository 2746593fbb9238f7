//! # herald-std
//!
//! Standard implementations for the Herald dispatch runtime.
//!
//! This crate provides:
//! - **Container**: [`ServiceCollection`](container::ServiceCollection) and the
//!   frozen [`ServiceContainer`](container::ServiceContainer)
//! - **Declarations**: [`ContractDeclaration`], [`declare_handler!`] and the
//!   [`TypeCatalog`](catalog::TypeCatalog) implementations
//! - **Scanning**: [`configure`](scan::configure) and
//!   [`HandlerRegistry`](scan::HandlerRegistry)
//! - **Dispatch**: [`RequestDispatcher`](request::RequestDispatcher),
//!   [`EventDispatcher`](event::EventDispatcher) and the combined
//!   [`Herald`](runtime::Herald)
//! - **Delivery strategies**: spawned or in-task event fan-out

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use herald_core;

// Modules
pub mod catalog;
pub mod container;
pub mod delivery;
pub mod event;
pub mod request;
pub mod runtime;
pub mod scan;
pub mod testing;

pub use catalog::ContractDeclaration;
pub use inventory;
