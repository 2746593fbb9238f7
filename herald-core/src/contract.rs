//! Contract keys.
//!
//! A contract is the capability shape a handler commits to: request handling
//! for one `(payload, result)` pair, or event handling for one payload type.
//! Contracts are plain values keyed by [`TypeId`], so a registry lookup never
//! needs runtime reflection.

use std::{
    any::{TypeId, type_name},
    fmt,
};

/// A stable identifier for a Rust type: its [`TypeId`] plus its name for
/// diagnostics.
///
/// Equality and hashing are driven by the `TypeId`; the name is carried along
/// so errors and logs can say which type was involved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    name: &'static str,
    id: TypeId,
}

impl TypeKey {
    /// The key of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name, as reported by [`type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether this key identifies `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The capability shape a handler implementation is bound under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Contract {
    /// `RequestHandler<payload, result>`: exactly one handler is expected.
    Request {
        /// The dispatchable type.
        payload: TypeKey,
        /// The result type the dispatchable expects back.
        result: TypeKey,
    },
    /// `EventHandler<payload>`: any number of subscribers.
    Event {
        /// The event type.
        payload: TypeKey,
    },
}

impl Contract {
    /// The request contract for `D` answered with `R`.
    pub fn request<D: ?Sized + 'static, R: 'static>() -> Self {
        Self::Request {
            payload: TypeKey::of::<D>(),
            result: TypeKey::of::<R>(),
        }
    }

    /// The event contract for `E`.
    pub fn event<E: ?Sized + 'static>() -> Self {
        Self::Event {
            payload: TypeKey::of::<E>(),
        }
    }

    /// The payload type this contract routes on.
    pub fn payload(&self) -> TypeKey {
        match self {
            Self::Request { payload, .. } | Self::Event { payload } => *payload,
        }
    }

    /// The result type, for request contracts.
    pub fn result(&self) -> Option<TypeKey> {
        match self {
            Self::Request { result, .. } => Some(*result),
            Self::Event { .. } => None,
        }
    }

    /// Whether this is a request contract.
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { payload, result } => write!(f, "RequestHandler<{payload}, {result}>"),
            Self::Event { payload } => write!(f, "EventHandler<{payload}>"),
        }
    }
}

/// How long a resolved handler instance lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A fresh instance is produced for every resolution (one per dispatch).
    #[default]
    Transient,
    /// One instance is created on first resolution and shared afterwards.
    Singleton,
}
