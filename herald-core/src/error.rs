//! Error types for Herald.
//!
//! - [`HeraldError`] - Top-level error type
//! - [`ConfigurationError`] - Registration preconditions unmet
//! - [`RequestError`] - Request dispatch failures (routing or passthrough)
//! - [`AggregateHandlerExecutionError`] - Every failed subscriber of one event

use crate::contract::{Contract, TypeKey};
use std::{error::Error, fmt};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Top-level error type for all Herald operations.
#[derive(Error, Debug)]
pub enum HeraldError {
    /// Handler registration could not proceed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A request could not be routed, or its handler failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// One or more event subscribers failed.
    #[error(transparent)]
    Event(#[from] AggregateHandlerExecutionError),
}

/// Registration preconditions were not met. Fatal to startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The module set handed to the scanner was empty.
    #[error("no modules were configured for handler scanning")]
    NoModules,

    /// A module identifier is not a valid `::`-separated path.
    #[error("invalid module identifier `{0}`")]
    InvalidModule(String),
}

/// No handler is bound for a dispatchable's runtime type and result type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no handler registered for dispatchable type `{payload}` returning `{result}`")]
pub struct UnregisteredHandlerError {
    payload: TypeKey,
    result: TypeKey,
}

impl UnregisteredHandlerError {
    /// Create the error for a `(payload, result)` pair.
    pub fn new(payload: TypeKey, result: TypeKey) -> Self {
        Self { payload, result }
    }

    /// The runtime type of the dispatched payload.
    pub fn payload(&self) -> TypeKey {
        self.payload
    }

    /// The requested result type.
    pub fn result(&self) -> TypeKey {
        self.result
    }
}

/// A handler instance bound under a contract could not honour it.
///
/// The typed registration API makes this unreachable; it is reported rather
/// than panicking when a hand-written provider hands out the wrong instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handler instance resolved for `{contract}` does not satisfy it")]
pub struct ContractMismatch {
    contract: Contract,
}

impl ContractMismatch {
    /// Create the error for `contract`.
    pub fn new(contract: Contract) -> Self {
        Self { contract }
    }

    /// The contract that was not honoured.
    pub fn contract(&self) -> Contract {
        self.contract
    }
}

/// Errors returned by request dispatch.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Routing failure: nothing is bound for the payload.
    #[error(transparent)]
    Unregistered(#[from] UnregisteredHandlerError),

    /// The handler's own failure, passed through unchanged.
    #[error(transparent)]
    Execution(BoxError),

    /// The resolved instance did not match the contract.
    #[error(transparent)]
    Mismatch(#[from] ContractMismatch),
}

impl RequestError {
    /// Whether this is a routing failure.
    pub fn is_unregistered(&self) -> bool {
        matches!(self, Self::Unregistered(_))
    }

    /// The handler's error, if the handler ran and failed.
    pub fn handler_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Self::Execution(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Take the handler's error out, if the handler ran and failed.
    pub fn into_handler_error(self) -> Option<BoxError> {
        match self {
            Self::Execution(err) => Some(err),
            _ => None,
        }
    }
}

/// A handler did not complete normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerAbort {
    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The handler's task was torn down before it finished.
    #[error("handler task was aborted before completion")]
    Aborted,
}

/// One event subscriber's failure, tagged with the implementation that
/// raised it.
#[derive(Error, Debug)]
#[error("event handler `{handler}` failed")]
pub struct HandlerExecutionError {
    handler: TypeKey,
    source: BoxError,
}

impl HandlerExecutionError {
    /// Wrap `source`, raised by `handler`.
    pub fn new(handler: TypeKey, source: impl Into<BoxError>) -> Self {
        Self {
            handler,
            source: source.into(),
        }
    }

    /// The implementation type that failed.
    pub fn handler(&self) -> TypeKey {
        self.handler
    }

    /// The handler's own error.
    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.source.as_ref()
    }

    /// Take the handler's own error.
    pub fn into_error(self) -> BoxError {
        self.source
    }
}

/// Every failure of one event dispatch.
///
/// Built only when at least one subscriber failed. No failure is dropped:
/// [`failures`](Self::failures) lists them in subscriber registration order.
#[derive(Debug)]
pub struct AggregateHandlerExecutionError {
    event: TypeKey,
    attempted: usize,
    failures: Vec<HandlerExecutionError>,
}

impl AggregateHandlerExecutionError {
    /// Aggregate `failures` out of `attempted` invocations for `event`.
    pub fn new(event: TypeKey, attempted: usize, failures: Vec<HandlerExecutionError>) -> Self {
        Self {
            event,
            attempted,
            failures,
        }
    }

    /// The dispatched event type.
    pub fn event(&self) -> TypeKey {
        self.event
    }

    /// How many subscribers were invoked.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// The individual failures.
    pub fn failures(&self) -> &[HandlerExecutionError] {
        &self.failures
    }

    /// Take the individual failures.
    pub fn into_failures(self) -> Vec<HandlerExecutionError> {
        self.failures
    }
}

impl fmt::Display for AggregateHandlerExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} handlers failed for event `{}`",
            self.failures.len(),
            self.attempted,
            self.event
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{failure} ({})", failure.error())?;
        }
        Ok(())
    }
}

impl Error for AggregateHandlerExecutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures.first().map(|f| f as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Signup;
    struct AuditLog;
    struct Mailer;

    #[test]
    fn aggregate_reports_every_failure() {
        let err = AggregateHandlerExecutionError::new(
            TypeKey::of::<Signup>(),
            3,
            vec![
                HandlerExecutionError::new(TypeKey::of::<AuditLog>(), "disk full"),
                HandlerExecutionError::new(TypeKey::of::<Mailer>(), "smtp down"),
            ],
        );

        let shown = err.to_string();
        assert!(shown.starts_with("2 of 3 handlers failed"));
        assert!(shown.contains("disk full"));
        assert!(shown.contains("smtp down"));
        assert!(shown.contains("AuditLog"));
        assert!(shown.contains("Mailer"));
        assert!(err.source().is_some());
    }

    #[test]
    fn handler_failure_leaves_its_cause_to_the_source_chain() {
        let err = HandlerExecutionError::new(TypeKey::of::<AuditLog>(), "disk full");

        assert!(err.to_string().contains("AuditLog"));
        assert!(!err.to_string().contains("disk full"));
        assert_eq!(err.source().map(|e| e.to_string()), Some("disk full".into()));
    }

    #[test]
    fn execution_errors_pass_through_unchanged() {
        let err = RequestError::Execution("boom".into());

        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_unregistered());
        assert_eq!(err.into_handler_error().map(|e| e.to_string()), Some("boom".into()));
    }

    #[test]
    fn unregistered_error_names_the_payload() {
        let err: RequestError =
            UnregisteredHandlerError::new(TypeKey::of::<Signup>(), TypeKey::of::<String>()).into();

        assert!(err.is_unregistered());
        assert!(err.to_string().contains("Signup"));
        assert!(err.handler_error().is_none());
    }
}
