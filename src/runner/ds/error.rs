use thiserror::Error;

/// Errors raised by user code while an activation is being driven. They
/// propagate out of the driving call and leave the stepper terminated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeError {
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
}
