//! Error types for the Slash Throttle subsystem.
//!
//! None of these fail the block: packet-path failures become error
//! acknowledgements, and an exhausted meter is not an error at all (it is the
//! bounce acknowledgement on the normal flow).

use shared_types::StoreError;
use thiserror::Error;

/// Slash Throttle subsystem errors.
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// A throttle parameter failed validation.
    #[error("invalid throttle parameter: {reason}")]
    InvalidParam { reason: String },

    /// The slash meter was used before genesis initialization.
    #[error("slash meter not initialized")]
    MeterNotInitialized,

    /// The state store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for throttle operations.
pub type ThrottleResult<T> = Result<T, ThrottleError>;
