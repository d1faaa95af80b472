//! Runtime error type aggregating the member subsystems' errors.

use ccv_01_key_assignment::KeyAssignmentError;
use ccv_02_slash_throttle::ThrottleError;
use ccv_03_valset_replication::ReplicationError;
use thiserror::Error;

/// Errors surfaced by the per-block pipeline.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    KeyAssignment(#[from] KeyAssignmentError),

    #[error(transparent)]
    Throttle(#[from] ThrottleError),

    #[error(transparent)]
    Replication(#[from] ReplicationError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
