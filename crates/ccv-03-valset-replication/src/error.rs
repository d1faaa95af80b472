//! Error types for the ValSet Replication subsystem.

use shared_types::StoreError;
use thiserror::Error;

/// ValSet Replication subsystem errors.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// The transport refused an outbound packet.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The state store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for replication operations.
pub type ReplicationResult<T> = Result<T, ReplicationError>;
