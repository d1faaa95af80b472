//! Error types for the Key Assignment subsystem.

use shared_types::{ConsumerConsAddress, OperatorAddress, ProviderConsAddress, StoreError};
use thiserror::Error;

use crate::domain::phase::ConsumerPhase;

/// Key Assignment subsystem errors.
///
/// Every variant except `Store` is a user-input failure returned to the tx
/// caller with state unchanged; the block itself never fails on them.
#[derive(Debug, Error)]
pub enum KeyAssignmentError {
    /// The consumer id does not identify a known consumer chain.
    #[error("unknown consumer chain: {consumer_id}")]
    UnknownConsumer { consumer_id: String },

    /// The consumer chain is not in a phase that accepts key assignment.
    #[error("consumer {consumer_id} is in phase {phase:?} which does not accept key assignment")]
    PhaseInvalid {
        consumer_id: String,
        phase: ConsumerPhase,
    },

    /// The derived consumer address is already claimed by another validator.
    #[error("consumer address {consumer_addr:?} is already in use by another validator")]
    AlreadyTaken { consumer_addr: ConsumerConsAddress },

    /// The key is the provider consensus key of a different active validator.
    #[error("key is the provider consensus key of active validator {provider_addr:?}")]
    CollidesWithActiveValidator { provider_addr: ProviderConsAddress },

    /// A validator cannot assign its own default key unless a non-default
    /// key was assigned on that consumer before.
    #[error(
        "a validator cannot assign the default key assignment unless its key on that \
         consumer has already been assigned"
    )]
    DefaultNotReassignable,

    /// A message signer does not correspond to a known validator.
    #[error("operator {operator:?} is not a known validator")]
    SignerNotValidator { operator: OperatorAddress },

    /// A message failed structural validation.
    #[error("malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// The state store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for key-assignment operations.
pub type KeyAssignmentResult<T> = Result<T, KeyAssignmentError>;
