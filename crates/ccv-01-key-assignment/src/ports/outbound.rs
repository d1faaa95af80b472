//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Key assignment consumes exactly these staking queries; the staking module
//! itself (delegation, bonding, reward flow) is an external collaborator.

use async_trait::async_trait;
use shared_types::{OperatorAddress, ProviderConsAddress, StakingValidator};
use std::time::Duration;

/// Read-only staking queries needed by key assignment.
///
/// `validator_by_cons_addr` is the collision oracle: a consumer key whose
/// derived address belongs to an *active* validator is that validator's
/// provider key and may not be claimed by anyone else.
#[async_trait]
pub trait StakingQuery: Send + Sync {
    /// The active validator whose provider consensus address is `addr`, if any.
    async fn validator_by_cons_addr(&self, addr: &ProviderConsAddress)
        -> Option<StakingValidator>;

    /// The validator controlled by `operator`, if any.
    async fn validator_by_operator(&self, operator: &OperatorAddress)
        -> Option<StakingValidator>;

    /// The provider's unbonding window. Reverse-lookup entries stay resolvable
    /// for this long after a key is rotated away.
    async fn unbonding_time(&self) -> Duration;
}
