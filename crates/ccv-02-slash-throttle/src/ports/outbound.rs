//! Driven Ports (SPI - Outbound Dependencies)

use async_trait::async_trait;
use shared_types::{
    ConsumerConsAddress, ConsumerId, InfractionKind, OperatorAddress, ProviderConsAddress,
    StakingValidator, StoreError,
};

/// Staking queries and the jail command consumed by the throttle.
///
/// Power values come from the staking module's last-validator-power table,
/// which only changes at its own end-of-block processing: a validator jailed
/// mid-block keeps its table power until the block closes. The meter is
/// decremented by that pre-jailing power.
#[async_trait]
pub trait StakingSlashing: Send + Sync {
    /// The validator whose provider consensus address is `addr`, if any.
    async fn validator_by_cons_addr(&self, addr: &ProviderConsAddress)
        -> Option<StakingValidator>;

    /// Power of the validator in the last-validator-power table.
    async fn last_validator_power(&self, operator: &OperatorAddress) -> i64;

    /// Total bonded power in the last-total-power table.
    async fn last_total_power(&self) -> i64;

    /// Jail the validator behind `addr` for the given infraction.
    async fn jail(&self, addr: &ProviderConsAddress, infraction: InfractionKind);
}

/// Cross-chain address lookup, answered by the key-assignment subsystem.
#[async_trait]
pub trait ConsumerAddressResolver: Send + Sync {
    /// Resolve a consumer consensus address to the provider validator behind
    /// it. Unassigned addresses resolve to themselves (default assignment).
    async fn provider_addr(
        &self,
        consumer: &ConsumerId,
        addr: &ConsumerConsAddress,
    ) -> Result<ProviderConsAddress, StoreError>;
}
