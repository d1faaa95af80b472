//! Driven Ports (SPI - Outbound Dependencies)

use async_trait::async_trait;
use shared_types::{
    ConsensusPublicKey, ConsumerId, ProviderConsAddress, StakingValidator, StoreError,
    ValidatorSetChangePacketData,
};

use crate::error::ReplicationResult;

/// A bonded provider validator with its voting power.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BondedValidator {
    pub validator: StakingValidator,
    pub power: i64,
}

/// The provider's bonded set, as reported by the staking collaborator.
#[async_trait]
pub trait BondedSetProvider: Send + Sync {
    /// All bonded validators with their current powers.
    async fn bonded_validators(&self) -> Vec<BondedValidator>;
}

/// Key-assignment lookups needed to rewrite provider validators into their
/// consumer-side identities.
#[async_trait]
pub trait KeyLookup: Send + Sync {
    /// Consumers currently receiving validator-set updates.
    async fn launched_consumers(&self) -> Result<Vec<ConsumerId>, StoreError>;

    /// The explicitly assigned consumer key for a validator, if any. Absent
    /// means the validator's provider key doubles as its consumer key.
    async fn assigned_consumer_key(
        &self,
        consumer: &ConsumerId,
        addr: &ProviderConsAddress,
    ) -> Result<Option<ConsensusPublicKey>, StoreError>;
}

/// Outbound transport for validator-set-change packets.
#[async_trait]
pub trait PacketSender: Send + Sync {
    async fn send_valset_change(
        &self,
        consumer: &ConsumerId,
        packet: ValidatorSetChangePacketData,
    ) -> ReplicationResult<()>;
}

/// Per-consumer membership filter (opt-in/opt-out, denylist).
pub trait ValidatorFilter: Send + Sync {
    /// Whether `addr` participates in `consumer`'s validator set.
    fn includes(&self, consumer: &ConsumerId, addr: &ProviderConsAddress) -> bool;
}

/// The default filter: every bonded validator participates.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl ValidatorFilter for AllowAll {
    fn includes(&self, _consumer: &ConsumerId, _addr: &ProviderConsAddress) -> bool {
        true
    }
}
