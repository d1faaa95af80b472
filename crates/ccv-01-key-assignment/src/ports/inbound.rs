//! Driving Ports (API - Inbound)

use async_trait::async_trait;
use shared_types::{
    BlockContext, ConsensusPublicKey, ConsumerConsAddress, ConsumerId, ProviderConsAddress,
    StakingValidator,
};

use crate::domain::phase::{ConsumerPhase, ConsumerRecord};
use crate::error::KeyAssignmentResult;

/// Primary Key Assignment API.
///
/// All state transitions take the block context explicitly; nothing here
/// reads a wall clock.
#[async_trait]
pub trait KeyAssignmentApi: Send + Sync {
    /// Register a new consumer chain. Returns its allocated consumer id;
    /// the consumer starts in the Registered phase.
    async fn create_consumer(&self, chain_id: String) -> KeyAssignmentResult<ConsumerId>;

    /// Update the chain id recorded for a consumer.
    async fn update_consumer(
        &self,
        consumer: &ConsumerId,
        chain_id: String,
    ) -> KeyAssignmentResult<()>;

    /// Move a consumer to a new lifecycle phase.
    async fn set_consumer_phase(
        &self,
        consumer: &ConsumerId,
        phase: ConsumerPhase,
    ) -> KeyAssignmentResult<()>;

    /// Current lifecycle phase of a consumer, if registered.
    async fn consumer_phase(
        &self,
        consumer: &ConsumerId,
    ) -> KeyAssignmentResult<Option<ConsumerPhase>>;

    /// All registered consumers with their records.
    async fn all_consumers(&self) -> KeyAssignmentResult<Vec<(ConsumerId, ConsumerRecord)>>;

    /// Consumers currently in the Launched phase.
    async fn launched_consumers(&self) -> KeyAssignmentResult<Vec<ConsumerId>>;

    /// Assign `consumer_key` as `validator`'s consensus key on `consumer`.
    ///
    /// On success the previous assignment (if any) is scheduled for pruning
    /// once the unbonding window passes. On failure state is unchanged.
    async fn assign_consumer_key(
        &self,
        consumer: &ConsumerId,
        validator: &StakingValidator,
        consumer_key: ConsensusPublicKey,
        ctx: BlockContext,
    ) -> KeyAssignmentResult<()>;

    /// The explicitly assigned consumer key for a provider validator, if any.
    /// Absent means the validator uses its provider key (the default).
    async fn assigned_consumer_key(
        &self,
        consumer: &ConsumerId,
        addr: &ProviderConsAddress,
    ) -> KeyAssignmentResult<Option<ConsensusPublicKey>>;

    /// The consensus key `validator` uses on `consumer`: the assigned key if
    /// any, otherwise the validator's own provider key.
    async fn resolve_consumer_key(
        &self,
        consumer: &ConsumerId,
        validator: &StakingValidator,
    ) -> KeyAssignmentResult<ConsensusPublicKey>;

    /// Resolve a consumer consensus address to the provider validator behind
    /// it. An address with no reverse-lookup entry is a default assignment,
    /// so it is returned reinterpreted as the provider address itself.
    async fn provider_addr_from_consumer_addr(
        &self,
        consumer: &ConsumerId,
        addr: &ConsumerConsAddress,
    ) -> KeyAssignmentResult<ProviderConsAddress>;

    /// Delete reverse-lookup entries whose prune time has passed. Returns the
    /// number of entries deleted.
    async fn prune_key_assignments(
        &self,
        consumer: &ConsumerId,
        ctx: BlockContext,
    ) -> KeyAssignmentResult<usize>;
}
