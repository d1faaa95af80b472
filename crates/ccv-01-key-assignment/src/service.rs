//! Key Assignment Service - Core business logic.

use async_trait::async_trait;
use shared_types::{
    BlockContext, ConsensusPublicKey, ConsumerConsAddress, ConsumerId, ProviderConsAddress,
    StakingValidator, StateStore,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::phase::{ConsumerPhase, ConsumerRecord};
use crate::domain::store::KeyAssignmentStore;
use crate::error::{KeyAssignmentError, KeyAssignmentResult};
use crate::metrics;
use crate::msgs::ProviderMsg;
use crate::ports::inbound::KeyAssignmentApi;
use crate::ports::outbound::StakingQuery;

/// Key Assignment Service implementation.
pub struct KeyAssignmentService<S>
where
    S: StakingQuery,
{
    store: KeyAssignmentStore,
    staking: Arc<S>,
}

impl<S> KeyAssignmentService<S>
where
    S: StakingQuery,
{
    /// Create a new key-assignment service over the shared state store.
    pub fn new(state: Arc<dyn StateStore>, staking: Arc<S>) -> Self {
        Self {
            store: KeyAssignmentStore::new(state),
            staking,
        }
    }

    /// Typed store handle, for invariant checks and test assertions.
    pub fn store(&self) -> &KeyAssignmentStore {
        &self.store
    }

    /// Dispatch a governance/admin message.
    ///
    /// Returns the allocated consumer id for `MsgCreateConsumer`.
    pub async fn handle_msg(
        &self,
        msg: ProviderMsg,
        ctx: BlockContext,
    ) -> KeyAssignmentResult<Option<ConsumerId>> {
        msg.validate()?;
        match msg {
            ProviderMsg::CreateConsumer(m) => {
                let id = self.create_consumer(m.chain_id).await?;
                Ok(Some(id))
            }
            ProviderMsg::UpdateConsumer(m) => {
                self.update_consumer(&m.consumer_id, m.chain_id).await?;
                Ok(None)
            }
            ProviderMsg::AssignConsumerKey(m) => {
                let validator = self
                    .staking
                    .validator_by_operator(&m.operator)
                    .await
                    .ok_or(KeyAssignmentError::SignerNotValidator {
                        operator: m.operator,
                    })?;
                self.assign_consumer_key(&m.consumer_id, &validator, m.consumer_key, ctx)
                    .await?;
                Ok(None)
            }
        }
    }

    /// The lifecycle phase of `consumer`, or `UnknownConsumer`.
    fn known_phase(&self, consumer: &ConsumerId) -> KeyAssignmentResult<ConsumerPhase> {
        self.store
            .phase(consumer)?
            .ok_or_else(|| KeyAssignmentError::UnknownConsumer {
                consumer_id: consumer.as_str().to_string(),
            })
    }
}

#[async_trait]
impl<S> KeyAssignmentApi for KeyAssignmentService<S>
where
    S: StakingQuery,
{
    async fn create_consumer(&self, chain_id: String) -> KeyAssignmentResult<ConsumerId> {
        if chain_id.is_empty() {
            return Err(KeyAssignmentError::MalformedMessage {
                reason: "chain id must not be empty".to_string(),
            });
        }
        let id = self.store.next_consumer_id()?;
        self.store
            .set_consumer_record(&id, &ConsumerRecord { chain_id })?;
        self.store.set_phase(&id, ConsumerPhase::Registered)?;
        info!("[ccv-01] registered consumer {}", id);
        Ok(id)
    }

    async fn update_consumer(
        &self,
        consumer: &ConsumerId,
        chain_id: String,
    ) -> KeyAssignmentResult<()> {
        self.known_phase(consumer)?;
        if chain_id.is_empty() {
            return Err(KeyAssignmentError::MalformedMessage {
                reason: "chain id must not be empty".to_string(),
            });
        }
        self.store
            .set_consumer_record(consumer, &ConsumerRecord { chain_id })?;
        Ok(())
    }

    async fn set_consumer_phase(
        &self,
        consumer: &ConsumerId,
        phase: ConsumerPhase,
    ) -> KeyAssignmentResult<()> {
        if self.store.consumer_record(consumer)?.is_none() {
            return Err(KeyAssignmentError::UnknownConsumer {
                consumer_id: consumer.as_str().to_string(),
            });
        }
        self.store.set_phase(consumer, phase)?;
        info!("[ccv-01] consumer {} moved to phase {}", consumer, phase.as_str());
        Ok(())
    }

    async fn consumer_phase(
        &self,
        consumer: &ConsumerId,
    ) -> KeyAssignmentResult<Option<ConsumerPhase>> {
        Ok(self.store.phase(consumer)?)
    }

    async fn all_consumers(&self) -> KeyAssignmentResult<Vec<(ConsumerId, ConsumerRecord)>> {
        Ok(self.store.all_consumers()?)
    }

    async fn launched_consumers(&self) -> KeyAssignmentResult<Vec<ConsumerId>> {
        let mut launched = Vec::new();
        for (id, _) in self.store.all_consumers()? {
            if matches!(self.store.phase(&id)?, Some(phase) if phase.is_launched()) {
                launched.push(id);
            }
        }
        Ok(launched)
    }

    async fn assign_consumer_key(
        &self,
        consumer: &ConsumerId,
        validator: &StakingValidator,
        consumer_key: ConsensusPublicKey,
        ctx: BlockContext,
    ) -> KeyAssignmentResult<()> {
        let phase = self.known_phase(consumer)?;
        if !phase.accepts_key_assignment() {
            metrics::record_assignment_rejected("phase_invalid");
            return Err(KeyAssignmentError::PhaseInvalid {
                consumer_id: consumer.as_str().to_string(),
                phase,
            });
        }

        let provider_addr = validator.provider_cons_addr();
        let new_consumer_addr = consumer_key.to_consumer_addr();

        // The address may already be claimed, either as a current assignment
        // or as a rotated-away address still inside the unbonding window.
        // Claims by the same validator are fine (re-assigning an old key).
        if let Some(claimant) = self
            .store
            .provider_by_consumer_addr(consumer, &new_consumer_addr)?
        {
            if claimant != provider_addr {
                metrics::record_assignment_rejected("already_taken");
                return Err(KeyAssignmentError::AlreadyTaken {
                    consumer_addr: new_consumer_addr,
                });
            }
        }

        // A key whose derived address belongs to an active validator is that
        // validator's provider key.
        if let Some(active) = self
            .staking
            .validator_by_cons_addr(&new_consumer_addr.as_provider_addr())
            .await
        {
            if active.operator != validator.operator {
                metrics::record_assignment_rejected("collides_with_active");
                return Err(KeyAssignmentError::CollidesWithActiveValidator {
                    provider_addr: active.provider_cons_addr(),
                });
            }
            // Assigning one's own provider key is only meaningful as an undo
            // of an earlier assignment; as a first assignment it is a no-op
            // and is rejected.
            if self.store.assigned_key(consumer, &provider_addr)?.is_none() {
                metrics::record_assignment_rejected("default_not_reassignable");
                return Err(KeyAssignmentError::DefaultNotReassignable);
            }
        }

        let previous = self.store.assigned_key(consumer, &provider_addr)?;

        self.store
            .set_assigned_key(consumer, &provider_addr, &consumer_key)?;
        self.store
            .set_provider_by_consumer_addr(consumer, &new_consumer_addr, &provider_addr)?;

        // The old address must stay resolvable for the unbonding window so a
        // late slash packet about it cannot be mis-attributed.
        if let Some(old_key) = previous {
            let prune_at = ctx
                .time
                .saturating_add(self.staking.unbonding_time().await);
            self.store
                .append_addr_to_prune(consumer, prune_at, old_key.to_consumer_addr())?;
        }

        metrics::record_assignment();
        debug!(
            "[ccv-01] consumer {} assignment {:?} -> {:?}",
            consumer, provider_addr, new_consumer_addr
        );
        Ok(())
    }

    async fn assigned_consumer_key(
        &self,
        consumer: &ConsumerId,
        addr: &ProviderConsAddress,
    ) -> KeyAssignmentResult<Option<ConsensusPublicKey>> {
        Ok(self.store.assigned_key(consumer, addr)?)
    }

    async fn resolve_consumer_key(
        &self,
        consumer: &ConsumerId,
        validator: &StakingValidator,
    ) -> KeyAssignmentResult<ConsensusPublicKey> {
        let assigned = self
            .store
            .assigned_key(consumer, &validator.provider_cons_addr())?;
        Ok(assigned.unwrap_or(validator.consensus_key))
    }

    async fn provider_addr_from_consumer_addr(
        &self,
        consumer: &ConsumerId,
        addr: &ConsumerConsAddress,
    ) -> KeyAssignmentResult<ProviderConsAddress> {
        match self.store.provider_by_consumer_addr(consumer, addr)? {
            Some(provider_addr) => Ok(provider_addr),
            // No entry means the default assignment: the consumer address is
            // the validator's own provider address.
            None => Ok(addr.as_provider_addr()),
        }
    }

    async fn prune_key_assignments(
        &self,
        consumer: &ConsumerId,
        ctx: BlockContext,
    ) -> KeyAssignmentResult<usize> {
        let mut pruned = 0usize;
        for (_, bucket) in self.store.consume_addrs_to_prune(consumer, ctx.time)? {
            for addr in bucket.addresses {
                let claimant = match self.store.provider_by_consumer_addr(consumer, &addr)? {
                    Some(claimant) => claimant,
                    None => continue,
                };
                // A validator may have re-assigned the key it once rotated
                // away; the current assignment takes precedence over pruning.
                let still_current = self
                    .store
                    .assigned_key(consumer, &claimant)?
                    .map(|key| key.to_consumer_addr() == addr)
                    .unwrap_or(false);
                if !still_current {
                    self.store
                        .delete_provider_by_consumer_addr(consumer, &addr)?;
                    pruned += 1;
                }
            }
        }
        if pruned > 0 {
            metrics::record_pruned_addresses(pruned as u64);
            debug!(
                "[ccv-01] pruned {} reverse-lookup entries on consumer {}",
                pruned, consumer
            );
        }
        Ok(pruned)
    }
}
