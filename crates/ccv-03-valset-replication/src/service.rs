//! ValSet Replication Service - Core business logic.

use shared_types::{BlockContext, ConsumerId, StateStore, ValidatorSetChangePacketData};
use std::sync::Arc;
use tracing::debug;

use crate::domain::diff::{diff_validators, ConsumerValidator};
use crate::domain::store::ReplicationStore;
use crate::error::ReplicationResult;
use crate::ports::outbound::{BondedSetProvider, KeyLookup, PacketSender, ValidatorFilter};

/// ValSet Replication Service implementation.
pub struct ReplicationService<B, K, P, F>
where
    B: BondedSetProvider,
    K: KeyLookup,
    P: PacketSender,
    F: ValidatorFilter,
{
    store: ReplicationStore,
    bonded: Arc<B>,
    keys: Arc<K>,
    sender: Arc<P>,
    filter: F,
}

impl<B, K, P, F> ReplicationService<B, K, P, F>
where
    B: BondedSetProvider,
    K: KeyLookup,
    P: PacketSender,
    F: ValidatorFilter,
{
    /// Create a new replication service over the shared state store.
    pub fn new(
        state: Arc<dyn StateStore>,
        bonded: Arc<B>,
        keys: Arc<K>,
        sender: Arc<P>,
        filter: F,
    ) -> Self {
        Self {
            store: ReplicationStore::new(state),
            bonded,
            keys,
            sender,
            filter,
        }
    }

    /// Typed store handle, for test assertions.
    pub fn store(&self) -> &ReplicationStore {
        &self.store
    }

    /// The consumer-side validator set `consumer` should run right now:
    /// bonded validators with positive power, passing the membership filter,
    /// rewritten to their consumer-side keys.
    pub async fn compute_next_valset(
        &self,
        consumer: &ConsumerId,
    ) -> ReplicationResult<Vec<ConsumerValidator>> {
        let mut next = Vec::new();
        for bonded in self.bonded.bonded_validators().await {
            if bonded.power <= 0 {
                continue;
            }
            let provider_addr = bonded.validator.provider_cons_addr();
            if !self.filter.includes(consumer, &provider_addr) {
                continue;
            }
            let consumer_key = self
                .keys
                .assigned_consumer_key(consumer, &provider_addr)
                .await?
                .unwrap_or(bonded.validator.consensus_key);
            next.push(ConsumerValidator {
                provider_addr,
                consumer_key,
                power: bonded.power,
            });
        }
        Ok(next)
    }

    /// End-of-block replication: for each launched consumer, diff the
    /// current set against the one last sent and emit the changes. The
    /// valset-update id advances once per block.
    pub async fn end_block(&self, _ctx: BlockContext) -> ReplicationResult<()> {
        let valset_update_id = self.store.valset_update_id()?;

        for consumer in self.keys.launched_consumers().await? {
            let next = self.compute_next_valset(&consumer).await?;
            let previous = self.store.consumer_val_set(&consumer)?;
            let updates = diff_validators(&previous, &next);

            if !updates.is_empty() {
                debug!(
                    "[ccv-03] consumer {}: sending {} validator updates (vsc id {})",
                    consumer,
                    updates.len(),
                    valset_update_id
                );
                self.sender
                    .send_valset_change(
                        &consumer,
                        ValidatorSetChangePacketData {
                            valset_update_id,
                            updates,
                            slash_acks: Vec::new(),
                        },
                    )
                    .await?;
            }
            self.store.set_consumer_val_set(&consumer, &next)?;
        }

        self.store.increment_valset_update_id()?;
        Ok(())
    }
}
