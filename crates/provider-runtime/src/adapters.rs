//! Adapters from the key-assignment service onto the resolver ports the
//! throttle and replication subsystems consume.

use async_trait::async_trait;
use std::sync::Arc;

use ccv_01_key_assignment::{
    KeyAssignmentApi, KeyAssignmentError, KeyAssignmentService, StakingQuery,
};
use ccv_02_slash_throttle::ConsumerAddressResolver;
use ccv_03_valset_replication::KeyLookup;
use shared_types::{
    ConsensusPublicKey, ConsumerConsAddress, ConsumerId, ProviderConsAddress, StoreError,
};

/// Answers cross-chain lookups from key-assignment state.
pub struct KeyAssignmentAdapter<S>
where
    S: StakingQuery,
{
    service: Arc<KeyAssignmentService<S>>,
}

impl<S> KeyAssignmentAdapter<S>
where
    S: StakingQuery,
{
    pub fn new(service: Arc<KeyAssignmentService<S>>) -> Self {
        Self { service }
    }
}

impl<S> Clone for KeyAssignmentAdapter<S>
where
    S: StakingQuery,
{
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

/// Read paths through the adapter only hit the store, so any other error
/// variant would indicate a bug in the service surface.
fn into_store_error(error: KeyAssignmentError) -> StoreError {
    match error {
        KeyAssignmentError::Store(e) => e,
        other => StoreError::Backend {
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl<S> ConsumerAddressResolver for KeyAssignmentAdapter<S>
where
    S: StakingQuery,
{
    async fn provider_addr(
        &self,
        consumer: &ConsumerId,
        addr: &ConsumerConsAddress,
    ) -> Result<ProviderConsAddress, StoreError> {
        self.service
            .provider_addr_from_consumer_addr(consumer, addr)
            .await
            .map_err(into_store_error)
    }
}

#[async_trait]
impl<S> KeyLookup for KeyAssignmentAdapter<S>
where
    S: StakingQuery,
{
    async fn launched_consumers(&self) -> Result<Vec<ConsumerId>, StoreError> {
        self.service
            .launched_consumers()
            .await
            .map_err(into_store_error)
    }

    async fn assigned_consumer_key(
        &self,
        consumer: &ConsumerId,
        addr: &ProviderConsAddress,
    ) -> Result<Option<ConsensusPublicKey>, StoreError> {
        self.service
            .assigned_consumer_key(consumer, addr)
            .await
            .map_err(into_store_error)
    }
}
