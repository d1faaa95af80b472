//! Typed assignment store over the ordered state store.
//!
//! Owns every key under the `ka/` prefix. All getters decode through bincode
//! and surface corruption as `StoreError::Corrupt` rather than panicking.

use serde::{Deserialize, Serialize};
use shared_types::{
    BlockTime, ConsensusPublicKey, ConsumerConsAddress, ConsumerId, ProviderConsAddress,
    StateStore, StoreError,
};
use std::sync::Arc;

use super::keys;
use super::phase::{ConsumerPhase, ConsumerRecord};

/// Consumer addresses whose reverse-lookup entries may be deleted once the
/// bucket's timestamp has passed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneBucket {
    pub addresses: Vec<ConsumerConsAddress>,
}

/// Typed accessor for key-assignment state.
#[derive(Clone)]
pub struct KeyAssignmentStore {
    store: Arc<dyn StateStore>,
}

fn decode<T: for<'de> Deserialize<'de>>(key: &[u8], bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::corrupt(key, e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).unwrap_or_default()
}

impl KeyAssignmentStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // assigned/{consumer}/{providerAddr} -> ConsensusPublicKey
    // ------------------------------------------------------------------

    pub fn assigned_key(
        &self,
        consumer: &ConsumerId,
        addr: &ProviderConsAddress,
    ) -> Result<Option<ConsensusPublicKey>, StoreError> {
        let key = keys::assigned_key(consumer, addr);
        match self.store.get(&key)? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_assigned_key(
        &self,
        consumer: &ConsumerId,
        addr: &ProviderConsAddress,
        consumer_key: &ConsensusPublicKey,
    ) -> Result<(), StoreError> {
        self.store
            .set(keys::assigned_key(consumer, addr), encode(consumer_key))
    }

    pub fn delete_assigned_key(
        &self,
        consumer: &ConsumerId,
        addr: &ProviderConsAddress,
    ) -> Result<(), StoreError> {
        self.store.delete(&keys::assigned_key(consumer, addr))
    }

    /// All assignments for `consumer`, in ascending provider-address order.
    pub fn all_assigned_keys(
        &self,
        consumer: &ConsumerId,
    ) -> Result<Vec<(ProviderConsAddress, ConsensusPublicKey)>, StoreError> {
        let mut out = Vec::new();
        for (key, value) in self.store.iter_prefix(&keys::assigned_prefix(consumer))? {
            let addr = keys::addr_suffix(&key)
                .ok_or_else(|| StoreError::corrupt(&key, "truncated provider address"))?;
            out.push((ProviderConsAddress::new(addr), decode(&key, &value)?));
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // byConsAddr/{consumer}/{consumerAddr} -> ProviderConsAddress
    // ------------------------------------------------------------------

    pub fn provider_by_consumer_addr(
        &self,
        consumer: &ConsumerId,
        addr: &ConsumerConsAddress,
    ) -> Result<Option<ProviderConsAddress>, StoreError> {
        let key = keys::by_cons_addr_key(consumer, addr);
        match self.store.get(&key)? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_provider_by_consumer_addr(
        &self,
        consumer: &ConsumerId,
        addr: &ConsumerConsAddress,
        provider_addr: &ProviderConsAddress,
    ) -> Result<(), StoreError> {
        self.store
            .set(keys::by_cons_addr_key(consumer, addr), encode(provider_addr))
    }

    pub fn delete_provider_by_consumer_addr(
        &self,
        consumer: &ConsumerId,
        addr: &ConsumerConsAddress,
    ) -> Result<(), StoreError> {
        self.store.delete(&keys::by_cons_addr_key(consumer, addr))
    }

    /// All reverse-lookup entries for `consumer`, in ascending consumer-address
    /// order.
    pub fn all_by_consumer_addr(
        &self,
        consumer: &ConsumerId,
    ) -> Result<Vec<(ConsumerConsAddress, ProviderConsAddress)>, StoreError> {
        let mut out = Vec::new();
        for (key, value) in self
            .store
            .iter_prefix(&keys::by_cons_addr_prefix(consumer))?
        {
            let addr = keys::addr_suffix(&key)
                .ok_or_else(|| StoreError::corrupt(&key, "truncated consumer address"))?;
            out.push((ConsumerConsAddress::new(addr), decode(&key, &value)?));
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // toPrune/{consumer}/{beNanos(pruneAt)} -> PruneBucket
    // ------------------------------------------------------------------

    pub fn append_addr_to_prune(
        &self,
        consumer: &ConsumerId,
        prune_at: BlockTime,
        addr: ConsumerConsAddress,
    ) -> Result<(), StoreError> {
        let key = keys::to_prune_key(consumer, prune_at);
        let mut bucket: PruneBucket = match self.store.get(&key)? {
            Some(bytes) => decode(&key, &bytes)?,
            None => PruneBucket::default(),
        };
        bucket.addresses.push(addr);
        self.store.set(key, encode(&bucket))
    }

    pub fn addrs_to_prune(
        &self,
        consumer: &ConsumerId,
        prune_at: BlockTime,
    ) -> Result<PruneBucket, StoreError> {
        let key = keys::to_prune_key(consumer, prune_at);
        match self.store.get(&key)? {
            Some(bytes) => decode(&key, &bytes),
            None => Ok(PruneBucket::default()),
        }
    }

    pub fn delete_addrs_to_prune(
        &self,
        consumer: &ConsumerId,
        prune_at: BlockTime,
    ) -> Result<(), StoreError> {
        self.store.delete(&keys::to_prune_key(consumer, prune_at))
    }

    /// Remove and return every bucket with `pruneAt <= now`, in time order.
    ///
    /// Ascending key iteration is ascending time iteration, so this stops at
    /// the first bucket past `now` without scanning the rest.
    pub fn consume_addrs_to_prune(
        &self,
        consumer: &ConsumerId,
        now: BlockTime,
    ) -> Result<Vec<(BlockTime, PruneBucket)>, StoreError> {
        let mut consumed = Vec::new();
        for (key, value) in self.store.iter_prefix(&keys::to_prune_prefix(consumer))? {
            let prune_at = keys::prune_time_suffix(&key)
                .ok_or_else(|| StoreError::corrupt(&key, "truncated prune timestamp"))?;
            if prune_at > now {
                break;
            }
            consumed.push((prune_at, decode(&key, &value)?));
            self.store.delete(&key)?;
        }
        Ok(consumed)
    }

    /// All pending prune buckets for `consumer`, in time order.
    pub fn all_addrs_to_prune(
        &self,
        consumer: &ConsumerId,
    ) -> Result<Vec<(BlockTime, PruneBucket)>, StoreError> {
        let mut out = Vec::new();
        for (key, value) in self.store.iter_prefix(&keys::to_prune_prefix(consumer))? {
            let prune_at = keys::prune_time_suffix(&key)
                .ok_or_else(|| StoreError::corrupt(&key, "truncated prune timestamp"))?;
            out.push((prune_at, decode(&key, &value)?));
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // consumer registry
    // ------------------------------------------------------------------

    pub fn consumer_record(
        &self,
        consumer: &ConsumerId,
    ) -> Result<Option<ConsumerRecord>, StoreError> {
        let key = keys::consumer_key(consumer);
        match self.store.get(&key)? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_consumer_record(
        &self,
        consumer: &ConsumerId,
        record: &ConsumerRecord,
    ) -> Result<(), StoreError> {
        self.store.set(keys::consumer_key(consumer), encode(record))
    }

    /// All registered consumers, in ascending consumer-id order.
    pub fn all_consumers(&self) -> Result<Vec<(ConsumerId, ConsumerRecord)>, StoreError> {
        let prefix = keys::consumer_prefix();
        let mut out = Vec::new();
        for (key, value) in self.store.iter_prefix(&prefix)? {
            let id = String::from_utf8(key[prefix.len()..].to_vec())
                .map_err(|_| StoreError::corrupt(&key, "non-utf8 consumer id"))?;
            out.push((ConsumerId::new(id), decode(&key, &value)?));
        }
        Ok(out)
    }

    pub fn phase(&self, consumer: &ConsumerId) -> Result<Option<ConsumerPhase>, StoreError> {
        let key = keys::phase_key(consumer);
        match self.store.get(&key)? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_phase(
        &self,
        consumer: &ConsumerId,
        phase: ConsumerPhase,
    ) -> Result<(), StoreError> {
        self.store.set(keys::phase_key(consumer), encode(&phase))
    }

    /// Allocate the next consumer id. Ids are small decimal strings.
    pub fn next_consumer_id(&self) -> Result<ConsumerId, StoreError> {
        let key = keys::next_consumer_id_key();
        let next: u64 = match self.store.get(&key)? {
            Some(bytes) => decode(&key, &bytes)?,
            None => 0,
        };
        self.store.set(key, encode(&(next + 1)))?;
        Ok(ConsumerId::new(next.to_string()))
    }
}
