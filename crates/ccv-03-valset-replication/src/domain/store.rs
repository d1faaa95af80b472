//! Typed replication store over the ordered state store.
//!
//! Owns every key under the `valset/` prefix:
//!
//! ```text
//! valset/consumer/{consumer}  -> Vec<ConsumerValidator>  (last set sent)
//! valset/updateId             -> u64
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{ConsumerId, StateStore, StoreError};
use std::sync::Arc;

use super::diff::ConsumerValidator;

const CONSUMER_VALSET: &[u8] = b"valset/consumer/";
const UPDATE_ID: &[u8] = b"valset/updateId";

fn consumer_valset_key(consumer: &ConsumerId) -> Vec<u8> {
    let mut key = CONSUMER_VALSET.to_vec();
    key.extend_from_slice(consumer.as_str().as_bytes());
    key
}

fn decode<T: for<'de> Deserialize<'de>>(key: &[u8], bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::corrupt(key, e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).unwrap_or_default()
}

/// Typed accessor for replication state.
#[derive(Clone)]
pub struct ReplicationStore {
    store: Arc<dyn StateStore>,
}

impl ReplicationStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// The validator set last sent to `consumer`. Empty before launch.
    pub fn consumer_val_set(
        &self,
        consumer: &ConsumerId,
    ) -> Result<Vec<ConsumerValidator>, StoreError> {
        let key = consumer_valset_key(consumer);
        match self.store.get(&key)? {
            Some(bytes) => decode(&key, &bytes),
            None => Ok(Vec::new()),
        }
    }

    pub fn set_consumer_val_set(
        &self,
        consumer: &ConsumerId,
        valset: &[ConsumerValidator],
    ) -> Result<(), StoreError> {
        self.store
            .set(consumer_valset_key(consumer), encode(&valset.to_vec()))
    }

    /// The monotonic validator-set-update counter. Starts at 0.
    pub fn valset_update_id(&self) -> Result<u64, StoreError> {
        match self.store.get(UPDATE_ID)? {
            Some(bytes) => decode(UPDATE_ID, &bytes),
            None => Ok(0),
        }
    }

    pub fn increment_valset_update_id(&self) -> Result<(), StoreError> {
        let next = self.valset_update_id()? + 1;
        self.store.set(UPDATE_ID.to_vec(), encode(&next))
    }
}
