//! Typed throttle store over the ordered state store.
//!
//! Owns every key under the `throttle/` prefix:
//!
//! ```text
//! throttle/meter                -> i64
//! throttle/replenishCandidate   -> u64 (nanos)
//! throttle/params               -> ThrottleParams
//! throttle/slashLog/{provider}  -> ()
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{BlockTime, ProviderConsAddress, StateStore, StoreError};
use std::sync::Arc;

use super::params::ThrottleParams;

const METER: &[u8] = b"throttle/meter";
const REPLENISH_CANDIDATE: &[u8] = b"throttle/replenishCandidate";
const PARAMS: &[u8] = b"throttle/params";
const SLASH_LOG: &[u8] = b"throttle/slashLog/";

fn slash_log_key(addr: &ProviderConsAddress) -> Vec<u8> {
    let mut key = SLASH_LOG.to_vec();
    key.extend_from_slice(addr.as_bytes());
    key
}

fn decode<T: for<'de> Deserialize<'de>>(key: &[u8], bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::corrupt(key, e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).unwrap_or_default()
}

/// Typed accessor for throttle state.
#[derive(Clone)]
pub struct ThrottleStore {
    store: Arc<dyn StateStore>,
}

impl ThrottleStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub fn slash_meter(&self) -> Result<Option<i64>, StoreError> {
        match self.store.get(METER)? {
            Some(bytes) => Ok(Some(decode(METER, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_slash_meter(&self, meter: i64) -> Result<(), StoreError> {
        self.store.set(METER.to_vec(), encode(&meter))
    }

    pub fn replenish_candidate(&self) -> Result<Option<BlockTime>, StoreError> {
        match self.store.get(REPLENISH_CANDIDATE)? {
            Some(bytes) => {
                let nanos: u64 = decode(REPLENISH_CANDIDATE, &bytes)?;
                Ok(Some(BlockTime::from_nanos(nanos)))
            }
            None => Ok(None),
        }
    }

    pub fn set_replenish_candidate(&self, candidate: BlockTime) -> Result<(), StoreError> {
        self.store
            .set(REPLENISH_CANDIDATE.to_vec(), encode(&candidate.as_nanos()))
    }

    pub fn params(&self) -> Result<Option<ThrottleParams>, StoreError> {
        match self.store.get(PARAMS)? {
            Some(bytes) => Ok(Some(decode(PARAMS, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_params(&self, params: &ThrottleParams) -> Result<(), StoreError> {
        self.store.set(PARAMS.to_vec(), encode(params))
    }

    /// Record that a double-sign slash was received for `addr`.
    pub fn set_slash_log(&self, addr: &ProviderConsAddress) -> Result<(), StoreError> {
        self.store.set(slash_log_key(addr), Vec::new())
    }

    pub fn slash_log(&self, addr: &ProviderConsAddress) -> Result<bool, StoreError> {
        Ok(self.store.get(&slash_log_key(addr))?.is_some())
    }

    /// All provider addresses with a slash log entry, in address order.
    pub fn all_slash_logs(&self) -> Result<Vec<ProviderConsAddress>, StoreError> {
        let mut out = Vec::new();
        for (key, _) in self.store.iter_prefix(SLASH_LOG)? {
            let suffix = &key[SLASH_LOG.len()..];
            let bytes: [u8; 20] = suffix
                .try_into()
                .map_err(|_| StoreError::corrupt(&key, "truncated provider address"))?;
            out.push(ProviderConsAddress::new(bytes));
        }
        Ok(out)
    }
}
