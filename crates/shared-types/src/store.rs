//! Ordered key/value state store.
//!
//! All provider state lives in a single ordered store owned by the chain.
//! Subsystems build typed accessors on top of it and each writes only under
//! its own key prefix. Prefix iteration is in ascending byte order, so keys
//! carrying fixed-width big-endian timestamp suffixes iterate chronologically
//! without any in-memory sorting.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use thiserror::Error;

/// State store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("store backend error: {reason}")]
    Backend { reason: String },

    /// A stored value failed to decode.
    #[error("stored value corrupt at key {key_hex}: {reason}")]
    Corrupt { key_hex: String, reason: String },
}

impl StoreError {
    /// Decode failure for the value stored under `key`.
    pub fn corrupt(key: &[u8], reason: impl Into<String>) -> Self {
        let key_hex = key.iter().map(|b| format!("{b:02x}")).collect();
        StoreError::Corrupt {
            key_hex,
            reason: reason.into(),
        }
    }
}

/// Ordered key/value store abstraction.
///
/// Writes within a block are applied in order; there is no transaction
/// surface here because the enclosing block is the transaction.
pub trait StateStore: Send + Sync {
    /// Get the value stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Set the value stored under `key`.
    fn set(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError>;

    /// Delete the value stored under `key`, if any.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// In-memory implementation of `StateStore` over a `BTreeMap`.
///
/// The canonical store for tests and for the block-simulation runtime.
#[derive(Default)]
pub struct InMemoryStateStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Test helper for bounded-storage assertions.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.write().insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let entries = self.entries.read();
        let matches = entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(matches)
    }
}
