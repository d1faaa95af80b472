//! Store key encoding for the Key Assignment subsystem.
//!
//! Logical layout:
//!
//! ```text
//! ka/assigned/{consumer}/{providerAddr}      -> ConsensusPublicKey
//! ka/byConsAddr/{consumer}/{consumerAddr}    -> ProviderConsAddress
//! ka/toPrune/{consumer}/{beNanos(pruneAt)}   -> PruneBucket
//! ka/consumer/{consumer}                     -> ConsumerRecord
//! ka/phase/{consumer}                        -> ConsumerPhase
//! ka/nextConsumerId                          -> u64
//! ```
//!
//! Prune timestamps are fixed-width big-endian so ascending key iteration is
//! ascending time iteration; no sorting happens in memory.

use shared_types::{BlockTime, ConsumerConsAddress, ConsumerId, ProviderConsAddress};

const ASSIGNED: &[u8] = b"ka/assigned/";
const BY_CONS_ADDR: &[u8] = b"ka/byConsAddr/";
const TO_PRUNE: &[u8] = b"ka/toPrune/";
const CONSUMER: &[u8] = b"ka/consumer/";
const PHASE: &[u8] = b"ka/phase/";
const NEXT_CONSUMER_ID: &[u8] = b"ka/nextConsumerId";

fn consumer_scoped(root: &[u8], consumer: &ConsumerId) -> Vec<u8> {
    let id = consumer.as_str().as_bytes();
    let mut key = Vec::with_capacity(root.len() + id.len() + 1);
    key.extend_from_slice(root);
    key.extend_from_slice(id);
    key.push(b'/');
    key
}

pub fn assigned_prefix(consumer: &ConsumerId) -> Vec<u8> {
    consumer_scoped(ASSIGNED, consumer)
}

pub fn assigned_key(consumer: &ConsumerId, addr: &ProviderConsAddress) -> Vec<u8> {
    let mut key = assigned_prefix(consumer);
    key.extend_from_slice(addr.as_bytes());
    key
}

pub fn by_cons_addr_prefix(consumer: &ConsumerId) -> Vec<u8> {
    consumer_scoped(BY_CONS_ADDR, consumer)
}

pub fn by_cons_addr_key(consumer: &ConsumerId, addr: &ConsumerConsAddress) -> Vec<u8> {
    let mut key = by_cons_addr_prefix(consumer);
    key.extend_from_slice(addr.as_bytes());
    key
}

pub fn to_prune_prefix(consumer: &ConsumerId) -> Vec<u8> {
    consumer_scoped(TO_PRUNE, consumer)
}

pub fn to_prune_key(consumer: &ConsumerId, prune_at: BlockTime) -> Vec<u8> {
    let mut key = to_prune_prefix(consumer);
    key.extend_from_slice(&prune_at.as_nanos().to_be_bytes());
    key
}

pub fn consumer_key(consumer: &ConsumerId) -> Vec<u8> {
    let mut key = CONSUMER.to_vec();
    key.extend_from_slice(consumer.as_str().as_bytes());
    key
}

pub fn phase_key(consumer: &ConsumerId) -> Vec<u8> {
    let mut key = PHASE.to_vec();
    key.extend_from_slice(consumer.as_str().as_bytes());
    key
}

pub fn consumer_prefix() -> Vec<u8> {
    CONSUMER.to_vec()
}

pub fn next_consumer_id_key() -> Vec<u8> {
    NEXT_CONSUMER_ID.to_vec()
}

/// Parse the trailing 20-byte address from a map key.
pub fn addr_suffix(key: &[u8]) -> Option<[u8; 20]> {
    if key.len() < 20 {
        return None;
    }
    key[key.len() - 20..].try_into().ok()
}

/// Parse the trailing big-endian timestamp from a prune-bucket key.
pub fn prune_time_suffix(key: &[u8]) -> Option<BlockTime> {
    if key.len() < 8 {
        return None;
    }
    let bytes: [u8; 8] = key[key.len() - 8..].try_into().ok()?;
    Some(BlockTime::from_nanos(u64::from_be_bytes(bytes)))
}
