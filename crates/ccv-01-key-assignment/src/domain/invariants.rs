//! Domain invariants for key assignment.
//!
//! The check forms return `bool` for use in tests and the simulation suite.
//! The assert forms panic: a violation means consensus state is corrupt, and
//! aborting the block is the only safe response. User-input failures never
//! come through here; they are typed errors on the service surface.

use shared_types::{ConsumerId, StoreError};

use super::store::KeyAssignmentStore;

/// No two provider validators may resolve to the same consumer address on
/// the same consumer chain.
pub fn check_unique_consumer_addrs(
    store: &KeyAssignmentStore,
    consumer: &ConsumerId,
) -> Result<bool, StoreError> {
    let assigned = store.all_assigned_keys(consumer)?;
    let mut seen = std::collections::HashSet::new();
    for (_, consumer_key) in &assigned {
        if !seen.insert(consumer_key.to_consumer_addr()) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Every reverse-lookup entry is either the current assignment of some
/// provider validator or listed in a pending prune bucket.
///
/// This is the bounded-storage property: entries that are neither current
/// nor scheduled would live forever.
pub fn check_pruning_property(
    store: &KeyAssignmentStore,
    consumer: &ConsumerId,
) -> Result<bool, StoreError> {
    let mut scheduled = std::collections::HashSet::new();
    for (_, bucket) in store.all_addrs_to_prune(consumer)? {
        scheduled.extend(bucket.addresses);
    }

    for (consumer_addr, provider_addr) in store.all_by_consumer_addr(consumer)? {
        if scheduled.contains(&consumer_addr) {
            continue;
        }
        let is_current = store
            .assigned_key(consumer, &provider_addr)?
            .map(|key| key.to_consumer_addr() == consumer_addr)
            .unwrap_or(false);
        if !is_current {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Panic if either key-assignment invariant is violated for `consumer`.
pub fn assert_invariants(store: &KeyAssignmentStore, consumer: &ConsumerId) {
    match check_unique_consumer_addrs(store, consumer) {
        Ok(true) => {}
        Ok(false) => panic!(
            "key-assignment invariant violated: duplicate consumer address on consumer {consumer}"
        ),
        Err(e) => panic!("key-assignment invariant check failed to read state: {e}"),
    }
    match check_pruning_property(store, consumer) {
        Ok(true) => {}
        Ok(false) => panic!(
            "key-assignment invariant violated: unprunable reverse-lookup entry on consumer {consumer}"
        ),
        Err(e) => panic!("key-assignment invariant check failed to read state: {e}"),
    }
}
