//! Deterministic validator-set diffing.

use serde::{Deserialize, Serialize};
use shared_types::{ConsensusPublicKey, ConsumerConsAddress, ProviderConsAddress, ValidatorUpdate};
use std::collections::BTreeMap;

/// A provider validator as it appears on one consumer chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerValidator {
    /// The validator's provider consensus address.
    pub provider_addr: ProviderConsAddress,
    /// The consensus key the validator uses on this consumer.
    pub consumer_key: ConsensusPublicKey,
    /// Voting power on the consumer (equal to provider power).
    pub power: i64,
}

impl ConsumerValidator {
    /// The validator's consensus address on the consumer.
    pub fn consumer_addr(&self) -> ConsumerConsAddress {
        self.consumer_key.to_consumer_addr()
    }
}

/// Compute the updates that turn `previous` into `next`.
///
/// Emits a power update for every validator that is new or whose power
/// changed, and a power-0 deletion for every validator that disappeared.
/// Output is sorted by consumer address bytes, so all provider nodes agree
/// on the packet byte-for-byte.
pub fn diff_validators(
    previous: &[ConsumerValidator],
    next: &[ConsumerValidator],
) -> Vec<ValidatorUpdate> {
    let prev_by_addr: BTreeMap<ConsumerConsAddress, &ConsumerValidator> = previous
        .iter()
        .map(|v| (v.consumer_addr(), v))
        .collect();
    let next_by_addr: BTreeMap<ConsumerConsAddress, &ConsumerValidator> =
        next.iter().map(|v| (v.consumer_addr(), v)).collect();

    // BTreeMap iteration is ascending by consumer address, and deletions
    // merge into the same ordering below.
    let mut updates = BTreeMap::new();
    for (addr, validator) in &next_by_addr {
        let changed = prev_by_addr
            .get(addr)
            .map(|prev| prev.power != validator.power)
            .unwrap_or(true);
        if changed {
            updates.insert(
                *addr,
                ValidatorUpdate {
                    pub_key: validator.consumer_key,
                    power: validator.power,
                },
            );
        }
    }
    for (addr, validator) in &prev_by_addr {
        if !next_by_addr.contains_key(addr) {
            updates.insert(
                *addr,
                ValidatorUpdate {
                    pub_key: validator.consumer_key,
                    power: 0,
                },
            );
        }
    }

    updates.into_values().collect()
}
