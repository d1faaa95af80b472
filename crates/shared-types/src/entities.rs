//! # Core Domain Entities
//!
//! Address and key types shared by every provider subsystem.
//!
//! A provider validator is identified by three related values:
//! - its **operator address** (who controls it),
//! - its **provider consensus address**, derived from its provider consensus
//!   public key,
//! - zero or more **consumer consensus addresses**, one per consumer chain,
//!   derived from whichever key the validator uses on that chain.
//!
//! All consensus addresses are 20 bytes: the first 20 bytes of the SHA-256
//! digest of the consensus public key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 20-byte consensus address on the provider chain.
///
/// Stable across the validator's lifetime on the provider.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderConsAddress(pub [u8; 20]);

impl ProviderConsAddress {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for ProviderConsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderConsAddress({})", hex_fmt(&self.0))
    }
}

/// A 20-byte consensus address on a consumer chain.
///
/// Derived from the consumer-side consensus key by the same hash the
/// consumer itself uses, so the provider and the consumer always agree on
/// which address a key maps to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsumerConsAddress(pub [u8; 20]);

impl ConsumerConsAddress {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Reinterpret as a provider address.
    ///
    /// Used when a consumer address has no explicit key assignment: the
    /// default assignment is the validator's own provider key, so the two
    /// addresses carry identical bytes.
    pub fn as_provider_addr(&self) -> ProviderConsAddress {
        ProviderConsAddress(self.0)
    }
}

impl fmt::Debug for ConsumerConsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsumerConsAddress({})", hex_fmt(&self.0))
    }
}

/// A 20-byte operator (account) address controlling a validator.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperatorAddress(pub [u8; 20]);

impl OperatorAddress {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for OperatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperatorAddress({})", hex_fmt(&self.0))
    }
}

/// A 32-byte consensus public key.
///
/// Opaque to the provider beyond being hashable to a consensus address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsensusPublicKey(pub [u8; 32]);

impl ConsensusPublicKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive the consumer-chain consensus address for this key.
    pub fn to_consumer_addr(&self) -> ConsumerConsAddress {
        ConsumerConsAddress(address_digest(&self.0))
    }

    /// Derive the provider-chain consensus address for this key.
    pub fn to_provider_addr(&self) -> ProviderConsAddress {
        ProviderConsAddress(address_digest(&self.0))
    }
}

impl fmt::Debug for ConsensusPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsensusPublicKey({})", hex_fmt(&self.0[..8]))
    }
}

/// First 20 bytes of the SHA-256 digest of the key bytes.
fn address_digest(key_bytes: &[u8; 32]) -> [u8; 20] {
    let digest = Sha256::digest(key_bytes);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[..20]);
    addr
}

/// String identifier of a consumer chain.
///
/// Distinct from the consumer's chain id and stable across the consumer's
/// lifecycle. Must not contain `/`, which is the store key separator.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsumerId(String);

impl ConsumerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is usable as a store key segment.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && !self.0.contains('/')
    }
}

impl fmt::Debug for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsumerId({})", self.0)
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A provider validator as reported by the staking collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingValidator {
    /// Operator address controlling this validator.
    pub operator: OperatorAddress,
    /// The validator's provider consensus public key.
    pub consensus_key: ConsensusPublicKey,
    /// Whether the validator is currently jailed.
    pub jailed: bool,
}

impl StakingValidator {
    /// The validator's provider consensus address.
    pub fn provider_cons_addr(&self) -> ProviderConsAddress {
        self.consensus_key.to_provider_addr()
    }
}

fn hex_fmt(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
