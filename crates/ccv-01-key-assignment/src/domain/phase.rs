//! Consumer chain lifecycle.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a consumer chain.
///
/// Key assignment is permitted in the Initialized and Launched phases only:
/// before initialization there is nothing to assign against, and a stopped
/// consumer no longer receives validator-set updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumerPhase {
    /// Created but not yet ready to launch.
    Registered,
    /// Spawn parameters are set; awaiting launch.
    Initialized,
    /// Live and receiving validator-set updates.
    Launched,
    /// Permanently stopped.
    Stopped,
}

impl ConsumerPhase {
    /// Whether validators may assign consumer keys in this phase.
    pub fn accepts_key_assignment(&self) -> bool {
        matches!(self, ConsumerPhase::Initialized | ConsumerPhase::Launched)
    }

    /// Whether the consumer receives validator-set updates.
    pub fn is_launched(&self) -> bool {
        matches!(self, ConsumerPhase::Launched)
    }

    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumerPhase::Registered => "registered",
            ConsumerPhase::Initialized => "initialized",
            ConsumerPhase::Launched => "launched",
            ConsumerPhase::Stopped => "stopped",
        }
    }
}

/// Persisted record of a consumer chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerRecord {
    /// The consumer's chain id. Distinct from its consumer id, which stays
    /// stable even if the chain id changes across a restart.
    pub chain_id: String,
}
