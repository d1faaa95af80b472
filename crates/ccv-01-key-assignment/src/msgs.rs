//! Governance/admin message types for the provider.
//!
//! Messages are structurally validated here; the service applies the actual
//! state rules. The proposal plumbing that would carry these on a real chain
//! is an external collaborator.

use serde::{Deserialize, Serialize};
use shared_types::{ConsensusPublicKey, ConsumerId, OperatorAddress};

use crate::error::{KeyAssignmentError, KeyAssignmentResult};

/// Register a new consumer chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateConsumer {
    pub chain_id: String,
}

/// Update the record of an existing consumer chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateConsumer {
    pub consumer_id: ConsumerId,
    pub chain_id: String,
}

/// Assign a consumer consensus key for the signer's validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAssignConsumerKey {
    pub consumer_id: ConsumerId,
    /// The signing operator; must control an active validator.
    pub operator: OperatorAddress,
    pub consumer_key: ConsensusPublicKey,
}

/// Tagged union of provider admin messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderMsg {
    CreateConsumer(MsgCreateConsumer),
    UpdateConsumer(MsgUpdateConsumer),
    AssignConsumerKey(MsgAssignConsumerKey),
}

impl ProviderMsg {
    /// Structural validation, before any state is read.
    pub fn validate(&self) -> KeyAssignmentResult<()> {
        match self {
            ProviderMsg::CreateConsumer(m) => {
                if m.chain_id.is_empty() {
                    return malformed("chain id must not be empty");
                }
            }
            ProviderMsg::UpdateConsumer(m) => {
                if !m.consumer_id.is_well_formed() {
                    return malformed("consumer id must be non-empty and must not contain '/'");
                }
                if m.chain_id.is_empty() {
                    return malformed("chain id must not be empty");
                }
            }
            ProviderMsg::AssignConsumerKey(m) => {
                if !m.consumer_id.is_well_formed() {
                    return malformed("consumer id must be non-empty and must not contain '/'");
                }
                if m.consumer_key.as_bytes() == &[0u8; 32] {
                    return malformed("consumer key must not be all zeroes");
                }
            }
        }
        Ok(())
    }
}

fn malformed(reason: &str) -> KeyAssignmentResult<()> {
    Err(KeyAssignmentError::MalformedMessage {
        reason: reason.to_string(),
    })
}
