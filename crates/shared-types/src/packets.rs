//! Packet schemas exchanged with consumer chains.
//!
//! Inbound payloads arrive as a tagged `ConsumerPacketData`; the discriminator
//! is read first and decoding dispatches on it, so unknown variants fail
//! loudly instead of being routed by a string registry. Payload bytes use the
//! bincode codec; the enclosing transport envelope (sequence, channel,
//! timeouts) is modeled by `InboundPacket`.

use crate::context::BlockTime;
use crate::entities::{ConsensusPublicKey, ConsumerConsAddress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Packet payload codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload bytes did not decode to the expected schema.
    #[error("malformed packet payload: {reason}")]
    Malformed { reason: String },
}

/// The class of infraction a consumer reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfractionKind {
    /// The validator missed too many blocks on the consumer.
    Downtime,
    /// The validator signed two conflicting blocks on the consumer.
    DoubleSign,
}

impl InfractionKind {
    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfractionKind::Downtime => "downtime",
            InfractionKind::DoubleSign => "double_sign",
        }
    }
}

/// The misbehaving validator as seen by the consumer chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketValidator {
    /// Consensus address of the validator on the consumer chain.
    pub address: ConsumerConsAddress,
    /// Voting power the validator had on the consumer.
    pub power: i64,
}

/// A slashing request from a consumer chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashPacketData {
    /// The validator-set change during which the infraction occurred.
    pub valset_update_id: u64,
    /// The misbehaving validator, identified by its consumer address.
    pub validator: PacketValidator,
    /// The class of infraction.
    pub infraction: InfractionKind,
}

/// Notice that all consumer-side unbonding for a validator-set change
/// completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VscMaturedPacketData {
    /// The matured validator-set change.
    pub valset_update_id: u64,
}

/// Tagged union of everything a consumer chain can send the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumerPacketData {
    /// A slashing request.
    Slash(SlashPacketData),
    /// A validator-set-change maturity notice.
    VscMatured(VscMaturedPacketData),
}

impl ConsumerPacketData {
    /// Encode to payload bytes.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Decode payload bytes, reading the discriminator first.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Malformed {
            reason: e.to_string(),
        })
    }
}

/// A single validator power change sent to a consumer.
///
/// Power 0 removes the validator from the consumer's set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// The consumer-side consensus key of the validator.
    pub pub_key: ConsensusPublicKey,
    /// New voting power on the consumer.
    pub power: i64,
}

/// A validator-set change sent from the provider to a consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetChangePacketData {
    /// Monotonic identifier of this validator-set change.
    pub valset_update_id: u64,
    /// Power changes since the previous set sent to this consumer,
    /// in ascending consumer-address order.
    pub updates: Vec<ValidatorUpdate>,
    /// Consumer addresses whose slash requests were handled since the last
    /// validator-set change.
    pub slash_acks: Vec<ConsumerConsAddress>,
}

impl ValidatorSetChangePacketData {
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Malformed {
            reason: e.to_string(),
        })
    }
}

/// Acknowledgement returned for a slash packet.
///
/// Bouncing is the sole back-pressure mechanism: the provider keeps no queue
/// of pending slashes, the consumer retries a bounced request with a fresh
/// sequence number after backoff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashPacketAck {
    /// The request was processed; no retry expected.
    Handled,
    /// The slash meter is exhausted; retry later.
    Bounce,
    /// The packet was malformed; no state change.
    Error(String),
}

impl SlashPacketAck {
    pub fn is_handled(&self) -> bool {
        matches!(self, SlashPacketAck::Handled)
    }

    pub fn is_bounce(&self) -> bool {
        matches!(self, SlashPacketAck::Bounce)
    }
}

/// An inbound transport packet, as delivered by the relayer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundPacket {
    /// Transport sequence number on the source channel.
    pub sequence: u64,
    /// Source channel the packet arrived on.
    pub source_channel: String,
    /// Encoded `ConsumerPacketData`.
    pub data: Vec<u8>,
    /// Height after which the packet is expired (0 = no height timeout).
    pub timeout_height: u64,
    /// Time after which the packet is expired.
    pub timeout_timestamp: BlockTime,
}

impl InboundPacket {
    /// Whether the packet expired before the block at `height` / `time`.
    pub fn is_expired(&self, height: u64, time: BlockTime) -> bool {
        let height_expired = self.timeout_height != 0 && height >= self.timeout_height;
        let time_expired =
            self.timeout_timestamp.as_nanos() != 0 && time >= self.timeout_timestamp;
        height_expired || time_expired
    }
}
