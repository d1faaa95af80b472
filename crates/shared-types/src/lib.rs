//! # Shared Types Crate
//!
//! Cross-subsystem domain types for the CCV provider: consensus addresses,
//! consensus public keys, consumer identifiers, block context, the inbound
//! and outbound packet schemas, and the ordered key/value state store used by
//! every subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Explicit Context**: Block height and time travel as a `BlockContext`
//!   value through every state transition; there is no ambient clock.
//! - **Ordered State**: The `StateStore` iterates prefixes in ascending key
//!   order, so keys with big-endian timestamp suffixes iterate in time order.
//! - **Key Ownership**: Each subsystem writes only under its own key prefix;
//!   two subsystems never share a key.

pub mod context;
pub mod entities;
pub mod packets;
pub mod store;

pub use context::{BlockContext, BlockTime};
pub use entities::{
    ConsensusPublicKey, ConsumerConsAddress, ConsumerId, OperatorAddress, ProviderConsAddress,
    StakingValidator,
};
pub use packets::{
    CodecError, ConsumerPacketData, InboundPacket, InfractionKind, PacketValidator,
    SlashPacketAck, SlashPacketData, ValidatorSetChangePacketData, ValidatorUpdate,
    VscMaturedPacketData,
};
pub use store::{InMemoryStateStore, StateStore, StoreError};
