//! Inbound packet decode and dispatch.
//!
//! The transport hands over raw payload bytes; the discriminator is read
//! first and dispatch follows it. Malformed bytes become an error
//! acknowledgement with no state change; an expired packet is never
//! processed.

use shared_types::{BlockContext, ConsumerId, ConsumerPacketData, InboundPacket, SlashPacketAck};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ports::inbound::ThrottleApi;

/// Decodes consumer packets and routes them to the throttle.
pub struct PacketHandler<T>
where
    T: ThrottleApi,
{
    throttle: Arc<T>,
}

impl<T> PacketHandler<T>
where
    T: ThrottleApi,
{
    pub fn new(throttle: Arc<T>) -> Self {
        Self { throttle }
    }

    /// Handle one inbound packet from `consumer`, returning the
    /// acknowledgement for the transport. Never fails the block.
    pub async fn handle(
        &self,
        consumer: &ConsumerId,
        packet: &InboundPacket,
        ctx: BlockContext,
    ) -> SlashPacketAck {
        if packet.is_expired(ctx.height, ctx.time) {
            warn!(
                "[ccv-02] dropping expired packet seq {} from consumer {}",
                packet.sequence, consumer
            );
            return SlashPacketAck::Error("packet expired".to_string());
        }

        let data = match ConsumerPacketData::decode(&packet.data) {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    "[ccv-02] undecodable packet seq {} from consumer {}: {}",
                    packet.sequence, consumer, e
                );
                return SlashPacketAck::Error(e.to_string());
            }
        };

        match data {
            ConsumerPacketData::Slash(slash) => {
                match self.throttle.on_recv_slash_packet(consumer, slash, ctx).await {
                    Ok(ack) => ack,
                    Err(e) => {
                        warn!(
                            "[ccv-02] slash packet seq {} from consumer {} failed: {}",
                            packet.sequence, consumer, e
                        );
                        SlashPacketAck::Error(e.to_string())
                    }
                }
            }
            ConsumerPacketData::VscMatured(matured) => {
                // Pruning is time-based, so maturity notices carry no state
                // effect; they are acknowledged for transport bookkeeping.
                debug!(
                    "[ccv-02] vsc {} matured on consumer {}",
                    matured.valset_update_id, consumer
                );
                SlashPacketAck::Handled
            }
        }
    }
}
