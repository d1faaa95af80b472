//! Driving Ports (API - Inbound)

use async_trait::async_trait;
use shared_types::{
    BlockContext, BlockTime, ConsumerId, ProviderConsAddress, SlashPacketAck, SlashPacketData,
};

use crate::error::ThrottleResult;

/// Primary Slash Throttle API.
#[async_trait]
pub trait ThrottleApi: Send + Sync {
    /// Set the meter to the full allowance and schedule the first
    /// replenishment. Called once at genesis.
    async fn initialize_slash_meter(&self, ctx: BlockContext) -> ThrottleResult<()>;

    /// Current meter value.
    async fn slash_meter(&self) -> ThrottleResult<i64>;

    /// Current allowance: `max(1, floor(fraction * last_total_power))`,
    /// recomputed from the staking collaborator on every call.
    async fn slash_meter_allowance(&self) -> ThrottleResult<i64>;

    /// The earliest time the next replenishment tick may fire.
    async fn replenish_candidate(&self) -> ThrottleResult<BlockTime>;

    /// Replenish the meter if the candidate time has passed. Called every
    /// BeginBlock. Returns whether a tick fired.
    async fn check_for_replenishment(&self, ctx: BlockContext) -> ThrottleResult<bool>;

    /// Apply one replenishment tick unconditionally, capped at the
    /// allowance. Does not move the candidate time.
    async fn replenish_slash_meter(&self) -> ThrottleResult<()>;

    /// Handle a slash packet from `consumer`. Never fails the block: the
    /// result is an acknowledgement for the transport.
    async fn on_recv_slash_packet(
        &self,
        consumer: &ConsumerId,
        data: SlashPacketData,
        ctx: BlockContext,
    ) -> ThrottleResult<SlashPacketAck>;

    /// Whether a double-sign slash was ever recorded for `addr`.
    async fn slash_log(&self, addr: &ProviderConsAddress) -> ThrottleResult<bool>;
}
