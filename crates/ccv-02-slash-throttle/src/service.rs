//! Slash Throttle Service - Core business logic.

use async_trait::async_trait;
use shared_types::{
    BlockContext, BlockTime, ConsumerId, InfractionKind, ProviderConsAddress, SlashPacketAck,
    SlashPacketData, StateStore,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::invariants;
use crate::domain::params::ThrottleParams;
use crate::domain::store::ThrottleStore;
use crate::error::{ThrottleError, ThrottleResult};
use crate::metrics;
use crate::ports::inbound::ThrottleApi;
use crate::ports::outbound::{ConsumerAddressResolver, StakingSlashing};

/// Slash Throttle Service implementation.
pub struct ThrottleService<S, R>
where
    S: StakingSlashing,
    R: ConsumerAddressResolver,
{
    store: ThrottleStore,
    staking: Arc<S>,
    resolver: Arc<R>,
}

impl<S, R> ThrottleService<S, R>
where
    S: StakingSlashing,
    R: ConsumerAddressResolver,
{
    /// Create a new throttle service over the shared state store, persisting
    /// `params` if none are stored yet.
    pub fn new(
        state: Arc<dyn StateStore>,
        staking: Arc<S>,
        resolver: Arc<R>,
        params: ThrottleParams,
    ) -> ThrottleResult<Self> {
        params.validate()?;
        let store = ThrottleStore::new(state);
        if store.params()?.is_none() {
            store.set_params(&params)?;
        }
        Ok(Self {
            store,
            staking,
            resolver,
        })
    }

    /// Typed store handle, for invariant checks and test assertions.
    pub fn store(&self) -> &ThrottleStore {
        &self.store
    }

    /// Replace the stored parameters. Admin surface; the new allowance takes
    /// effect on the next read.
    pub fn set_params(&self, params: ThrottleParams) -> ThrottleResult<()> {
        params.validate()?;
        self.store.set_params(&params)?;
        Ok(())
    }

    fn stored_params(&self) -> ThrottleResult<ThrottleParams> {
        // Params are written in the constructor, so absence is corruption.
        self.store.params()?.ok_or(ThrottleError::MeterNotInitialized)
    }

    fn stored_meter(&self) -> ThrottleResult<i64> {
        self.store
            .slash_meter()?
            .ok_or(ThrottleError::MeterNotInitialized)
    }

    async fn allowance(&self) -> ThrottleResult<i64> {
        let params = self.stored_params()?;
        let total_power = self.staking.last_total_power().await;
        Ok(params.replenish_fraction.allowance_for(total_power))
    }

    /// One replenishment tick: `meter = min(allowance, meter + allowance)`.
    async fn apply_replenish_tick(&self) -> ThrottleResult<()> {
        let allowance = self.allowance().await?;
        let meter = self.stored_meter()?;
        let replenished = allowance.min(meter.saturating_add(allowance));
        self.store.set_slash_meter(replenished)?;
        metrics::set_slash_meter(replenished);
        invariants::assert_meter_bound(replenished, allowance);
        debug!(
            "[ccv-02] slash meter replenished {} -> {} (allowance {})",
            meter, replenished, allowance
        );
        Ok(())
    }

    async fn handle_downtime(
        &self,
        provider_addr: &ProviderConsAddress,
        validator: &shared_types::StakingValidator,
    ) -> ThrottleResult<SlashPacketAck> {
        if validator.jailed {
            debug!(
                "[ccv-02] downtime slash for already-jailed validator {:?}, no-op",
                provider_addr
            );
            return Ok(SlashPacketAck::Handled);
        }

        let meter = self.stored_meter()?;
        if meter <= 0 {
            info!(
                "[ccv-02] slash meter exhausted ({}), bouncing downtime slash for {:?}",
                meter, provider_addr
            );
            metrics::record_slash_packet("bounced");
            return Ok(SlashPacketAck::Bounce);
        }

        // Read the power before jailing: the meter drains by what the
        // validator was worth when the infraction was admitted.
        let power = self.staking.last_validator_power(&validator.operator).await;
        self.staking
            .jail(provider_addr, InfractionKind::Downtime)
            .await;
        let drained = meter.saturating_sub(power);
        self.store.set_slash_meter(drained)?;
        metrics::set_slash_meter(drained);
        metrics::record_slash_packet("downtime_jailed");
        info!(
            "[ccv-02] downtime slash admitted for {:?}: power {}, meter {} -> {}",
            provider_addr, power, meter, drained
        );
        Ok(SlashPacketAck::Handled)
    }

    async fn handle_double_sign(
        &self,
        provider_addr: &ProviderConsAddress,
        validator: &shared_types::StakingValidator,
    ) -> ThrottleResult<SlashPacketAck> {
        // Double signs bypass the meter: provable, rare, and too severe to
        // defer behind throttling.
        self.store.set_slash_log(provider_addr)?;
        if !validator.jailed {
            self.staking
                .jail(provider_addr, InfractionKind::DoubleSign)
                .await;
            info!(
                "[ccv-02] double-sign slash: jailed {:?}, meter untouched",
                provider_addr
            );
        } else {
            debug!(
                "[ccv-02] double-sign slash for already-jailed validator {:?}",
                provider_addr
            );
        }
        metrics::record_slash_packet("double_sign_jailed");
        Ok(SlashPacketAck::Handled)
    }
}

#[async_trait]
impl<S, R> ThrottleApi for ThrottleService<S, R>
where
    S: StakingSlashing,
    R: ConsumerAddressResolver,
{
    async fn initialize_slash_meter(&self, ctx: BlockContext) -> ThrottleResult<()> {
        let params = self.stored_params()?;
        let allowance = self.allowance().await?;
        self.store.set_slash_meter(allowance)?;
        self.store
            .set_replenish_candidate(ctx.time.saturating_add(params.replenish_period))?;
        metrics::set_slash_meter(allowance);
        info!("[ccv-02] slash meter initialized to {}", allowance);
        Ok(())
    }

    async fn slash_meter(&self) -> ThrottleResult<i64> {
        self.stored_meter()
    }

    async fn slash_meter_allowance(&self) -> ThrottleResult<i64> {
        self.allowance().await
    }

    async fn replenish_candidate(&self) -> ThrottleResult<BlockTime> {
        self.store
            .replenish_candidate()?
            .ok_or(ThrottleError::MeterNotInitialized)
    }

    async fn check_for_replenishment(&self, ctx: BlockContext) -> ThrottleResult<bool> {
        let candidate = self.replenish_candidate().await?;
        if ctx.time < candidate {
            return Ok(false);
        }
        let params = self.stored_params()?;
        self.apply_replenish_tick().await?;
        self.store
            .set_replenish_candidate(ctx.time.saturating_add(params.replenish_period))?;
        Ok(true)
    }

    async fn replenish_slash_meter(&self) -> ThrottleResult<()> {
        self.apply_replenish_tick().await
    }

    async fn on_recv_slash_packet(
        &self,
        consumer: &ConsumerId,
        data: SlashPacketData,
        _ctx: BlockContext,
    ) -> ThrottleResult<SlashPacketAck> {
        let provider_addr = self
            .resolver
            .provider_addr(consumer, &data.validator.address)
            .await?;

        let validator = match self.staking.validator_by_cons_addr(&provider_addr).await {
            Some(validator) => validator,
            None => {
                // The validator was already removed from the provider; there
                // is nothing left to slash and nothing to retry.
                warn!(
                    "[ccv-02] slash packet from consumer {} for unknown validator {:?}, no-op",
                    consumer, provider_addr
                );
                metrics::record_slash_packet("unknown_validator");
                return Ok(SlashPacketAck::Handled);
            }
        };

        match data.infraction {
            InfractionKind::Downtime => self.handle_downtime(&provider_addr, &validator).await,
            InfractionKind::DoubleSign => {
                self.handle_double_sign(&provider_addr, &validator).await
            }
        }
    }

    async fn slash_log(&self, addr: &ProviderConsAddress) -> ThrottleResult<bool> {
        Ok(self.store.slash_log(addr)?)
    }
}
