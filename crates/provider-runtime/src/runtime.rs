//! The per-block pipeline.

use std::sync::Arc;
use tracing::debug;

use ccv_01_key_assignment::{
    ConsumerPhase, KeyAssignmentApi, KeyAssignmentService, ProviderMsg, StakingQuery,
};
use ccv_02_slash_throttle::{
    PacketHandler, StakingSlashing, ThrottleApi, ThrottleParams, ThrottleService,
};
use ccv_03_valset_replication::{
    BondedSetProvider, PacketSender, ReplicationService, ValidatorFilter,
};
use shared_types::{BlockContext, ConsumerId, InboundPacket, SlashPacketAck, StateStore};

use crate::adapters::KeyAssignmentAdapter;
use crate::error::RuntimeResult;

/// The assembled provider core: one instance per chain, state in the shared
/// ordered store, collaborators injected at the edges.
pub struct ProviderRuntime<SQ, SS, B, P, F>
where
    SQ: StakingQuery + 'static,
    SS: StakingSlashing,
    B: BondedSetProvider,
    P: PacketSender,
    F: ValidatorFilter,
{
    key_assignment: Arc<KeyAssignmentService<SQ>>,
    throttle: Arc<ThrottleService<SS, KeyAssignmentAdapter<SQ>>>,
    packet_handler: PacketHandler<ThrottleService<SS, KeyAssignmentAdapter<SQ>>>,
    replication: ReplicationService<B, KeyAssignmentAdapter<SQ>, P, F>,
}

impl<SQ, SS, B, P, F> ProviderRuntime<SQ, SS, B, P, F>
where
    SQ: StakingQuery + 'static,
    SS: StakingSlashing,
    B: BondedSetProvider,
    P: PacketSender,
    F: ValidatorFilter,
{
    /// Assemble the provider core over one shared state store.
    pub fn new(
        state: Arc<dyn StateStore>,
        staking_query: Arc<SQ>,
        staking_slashing: Arc<SS>,
        bonded: Arc<B>,
        sender: Arc<P>,
        filter: F,
        params: ThrottleParams,
    ) -> RuntimeResult<Self> {
        let key_assignment = Arc::new(KeyAssignmentService::new(Arc::clone(&state), staking_query));
        let adapter = KeyAssignmentAdapter::new(Arc::clone(&key_assignment));

        let throttle = Arc::new(ThrottleService::new(
            Arc::clone(&state),
            staking_slashing,
            Arc::new(adapter.clone()),
            params,
        )?);
        let packet_handler = PacketHandler::new(Arc::clone(&throttle));

        let replication = ReplicationService::new(
            state,
            bonded,
            Arc::new(adapter),
            sender,
            filter,
        );

        Ok(Self {
            key_assignment,
            throttle,
            packet_handler,
            replication,
        })
    }

    /// The key-assignment service (admin and query surface).
    pub fn key_assignment(&self) -> &Arc<KeyAssignmentService<SQ>> {
        &self.key_assignment
    }

    /// The throttle service (query surface).
    pub fn throttle(&self) -> &Arc<ThrottleService<SS, KeyAssignmentAdapter<SQ>>> {
        &self.throttle
    }

    /// The replication service (query surface).
    pub fn replication(&self) -> &ReplicationService<B, KeyAssignmentAdapter<SQ>, P, F> {
        &self.replication
    }

    /// Genesis initialization: fill the slash meter and schedule its first
    /// replenishment.
    pub async fn init_genesis(&self, ctx: BlockContext) -> RuntimeResult<()> {
        self.throttle.initialize_slash_meter(ctx).await?;
        Ok(())
    }

    /// BeginBlock: replenish the slash meter if due, then prune expired key
    /// assignments on every registered consumer.
    pub async fn begin_block(&self, ctx: BlockContext) -> RuntimeResult<()> {
        self.throttle.check_for_replenishment(ctx).await?;

        for (consumer, _) in self.key_assignment.all_consumers().await? {
            self.key_assignment
                .prune_key_assignments(&consumer, ctx)
                .await?;
        }
        Ok(())
    }

    /// Deliver one inbound consumer packet. Never fails the block; the
    /// acknowledgement goes back through the transport.
    pub async fn deliver_packet(
        &self,
        consumer: &ConsumerId,
        packet: &InboundPacket,
        ctx: BlockContext,
    ) -> SlashPacketAck {
        debug!(
            "[runtime] delivering packet seq {} from consumer {}",
            packet.sequence, consumer
        );
        self.packet_handler.handle(consumer, packet, ctx).await
    }

    /// Dispatch a governance/admin message. Returns the allocated consumer
    /// id for consumer creation.
    pub async fn deliver_msg(
        &self,
        msg: ProviderMsg,
        ctx: BlockContext,
    ) -> RuntimeResult<Option<ConsumerId>> {
        Ok(self.key_assignment.handle_msg(msg, ctx).await?)
    }

    /// Convenience for tests and tooling: create a consumer and advance it
    /// straight to the Launched phase.
    pub async fn launch_consumer(&self, chain_id: String) -> RuntimeResult<ConsumerId> {
        let consumer = self.key_assignment.create_consumer(chain_id).await?;
        self.key_assignment
            .set_consumer_phase(&consumer, ConsumerPhase::Initialized)
            .await?;
        self.key_assignment
            .set_consumer_phase(&consumer, ConsumerPhase::Launched)
            .await?;
        Ok(consumer)
    }

    /// EndBlock: replicate validator sets to launched consumers.
    pub async fn end_block(&self, ctx: BlockContext) -> RuntimeResult<()> {
        self.replication.end_block(ctx).await?;
        Ok(())
    }
}
