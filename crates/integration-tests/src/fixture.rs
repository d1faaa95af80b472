//! Simulated collaborators for whole-block scenario tests.
//!
//! `SimulatedStaking` models the staking module with a *staged* power table:
//! jailing marks the validator immediately, but its table power only drops
//! when the block closes (`end_block`), matching the staking module's
//! end-of-block processing. `RecordingTransport` captures outbound
//! validator-set packets for assertions.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ccv_01_key_assignment::StakingQuery;
use ccv_02_slash_throttle::{StakingSlashing, ThrottleParams};
use ccv_03_valset_replication::{
    AllowAll, BondedSetProvider, BondedValidator, PacketSender, ReplicationResult,
};
use provider_runtime::ProviderRuntime;
use shared_types::{
    BlockContext, BlockTime, ConsensusPublicKey, ConsumerConsAddress, ConsumerId,
    ConsumerPacketData, InboundPacket, InfractionKind, InMemoryStateStore, OperatorAddress,
    PacketValidator, ProviderConsAddress, SlashPacketAck, SlashPacketData, StakingValidator,
    ValidatorSetChangePacketData,
};

/// Default replenish period used by the scenario suites.
pub const REPLENISH_PERIOD: Duration = Duration::from_secs(3600);

/// Default unbonding window used by the scenario suites.
pub const UNBONDING_TIME: Duration = Duration::from_secs(60);

struct ValidatorState {
    validator: StakingValidator,
    /// Power in the last-validator-power table.
    power: i64,
}

/// Staking collaborator with a staged power table.
pub struct SimulatedStaking {
    states: RwLock<Vec<ValidatorState>>,
    unbonding: Duration,
}

impl SimulatedStaking {
    pub fn new(powers: &[i64], unbonding: Duration) -> Arc<Self> {
        let states = powers
            .iter()
            .enumerate()
            .map(|(i, power)| ValidatorState {
                validator: StakingValidator {
                    operator: OperatorAddress::new([i as u8 + 1; 20]),
                    consensus_key: ConsensusPublicKey::new([i as u8 + 1; 32]),
                    jailed: false,
                },
                power: *power,
            })
            .collect();
        Arc::new(Self {
            states: RwLock::new(states),
            unbonding,
        })
    }

    pub fn validator(&self, index: usize) -> StakingValidator {
        self.states.read()[index].validator.clone()
    }

    pub fn is_jailed(&self, index: usize) -> bool {
        self.states.read()[index].validator.jailed
    }

    pub fn power_of(&self, index: usize) -> i64 {
        self.states.read()[index].power
    }

    pub fn total_power(&self) -> i64 {
        self.states.read().iter().map(|s| s.power).sum()
    }

    /// Overwrite a validator's table power (simulates delegation changes
    /// applied by the staking end-blocker).
    pub fn set_power(&self, index: usize, power: i64) {
        self.states.write()[index].power = power;
    }

    /// The staking end-blocker: jailed validators leave the power table.
    pub fn end_block(&self) {
        for state in self.states.write().iter_mut() {
            if state.validator.jailed {
                state.power = 0;
            }
        }
    }
}

#[async_trait]
impl StakingQuery for SimulatedStaking {
    async fn validator_by_cons_addr(
        &self,
        addr: &ProviderConsAddress,
    ) -> Option<StakingValidator> {
        self.states
            .read()
            .iter()
            .map(|s| &s.validator)
            .find(|v| v.provider_cons_addr() == *addr)
            .cloned()
    }

    async fn validator_by_operator(&self, operator: &OperatorAddress) -> Option<StakingValidator> {
        self.states
            .read()
            .iter()
            .map(|s| &s.validator)
            .find(|v| v.operator == *operator)
            .cloned()
    }

    async fn unbonding_time(&self) -> Duration {
        self.unbonding
    }
}

#[async_trait]
impl StakingSlashing for SimulatedStaking {
    async fn validator_by_cons_addr(
        &self,
        addr: &ProviderConsAddress,
    ) -> Option<StakingValidator> {
        StakingQuery::validator_by_cons_addr(self, addr).await
    }

    async fn last_validator_power(&self, operator: &OperatorAddress) -> i64 {
        self.states
            .read()
            .iter()
            .find(|s| s.validator.operator == *operator)
            .map(|s| s.power)
            .unwrap_or(0)
    }

    async fn last_total_power(&self) -> i64 {
        self.total_power()
    }

    async fn jail(&self, addr: &ProviderConsAddress, _infraction: InfractionKind) {
        for state in self.states.write().iter_mut() {
            if state.validator.provider_cons_addr() == *addr {
                state.validator.jailed = true;
            }
        }
    }
}

#[async_trait]
impl BondedSetProvider for SimulatedStaking {
    async fn bonded_validators(&self) -> Vec<BondedValidator> {
        self.states
            .read()
            .iter()
            .map(|s| BondedValidator {
                validator: s.validator.clone(),
                power: s.power,
            })
            .collect()
    }
}

/// Transport collaborator that records outbound validator-set packets.
#[derive(Default)]
pub struct RecordingTransport {
    sent: RwLock<Vec<(ConsumerId, ValidatorSetChangePacketData)>>,
}

impl RecordingTransport {
    /// Drain everything sent since the last call.
    pub fn take_sent(&self) -> Vec<(ConsumerId, ValidatorSetChangePacketData)> {
        std::mem::take(&mut *self.sent.write())
    }
}

#[async_trait]
impl PacketSender for RecordingTransport {
    async fn send_valset_change(
        &self,
        consumer: &ConsumerId,
        packet: ValidatorSetChangePacketData,
    ) -> ReplicationResult<()> {
        self.sent.write().push((consumer.clone(), packet));
        Ok(())
    }
}

/// The type every scenario runtime resolves to.
pub type SimulatedRuntime = ProviderRuntime<
    SimulatedStaking,
    SimulatedStaking,
    SimulatedStaking,
    RecordingTransport,
    AllowAll,
>;

/// The assembled provider with simulated collaborators and a block clock.
pub struct SimulatedProvider {
    pub staking: Arc<SimulatedStaking>,
    pub transport: Arc<RecordingTransport>,
    pub runtime: SimulatedRuntime,
    height: AtomicU64,
    time_nanos: AtomicU64,
}

impl SimulatedProvider {
    /// Assemble a provider with the given validator powers and replenish
    /// fraction, slash meter initialized at genesis.
    pub async fn new(powers: &[i64], replenish_fraction: &str) -> Self {
        let staking = SimulatedStaking::new(powers, UNBONDING_TIME);
        let transport = Arc::new(RecordingTransport::default());
        let runtime = ProviderRuntime::new(
            Arc::new(InMemoryStateStore::new()),
            Arc::clone(&staking),
            Arc::clone(&staking),
            Arc::clone(&staking),
            Arc::clone(&transport),
            AllowAll,
            ThrottleParams::new(replenish_fraction, REPLENISH_PERIOD).unwrap(),
        )
        .unwrap();

        let provider = Self {
            staking,
            transport,
            runtime,
            height: AtomicU64::new(1),
            time_nanos: AtomicU64::new(1),
        };
        provider.runtime.init_genesis(provider.ctx()).await.unwrap();
        provider
    }

    /// The current block context.
    pub fn ctx(&self) -> BlockContext {
        BlockContext::new(
            self.height.load(Ordering::SeqCst),
            BlockTime::from_nanos(self.time_nanos.load(Ordering::SeqCst)),
        )
    }

    pub fn advance_time(&self, duration: Duration) {
        self.time_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn set_time(&self, time: BlockTime) {
        self.time_nanos.store(time.as_nanos(), Ordering::SeqCst);
    }

    /// Close the block: the staking end-blocker runs and the height advances.
    pub fn next_block(&self) {
        self.staking.end_block();
        self.height.fetch_add(1, Ordering::SeqCst);
    }

    /// The consumer address a validator has by default (its provider key).
    pub fn default_consumer_addr(&self, index: usize) -> ConsumerConsAddress {
        self.staking.validator(index).consensus_key.to_consumer_addr()
    }

    /// Deliver one slash packet through the runtime's packet path.
    pub async fn deliver_slash(
        &self,
        consumer: &ConsumerId,
        addr: ConsumerConsAddress,
        infraction: InfractionKind,
        sequence: u64,
    ) -> SlashPacketAck {
        let data = ConsumerPacketData::Slash(SlashPacketData {
            valset_update_id: 1,
            validator: PacketValidator { address: addr, power: 0 },
            infraction,
        });
        let packet = InboundPacket {
            sequence,
            source_channel: format!("channel-{consumer}"),
            data: data.encode(),
            timeout_height: 0,
            timeout_timestamp: BlockTime::from_nanos(0),
        };
        self.runtime.deliver_packet(consumer, &packet, self.ctx()).await
    }
}
