//! Key-assignment scenarios: the rule walk-through and the randomized
//! assignment/power simulation with property checks after every block.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use ccv_01_key_assignment::domain::invariants;
use ccv_01_key_assignment::{ConsumerPhase, KeyAssignmentApi, KeyAssignmentError};
use shared_types::{
    ConsensusPublicKey, ConsumerConsAddress, ProviderConsAddress, StakingValidator,
};

use crate::fixture::{SimulatedProvider, UNBONDING_TIME};

fn assignable_key(index: usize) -> ConsensusPublicKey {
    // Indices below the validator count are the provider keys themselves;
    // the fixture derives validator keys the same way.
    ConsensusPublicKey::new([index as u8 + 1; 32])
}

#[tokio::test]
async fn test_assignment_rule_walkthrough() {
    let provider = SimulatedProvider::new(&[10, 20], "0.05").await;
    let service = provider.runtime.key_assignment();
    let consumer = service.create_consumer("pion-1".to_string()).await.unwrap();
    service
        .set_consumer_phase(&consumer, ConsumerPhase::Initialized)
        .await
        .unwrap();

    let v0 = provider.staking.validator(0);
    let v1 = provider.staking.validator(1);
    let key_a = assignable_key(10);
    let addr_a = key_a.to_consumer_addr();

    // Assign V0 -> key A; both directions resolve.
    service
        .assign_consumer_key(&consumer, &v0, key_a, provider.ctx())
        .await
        .unwrap();
    assert_eq!(
        service
            .assigned_consumer_key(&consumer, &v0.provider_cons_addr())
            .await
            .unwrap(),
        Some(key_a)
    );
    assert_eq!(
        service.resolve_consumer_key(&consumer, &v0).await.unwrap(),
        key_a
    );
    // V1 never assigned anything, so it resolves to its provider key.
    assert_eq!(
        service.resolve_consumer_key(&consumer, &v1).await.unwrap(),
        v1.consensus_key
    );
    assert_eq!(
        service
            .provider_addr_from_consumer_addr(&consumer, &addr_a)
            .await
            .unwrap(),
        v0.provider_cons_addr()
    );

    // V1 cannot claim the same key.
    let err = service
        .assign_consumer_key(&consumer, &v1, key_a, provider.ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, KeyAssignmentError::AlreadyTaken { .. }));

    // V1 cannot claim V0's provider key while V0 is active.
    let err = service
        .assign_consumer_key(&consumer, &v1, v0.consensus_key, provider.ctx())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        KeyAssignmentError::CollidesWithActiveValidator { .. }
    ));

    // V0 undoes its assignment by taking its own provider key back.
    service
        .assign_consumer_key(&consumer, &v0, v0.consensus_key, provider.ctx())
        .await
        .unwrap();

    // The old address is scheduled to prune at now + unbonding time, and
    // still resolves to V0 until then.
    let buckets = service.store().all_addrs_to_prune(&consumer).unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(
        buckets[0].0,
        provider.ctx().time.saturating_add(UNBONDING_TIME)
    );
    assert_eq!(buckets[0].1.addresses, vec![addr_a]);
    assert_eq!(
        service
            .provider_addr_from_consumer_addr(&consumer, &addr_a)
            .await
            .unwrap(),
        v0.provider_cons_addr()
    );

    invariants::assert_invariants(service.store(), &consumer);
}

/// Randomized simulation: blocks of random key assignments interleaved with
/// random power updates, with the uniqueness, pruning, replication, and
/// lookup-stability properties checked after every block.
#[tokio::test]
async fn test_simulated_assignments_and_update_application() {
    const NUM_EXECUTIONS: u64 = 20;
    const NUM_BLOCKS: usize = 40;
    const NUM_VALIDATORS: usize = 4;
    // Small on purpose: key reuse across assignments is the interesting case.
    const NUM_ASSIGNABLE_KEYS: usize = 12;
    const MAX_ASSIGNMENTS_PER_BLOCK: usize = 8;

    for seed in 0..NUM_EXECUTIONS {
        let mut rng = StdRng::seed_from_u64(seed);
        let provider = SimulatedProvider::new(&[0; NUM_VALIDATORS], "0.05").await;
        let service = provider.runtime.key_assignment();
        let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();

        let validators: Vec<StakingValidator> = (0..NUM_VALIDATORS)
            .map(|i| provider.staking.validator(i))
            .collect();

        // Mirror valsets, provider-side by index and consumer-side by
        // consumer address.
        let mut provider_powers = vec![0i64; NUM_VALIDATORS];
        let mut consumer_powers: HashMap<ConsumerConsAddress, i64> = HashMap::new();
        // Last observed resolution per consumer address, cleared when the
        // reverse-lookup entry is pruned.
        let mut last_resolved: HashMap<ConsumerConsAddress, ProviderConsAddress> = HashMap::new();

        for _block in 0..NUM_BLOCKS {
            // Random assignment txs; failures are allowed and ignored.
            for _ in 0..rng.gen_range(0..=MAX_ASSIGNMENTS_PER_BLOCK) {
                let validator = &validators[rng.gen_range(0..NUM_VALIDATORS)];
                let key = assignable_key(rng.gen_range(0..NUM_VALIDATORS + NUM_ASSIGNABLE_KEYS));
                let _ = service
                    .assign_consumer_key(&consumer, validator, key, provider.ctx())
                    .await;
            }

            // Random power updates on a random subset of validators.
            let mut indices: Vec<usize> = (0..NUM_VALIDATORS).collect();
            indices.shuffle(&mut rng);
            for &i in indices.iter().take(rng.gen_range(0..=NUM_VALIDATORS)) {
                let power = rng.gen_range(0..3);
                provider.staking.set_power(i, power);
                provider_powers[i] = power;
            }

            // EndBlock replication; apply emitted updates to the consumer
            // mirror.
            provider.runtime.end_block(provider.ctx()).await.unwrap();
            for (_, packet) in provider.transport.take_sent() {
                for update in packet.updates {
                    consumer_powers.insert(update.pub_key.to_consumer_addr(), update.power);
                }
            }

            // Prune with the current block time, tracking which reverse
            // entries disappear.
            let before: HashSet<ConsumerConsAddress> = service
                .store()
                .all_by_consumer_addr(&consumer)
                .unwrap()
                .into_iter()
                .map(|(addr, _)| addr)
                .collect();
            service
                .prune_key_assignments(&consumer, provider.ctx())
                .await
                .unwrap();
            let after: HashSet<ConsumerConsAddress> = service
                .store()
                .all_by_consumer_addr(&consumer)
                .unwrap()
                .into_iter()
                .map(|(addr, _)| addr)
                .collect();
            for pruned in before.difference(&after) {
                last_resolved.remove(pruned);
            }

            // Uniqueness and bounded storage hold after every block.
            assert!(invariants::check_unique_consumer_addrs(service.store(), &consumer).unwrap());
            assert!(invariants::check_pruning_property(service.store(), &consumer).unwrap());

            // Replication, forward direction: every active provider
            // validator appears on the consumer under its resolved key with
            // equal power.
            for (i, validator) in validators.iter().enumerate() {
                if provider_powers[i] == 0 {
                    continue;
                }
                let key = service
                    .assigned_consumer_key(&consumer, &validator.provider_cons_addr())
                    .await
                    .unwrap()
                    .unwrap_or(validator.consensus_key);
                assert_eq!(
                    consumer_powers.get(&key.to_consumer_addr()).copied(),
                    Some(provider_powers[i]),
                    "forward replication failed (seed {seed})"
                );
            }

            // Replication, backward direction: every active consumer
            // validator maps back to a provider validator with equal power.
            for (consumer_addr, power) in &consumer_powers {
                if *power == 0 {
                    continue;
                }
                let provider_addr = service
                    .provider_addr_from_consumer_addr(&consumer, consumer_addr)
                    .await
                    .unwrap();
                let index = validators
                    .iter()
                    .position(|v| v.provider_cons_addr() == provider_addr)
                    .expect("consumer validator must map to a provider validator");
                assert_eq!(
                    provider_powers[index], *power,
                    "backward replication failed (seed {seed})"
                );
            }

            // Lookup stability: a consumer address resolves to the same
            // provider address for as long as its reverse entry survives
            // pruning.
            for (consumer_addr, power) in &consumer_powers {
                if *power == 0 {
                    continue;
                }
                let resolved = service
                    .provider_addr_from_consumer_addr(&consumer, consumer_addr)
                    .await
                    .unwrap();
                if let Some(previous) = last_resolved.insert(*consumer_addr, resolved) {
                    assert_eq!(
                        previous, resolved,
                        "lookup changed without a prune in between (seed {seed})"
                    );
                }
            }

            // Advance time by a random slice of the unbonding window, so
            // only some scheduled prunes expire per block.
            let step = rng.gen_range(0..UNBONDING_TIME.as_nanos() as u64 / 10);
            provider.advance_time(Duration::from_nanos(step));
            provider.next_block();
        }
    }
}

#[tokio::test]
async fn test_governance_message_dispatch() {
    use ccv_01_key_assignment::{
        MsgAssignConsumerKey, MsgCreateConsumer, MsgUpdateConsumer, ProviderMsg,
    };

    let provider = SimulatedProvider::new(&[10, 20], "0.05").await;
    let service = provider.runtime.key_assignment();

    // Create, then advance the consumer to an assignment-accepting phase.
    let consumer = provider
        .runtime
        .deliver_msg(
            ProviderMsg::CreateConsumer(MsgCreateConsumer {
                chain_id: "pion-1".to_string(),
            }),
            provider.ctx(),
        )
        .await
        .unwrap()
        .expect("consumer creation returns the allocated id");
    assert_eq!(
        service.consumer_phase(&consumer).await.unwrap(),
        Some(ConsumerPhase::Registered)
    );
    service
        .set_consumer_phase(&consumer, ConsumerPhase::Initialized)
        .await
        .unwrap();

    // The chain id can be updated under the same consumer id.
    provider
        .runtime
        .deliver_msg(
            ProviderMsg::UpdateConsumer(MsgUpdateConsumer {
                consumer_id: consumer.clone(),
                chain_id: "pion-2".to_string(),
            }),
            provider.ctx(),
        )
        .await
        .unwrap();

    // Key assignment signed by validator 0's operator lands in state.
    let v0 = provider.staking.validator(0);
    let key = assignable_key(10);
    provider
        .runtime
        .deliver_msg(
            ProviderMsg::AssignConsumerKey(MsgAssignConsumerKey {
                consumer_id: consumer.clone(),
                operator: v0.operator,
                consumer_key: key,
            }),
            provider.ctx(),
        )
        .await
        .unwrap();
    assert_eq!(
        service
            .assigned_consumer_key(&consumer, &v0.provider_cons_addr())
            .await
            .unwrap(),
        Some(key)
    );

    // A signer without a validator is rejected.
    let err = provider
        .runtime
        .deliver_msg(
            ProviderMsg::AssignConsumerKey(MsgAssignConsumerKey {
                consumer_id: consumer,
                operator: shared_types::OperatorAddress::new([0xAA; 20]),
                consumer_key: assignable_key(11),
            }),
            provider.ctx(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        provider_runtime::RuntimeError::KeyAssignment(
            KeyAssignmentError::SignerNotValidator { .. }
        )
    ));
}

/// Storage stays bounded: after rotating keys far past the unbonding window,
/// the reverse index holds only live assignments.
#[tokio::test]
async fn test_reverse_index_is_bounded_by_pruning() {
    let provider = SimulatedProvider::new(&[100], "0.05").await;
    let service = provider.runtime.key_assignment();
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();
    let validator = provider.staking.validator(0);

    // Rotate through many keys, expiring the unbonding window each time.
    for round in 0..20usize {
        service
            .assign_consumer_key(&consumer, &validator, assignable_key(round + 5), provider.ctx())
            .await
            .unwrap();
        provider.advance_time(UNBONDING_TIME + Duration::from_secs(1));
        service
            .prune_key_assignments(&consumer, provider.ctx())
            .await
            .unwrap();
        provider.next_block();
    }

    let entries = service.store().all_by_consumer_addr(&consumer).unwrap();
    assert_eq!(entries.len(), 1, "only the live assignment may remain");
    assert!(service.store().all_addrs_to_prune(&consumer).unwrap().is_empty());
    invariants::assert_invariants(service.store(), &consumer);
}
