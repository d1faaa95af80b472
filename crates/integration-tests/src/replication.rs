//! Validator-set replication scenarios at the runtime surface.

use ccv_01_key_assignment::{ConsumerPhase, KeyAssignmentApi};
use shared_types::ConsensusPublicKey;

use crate::fixture::SimulatedProvider;

#[tokio::test]
async fn test_replication_rewrites_assigned_keys() {
    let provider = SimulatedProvider::new(&[10, 20], "0.05").await;
    let service = provider.runtime.key_assignment();
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();

    let v0 = provider.staking.validator(0);
    let v1 = provider.staking.validator(1);
    let assigned = ConsensusPublicKey::new([99; 32]);
    service
        .assign_consumer_key(&consumer, &v1, assigned, provider.ctx())
        .await
        .unwrap();

    provider.runtime.end_block(provider.ctx()).await.unwrap();

    let sent = provider.transport.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, consumer);
    let packet = &sent[0].1;

    // V0 under its provider key at power 10, V1 under the assigned key at
    // power 20, and V1's provider key nowhere.
    assert_eq!(packet.updates.len(), 2);
    let by_key = |key: ConsensusPublicKey| packet.updates.iter().find(|u| u.pub_key == key);
    assert_eq!(by_key(v0.consensus_key).unwrap().power, 10);
    assert_eq!(by_key(assigned).unwrap().power, 20);
    assert!(by_key(v1.consensus_key).is_none());
}

#[tokio::test]
async fn test_unlaunched_consumers_get_no_packets() {
    let provider = SimulatedProvider::new(&[10, 20], "0.05").await;
    let service = provider.runtime.key_assignment();

    let registered = service.create_consumer("pion-1".to_string()).await.unwrap();
    let initialized = service.create_consumer("neutron-1".to_string()).await.unwrap();
    service
        .set_consumer_phase(&initialized, ConsumerPhase::Initialized)
        .await
        .unwrap();

    provider.runtime.end_block(provider.ctx()).await.unwrap();
    assert!(provider.transport.take_sent().is_empty());

    // Launching starts the update flow.
    service
        .set_consumer_phase(&initialized, ConsumerPhase::Launched)
        .await
        .unwrap();
    provider.runtime.end_block(provider.ctx()).await.unwrap();
    let sent = provider.transport.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, initialized);
    assert_ne!(sent[0].0, registered);
}

#[tokio::test]
async fn test_valset_update_id_advances_every_block() {
    let provider = SimulatedProvider::new(&[10], "0.05").await;
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();

    provider.runtime.end_block(provider.ctx()).await.unwrap();
    provider.next_block();
    provider.runtime.end_block(provider.ctx()).await.unwrap();
    provider.next_block();

    // Power change in the third block produces the second packet, carrying
    // the advanced update id.
    provider.staking.set_power(0, 25);
    provider.runtime.end_block(provider.ctx()).await.unwrap();

    let sent = provider.transport.take_sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(id, _)| *id == consumer));
    assert_eq!(sent[0].1.valset_update_id, 0);
    assert_eq!(sent[1].1.valset_update_id, 2);
}

#[tokio::test]
async fn test_jailed_validator_leaves_consumer_set_next_block() {
    let provider = SimulatedProvider::new(&[1000, 1000, 1000, 1000], "1.0").await;
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();

    provider.runtime.end_block(provider.ctx()).await.unwrap();
    let first = provider.transport.take_sent();
    assert_eq!(first[0].1.updates.len(), 4);
    provider.next_block();

    provider
        .deliver_slash(
            &consumer,
            provider.default_consumer_addr(2),
            shared_types::InfractionKind::Downtime,
            1,
        )
        .await;
    // The staking end-blocker zeroes the jailed validator's power; the next
    // replication emits its deletion.
    provider.next_block();
    provider.runtime.end_block(provider.ctx()).await.unwrap();

    let sent = provider.transport.take_sent();
    assert_eq!(sent.len(), 1);
    let updates = &sent[0].1.updates;
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].pub_key,
        provider.staking.validator(2).consensus_key
    );
    assert_eq!(updates[0].power, 0);
}
