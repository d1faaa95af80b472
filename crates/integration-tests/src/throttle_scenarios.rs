//! Slash-packet throttling scenarios.
//!
//! Four validators with 1000 power each unless stated otherwise; each case
//! drives whole blocks through the runtime, with acknowledgements observed
//! at the packet surface and jail state observed in the staking fixture.

use std::time::Duration;

use ccv_02_slash_throttle::ThrottleApi;
use shared_types::{BlockContext, InfractionKind};

use crate::fixture::{SimulatedProvider, REPLENISH_PERIOD};

/// One replenish tick driven through BeginBlock, asserting candidate
/// bookkeeping on the way.
async fn replenish_via_begin_block(provider: &SimulatedProvider) {
    let throttle = provider.runtime.throttle();
    let candidate = throttle.replenish_candidate().await.unwrap();
    provider.set_time(candidate.saturating_add(Duration::from_secs(60)));
    provider.next_block();

    let before = throttle.slash_meter().await.unwrap();
    provider.runtime.begin_block(provider.ctx()).await.unwrap();
    let after = throttle.slash_meter().await.unwrap();
    assert!(after > before, "tick must increase the meter");

    // Candidate moved to block time + period; the same block cannot tick
    // twice.
    assert_eq!(
        throttle.replenish_candidate().await.unwrap(),
        provider.ctx().time.saturating_add(REPLENISH_PERIOD)
    );
    provider.runtime.begin_block(provider.ctx()).await.unwrap();
    assert_eq!(throttle.slash_meter().await.unwrap(), after);
}

#[tokio::test]
async fn test_basic_slash_packet_throttling() {
    struct Case {
        replenish_fraction: &'static str,
        meter_before_first_slash: i64,
        meter_after_first_slash: i64,
        allowance_after_first_slash: i64,
        replenishes_till_positive: usize,
    }
    // allowance = fraction * 4000 before the slash, fraction * 3000 after.
    let cases = [
        Case {
            replenish_fraction: "0.2",
            meter_before_first_slash: 800,
            meter_after_first_slash: -200,
            allowance_after_first_slash: 600,
            replenishes_till_positive: 1,
        },
        Case {
            replenish_fraction: "0.1",
            meter_before_first_slash: 400,
            meter_after_first_slash: -600,
            allowance_after_first_slash: 300,
            replenishes_till_positive: 3,
        },
        Case {
            replenish_fraction: "0.05",
            meter_before_first_slash: 200,
            meter_after_first_slash: -800,
            allowance_after_first_slash: 150,
            replenishes_till_positive: 6,
        },
        Case {
            replenish_fraction: "0.01",
            meter_before_first_slash: 40,
            meter_after_first_slash: -960,
            allowance_after_first_slash: 30,
            replenishes_till_positive: 33,
        },
    ];

    for case in cases {
        let provider =
            SimulatedProvider::new(&[1000, 1000, 1000, 1000], case.replenish_fraction).await;
        let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();
        let throttle = provider.runtime.throttle();

        assert_eq!(
            throttle.slash_meter().await.unwrap(),
            case.meter_before_first_slash
        );
        for i in 0..4 {
            assert!(!provider.staking.is_jailed(i));
        }

        // First downtime slash is admitted and drives the meter negative.
        let ack = provider
            .deliver_slash(
                &consumer,
                provider.default_consumer_addr(0),
                InfractionKind::Downtime,
                1,
            )
            .await;
        assert!(ack.is_handled());
        provider.next_block();

        assert!(provider.staking.is_jailed(0));
        assert_eq!(provider.staking.power_of(0), 0);
        assert_eq!(
            throttle.slash_meter().await.unwrap(),
            case.meter_after_first_slash
        );
        assert_eq!(
            throttle.slash_meter_allowance().await.unwrap(),
            case.allowance_after_first_slash
        );

        // Second slash bounces: no jail, meter unchanged.
        let ack = provider
            .deliver_slash(
                &consumer,
                provider.default_consumer_addr(2),
                InfractionKind::Downtime,
                2,
            )
            .await;
        assert!(ack.is_bounce());
        assert!(!provider.staking.is_jailed(2));
        assert_eq!(
            throttle.slash_meter().await.unwrap(),
            case.meter_after_first_slash
        );

        // Replenish until positive; the meter must stay non-positive until
        // the final tick.
        for i in 0..case.replenishes_till_positive {
            replenish_via_begin_block(&provider).await;
            let meter = throttle.slash_meter().await.unwrap();
            assert_eq!(meter > 0, i == case.replenishes_till_positive - 1);
        }

        // The consumer retries with a fresh sequence number and is admitted.
        let ack = provider
            .deliver_slash(
                &consumer,
                provider.default_consumer_addr(2),
                InfractionKind::Downtime,
                3,
            )
            .await;
        assert!(ack.is_handled());
        provider.next_block();
        assert!(provider.staking.is_jailed(2));
        assert_eq!(provider.staking.power_of(2), 0);
    }
}

#[tokio::test]
async fn test_multi_consumer_slash_packet_throttling() {
    let provider = SimulatedProvider::new(&[1000, 1000, 1000, 1000], "0.05").await;
    let consumers = [
        provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap(),
        provider.runtime.launch_consumer("neutron-1".to_string()).await.unwrap(),
        provider.runtime.launch_consumer("stride-1".to_string()).await.unwrap(),
    ];
    let throttle = provider.runtime.throttle();

    // Each consumer slashes a different validator; only the first fits the
    // meter.
    let acks = [
        provider
            .deliver_slash(
                &consumers[0],
                provider.default_consumer_addr(0),
                InfractionKind::Downtime,
                1,
            )
            .await,
        provider
            .deliver_slash(
                &consumers[1],
                provider.default_consumer_addr(1),
                InfractionKind::Downtime,
                1,
            )
            .await,
        provider
            .deliver_slash(
                &consumers[2],
                provider.default_consumer_addr(2),
                InfractionKind::Downtime,
                1,
            )
            .await,
    ];
    assert!(acks[0].is_handled());
    assert!(acks[1].is_bounce());
    assert!(acks[2].is_bounce());
    provider.next_block();

    assert!(provider.staking.is_jailed(0));
    assert!(!provider.staking.is_jailed(1));
    assert!(!provider.staking.is_jailed(2));
    assert_eq!(provider.staking.total_power(), 3000);

    // Replenish until positive, then both bounced consumers retry; only one
    // fits.
    while throttle.slash_meter().await.unwrap() <= 0 {
        throttle.replenish_slash_meter().await.unwrap();
    }
    let ack = provider
        .deliver_slash(
            &consumers[1],
            provider.default_consumer_addr(1),
            InfractionKind::Downtime,
            2,
        )
        .await;
    assert!(ack.is_handled());
    let ack = provider
        .deliver_slash(
            &consumers[2],
            provider.default_consumer_addr(2),
            InfractionKind::Downtime,
            2,
        )
        .await;
    assert!(ack.is_bounce());
    provider.next_block();
    assert_eq!(provider.staking.total_power(), 2000);

    // One more replenish round admits the last retry.
    while throttle.slash_meter().await.unwrap() <= 0 {
        throttle.replenish_slash_meter().await.unwrap();
    }
    let ack = provider
        .deliver_slash(
            &consumers[2],
            provider.default_consumer_addr(2),
            InfractionKind::Downtime,
            3,
        )
        .await;
    assert!(ack.is_handled());
    provider.next_block();
    assert_eq!(provider.staking.total_power(), 1000);
    for i in 0..3 {
        assert!(provider.staking.is_jailed(i));
    }
}

#[tokio::test]
async fn test_packet_spam() {
    let provider = SimulatedProvider::new(&[1000, 1000, 1000, 1000], "0.75").await;
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();

    // 500 packets in one block, alternating infraction kinds, targeting the
    // first three validators round-robin.
    for sequence in 1u64..=500 {
        let infraction = if sequence % 2 == 0 {
            InfractionKind::Downtime
        } else {
            InfractionKind::DoubleSign
        };
        let target = (sequence % 3) as usize;
        let ack = provider
            .deliver_slash(
                &consumer,
                provider.default_consumer_addr(target),
                infraction,
                sequence,
            )
            .await;
        assert!(ack.is_handled(), "seq {sequence} should not bounce");
    }
    provider.next_block();

    for i in 0..3 {
        assert!(provider.staking.is_jailed(i));
    }
    assert!(!provider.staking.is_jailed(3));
}

#[tokio::test]
async fn test_double_sign_does_not_affect_throttling() {
    let provider = SimulatedProvider::new(&[1000, 1000, 1000, 1000], "0.1").await;
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();
    let throttle = provider.runtime.throttle();
    let initial_meter = throttle.slash_meter().await.unwrap();
    assert_eq!(initial_meter, 400);

    // 500 double-sign packets in one block against the first three
    // validators.
    for sequence in 1u64..=500 {
        let target = (sequence % 3) as usize;
        let ack = provider
            .deliver_slash(
                &consumer,
                provider.default_consumer_addr(target),
                InfractionKind::DoubleSign,
                sequence,
            )
            .await;
        assert!(ack.is_handled());
        // The meter never moves, no matter how many double signs arrive.
        assert_eq!(throttle.slash_meter().await.unwrap(), initial_meter);
    }
    provider.next_block();
    provider.next_block();

    assert_eq!(throttle.slash_meter().await.unwrap(), initial_meter);
    for i in 0..3 {
        assert!(provider.staking.is_jailed(i));
        assert!(throttle
            .slash_log(&provider.staking.validator(i).provider_cons_addr())
            .await
            .unwrap());
    }
    // The fourth validator is untouched: not jailed, full power, no log.
    assert!(!provider.staking.is_jailed(3));
    assert_eq!(provider.staking.power_of(3), 1000);
    assert!(!throttle
        .slash_log(&provider.staking.validator(3).provider_cons_addr())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_slash_all_validators_in_one_block() {
    // Fraction 1.0 disables throttling entirely: the whole set can be
    // jailed in a single block.
    let provider = SimulatedProvider::new(&[1000, 1000, 1000, 1000], "1.0").await;
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();

    let mut sequence = 0u64;
    for target in 0..4 {
        sequence += 1;
        let ack = provider
            .deliver_slash(
                &consumer,
                provider.default_consumer_addr(target),
                InfractionKind::Downtime,
                sequence,
            )
            .await;
        assert!(ack.is_handled());
    }
    // Five more packets per validator in the same block are no-ops.
    for target in 0..4 {
        for _ in 0..5 {
            sequence += 1;
            let ack = provider
                .deliver_slash(
                    &consumer,
                    provider.default_consumer_addr(target),
                    InfractionKind::Downtime,
                    sequence,
                )
                .await;
            assert!(ack.is_handled());
        }
    }

    for i in 0..4 {
        assert!(provider.staking.is_jailed(i));
    }
    assert_eq!(provider.runtime.throttle().slash_meter().await.unwrap(), 0);
}

#[tokio::test]
async fn test_bounced_fourth_validator_jailed_after_replenish() {
    // With fraction 0.75 the meter admits three of four validators in one
    // block; the fourth bounces and lands after a replenish tick.
    let provider = SimulatedProvider::new(&[1000, 1000, 1000, 1000], "0.75").await;
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();
    let throttle = provider.runtime.throttle();
    assert_eq!(throttle.slash_meter().await.unwrap(), 3000);

    for target in 0..3 {
        let ack = provider
            .deliver_slash(
                &consumer,
                provider.default_consumer_addr(target),
                InfractionKind::Downtime,
                target as u64 + 1,
            )
            .await;
        assert!(ack.is_handled());
    }
    // Meter is exactly exhausted; the fourth bounces.
    assert_eq!(throttle.slash_meter().await.unwrap(), 0);
    let ack = provider
        .deliver_slash(
            &consumer,
            provider.default_consumer_addr(3),
            InfractionKind::Downtime,
            4,
        )
        .await;
    assert!(ack.is_bounce());
    assert!(!provider.staking.is_jailed(3));
    provider.next_block();

    replenish_via_begin_block(&provider).await;
    let ack = provider
        .deliver_slash(
            &consumer,
            provider.default_consumer_addr(3),
            InfractionKind::Downtime,
            5,
        )
        .await;
    assert!(ack.is_handled());
    provider.next_block();
    for i in 0..4 {
        assert!(provider.staking.is_jailed(i));
    }
}

#[tokio::test]
async fn test_slashing_small_validators_is_not_throttled() {
    // One large validator and three small ones: the default fraction admits
    // all three small slashes immediately.
    let provider = SimulatedProvider::new(&[1000, 10, 10, 10], "0.05").await;
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();

    for target in 1..4 {
        let ack = provider
            .deliver_slash(
                &consumer,
                provider.default_consumer_addr(target),
                InfractionKind::Downtime,
                target as u64,
            )
            .await;
        assert!(ack.is_handled());
    }
    provider.next_block();

    assert!(!provider.staking.is_jailed(0));
    assert_eq!(provider.staking.power_of(0), 1000);
    for i in 1..4 {
        assert!(provider.staking.is_jailed(i));
        assert_eq!(provider.staking.power_of(i), 0);
    }
}

#[tokio::test]
async fn test_allowance_tracks_power_and_params() {
    // Four validators with power 1: the floor of 1 is in effect.
    let provider = SimulatedProvider::new(&[1, 1, 1, 1], "0.05").await;
    let throttle = provider.runtime.throttle();
    assert_eq!(throttle.slash_meter_allowance().await.unwrap(), 1);

    // Power growth raises the allowance.
    for i in 0..4 {
        provider.staking.set_power(i, 1000);
    }
    assert_eq!(throttle.slash_meter_allowance().await.unwrap(), 200);

    // A fraction change takes effect on the next read.
    throttle
        .set_params(ccv_02_slash_throttle::ThrottleParams::new("0.3", REPLENISH_PERIOD).unwrap())
        .unwrap();
    assert_eq!(throttle.slash_meter_allowance().await.unwrap(), 1200);
}

#[tokio::test]
async fn test_expired_packet_is_rejected_without_state_change() {
    let provider = SimulatedProvider::new(&[1000, 1000, 1000, 1000], "0.05").await;
    let consumer = provider.runtime.launch_consumer("pion-1".to_string()).await.unwrap();
    provider.set_time(shared_types::BlockTime::from_nanos(1_000_000));
    let throttle = provider.runtime.throttle();
    let meter_before = throttle.slash_meter().await.unwrap();

    let data = shared_types::ConsumerPacketData::Slash(shared_types::SlashPacketData {
        valset_update_id: 1,
        validator: shared_types::PacketValidator {
            address: provider.default_consumer_addr(0),
            power: 0,
        },
        infraction: InfractionKind::Downtime,
    });
    let packet = shared_types::InboundPacket {
        sequence: 1,
        source_channel: "channel-0".to_string(),
        data: data.encode(),
        timeout_height: 0,
        timeout_timestamp: shared_types::BlockTime::from_nanos(500),
    };
    let ctx = BlockContext::new(provider.ctx().height, provider.ctx().time);
    let ack = provider.runtime.deliver_packet(&consumer, &packet, ctx).await;

    assert!(matches!(ack, shared_types::SlashPacketAck::Error(_)));
    assert!(!provider.staking.is_jailed(0));
    assert_eq!(throttle.slash_meter().await.unwrap(), meter_before);
}
