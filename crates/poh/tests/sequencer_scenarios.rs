use std::sync::Arc;
use std::time::Duration;

use tower_poh::{DelayState, PohService, Sequencer, SequencerConfig, VerifyError, BASE_LOCKOUT};

fn genesis_config() -> SequencerConfig {
    SequencerConfig {
        capacity: 4,
        hashes_per_slot: 2,
        max_slots: 8,
        max_timeout_slots: 8,
        target_slot_duration_ms: 0,
    }
}

#[test]
fn genesis_walkthrough() {
    let mut seq = Sequencer::new(DelayState::from_seed("genesis"), genesis_config()).unwrap();

    seq.step();
    seq.step();
    assert_eq!(seq.sequence(), 2);
    assert_eq!(seq.slot(), 1);
    assert_eq!(seq.lockouts(), &[BASE_LOCKOUT]);

    seq.step();
    seq.step();
    assert_eq!(seq.slot(), 2);
    assert_eq!(seq.lockouts(), &[2, 4]);

    assert!(seq.verify(1), "first verification succeeds");
    assert!(!seq.verify(1), "replay is rejected");
    assert!(!seq.verify(0));
    assert!(!seq.verify(0));
}

#[test]
fn independent_sequencers_agree() {
    let config = SequencerConfig::from_slot_window(256, 16).unwrap();
    let mut a = Sequencer::new(DelayState::from_seed("replay"), config.clone()).unwrap();
    let mut b = Sequencer::new(DelayState::from_seed("replay"), config).unwrap();

    for _ in 0..1_000 {
        let ta = a.step();
        let tb = b.step();
        assert_eq!(ta, tb);
    }
    assert_eq!(a.lockouts(), b.lockouts());
}

#[test]
fn sequencer_chain_matches_batched_delay_function() {
    let seed = DelayState::from_seed("batch");
    let mut seq = Sequencer::new(seed, SequencerConfig::default()).unwrap();
    seq.step_n(500);

    let mut state = seed;
    state.advance_batch(500);
    assert_eq!(seq.last_hash(), state);
}

#[test]
fn slot_wraps_but_lockouts_keep_growing() {
    let config = SequencerConfig {
        capacity: 8,
        hashes_per_slot: 1,
        max_slots: 4,
        max_timeout_slots: 16,
        target_slot_duration_ms: 0,
    };
    let mut seq = Sequencer::new(DelayState::from_seed("wrap"), config).unwrap();

    seq.step_n(4);
    assert_eq!(seq.slot(), 0);
    assert_eq!(seq.lockouts(), &[2, 4, 8, 16]);

    seq.step_n(1);
    assert_eq!(seq.slot(), 1);
    assert_eq!(seq.lockouts(), &[2, 4, 8, 16, 32]);
}

#[test]
fn lockout_history_is_bounded() {
    let config = SequencerConfig {
        capacity: 8,
        hashes_per_slot: 1,
        max_slots: 8,
        max_timeout_slots: 3,
        target_slot_duration_ms: 0,
    };
    let mut seq = Sequencer::new(DelayState::from_seed("bounded"), config).unwrap();
    seq.step_n(10);
    assert_eq!(seq.lockouts(), &[2, 4, 8]);
}

#[test]
fn mixed_events_stay_verifiable_in_sequence() {
    let mut seq =
        Sequencer::new(DelayState::from_seed("events"), SequencerConfig::default()).unwrap();
    seq.step_n(3);
    let event = seq.mix_in(&[0x42; 32]);
    seq.step_n(3);

    for s in 1..=seq.sequence() {
        assert_eq!(seq.verify_detailed(s), Ok(()), "sequence {s}");
    }
    assert_eq!(
        seq.verify_detailed(event.sequence),
        Err(VerifyError::Consumed(event.sequence))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_verifiers_consume_each_sequence_once() {
    let config = SequencerConfig {
        capacity: 1_024,
        hashes_per_slot: 16,
        max_slots: 64,
        max_timeout_slots: 64,
        target_slot_duration_ms: 0,
    };
    let service = Arc::new(PohService::new(
        Sequencer::new(DelayState::from_seed("concurrent"), config).unwrap(),
    ));
    for _ in 0..512 {
        service.step();
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            (1..=512u64).filter(|s| service.verify(*s)).count()
        }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }
    assert_eq!(total, 512, "every sequence verifies exactly once overall");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn verification_runs_alongside_generation() {
    let service = Arc::new(PohService::new(
        Sequencer::new(
            DelayState::from_seed("live"),
            SequencerConfig::default().uncapped(),
        )
        .unwrap(),
    ));
    service.start().unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Mix in an event while the generator runs, then verify it.
    let event = service.mix_in(&[1u8; 32]);
    let outcome = service.verify_detailed(event.sequence);
    service.shutdown().await.unwrap();

    // The generator may have lapped the ring, which fails closed.
    assert!(matches!(
        outcome,
        Ok(()) | Err(VerifyError::OutsideWindow(_))
    ));
    assert!(!service.verify(event.sequence));
    assert!(service.status().sequence >= event.sequence);
}
