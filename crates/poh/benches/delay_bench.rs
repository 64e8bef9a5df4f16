use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tower_poh::{DelayState, Sequencer, SequencerConfig};

const BATCH: u64 = 10_000;

fn bench_advance_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("poh_delay");
    group.throughput(Throughput::Elements(BATCH));

    group.bench_function("advance_batch_10k", |b| {
        let mut state = DelayState::from_seed("bench");
        b.iter(|| {
            state.advance_batch(BATCH);
            black_box(state);
        });
    });

    group.bench_function("sequencer_step_10k", |b| {
        let mut sequencer = Sequencer::new(
            DelayState::from_seed("bench"),
            SequencerConfig::default().uncapped(),
        )
        .expect("default config is valid");
        b.iter(|| {
            black_box(sequencer.step_n(BATCH));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_advance_batch);
criterion_main!(benches);
