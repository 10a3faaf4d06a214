//! Benchmarks for buffering, threshold evaluation and tick throughput

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use nicu_monitor::{MonitorConfig, RingBuffer, Sample, ThresholdEngine, VitalChannel, VitalPipeline};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_ring_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("push_1000_samples", |b| {
        let mut buffer = RingBuffer::new(300).unwrap();
        b.iter(|| {
            for i in 0..1000u64 {
                let evicted = buffer.push(Sample::new(VitalChannel::HeartRate, 145.0, i));
                black_box(evicted);
            }
        })
    });

    let mut buffer = RingBuffer::new(300).unwrap();
    for i in 0..1000u64 {
        buffer.push(Sample::new(VitalChannel::HeartRate, 145.0, i));
    }
    group.bench_function("snapshot_300_samples", |b| b.iter(|| black_box(buffer.to_vec())));

    group.finish();
}

fn bench_threshold_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("threshold_engine");

    // Alternate in and out of range so violation state churns
    let samples: Vec<Sample> = (0..1000u64)
        .map(|i| {
            let value = if i % 7 < 4 { 90.0 } else { 145.0 };
            Sample::new(VitalChannel::HeartRate, value, i * 1000)
        })
        .collect();

    group.throughput(Throughput::Elements(samples.len() as u64));
    group.bench_function("evaluate_1000_samples", |b| {
        b.iter(|| {
            let mut engine = ThresholdEngine::default();
            for sample in &samples {
                black_box(engine.evaluate(sample, 1000, 30_000));
            }
        })
    });

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(100));

    group.bench_function("tick_100", |b| {
        let mut pipeline = VitalPipeline::with_rng(
            MonitorConfig::default(),
            Box::new(StdRng::seed_from_u64(42)),
        )
        .unwrap();
        let mut now = 0u64;
        b.iter(|| {
            for _ in 0..100 {
                now += 1000;
                black_box(pipeline.tick(now));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_ring_buffer, bench_threshold_engine, bench_tick);
criterion_main!(benches);
