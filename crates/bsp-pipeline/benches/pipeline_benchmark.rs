//! Performance benchmarks for pipeline execution

use bsp_core::{Biosignal, BiosignalKind, BiosignalSource, Segment, SourceOptions};
use bsp_pipeline::{FeatureSelector, Packet, PipelineConfig};
use bsp_simulation::{SimulatedSource, SimulationConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::Path;

fn recording(channel_count: usize) -> Biosignal {
    let config = SimulationConfig {
        channels: (0..channel_count).map(|i| format!("A{}", i + 1)).collect(),
        segment_count: 4,
        segment_duration_secs: 5.0,
        ..Default::default()
    };
    let source = SimulatedSource::new(config).unwrap();
    let channels = source
        .read(Path::new("bench"), BiosignalKind::EDA, &SourceOptions::default())
        .unwrap();
    Biosignal::new(BiosignalKind::EDA, channels)
}

/// Benchmark feature selection over growing channel counts
fn bench_feature_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_selection");
    let selector = FeatureSelector::new("active", |segment: &Segment| Ok(segment.stats().mean > 0.5));

    for &channels in &[1, 8, 64] {
        let features = recording(channels).to_packet_seed();
        group.bench_with_input(BenchmarkId::from_parameter(channels), &features, |b, features| {
            b.iter(|| black_box(selector.select(black_box(features)).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark a full configured run, including packet seeding
fn bench_apply_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_all");
    let config = PipelineConfig::default_selection();

    for &channels in &[1, 8, 64] {
        let biosignal = recording(channels);
        group.bench_with_input(BenchmarkId::from_parameter(channels), &biosignal, |b, biosignal| {
            b.iter(|| {
                let mut pipeline = config.build().unwrap();
                pipeline.load(vec![biosignal.clone()]).unwrap();
                let packet: Packet = pipeline.apply_all().unwrap().unwrap().clone();
                black_box(packet)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_feature_selection, bench_apply_all);
criterion_main!(benches);
