//! Basic usage examples for BSP-Framework
//!
//! Builds a gapped recording from segments, slices it, wraps it in a
//! biosignal and applies a filter.

use bsp_core::{
    Biosignal, BiosignalKind, BspResult, ChannelSelector, PrecisionTimestamp, Segment,
    Timeseries, TimeseriesFilter,
};
use std::collections::BTreeMap;

/// Removes each segment's mean
struct Detrend;

impl TimeseriesFilter for Detrend {
    fn name(&self) -> &str {
        "detrend"
    }

    fn apply(&self, input: &Timeseries) -> BspResult<Timeseries> {
        input.map_segments(|segment| {
            let mean = segment.stats().mean;
            Ok(segment.samples().iter().map(|x| x - mean).collect())
        })
    }
}

fn main() -> BspResult<()> {
    println!("=== BSP-Framework Basic Usage Examples ===\n");

    let start = PrecisionTimestamp::from_secs(1_700_000_000);
    let sampling_rate = 250.0;

    // Two acquisitions of 2 s separated by a 1 s pause
    let mut ecg = Timeseries::new(sampling_rate, true)?;
    for offset in [0u64, 3] {
        let samples: Vec<f32> = (0..500)
            .map(|i| 0.5 + 0.4 * (i as f32 / sampling_rate * 7.5).sin())
            .collect();
        ecg.append(Segment::new(samples, PrecisionTimestamp::from_secs(1_700_000_000 + offset), sampling_rate)?)?;
    }

    println!("1. Segmented timeseries");
    println!("   Segments: {}, samples: {}", ecg.segment_count(), ecg.sample_count());
    for (from, to) in ecg.gaps() {
        println!("   Gap: {} -> {}", from, to);
    }

    println!("\n2. Slicing a segment");
    if let Some(first) = ecg.first_segment() {
        let window = first.slice(start, PrecisionTimestamp::from_millis(1_700_000_000_500))?;
        let stats = window.stats();
        println!("   {} samples, mean {:.3}, rms {:.3}", window.len(), stats.mean, stats.rms);
    }

    println!("\n3. Biosignal");
    let mut channels = BTreeMap::new();
    channels.insert("ecg_chest".to_string(), ecg);
    let biosignal = Biosignal::new(BiosignalKind::ECG, channels)
        .with_name("Resting ECG")
        .with_acquisition_location("Lab");
    println!("{}", biosignal);

    match biosignal.select(ChannelSelector::Range { start: Some("ecg_chest"), stop: Some("z") }) {
        Ok(_) => println!("   Unexpected slice"),
        Err(e) => println!("   Range selection rejected: {}", e),
    }

    println!("\n4. Filtering");
    let detrended = biosignal.filter(&Detrend)?;
    let mean = detrended
        .select(ChannelSelector::Single("ecg_chest"))?
        .first_segment()
        .map(|segment| segment.stats().mean)
        .unwrap_or_default();
    println!("   Mean after detrend: {:.4}", mean);

    println!("\n=== All examples completed successfully! ===");
    Ok(())
}
