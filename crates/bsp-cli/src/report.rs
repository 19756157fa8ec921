//! Plain-text summaries printed by the CLI

use bsp_core::{Biosignal, Timeseries};
use bsp_pipeline::{Packet, Payload};
use std::fmt::Write;

fn timeseries_line(out: &mut String, name: &str, timeseries: &Timeseries) {
    let _ = writeln!(
        out,
        "  {}: {} segments, {} samples @ {} Hz, {} gaps, {:.1} s recorded{}",
        name,
        timeseries.segment_count(),
        timeseries.sample_count(),
        timeseries.sampling_rate(),
        timeseries.gaps().len(),
        timeseries.recorded_duration().as_secs_f64(),
        timeseries
            .start()
            .map(|start| format!(", from {}", start.to_rfc3339()))
            .unwrap_or_default(),
    );
}

/// Biosignal header followed by one line per channel
pub fn biosignal(biosignal: &Biosignal) -> String {
    let mut out = format!("{}\n", biosignal);
    for name in biosignal.channel_names() {
        if let Ok(timeseries) = biosignal.channel(name) {
            timeseries_line(&mut out, name, timeseries);
        }
    }
    out
}

/// Every label of a packet with its contents
pub fn packet(packet: &Packet) -> String {
    let mut out = String::new();
    for label in packet.labels() {
        let Ok(payload) = packet.get(label) else {
            continue;
        };
        let _ = writeln!(out, "{} ({})", label, payload.payload_type());
        match payload {
            Payload::Timeseries(timeseries) => timeseries_line(&mut out, label, timeseries),
            Payload::TimeseriesMap(channels) => {
                for (name, timeseries) in channels {
                    timeseries_line(&mut out, name, timeseries);
                }
            }
            Payload::Values(values) => {
                for (name, value) in values {
                    let _ = writeln!(out, "  {}: {:.4}", name, value);
                }
            }
        }
    }
    out
}
