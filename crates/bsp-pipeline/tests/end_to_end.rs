//! Simulated acquisition through configured pipelines

use bsp_core::{
    Biosignal, BiosignalKind, BiosignalSource, BspError, BspResult, SourceOptions, Timeseries,
    TimeseriesFilter,
};
use bsp_pipeline::{Packet, PipelineConfig, PipelineState};
use bsp_simulation::{SignalPattern, SimulatedSource, SimulationConfig};
use std::path::Path;

fn source(channels: &[&str], level: f32) -> SimulatedSource {
    SimulatedSource::new(SimulationConfig {
        channels: channels.iter().map(|c| c.to_string()).collect(),
        pattern: Some(SignalPattern::Constant { level }),
        ..Default::default()
    })
    .unwrap()
}

fn acquire(source: &SimulatedSource, name: &str) -> Biosignal {
    Biosignal::from_source(source, Path::new("session"), BiosignalKind::EDA, &SourceOptions::default())
        .unwrap()
        .with_name(name)
}

fn recordings() -> Vec<Biosignal> {
    vec![
        acquire(&source(&["A1", "A2"], 0.8), "active"),
        acquire(&source(&["B1"], 0.2), "resting"),
    ]
}

#[test]
fn default_selection_keeps_active_channels() {
    let mut pipeline = PipelineConfig::default_selection().build().unwrap();
    pipeline.load(recordings()).unwrap();

    let packet = pipeline.apply_all().unwrap().unwrap().clone();

    let selected = packet.timeseries_map("selected_features").unwrap();
    assert_eq!(selected.keys().collect::<Vec<_>>(), vec!["A1", "A2"]);

    let rms = packet.values("rms").unwrap();
    assert_eq!(rms.len(), 2);
    for value in rms.values() {
        assert!((value - 0.8).abs() < 0.05, "rms {} far from level", value);
    }

    // Seed channels stay available to later consumers
    assert_eq!(packet.timeseries_map(Packet::TIMESERIES_LABEL).unwrap().len(), 3);
    assert_eq!(pipeline.state(), PipelineState::Completed);
}

#[test]
fn stepping_a_json_pipeline() {
    let config = PipelineConfig::from_json(
        r#"{
            "name": "arousal",
            "units": [
                { "type": "feature_selector", "name": "quiet", "rule": { "kind": "mean_below", "threshold": 0.5 } },
                { "type": "segment_summary", "name": "spread", "input_label": "selected_features",
                  "output_label": "spread", "statistic": "peak_to_peak" }
            ]
        }"#,
    )
    .unwrap();
    let mut pipeline = config.build().unwrap();
    pipeline.load(recordings()).unwrap();
    assert!(matches!(pipeline.current_step(), Err(BspError::NotStarted)));

    let first = pipeline.next().unwrap().clone();
    assert_eq!(
        first.timeseries_map("selected_features").unwrap().keys().collect::<Vec<_>>(),
        vec!["B1"]
    );
    assert!(!first.contains("spread"));
    assert_eq!(pipeline.current_step().unwrap(), 1);

    let second = pipeline.next().unwrap().clone();
    assert!(second.values("spread").unwrap()["B1"] > 0.0);
    assert!(second.shares_payload(&first, "selected_features"));

    assert_eq!(pipeline.history().len(), 2);
    assert!(matches!(pipeline.next(), Err(BspError::PipelineCompleted { steps: 2 })));
}

#[test]
fn duplicate_channels_across_biosignals() {
    let mut pipeline = PipelineConfig::default_selection().build().unwrap();
    pipeline
        .load(vec![
            acquire(&source(&["A1"], 0.8), "first"),
            acquire(&source(&["A1"], 0.2), "second"),
        ])
        .unwrap();

    assert_eq!(
        pipeline.apply_all().map(|packet| packet.cloned()),
        Err(BspError::DuplicateChannelLabel { label: "A1".to_string() })
    );
    assert_eq!(pipeline.state(), PipelineState::Built);
    assert!(pipeline.current_packet().is_none());
}

#[test]
fn pipeline_without_biosignals() {
    let mut pipeline = PipelineConfig::default_selection().build().unwrap();
    assert_eq!(pipeline.next().map(|packet| packet.clone()), Err(BspError::NoBiosignalsLoaded));
}

struct Scale(f32);

impl TimeseriesFilter for Scale {
    fn name(&self) -> &str {
        "scale"
    }

    fn apply(&self, input: &Timeseries) -> BspResult<Timeseries> {
        input.map_segments(|segment| Ok(segment.samples().iter().map(|x| x * self.0).collect()))
    }
}

#[test]
fn filtered_biosignal_written_and_read_back() {
    let source = source(&["A1"], 0.8);
    let original = acquire(&source, "raw");
    let scaled = original.filter(&Scale(2.0)).unwrap();
    assert_ne!(scaled.id(), original.id());

    source.write(Path::new("scaled"), &scaled.to_packet_seed()).unwrap();
    let reread = Biosignal::from_source(
        &source,
        Path::new("scaled"),
        BiosignalKind::EDA,
        &SourceOptions::default(),
    )
    .unwrap();

    assert_eq!(reread.channel("A1").unwrap(), scaled.channel("A1").unwrap());
    let mean = reread.channel("A1").unwrap().first_segment().unwrap().stats().mean;
    assert!((mean - 1.6).abs() < 0.05);
}

#[test]
fn located_channels_from_source() {
    let mut options = SourceOptions::default();
    options.body_locations.insert("A1".to_string(), "left wrist".to_string());
    options.body_locations.insert("A2".to_string(), "chest".to_string());
    options.location_filter = Some("wrist".to_string());

    let source = source(&["A1", "A2"], 0.5);
    let biosignal =
        Biosignal::from_source(&source, Path::new("session"), BiosignalKind::EDA, &options).unwrap();

    assert_eq!(biosignal.channel_names().collect::<Vec<_>>(), vec!["A1_left wrist"]);
    assert_eq!(biosignal.source(), Some("Simulated"));
    assert!(biosignal.to_string().contains("Number of Channels: 1"));

    let other: &dyn BiosignalSource = &SimulatedSource::new(SimulationConfig::default()).unwrap();
    let this: &dyn BiosignalSource = &source;
    assert!(this == other);
}
