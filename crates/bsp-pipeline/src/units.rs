//! Built-in units available to configured pipelines

use crate::packet::{Payload, PayloadType};
use crate::unit::{InputBinding, OutputBinding, PipelineUnit, UnitInputs, UnitSignature};
use bsp_core::{BspError, BspResult, SampleStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extracts one channel out of a timeseries map
///
/// The output is a single [`bsp_core::Timeseries`], which no other built-in unit
/// reads, so in configured pipelines this is the last unit.
#[derive(Debug, Clone)]
pub struct ChannelPicker {
    name: String,
    channel: String,
    signature: UnitSignature,
}

impl ChannelPicker {
    pub fn new(name: impl Into<String>, input_label: &str, channel: &str, output_label: &str) -> Self {
        ChannelPicker {
            name: name.into(),
            channel: channel.to_string(),
            signature: UnitSignature::single(
                InputBinding {
                    parameter: "channels".to_string(),
                    label: input_label.to_string(),
                    payload_type: PayloadType::TimeseriesMap,
                },
                OutputBinding {
                    result: "channel".to_string(),
                    label: output_label.to_string(),
                    payload_type: PayloadType::Timeseries,
                },
            ),
        }
    }
}

impl PipelineUnit for ChannelPicker {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &UnitSignature {
        &self.signature
    }

    fn apply(&self, inputs: &UnitInputs<'_>) -> BspResult<Payload> {
        let channels = inputs.timeseries_map("channels")?;
        channels
            .get(&self.channel)
            .cloned()
            .map(Payload::Timeseries)
            .ok_or_else(|| BspError::ChannelNotFound {
                name: self.channel.clone(),
            })
    }
}

/// Descriptive value reported by [`SegmentSummary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    Rms,
    StdDev,
    Min,
    Max,
    PeakToPeak,
}

impl Statistic {
    pub fn of(&self, stats: &SampleStats) -> f32 {
        match self {
            Statistic::Mean => stats.mean,
            Statistic::Rms => stats.rms,
            Statistic::StdDev => stats.std_dev,
            Statistic::Min => stats.min,
            Statistic::Max => stats.max,
            Statistic::PeakToPeak => stats.peak_to_peak,
        }
    }
}

/// Reduces each entry of a timeseries map to one value computed over all
/// its samples
#[derive(Debug, Clone)]
pub struct SegmentSummary {
    name: String,
    statistic: Statistic,
    signature: UnitSignature,
}

impl SegmentSummary {
    pub fn new(name: impl Into<String>, input_label: &str, output_label: &str, statistic: Statistic) -> Self {
        SegmentSummary {
            name: name.into(),
            statistic,
            signature: UnitSignature::single(
                InputBinding {
                    parameter: "channels".to_string(),
                    label: input_label.to_string(),
                    payload_type: PayloadType::TimeseriesMap,
                },
                OutputBinding {
                    result: "summary".to_string(),
                    label: output_label.to_string(),
                    payload_type: PayloadType::Values,
                },
            ),
        }
    }
}

impl PipelineUnit for SegmentSummary {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &UnitSignature {
        &self.signature
    }

    fn apply(&self, inputs: &UnitInputs<'_>) -> BspResult<Payload> {
        let channels = inputs.timeseries_map("channels")?;
        let values: BTreeMap<String, f32> = channels
            .iter()
            .filter(|(_, timeseries)| timeseries.sample_count() > 0)
            .map(|(name, timeseries)| {
                let samples: Vec<f32> = timeseries
                    .segments()
                    .flat_map(|segment| segment.samples().iter().copied())
                    .collect();
                (name.clone(), self.statistic.of(&SampleStats::calculate(&samples)))
            })
            .collect();
        Ok(Payload::Values(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use bsp_core::{PrecisionTimestamp, Segment, Timeseries};

    fn packet() -> Packet {
        let first = Segment::new(vec![1.0, 2.0], PrecisionTimestamp::from_secs(0), 1.0).unwrap();
        let second = Segment::new(vec![3.0, 6.0], PrecisionTimestamp::from_secs(5), 1.0).unwrap();
        let ts = Timeseries::from_segments(vec![first, second], true, 1.0).unwrap();

        let mut channels = BTreeMap::new();
        channels.insert("ecg".to_string(), ts);
        channels.insert("empty".to_string(), Timeseries::new(1.0, true).unwrap());
        Packet::seed(channels)
    }

    #[test]
    fn test_channel_picker() {
        let picker = ChannelPicker::new("pick", Packet::TIMESERIES_LABEL, "ecg", "ecg_only");
        let output = picker.apply_to_packet(&packet()).unwrap();

        assert_eq!(output.timeseries("ecg_only").unwrap().segment_count(), 2);

        let missing = ChannelPicker::new("pick", Packet::TIMESERIES_LABEL, "eda", "eda_only");
        assert_eq!(
            missing.apply_to_packet(&packet()),
            Err(BspError::ChannelNotFound { name: "eda".to_string() })
        );
    }

    #[test]
    fn test_segment_summary_spans_all_segments() {
        let summary = SegmentSummary::new("max", Packet::TIMESERIES_LABEL, "max", Statistic::Max);
        let output = summary.apply_to_packet(&packet()).unwrap();
        let values = output.values("max").unwrap();

        assert_eq!(values["ecg"], 6.0);
        assert!(!values.contains_key("empty"));

        let mean = SegmentSummary::new("mean", Packet::TIMESERIES_LABEL, "mean", Statistic::Mean);
        let output = mean.apply_to_packet(&packet()).unwrap();
        assert_eq!(output.values("mean").unwrap()["ecg"], 3.0);
    }
}
