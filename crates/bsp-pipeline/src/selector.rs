//! Feature selection unit

use crate::packet::{Packet, Payload, PayloadType};
use crate::unit::{InputBinding, OutputBinding, PipelineUnit, UnitInputs, UnitSignature};
use bsp_core::{BspResult, Segment, Timeseries};
use std::collections::BTreeMap;

type Predicate = dyn Fn(&Segment) -> BspResult<bool> + Send + Sync;

/// Keeps the entries of a timeseries map whose first segment satisfies a
/// caller-supplied predicate.
///
/// The predicate sees only the first segment of each entry, as the
/// representative sample for the keep/drop decision. Entries without
/// segments are dropped without consulting it.
pub struct FeatureSelector {
    name: String,
    signature: UnitSignature,
    predicate: Box<Predicate>,
}

impl FeatureSelector {
    pub const PARAMETER: &'static str = "features";
    pub const RESULT: &'static str = "selected";
    pub const DEFAULT_OUTPUT_LABEL: &'static str = "selected_features";

    /// Selector reading the seed channels and writing `selected_features`
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Segment) -> BspResult<bool> + Send + Sync + 'static,
    {
        FeatureSelector {
            name: name.into(),
            signature: Self::signature_for(Packet::TIMESERIES_LABEL, Self::DEFAULT_OUTPUT_LABEL),
            predicate: Box::new(predicate),
        }
    }

    /// Rebind the packet labels the selector reads from and writes to
    pub fn with_labels(mut self, input: &str, output: &str) -> Self {
        self.signature = Self::signature_for(input, output);
        self
    }

    fn signature_for(input: &str, output: &str) -> UnitSignature {
        UnitSignature::single(
            InputBinding {
                parameter: Self::PARAMETER.to_string(),
                label: input.to_string(),
                payload_type: PayloadType::TimeseriesMap,
            },
            OutputBinding {
                result: Self::RESULT.to_string(),
                label: output.to_string(),
                payload_type: PayloadType::TimeseriesMap,
            },
        )
    }

    /// Apply the predicate to each entry's first segment
    pub fn select(
        &self,
        features: &BTreeMap<String, Timeseries>,
    ) -> BspResult<BTreeMap<String, Timeseries>> {
        let mut selected = BTreeMap::new();
        for (name, timeseries) in features {
            let Some(first) = timeseries.first_segment() else {
                tracing::debug!(unit = %self.name, feature = %name, "dropping feature without segments");
                continue;
            };
            if (self.predicate)(first)? {
                selected.insert(name.clone(), timeseries.clone());
            }
        }
        tracing::debug!(
            unit = %self.name,
            kept = selected.len(),
            total = features.len(),
            "selected features"
        );
        Ok(selected)
    }
}

impl PipelineUnit for FeatureSelector {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &UnitSignature {
        &self.signature
    }

    fn apply(&self, inputs: &UnitInputs<'_>) -> BspResult<Payload> {
        let features = inputs.timeseries_map(Self::PARAMETER)?;
        Ok(Payload::TimeseriesMap(self.select(features)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_core::{BspError, PrecisionTimestamp};

    const SAMPLES: [[f32; 8]; 3] = [
        [0.2, 0.4, 0.6, 0.4, 0.2, 0.4, 0.1, 0.15],
        [0.7, 0.1, 0.8, 0.9, 0.3, 0.6, 0.3, 0.91],
        [0.3, 0.75, 0.8, 0.92, 0.4, 0.1, 0.3, 1.0],
    ];
    const NAMES: [&str; 3] = ["mean", "variance", "deviation"];

    fn features() -> BTreeMap<String, Timeseries> {
        // 2000-01-01T00:00:00Z, 1 Hz
        let initial = PrecisionTimestamp::from_secs(946_684_800);
        NAMES
            .iter()
            .zip(SAMPLES.iter())
            .map(|(name, samples)| {
                let segment = Segment::new(samples.to_vec(), initial, 1.0).unwrap();
                let ts = Timeseries::from_segments(vec![segment], true, 1.0).unwrap();
                (name.to_string(), ts)
            })
            .collect()
    }

    #[test]
    fn test_select_based_on_average_being_higher_than() {
        let selector = FeatureSelector::new("My third pipeline unit!", |segment: &Segment| {
            Ok(segment.stats().mean > 0.5)
        });

        let selected = selector.select(&features()).unwrap();

        assert_eq!(selected.len(), 2);
        assert!(selected.contains_key("variance"));
        assert!(selected.contains_key("deviation"));
        assert_eq!(
            selected["variance"].first_segment().unwrap().samples(),
            &SAMPLES[1]
        );
        assert_eq!(
            selected["deviation"].first_segment().unwrap().samples(),
            &SAMPLES[2]
        );
    }

    #[test]
    fn test_predicate_sees_only_first_segment() {
        let initial = PrecisionTimestamp::from_secs(0);
        let low = Segment::new(vec![0.0; 4], initial, 1.0).unwrap();
        let high = Segment::new(vec![1.0; 4], PrecisionTimestamp::from_secs(10), 1.0).unwrap();
        let ts = Timeseries::from_segments(vec![low, high], true, 1.0).unwrap();

        let mut map = BTreeMap::new();
        map.insert("mixed".to_string(), ts);

        let selector = FeatureSelector::new("first", |segment: &Segment| Ok(segment.stats().mean > 0.5));
        assert!(selector.select(&map).unwrap().is_empty());
    }

    #[test]
    fn test_predicate_error_propagates_unchanged() {
        let failure = BspError::UnitFailed {
            unit: "predicate".to_string(),
            reason: "sensor saturated".to_string(),
        };
        let expected = failure.clone();
        let selector = FeatureSelector::new("failing", move |_: &Segment| Err(failure.clone()));

        assert_eq!(selector.select(&features()), Err(expected));
    }

    #[test]
    fn test_empty_timeseries_dropped() {
        let mut map = features();
        map.insert("empty".to_string(), Timeseries::new(1.0, true).unwrap());

        let selector = FeatureSelector::new("all", |_: &Segment| Ok(true));
        let selected = selector.select(&map).unwrap();
        assert_eq!(selected.len(), 3);
        assert!(!selected.contains_key("empty"));
    }

    #[test]
    fn test_as_pipeline_unit() {
        let selector = FeatureSelector::new("select", |segment: &Segment| Ok(segment.stats().mean > 0.5))
            .with_labels("features", "kept");
        let packet = Packet::new().with("features", features());

        let output = selector.apply_to_packet(&packet).unwrap();
        let kept = output.timeseries_map("kept").unwrap();
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["deviation", "variance"]);
        assert_eq!(selector.signature().inputs()[0].label, "features");
    }
}
