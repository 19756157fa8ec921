//! Biosignal: named channel timeseries plus acquisition metadata

use crate::error::{BspError, BspResult};
use crate::source::{BiosignalKind, BiosignalSource, SourceOptions};
use crate::timeseries::{Timeseries, TimeseriesFilter};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Channel addressing on a biosignal.
///
/// Only single-channel lookup is supported; ranges exist so callers porting
/// slice-style indexing get an explicit error instead of a silent subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelector<'a> {
    /// One channel by name
    Single(&'a str),
    /// A `start:stop` style range
    Range {
        start: Option<&'a str>,
        stop: Option<&'a str>,
    },
}

/// Multi-channel physiological recording
#[derive(Debug, Clone)]
pub struct Biosignal {
    id: Uuid,
    name: Option<String>,
    kind: BiosignalKind,
    channels: BTreeMap<String, Timeseries>,
    patient_code: Option<String>,
    source: Option<String>,
    acquisition_location: Option<String>,
}

impl Biosignal {
    /// Create a biosignal from its channel mapping
    pub fn new(kind: BiosignalKind, channels: BTreeMap<String, Timeseries>) -> Self {
        Biosignal {
            id: Uuid::new_v4(),
            name: None,
            kind,
            channels,
            patient_code: None,
            source: None,
            acquisition_location: None,
        }
    }

    /// Read channels of `kind` from a source and record the source name
    pub fn from_source(
        source: &dyn BiosignalSource,
        location: &Path,
        kind: BiosignalKind,
        options: &SourceOptions,
    ) -> BspResult<Self> {
        let channels = source.read(location, kind, options)?;
        tracing::debug!(
            source = source.name(),
            %kind,
            channels = channels.len(),
            "read biosignal"
        );
        Ok(Biosignal::new(kind, channels).with_source(source.name()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach the patient by code; the patient record itself lives elsewhere
    pub fn with_patient_code(mut self, code: impl Into<String>) -> Self {
        self.patient_code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_acquisition_location(mut self, location: impl Into<String>) -> Self {
        self.acquisition_location = Some(location.into());
        self
    }

    /// Timeseries of one channel
    pub fn channel(&self, name: &str) -> BspResult<&Timeseries> {
        self.channels.get(name).ok_or_else(|| BspError::ChannelNotFound {
            name: name.to_string(),
        })
    }

    /// Resolve a selector; ranges with a stop bound are rejected
    pub fn select(&self, selector: ChannelSelector<'_>) -> BspResult<&Timeseries> {
        match selector {
            ChannelSelector::Single(name) => self.channel(name),
            ChannelSelector::Range { start: Some(name), stop: None } => self.channel(name),
            ChannelSelector::Range { .. } => Err(BspError::UnsupportedOperation {
                operation: "biosignals cannot be sliced, only one channel may be indexed"
                    .to_string(),
            }),
        }
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Full channel mapping for seeding a pipeline packet
    pub fn to_packet_seed(&self) -> BTreeMap<String, Timeseries> {
        self.channels.clone()
    }

    /// New biosignal with every channel replaced by the filter's output
    pub fn filter(&self, filter: &dyn TimeseriesFilter) -> BspResult<Biosignal> {
        let channels = self
            .channels
            .iter()
            .map(|(name, timeseries)| Ok((name.clone(), timeseries.filter(filter)?)))
            .collect::<BspResult<BTreeMap<_, _>>>()?;

        Ok(Biosignal {
            id: Uuid::new_v4(),
            channels,
            ..self.clone()
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Display name, `"No Name"` when unset
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("No Name")
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn kind(&self) -> BiosignalKind {
        self.kind
    }

    pub fn patient_code(&self) -> Option<&str> {
        self.patient_code.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn acquisition_location(&self) -> Option<&str> {
        self.acquisition_location.as_deref()
    }
}

impl fmt::Display for Biosignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}\nType: {}\nLocation: {}\nNumber of Channels: {}\nSource: {}",
            self.name(),
            self.kind,
            self.acquisition_location().unwrap_or("Unknown"),
            self.channel_count(),
            self.source().unwrap_or("Unknown"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;
    use crate::timestamp::PrecisionTimestamp;

    fn channels(names: &[&str]) -> BTreeMap<String, Timeseries> {
        names
            .iter()
            .map(|name| {
                let segment =
                    Segment::new(vec![0.5; 10], PrecisionTimestamp::from_secs(0), 10.0).unwrap();
                let ts = Timeseries::from_segments(vec![segment], true, 10.0).unwrap();
                (name.to_string(), ts)
            })
            .collect()
    }

    #[test]
    fn test_channel_lookup() {
        let biosignal = Biosignal::new(BiosignalKind::ECG, channels(&["V1", "V2"]));

        assert_eq!(biosignal.channel_count(), 2);
        assert!(biosignal.channel("V1").is_ok());
        assert_eq!(
            biosignal.channel("V9").unwrap_err(),
            BspError::ChannelNotFound { name: "V9".to_string() }
        );
    }

    #[test]
    fn test_range_selection_rejected() {
        let biosignal = Biosignal::new(BiosignalKind::ECG, channels(&["V1", "V2"]));

        let ranged = biosignal.select(ChannelSelector::Range {
            start: Some("V1"),
            stop: Some("V2"),
        });
        assert!(matches!(ranged, Err(BspError::UnsupportedOperation { .. })));

        let unbounded = biosignal.select(ChannelSelector::Range { start: None, stop: None });
        assert!(matches!(unbounded, Err(BspError::UnsupportedOperation { .. })));

        let open_ended = biosignal.select(ChannelSelector::Range {
            start: Some("V2"),
            stop: None,
        });
        assert!(open_ended.is_ok());
        assert!(biosignal.select(ChannelSelector::Single("V1")).is_ok());
    }

    #[test]
    fn test_name_defaults_and_setter() {
        let mut biosignal = Biosignal::new(BiosignalKind::EDA, channels(&["hand"]));
        assert_eq!(biosignal.name(), "No Name");

        biosignal.set_name("Resting EDA");
        assert_eq!(biosignal.name(), "Resting EDA");
    }

    #[test]
    fn test_display() {
        let biosignal = Biosignal::new(BiosignalKind::EMG, channels(&["bicep"]))
            .with_name("Curl")
            .with_source("Bitalino")
            .with_acquisition_location("Left Bicep")
            .with_patient_code("101");

        let display = biosignal.to_string();
        assert!(display.contains("Name: Curl"));
        assert!(display.contains("Type: EMG"));
        assert!(display.contains("Location: Left Bicep"));
        assert!(display.contains("Number of Channels: 1"));
        assert!(display.contains("Source: Bitalino"));
        assert_eq!(biosignal.patient_code(), Some("101"));
    }

    #[test]
    fn test_packet_seed_is_full_mapping() {
        let biosignal = Biosignal::new(BiosignalKind::ECG, channels(&["V1", "V2", "V3"]));
        let seed = biosignal.to_packet_seed();

        assert_eq!(seed.len(), 3);
        assert!(seed.contains_key("V3"));
    }

    struct Invert;

    impl TimeseriesFilter for Invert {
        fn name(&self) -> &str {
            "invert"
        }

        fn apply(&self, input: &Timeseries) -> BspResult<Timeseries> {
            input.map_segments(|seg| Ok(seg.samples().iter().map(|x| -x).collect()))
        }
    }

    #[test]
    fn test_filter_replaces_channels() {
        let biosignal = Biosignal::new(BiosignalKind::ECG, channels(&["V1"])).with_name("raw");
        let filtered = biosignal.filter(&Invert).unwrap();

        assert_eq!(filtered.name(), "raw");
        assert_ne!(filtered.id(), biosignal.id());
        let samples = filtered.channel("V1").unwrap().first_segment().unwrap().samples();
        assert_eq!(samples[0], -0.5);
        let original = biosignal.channel("V1").unwrap().first_segment().unwrap().samples();
        assert_eq!(original[0], 0.5);
    }
}
