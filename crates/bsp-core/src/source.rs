//! Source contract: how acquisition back-ends hand channels to the core

use crate::error::BspResult;
use crate::timeseries::Timeseries;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

/// Physiological channel type requested from a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiosignalKind {
    /// Electrocardiography
    ECG,
    /// Electrodermal activity
    EDA,
    /// Electromyography
    EMG,
    /// Accelerometry
    ACC,
    /// Photoplethysmography
    PPG,
    /// Respiration
    RESP,
}

impl BiosignalKind {
    /// Sensor tag acquisition devices use for this channel type
    pub fn sensor_tag(&self) -> &'static str {
        match self {
            BiosignalKind::ECG => "ECG",
            BiosignalKind::EDA => "EDA",
            BiosignalKind::EMG => "EMG",
            BiosignalKind::ACC => "ACC",
            BiosignalKind::PPG => "PPG",
            BiosignalKind::RESP => "PZT",
        }
    }

    pub fn all() -> [BiosignalKind; 6] {
        [
            BiosignalKind::ECG,
            BiosignalKind::EDA,
            BiosignalKind::EMG,
            BiosignalKind::ACC,
            BiosignalKind::PPG,
            BiosignalKind::RESP,
        ]
    }
}

impl fmt::Display for BiosignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BiosignalKind::ECG => "ECG",
            BiosignalKind::EDA => "EDA",
            BiosignalKind::EMG => "EMG",
            BiosignalKind::ACC => "ACC",
            BiosignalKind::PPG => "PPG",
            BiosignalKind::RESP => "RESP",
        };
        f.write_str(name)
    }
}

/// Options a caller supplies to a source instead of answering prompts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Raw device label -> channel name
    pub channel_labels: HashMap<String, String>,
    /// Channel (or device) -> body location description
    pub body_locations: HashMap<String, String>,
    /// Device identifier to read from when a recording holds several
    pub device_id: Option<String>,
    /// Keep only channels whose location contains this text (case-insensitive)
    pub location_filter: Option<String>,
}

impl SourceOptions {
    /// Channel name for a raw device label, falling back to the label itself
    pub fn channel_label<'a>(&'a self, raw: &'a str) -> &'a str {
        self.channel_labels.get(raw).map(String::as_str).unwrap_or(raw)
    }

    /// Configured body location for a channel or device key
    pub fn body_location(&self, key: &str) -> Option<&str> {
        self.body_locations.get(key).map(String::as_str)
    }

    /// Whether a channel acquired at `location` passes the location filter
    pub fn accepts_location(&self, location: Option<&str>) -> bool {
        match (&self.location_filter, location) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(filter), Some(location)) => {
                location.to_lowercase().contains(&filter.to_lowercase())
            }
        }
    }
}

/// Acquisition back-end producing per-channel timeseries
pub trait BiosignalSource {
    /// Display name; sources with equal names are the same kind of source
    fn name(&self) -> &str;

    /// Read every channel of `kind` found at `location`
    fn read(
        &self,
        location: &Path,
        kind: BiosignalKind,
        options: &SourceOptions,
    ) -> BspResult<BTreeMap<String, Timeseries>>;

    /// Write channels back to `location`
    fn write(&self, location: &Path, channels: &BTreeMap<String, Timeseries>) -> BspResult<()>;
}

impl PartialEq for dyn BiosignalSource + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}
