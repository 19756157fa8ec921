//! Packets: labeled payloads flowing between pipeline units

use bsp_core::{BspError, BspResult, Timeseries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Value stored under one packet label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// A single channel
    Timeseries(Timeseries),
    /// Channels or features keyed by name
    TimeseriesMap(BTreeMap<String, Timeseries>),
    /// Named scalar features
    Values(BTreeMap<String, f32>),
}

/// Type tag of a payload, declared by units for assembly-time checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadType {
    Timeseries,
    TimeseriesMap,
    Values,
}

impl PayloadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadType::Timeseries => "Timeseries",
            PayloadType::TimeseriesMap => "TimeseriesMap",
            PayloadType::Values => "Values",
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Payload {
    pub fn payload_type(&self) -> PayloadType {
        match self {
            Payload::Timeseries(_) => PayloadType::Timeseries,
            Payload::TimeseriesMap(_) => PayloadType::TimeseriesMap,
            Payload::Values(_) => PayloadType::Values,
        }
    }
}

impl From<Timeseries> for Payload {
    fn from(timeseries: Timeseries) -> Self {
        Payload::Timeseries(timeseries)
    }
}

impl From<BTreeMap<String, Timeseries>> for Payload {
    fn from(map: BTreeMap<String, Timeseries>) -> Self {
        Payload::TimeseriesMap(map)
    }
}

impl From<BTreeMap<String, f32>> for Payload {
    fn from(values: BTreeMap<String, f32>) -> Self {
        Payload::Values(values)
    }
}

/// Immutable label -> payload mapping.
///
/// `with` returns a new packet sharing unchanged payloads, so a packet handed
/// to an earlier step is never modified by a later one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packet {
    contents: BTreeMap<String, Arc<Payload>>,
}

impl Packet {
    /// Label under which the merged biosignal channels are seeded
    pub const TIMESERIES_LABEL: &'static str = "timeseries";

    pub fn new() -> Self {
        Packet::default()
    }

    /// First packet of a run: all channels under [`Packet::TIMESERIES_LABEL`]
    pub fn seed(channels: BTreeMap<String, Timeseries>) -> Self {
        Packet::new().with(Self::TIMESERIES_LABEL, Payload::TimeseriesMap(channels))
    }

    /// Payload stored under `label`
    pub fn get(&self, label: &str) -> BspResult<&Payload> {
        self.contents
            .get(label)
            .map(Arc::as_ref)
            .ok_or_else(|| BspError::LabelNotFound {
                label: label.to_string(),
            })
    }

    /// New packet with `label` set to `payload`
    pub fn with(&self, label: impl Into<String>, payload: impl Into<Payload>) -> Packet {
        let mut contents = self.contents.clone();
        contents.insert(label.into(), Arc::new(payload.into()));
        Packet { contents }
    }

    pub fn timeseries(&self, label: &str) -> BspResult<&Timeseries> {
        match self.get(label)? {
            Payload::Timeseries(timeseries) => Ok(timeseries),
            other => Err(mismatch(label, PayloadType::Timeseries, other)),
        }
    }

    pub fn timeseries_map(&self, label: &str) -> BspResult<&BTreeMap<String, Timeseries>> {
        match self.get(label)? {
            Payload::TimeseriesMap(map) => Ok(map),
            other => Err(mismatch(label, PayloadType::TimeseriesMap, other)),
        }
    }

    pub fn values(&self, label: &str) -> BspResult<&BTreeMap<String, f32>> {
        match self.get(label)? {
            Payload::Values(values) => Ok(values),
            other => Err(mismatch(label, PayloadType::Values, other)),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.contents.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.contents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Whether both packets hold the very same payload allocation for `label`
    pub fn shares_payload(&self, other: &Packet, label: &str) -> bool {
        match (self.contents.get(label), other.contents.get(label)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

pub(crate) fn mismatch(label: &str, expected: PayloadType, found: &Payload) -> BspError {
    BspError::PayloadTypeMismatch {
        label: label.to_string(),
        expected: expected.as_str(),
        found: found.payload_type().as_str(),
    }
}
