//! Timeseries: the segments recorded for one channel

use crate::error::{BspError, BspResult};
use crate::segment::{validate_sampling_rate, Segment};
use crate::timestamp::{Duration, PrecisionTimestamp};
use serde::{Deserialize, Serialize};

/// Collection of segments sharing one sampling rate.
///
/// When `ordered` is set, segments are sorted by start and never overlap;
/// the space between two segments is missing data, not an error.
/// Deserialized timeseries are rebuilt through [`Timeseries::from_segments`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeseriesRecord")]
pub struct Timeseries {
    segments: Vec<Segment>,
    sampling_rate: f32,
    ordered: bool,
}

#[derive(Deserialize)]
struct TimeseriesRecord {
    segments: Vec<Segment>,
    sampling_rate: f32,
    ordered: bool,
}

impl TryFrom<TimeseriesRecord> for Timeseries {
    type Error = BspError;

    fn try_from(record: TimeseriesRecord) -> BspResult<Self> {
        Timeseries::from_segments(record.segments, record.ordered, record.sampling_rate)
    }
}

/// Replacement-producing filter applied to a whole timeseries.
///
/// Filter design lives outside this crate; callers only rely on the output
/// satisfying the same append invariants as any other timeseries.
pub trait TimeseriesFilter {
    /// Filter identifier used in logs
    fn name(&self) -> &str;

    /// Produce the filtered replacement
    fn apply(&self, input: &Timeseries) -> BspResult<Timeseries>;
}

impl Timeseries {
    /// Create an empty timeseries
    pub fn new(sampling_rate: f32, ordered: bool) -> BspResult<Self> {
        validate_sampling_rate(sampling_rate)?;
        Ok(Timeseries {
            segments: Vec::new(),
            sampling_rate,
            ordered,
        })
    }

    /// Create a timeseries by appending each segment in turn
    pub fn from_segments(
        segments: impl IntoIterator<Item = Segment>,
        ordered: bool,
        sampling_rate: f32,
    ) -> BspResult<Self> {
        let mut timeseries = Timeseries::new(sampling_rate, ordered)?;
        for segment in segments {
            timeseries.append(segment)?;
        }
        Ok(timeseries)
    }

    /// Append a segment, enforcing rate and ordering invariants
    pub fn append(&mut self, segment: Segment) -> BspResult<()> {
        if segment.sampling_rate() != self.sampling_rate {
            return Err(BspError::SamplingRateMismatch {
                expected: self.sampling_rate,
                found: segment.sampling_rate(),
            });
        }

        if self.ordered {
            if let Some(last) = self.segments.last() {
                if segment.start() <= last.end() {
                    return Err(BspError::OrderingViolation {
                        start: segment.start(),
                        previous_end: last.end(),
                    });
                }
            }
        }

        self.segments.push(segment);
        Ok(())
    }

    /// Segments in storage order. Call again to restart.
    pub fn segments(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn first_segment(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total samples across all segments
    pub fn sample_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Check if no segments were appended
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Earliest segment start
    pub fn start(&self) -> Option<PrecisionTimestamp> {
        self.segments.iter().map(Segment::start).min()
    }

    /// Latest segment end
    pub fn end(&self) -> Option<PrecisionTimestamp> {
        self.segments.iter().map(Segment::end).max()
    }

    /// Recorded duration, excluding gaps
    pub fn recorded_duration(&self) -> Duration {
        self.segments
            .iter()
            .fold(Duration::from_nanos(0), |total, segment| total + segment.duration())
    }

    /// Missing-data intervals `(previous_end, next_start)` of an ordered timeseries.
    /// Unordered timeseries make no claim about gaps and return an empty list.
    pub fn gaps(&self) -> Vec<(PrecisionTimestamp, PrecisionTimestamp)> {
        if !self.ordered {
            return Vec::new();
        }
        self.segments
            .windows(2)
            .map(|pair| (pair[0].end(), pair[1].start()))
            .collect()
    }

    /// Build a fresh timeseries from per-segment sample transformations
    pub fn map_segments<F>(&self, mut transform: F) -> BspResult<Timeseries>
    where
        F: FnMut(&Segment) -> BspResult<Vec<f32>>,
    {
        let mut output = Timeseries::new(self.sampling_rate, self.ordered)?;
        for segment in &self.segments {
            let samples = transform(segment)?;
            output.append(Segment::new(samples, segment.start(), self.sampling_rate)?)?;
        }
        Ok(output)
    }

    /// Run a filter and re-validate its replacement
    pub fn filter(&self, filter: &dyn TimeseriesFilter) -> BspResult<Timeseries> {
        let replacement = filter.apply(self)?;
        tracing::debug!(
            filter = filter.name(),
            segments = replacement.segment_count(),
            "filtered timeseries"
        );
        Timeseries::from_segments(
            replacement.segments,
            replacement.ordered,
            replacement.sampling_rate,
        )
    }
}

impl<'a> IntoIterator for &'a Timeseries {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments()
    }
}
