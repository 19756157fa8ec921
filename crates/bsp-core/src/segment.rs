//! Segment: a contiguous run of uniformly sampled values

use crate::error::{BspError, BspResult};
use crate::timestamp::{Duration, PrecisionTimestamp};
use serde::{Deserialize, Serialize};

/// Contiguous, uniformly sampled run of values starting at `start`.
///
/// Samples are immutable once stored; every transformation yields a new
/// segment. Deserialized segments go through [`Segment::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SegmentRecord")]
pub struct Segment {
    samples: Vec<f32>,
    start: PrecisionTimestamp,
    end: PrecisionTimestamp,
    sampling_rate: f32,
}

/// Serialized form of a segment; `end` is derived and only checked
#[derive(Deserialize)]
struct SegmentRecord {
    samples: Vec<f32>,
    start: PrecisionTimestamp,
    sampling_rate: f32,
    #[serde(default)]
    end: Option<PrecisionTimestamp>,
}

impl TryFrom<SegmentRecord> for Segment {
    type Error = BspError;

    fn try_from(record: SegmentRecord) -> BspResult<Self> {
        let segment = Segment::new(record.samples, record.start, record.sampling_rate)?;
        match record.end {
            Some(end) if end != segment.end => Err(BspError::InvalidTimestamp {
                reason: "segment end does not match sample count and rate",
            }),
            _ => Ok(segment),
        }
    }
}

impl Segment {
    /// Create a segment from samples, start timestamp and sampling rate
    pub fn new(samples: Vec<f32>, start: PrecisionTimestamp, sampling_rate: f32) -> BspResult<Self> {
        validate_sampling_rate(sampling_rate)?;
        let end = start.add_duration(Duration::from_samples(samples.len(), sampling_rate))?;

        Ok(Segment {
            samples,
            start,
            end,
            sampling_rate,
        })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if segment holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Read-only view of the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Timestamp of the first sample
    pub fn start(&self) -> PrecisionTimestamp {
        self.start
    }

    /// Timestamp one sample period after the last sample
    pub fn end(&self) -> PrecisionTimestamp {
        self.end
    }

    /// Sampling rate in Hz
    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    /// Segment duration (sample count / sampling rate)
    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.end.as_nanos() - self.start.as_nanos())
    }

    /// Segment duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate as f64
    }

    /// Slice the segment to the time range `[from, to)`.
    ///
    /// The first sample is the one covering `from`; the slice stops before
    /// the sample covering `to`. A range inside a single sample period holds
    /// no sample and is rejected.
    pub fn slice(&self, from: PrecisionTimestamp, to: PrecisionTimestamp) -> BspResult<Segment> {
        let out_of_range = BspError::RangeError {
            from,
            to,
            start: self.start,
            end: self.end,
        };
        if from < self.start || to > self.end || from >= to {
            return Err(out_of_range);
        }

        let first = self.sample_index(from);
        let last = self.sample_index(to);
        if first >= last {
            return Err(out_of_range);
        }

        let offset = Duration::from_samples(first, self.sampling_rate);
        Segment::new(
            self.samples[first..last].to_vec(),
            self.start.add_duration(offset)?,
            self.sampling_rate,
        )
    }

    /// Descriptive statistics over the samples
    pub fn stats(&self) -> SampleStats {
        SampleStats::calculate(&self.samples)
    }

    /// Index of the sample covering `at`
    fn sample_index(&self, at: PrecisionTimestamp) -> usize {
        let elapsed = (at.as_nanos() - self.start.as_nanos()) as f64 / 1_000_000_000.0;
        // Tolerance keeps exact sample instants from flooring one sample early
        let index = (elapsed * self.sampling_rate as f64 + 1e-6).floor() as usize;
        index.min(self.samples.len())
    }
}

/// Reject zero, negative and non-finite sampling rates
pub fn validate_sampling_rate(rate: f32) -> BspResult<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(BspError::InvalidSamplingRate { rate })
    }
}

/// Basic statistics for a run of samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub mean: f32,
    pub rms: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
    pub peak_to_peak: f32,
}

impl SampleStats {
    pub fn calculate(data: &[f32]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let sum: f32 = data.iter().sum();
        let mean = sum / data.len() as f32;

        let sum_sq: f32 = data.iter().map(|x| x * x).sum();
        let rms = (sum_sq / data.len() as f32).sqrt();

        let variance: f32 = data.iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f32>() / data.len() as f32;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let peak_to_peak = max - min;

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(samples: Vec<f32>, start_secs: u64, rate: f32) -> Segment {
        Segment::new(samples, PrecisionTimestamp::from_secs(start_secs), rate).unwrap()
    }

    #[test]
    fn test_segment_creation() {
        let seg = segment(vec![0.0; 1000], 10, 1000.0);

        assert_eq!(seg.len(), 1000);
        assert_eq!(seg.duration(), Duration::from_secs(1));
        assert_eq!(seg.end(), PrecisionTimestamp::from_secs(11));
        assert!((seg.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_sampling_rate() {
        let start = PrecisionTimestamp::from_secs(0);
        assert_eq!(
            Segment::new(vec![1.0], start, 0.0),
            Err(BspError::InvalidSamplingRate { rate: 0.0 })
        );
        assert!(Segment::new(vec![1.0], start, -5.0).is_err());
        assert!(Segment::new(vec![1.0], start, f32::NAN).is_err());
    }

    #[test]
    fn test_slice_within_range() {
        let seg = segment((0..10).map(|i| i as f32).collect(), 100, 2.0); // 5 seconds

        let sliced = seg
            .slice(PrecisionTimestamp::from_secs(101), PrecisionTimestamp::from_secs(103))
            .unwrap();

        assert_eq!(sliced.samples(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sliced.start(), PrecisionTimestamp::from_secs(101));
        assert_eq!(sliced.end(), PrecisionTimestamp::from_secs(103));
        // Original is untouched
        assert_eq!(seg.len(), 10);
    }

    #[test]
    fn test_slice_outside_range() {
        let seg = segment(vec![1.0; 10], 100, 2.0);

        let before = seg.slice(PrecisionTimestamp::from_secs(99), PrecisionTimestamp::from_secs(101));
        assert!(matches!(before, Err(BspError::RangeError { .. })));

        let after = seg.slice(PrecisionTimestamp::from_secs(104), PrecisionTimestamp::from_secs(106));
        assert!(matches!(after, Err(BspError::RangeError { .. })));

        let inverted = seg.slice(PrecisionTimestamp::from_secs(103), PrecisionTimestamp::from_secs(102));
        assert!(matches!(inverted, Err(BspError::RangeError { .. })));
    }

    #[test]
    fn test_slice_bounds_between_samples() {
        let seg = segment((0..8).map(|i| i as f32).collect(), 0, 1.0);

        let short = seg
            .slice(PrecisionTimestamp::from_millis(600), PrecisionTimestamp::from_millis(1_400))
            .unwrap();
        assert_eq!(short.samples(), &[0.0]);
        assert_eq!(short.start(), PrecisionTimestamp::from_secs(0));

        let longer = seg
            .slice(PrecisionTimestamp::from_millis(600), PrecisionTimestamp::from_secs(3))
            .unwrap();
        assert_eq!(longer.samples(), &[0.0, 1.0, 2.0]);

        let to_end = seg
            .slice(PrecisionTimestamp::from_millis(7_500), PrecisionTimestamp::from_secs(8))
            .unwrap();
        assert_eq!(to_end.samples(), &[7.0]);

        let within_one_sample =
            seg.slice(PrecisionTimestamp::from_millis(200), PrecisionTimestamp::from_millis(800));
        assert!(matches!(within_one_sample, Err(BspError::RangeError { .. })));
    }

    #[test]
    fn test_deserialize_validates() {
        let seg: Segment =
            serde_json::from_str(r#"{ "samples": [1.0, 2.0], "start": 0, "sampling_rate": 2.0 }"#)
                .unwrap();
        assert_eq!(seg.end(), PrecisionTimestamp::from_secs(1));

        let round_trip: Segment = serde_json::from_str(&serde_json::to_string(&seg).unwrap()).unwrap();
        assert_eq!(round_trip, seg);

        let bad_rate = serde_json::from_str::<Segment>(
            r#"{ "samples": [1.0], "start": 0, "sampling_rate": 0.0 }"#,
        );
        assert!(bad_rate.is_err());

        let bad_end = serde_json::from_str::<Segment>(
            r#"{ "samples": [1.0, 2.0], "start": 0, "end": 99000000000, "sampling_rate": 5.0 }"#,
        );
        assert!(bad_end.is_err());
    }

    #[test]
    fn test_stats() {
        let seg = segment(vec![1.0, -1.0, 1.0, -1.0], 0, 4.0);
        let stats = seg.stats();

        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.rms, 1.0);
        assert_eq!(stats.peak_to_peak, 2.0);
        assert_eq!(SampleStats::calculate(&[]).mean, 0.0);
    }
}
