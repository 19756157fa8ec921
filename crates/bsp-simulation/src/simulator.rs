//! Simulated acquisition device with realistic gapped recordings
//!
//! Each simulated acquisition produces one segment per channel, separated from
//! the next acquisition by a gap, the way a device writing one file per
//! session does.

use crate::signal_patterns::SignalPattern;
use bsp_core::{
    config_error, BiosignalKind, BiosignalSource, BspError, BspResult, Duration,
    PrecisionTimestamp, Segment, SourceOptions, Timeseries,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 2000-01-01T00:00:00Z
const DEFAULT_START_SECS: u64 = 946_684_800;

/// Configuration for a simulated device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Device identifier reported by the simulated device
    pub device_id: String,
    /// Sampling rate in Hz
    pub sampling_rate: f32,
    /// Raw device channel labels
    pub channels: Vec<String>,
    /// Number of acquisitions (segments per channel)
    pub segment_count: usize,
    /// Length of each acquisition in seconds
    pub segment_duration_secs: f64,
    /// Pause between acquisitions in seconds
    pub gap_secs: f64,
    /// Waveform; `None` uses the typical pattern of the requested kind
    pub pattern: Option<SignalPattern>,
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub noise_std: f32,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Start of the first acquisition
    pub start: PrecisionTimestamp,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_id: "SIM-0001".to_string(),
            sampling_rate: 100.0,
            channels: vec!["A1".to_string(), "A2".to_string()],
            segment_count: 3,
            segment_duration_secs: 10.0,
            gap_secs: 2.0,
            pattern: None,
            noise_std: 0.05,
            seed: Some(42),
            start: PrecisionTimestamp::from_secs(DEFAULT_START_SECS),
        }
    }
}

impl SimulationConfig {
    /// Validate configuration
    pub fn validate(&self) -> BspResult<()> {
        bsp_core::segment::validate_sampling_rate(self.sampling_rate)?;

        if self.channels.is_empty() {
            return Err(config_error!("Simulation needs at least one channel"));
        }

        if self.segment_count == 0 {
            return Err(config_error!("Segment count must be positive"));
        }

        if !(self.segment_duration_secs.is_finite() && self.segment_duration_secs > 0.0) {
            return Err(config_error!(
                "Segment duration must be positive, got {}",
                self.segment_duration_secs
            ));
        }

        // Consecutive segments of an ordered timeseries may not touch
        if !(self.gap_secs.is_finite() && self.gap_secs > 0.0) {
            return Err(config_error!("Gap must be positive, got {}", self.gap_secs));
        }

        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(config_error!("Noise level must be non-negative, got {}", self.noise_std));
        }

        self.start.validate()
    }

    /// Samples per acquisition
    pub fn samples_per_segment(&self) -> usize {
        (self.segment_duration_secs * self.sampling_rate as f64).round() as usize
    }

    /// Offset of acquisition `index` from the first start, in seconds
    fn segment_offset_secs(&self, index: usize) -> f64 {
        index as f64 * (self.segment_duration_secs + self.gap_secs)
    }
}

/// In-process device standing in for a recording back-end.
///
/// Reading a location that was previously written returns the written
/// channels; any other location is synthesized from the configuration.
#[derive(Debug)]
pub struct SimulatedSource {
    config: SimulationConfig,
    recordings: Mutex<HashMap<PathBuf, BTreeMap<String, Timeseries>>>,
}

impl SimulatedSource {
    pub const NAME: &'static str = "Simulated";

    /// Create new simulated source with configuration
    pub fn new(config: SimulationConfig) -> BspResult<Self> {
        config.validate()?;
        Ok(SimulatedSource {
            config,
            recordings: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Synthesize one channel of `kind`
    pub fn generate_channel(&self, kind: BiosignalKind, channel_index: usize) -> BspResult<Timeseries> {
        let config = &self.config;
        let pattern = config.pattern.unwrap_or_else(|| SignalPattern::for_kind(kind));

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(channel_index as u64)),
            None => StdRng::from_entropy(),
        };
        let noise = Normal::new(0.0, config.noise_std)
            .map_err(|e| self.failure(format!("Failed to create normal distribution: {}", e)))?;

        let samples_per_segment = config.samples_per_segment();
        let dt = 1.0 / config.sampling_rate as f64;
        let mut timeseries = Timeseries::new(config.sampling_rate, true)?;

        for index in 0..config.segment_count {
            let offset = config.segment_offset_secs(index);
            let start = config.start.add_duration(Duration::from_secs_f64(offset))?;

            let samples = (0..samples_per_segment)
                .map(|i| {
                    let time = (offset + i as f64 * dt) as f32;
                    pattern.value_at(time) + noise.sample(&mut rng)
                })
                .collect();

            timeseries.append(Segment::new(samples, start, config.sampling_rate)?)?;
        }

        Ok(timeseries)
    }

    fn failure(&self, reason: impl Into<String>) -> BspError {
        BspError::SourceError {
            source_name: Self::NAME.to_string(),
            reason: reason.into(),
        }
    }

    fn stored(&self, location: &Path) -> BspResult<Option<BTreeMap<String, Timeseries>>> {
        let recordings = self
            .recordings
            .lock()
            .map_err(|_| self.failure("recording store is poisoned"))?;
        Ok(recordings.get(location).cloned())
    }
}

impl BiosignalSource for SimulatedSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn read(
        &self,
        location: &Path,
        kind: BiosignalKind,
        options: &SourceOptions,
    ) -> BspResult<BTreeMap<String, Timeseries>> {
        if let Some(channels) = self.stored(location)? {
            tracing::debug!(location = %location.display(), "reading stored recording");
            return Ok(channels);
        }

        if let Some(device_id) = &options.device_id {
            if device_id != &self.config.device_id {
                return Err(self.failure(format!("device {} not found", device_id)));
            }
        }

        let mut channels = BTreeMap::new();
        for (index, raw) in self.config.channels.iter().enumerate() {
            let label = options.channel_label(raw);
            let body_location = options
                .body_location(label)
                .or_else(|| options.body_location(raw));

            if !options.accepts_location(body_location) {
                tracing::debug!(channel = label, "skipping channel outside location filter");
                continue;
            }

            let name = match body_location {
                Some(body_location) => format!("{}_{}", label, body_location),
                None => label.to_string(),
            };
            if channels.contains_key(&name) {
                return Err(self.failure(format!("channel {} produced twice", name)));
            }

            channels.insert(name, self.generate_channel(kind, index)?);
        }

        if channels.is_empty() {
            return Err(self.failure(format!(
                "no {} channels at {}",
                kind.sensor_tag(),
                location.display()
            )));
        }

        tracing::info!(
            location = %location.display(),
            %kind,
            channels = channels.len(),
            segments = self.config.segment_count,
            "simulated recording"
        );
        Ok(channels)
    }

    fn write(&self, location: &Path, channels: &BTreeMap<String, Timeseries>) -> BspResult<()> {
        let mut recordings = self
            .recordings
            .lock()
            .map_err(|_| self.failure("recording store is poisoned"))?;
        recordings.insert(location.to_path_buf(), channels.clone());
        tracing::debug!(location = %location.display(), channels = channels.len(), "stored recording");
        Ok(())
    }
}
