//! Pre-defined waveform patterns for synthetic physiological channels

use bsp_core::BiosignalKind;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Noise-free waveform evaluated at a time offset in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum SignalPattern {
    /// Constant level
    Constant { level: f32 },
    /// Sinusoidal oscillation around a baseline
    Sinusoidal {
        frequency: f32,
        amplitude: f32,
        baseline: f32,
    },
    /// Linear ramp that holds its end level after `duration`
    Ramp {
        start_level: f32,
        end_level: f32,
        duration: f32,
    },
    /// Burst pattern (on/off cycles)
    Burst {
        on_duration: f32,
        off_duration: f32,
        amplitude: f32,
    },
    /// Exponentially decaying amplitude
    Decay {
        initial_amplitude: f32,
        decay_rate: f32,
    },
    /// Narrow periodic pulses at a heart rate
    Cardiac {
        heart_rate_bpm: f32,
        amplitude: f32,
    },
}

impl SignalPattern {
    /// Waveform value at given time
    pub fn value_at(&self, time: f32) -> f32 {
        match self {
            SignalPattern::Constant { level } => *level,

            SignalPattern::Sinusoidal { frequency, amplitude, baseline } => {
                baseline + amplitude * (2.0 * PI * frequency * time).sin()
            },

            SignalPattern::Ramp { start_level, end_level, duration } => {
                if time >= *duration {
                    *end_level
                } else {
                    start_level + (end_level - start_level) * (time / duration)
                }
            },

            SignalPattern::Burst { on_duration, off_duration, amplitude } => {
                let cycle_duration = on_duration + off_duration;
                let phase = time % cycle_duration;
                if phase < *on_duration {
                    *amplitude
                } else {
                    0.0
                }
            },

            SignalPattern::Decay { initial_amplitude, decay_rate } => {
                initial_amplitude * (-decay_rate * time).exp()
            },

            SignalPattern::Cardiac { heart_rate_bpm, amplitude } => {
                let period = 60.0 / heart_rate_bpm;
                let phase = (time % period) / period;
                // Gaussian R-wave centered in the beat
                amplitude * (-((phase - 0.5) / 0.03).powi(2)).exp()
            },
        }
    }

    /// Typical waveform for a channel type
    pub fn for_kind(kind: BiosignalKind) -> SignalPattern {
        match kind {
            BiosignalKind::ECG => SignalPattern::Cardiac { heart_rate_bpm: 72.0, amplitude: 1.0 },
            BiosignalKind::EDA => SignalPattern::Ramp { start_level: 0.4, end_level: 0.8, duration: 60.0 },
            BiosignalKind::EMG => SignalPattern::Burst { on_duration: 2.0, off_duration: 1.0, amplitude: 0.8 },
            BiosignalKind::ACC => SignalPattern::Sinusoidal { frequency: 1.5, amplitude: 0.3, baseline: 1.0 },
            BiosignalKind::PPG => SignalPattern::Sinusoidal { frequency: 1.2, amplitude: 0.4, baseline: 0.5 },
            BiosignalKind::RESP => SignalPattern::Sinusoidal { frequency: 0.25, amplitude: 0.5, baseline: 0.0 },
        }
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Constant { .. } => "Constant level",
            SignalPattern::Sinusoidal { .. } => "Sinusoidal oscillation",
            SignalPattern::Ramp { .. } => "Gradual ramp",
            SignalPattern::Burst { .. } => "Burst pattern",
            SignalPattern::Decay { .. } => "Exponential decay",
            SignalPattern::Cardiac { .. } => "Cardiac pulses",
        }
    }

    /// Create common preset patterns
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("Rest", SignalPattern::Constant { level: 0.1 }),
            ("Resting Heart", SignalPattern::Cardiac { heart_rate_bpm: 60.0, amplitude: 1.0 }),
            ("Exercise Heart", SignalPattern::Cardiac { heart_rate_bpm: 140.0, amplitude: 1.2 }),
            ("Calm Breathing", SignalPattern::Sinusoidal {
                frequency: 0.2, amplitude: 0.5, baseline: 0.0
            }),
            ("Arousal", SignalPattern::Ramp {
                start_level: 0.2, end_level: 0.9, duration: 30.0
            }),
            ("Exercise Bursts", SignalPattern::Burst {
                on_duration: 2.0, off_duration: 1.0, amplitude: 0.8
            }),
            ("Habituation", SignalPattern::Decay {
                initial_amplitude: 0.9, decay_rate: 0.1
            }),
        ]
    }

    /// Look up a preset by name, ignoring case
    pub fn preset(name: &str) -> Option<SignalPattern> {
        Self::presets()
            .into_iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, pattern)| pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_and_ramp() {
        assert_eq!(SignalPattern::Constant { level: 0.3 }.value_at(12.0), 0.3);

        let ramp = SignalPattern::Ramp { start_level: 0.0, end_level: 1.0, duration: 10.0 };
        assert_eq!(ramp.value_at(5.0), 0.5);
        assert_eq!(ramp.value_at(20.0), 1.0);
    }

    #[test]
    fn test_burst_cycles() {
        let burst = SignalPattern::Burst { on_duration: 2.0, off_duration: 1.0, amplitude: 0.8 };
        assert_eq!(burst.value_at(1.0), 0.8);
        assert_eq!(burst.value_at(2.5), 0.0);
        assert_eq!(burst.value_at(3.5), 0.8);
    }

    #[test]
    fn test_cardiac_peaks_mid_beat() {
        let cardiac = SignalPattern::Cardiac { heart_rate_bpm: 60.0, amplitude: 1.0 };
        assert!((cardiac.value_at(0.5) - 1.0).abs() < 1e-6);
        assert!(cardiac.value_at(0.0) < 0.01);
    }

    #[test]
    fn test_every_kind_has_a_pattern() {
        for kind in BiosignalKind::all() {
            let pattern = SignalPattern::for_kind(kind);
            assert!(pattern.value_at(1.0).is_finite());
        }
        assert!(!SignalPattern::presets().is_empty());
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(
            SignalPattern::preset("resting heart"),
            Some(SignalPattern::Cardiac { heart_rate_bpm: 60.0, amplitude: 1.0 })
        );
        assert_eq!(SignalPattern::preset("Sprint"), None);
    }
}
