//! High-precision timestamps for segment placement
//!
//! Segment starts and ends are nanosecond timestamps since the Unix epoch so
//! that ordering checks between segments are exact integer comparisons.

use crate::error::{BspError, BspResult};
use chrono::{DateTime, TimeZone, Utc};
use core::fmt;
use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

/// High-precision timestamp with nanosecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct PrecisionTimestamp {
    /// Nanoseconds since Unix epoch
    nanos: u64,
}

impl PrecisionTimestamp {
    /// Create a new timestamp from nanoseconds since Unix epoch
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Create a new timestamp from milliseconds since Unix epoch
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos: millis * 1_000_000
        }
    }

    /// Create a new timestamp from seconds since Unix epoch
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            nanos: secs * 1_000_000_000
        }
    }

    /// Convert a UTC datetime; datetimes before the epoch are rejected
    pub fn from_datetime(datetime: DateTime<Utc>) -> BspResult<Self> {
        datetime
            .timestamp_nanos_opt()
            .and_then(|nanos| u64::try_from(nanos).ok())
            .map(Self::from_nanos)
            .ok_or(BspError::InvalidTimestamp {
                reason: "datetime outside the representable range"
            })
    }

    /// Parse an RFC 3339 datetime such as `2024-03-01T09:30:00Z`
    pub fn parse_rfc3339(text: &str) -> BspResult<Self> {
        let datetime = DateTime::parse_from_rfc3339(text).map_err(|_| BspError::InvalidTimestamp {
            reason: "expected an RFC 3339 datetime"
        })?;
        Self::from_datetime(datetime.with_timezone(&Utc))
    }

    /// RFC 3339 rendering in UTC
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime().to_rfc3339()
    }

    /// Convert back to a UTC datetime
    pub fn to_datetime(&self) -> DateTime<Utc> {
        // u64 nanos always fit in chrono's i64 range up to year 2262
        Utc.timestamp_nanos(self.nanos as i64)
    }

    /// Get nanoseconds since Unix epoch
    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Get milliseconds since Unix epoch
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Get seconds since Unix epoch
    #[inline]
    pub const fn as_secs(&self) -> u64 {
        self.nanos / 1_000_000_000
    }

    /// Get fractional seconds as f64
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Calculate duration since another timestamp
    #[inline]
    pub fn duration_since(&self, earlier: PrecisionTimestamp) -> BspResult<Duration> {
        if self.nanos >= earlier.nanos {
            Ok(Duration::from_nanos(self.nanos - earlier.nanos))
        } else {
            Err(BspError::InvalidTimestamp {
                reason: "timestamp is earlier than reference"
            })
        }
    }

    /// Add a duration to this timestamp
    #[inline]
    pub fn add_duration(&self, duration: Duration) -> BspResult<PrecisionTimestamp> {
        self.nanos.checked_add(duration.as_nanos())
            .map(PrecisionTimestamp::from_nanos)
            .ok_or(BspError::InvalidTimestamp {
                reason: "timestamp overflow"
            })
    }

    /// Check if timestamp is within a plausible acquisition range
    /// (between year 2000 and year 2100)
    pub fn validate(&self) -> BspResult<()> {
        const YEAR_2000_NANOS: u64 = 946_684_800 * 1_000_000_000;
        const YEAR_2100_NANOS: u64 = 4_102_444_800 * 1_000_000_000;

        if self.nanos < YEAR_2000_NANOS {
            Err(BspError::InvalidTimestamp {
                reason: "timestamp before year 2000"
            })
        } else if self.nanos > YEAR_2100_NANOS {
            Err(BspError::InvalidTimestamp {
                reason: "timestamp after year 2100"
            })
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for PrecisionTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.as_secs();
        let subsec_nanos = self.nanos % 1_000_000_000;
        write!(f, "{}.{:09}", secs, subsec_nanos)
    }
}

/// Duration type with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration {
    nanos: u64,
}

impl Duration {
    /// Create duration from nanoseconds
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Create duration from milliseconds
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self { nanos: millis * 1_000_000 }
    }

    /// Create duration from seconds
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self { nanos: secs * 1_000_000_000 }
    }

    /// Create duration from fractional seconds, rounded to the nearest nanosecond.
    /// Negative and non-finite inputs saturate to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self { nanos: 0 };
        }
        Self { nanos: (secs * 1_000_000_000.0).round() as u64 }
    }

    /// Duration covered by `samples` samples at `sampling_rate` Hz
    pub fn from_samples(samples: usize, sampling_rate: f32) -> Self {
        Self::from_secs_f64(samples as f64 / sampling_rate as f64)
    }

    /// Get duration as nanoseconds
    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Get duration as milliseconds
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Get duration as seconds
    #[inline]
    pub const fn as_secs(&self) -> u64 {
        self.nanos / 1_000_000_000
    }

    /// Get duration as fractional seconds
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }
}

impl Add for Duration {
    type Output = Duration;

    #[inline]
    fn add(self, other: Duration) -> Duration {
        Duration::from_nanos(self.nanos.saturating_add(other.nanos))
    }
}

impl Sub for Duration {
    type Output = Duration;

    #[inline]
    fn sub(self, other: Duration) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(other.nanos))
    }
}
