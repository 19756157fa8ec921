//! BSP-Core: Foundation types for biosignal processing
//!
//! Segmented timeseries, multi-channel biosignals and the contracts that
//! acquisition sources and filters implement.

pub mod biosignal;
pub mod error;
pub mod segment;
pub mod source;
pub mod timeseries;
pub mod timestamp;

pub use biosignal::{Biosignal, ChannelSelector};
pub use error::{BspError, BspResult};
pub use segment::{SampleStats, Segment};
pub use source::{BiosignalKind, BiosignalSource, SourceOptions};
pub use timeseries::{Timeseries, TimeseriesFilter};
pub use timestamp::{Duration, PrecisionTimestamp};
