//! Error handling for the BSP Framework
//!
//! One error type covers the data model, the source contract and the
//! pipeline engine so that every layer can propagate with `?`.

use core::fmt;

use crate::timestamp::PrecisionTimestamp;

/// Result type alias for BSP Framework operations
pub type BspResult<T> = Result<T, BspError>;

/// Comprehensive error type for all BSP Framework operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BspError {
    /// Invalid signal or pipeline configuration
    InvalidSignalConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Sampling rate is not a positive finite number
    InvalidSamplingRate {
        /// Provided sampling rate
        rate: f32,
    },

    /// Timestamp validation error
    InvalidTimestamp {
        /// Description of timestamp issue
        reason: &'static str,
    },

    /// Segment sampling rate differs from the timeseries rate
    SamplingRateMismatch {
        /// Rate declared by the timeseries
        expected: f32,
        /// Rate carried by the rejected segment
        found: f32,
    },

    /// Segment does not start after the previous segment of an ordered timeseries
    OrderingViolation {
        /// Start of the rejected segment
        start: PrecisionTimestamp,
        /// End of the last stored segment
        previous_end: PrecisionTimestamp,
    },

    /// Requested time range lies outside the stored samples
    RangeError {
        /// Requested range start
        from: PrecisionTimestamp,
        /// Requested range end
        to: PrecisionTimestamp,
        /// Start of the stored samples
        start: PrecisionTimestamp,
        /// End of the stored samples
        end: PrecisionTimestamp,
    },

    /// Channel lookup miss on a biosignal
    ChannelNotFound {
        /// Requested channel name
        name: String,
    },

    /// Operation not supported by the receiver
    UnsupportedOperation {
        /// Description of the rejected operation
        operation: String,
    },

    /// Two biosignals contribute the same channel to a packet seed
    DuplicateChannelLabel {
        /// Colliding channel name
        label: String,
    },

    /// Packet lookup miss
    LabelNotFound {
        /// Requested packet label
        label: String,
    },

    /// Packet payload has a different type than requested
    PayloadTypeMismatch {
        /// Packet label
        label: String,
        /// Requested payload type
        expected: &'static str,
        /// Stored payload type
        found: &'static str,
    },

    /// New unit's input cannot be satisfied by the units already in the pipeline
    IncompatiblePipeline {
        /// Packet label of the unsatisfied input
        label: String,
        /// Parameter name in the new unit
        parameter: String,
        /// Type declared by the new unit
        parameter_type: &'static str,
        /// Type declared by the most recent producer, if any
        upstream_type: Option<&'static str>,
    },

    /// Pipeline mutation attempted after execution began
    PipelineAlreadyStarted {
        /// Step index at the time of the attempt
        step: usize,
    },

    /// Step index queried before the first step
    NotStarted,

    /// `next` called on a pipeline with no remaining units
    PipelineCompleted {
        /// Number of units in the pipeline
        steps: usize,
    },

    /// Pipeline started without any biosignals to seed the first packet
    NoBiosignalsLoaded,

    /// A biosignal source failed to read or write
    SourceError {
        /// Source name
        source_name: String,
        /// Failure description
        reason: String,
    },

    /// A unit's transformation reported a failure
    UnitFailed {
        /// Unit name
        unit: String,
        /// Failure description
        reason: String,
    },
}

impl fmt::Display for BspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BspError::InvalidSignalConfig { reason } => {
                write!(f, "Invalid signal configuration: {}", reason)
            }
            BspError::InvalidSamplingRate { rate } => {
                write!(f, "Invalid sampling rate: {}Hz, must be positive and finite", rate)
            }
            BspError::InvalidTimestamp { reason } => {
                write!(f, "Invalid timestamp: {}", reason)
            }
            BspError::SamplingRateMismatch { expected, found } => {
                write!(f, "Sampling rate mismatch: timeseries is {}Hz, segment is {}Hz",
                       expected, found)
            }
            BspError::OrderingViolation { start, previous_end } => {
                write!(f, "Ordering violation: segment starts at {}, previous segment ends at {}",
                       start, previous_end)
            }
            BspError::RangeError { from, to, start, end } => {
                write!(f, "Range [{}, {}) outside stored samples [{}, {})",
                       from, to, start, end)
            }
            BspError::ChannelNotFound { name } => {
                write!(f, "Channel '{}' not found", name)
            }
            BspError::UnsupportedOperation { operation } => {
                write!(f, "Unsupported operation: {}", operation)
            }
            BspError::DuplicateChannelLabel { label } => {
                write!(f, "Channel '{}' is contributed by more than one biosignal", label)
            }
            BspError::LabelNotFound { label } => {
                write!(f, "Label '{}' not found in packet", label)
            }
            BspError::PayloadTypeMismatch { label, expected, found } => {
                write!(f, "Payload '{}' is {}, expected {}", label, found, expected)
            }
            BspError::IncompatiblePipeline { label, parameter, parameter_type, upstream_type } => {
                match upstream_type {
                    Some(upstream) => write!(
                        f,
                        "Incompatible pipeline: input type {} of parameter '{}' does not match output type {} of label '{}'",
                        parameter_type, parameter, upstream, label
                    ),
                    None => write!(
                        f,
                        "Incompatible pipeline: input label '{}' of parameter '{}' ({}) is not produced by any previous unit",
                        label, parameter, parameter_type
                    ),
                }
            }
            BspError::PipelineAlreadyStarted { step } => {
                write!(f, "Pipeline already started (step {}), units cannot be changed", step)
            }
            BspError::NotStarted => write!(f, "Pipeline has not started yet"),
            BspError::PipelineCompleted { steps } => {
                write!(f, "Pipeline completed all {} steps", steps)
            }
            BspError::NoBiosignalsLoaded => {
                write!(f, "No biosignals loaded to seed the first packet")
            }
            BspError::SourceError { source_name, reason } => {
                write!(f, "Source {} failed: {}", source_name, reason)
            }
            BspError::UnitFailed { unit, reason } => {
                write!(f, "Unit '{}' failed: {}", unit, reason)
            }
        }
    }
}

impl std::error::Error for BspError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::BspError::InvalidSignalConfig {
            reason: format!($($arg)*),
        }
    };
}
