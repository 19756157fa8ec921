//! BSP-Pipeline: Typed processing pipelines over biosignals
//!
//! Units declare typed packet inputs and outputs, pipelines check those
//! declarations as units are added and then run them step by step.

pub mod config;
pub mod packet;
pub mod pipeline;
pub mod selector;
pub mod unit;
pub mod units;

pub use config::{PipelineConfig, SelectionRule, UnitConfig};
pub use packet::{Packet, Payload, PayloadType};
pub use pipeline::{Pipeline, PipelineState};
pub use selector::FeatureSelector;
pub use unit::{FunctionUnit, InputBinding, OutputBinding, PipelineUnit, UnitInputs, UnitSignature};
pub use units::{ChannelPicker, SegmentSummary, Statistic};
