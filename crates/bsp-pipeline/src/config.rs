//! Configuration for assembling pipelines from built-in units

use crate::packet::Packet;
use crate::pipeline::Pipeline;
use crate::selector::FeatureSelector;
use crate::unit::PipelineUnit;
use crate::units::{ChannelPicker, SegmentSummary, Statistic};
use bsp_core::{config_error, BspResult, Segment};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,
    /// Units in execution order
    pub units: Vec<UnitConfig>,
}

/// One configured unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitConfig {
    FeatureSelector {
        name: String,
        #[serde(default = "default_input_label")]
        input_label: String,
        #[serde(default = "default_selection_label")]
        output_label: String,
        rule: SelectionRule,
    },
    ChannelPicker {
        name: String,
        #[serde(default = "default_input_label")]
        input_label: String,
        channel: String,
        output_label: String,
    },
    SegmentSummary {
        name: String,
        #[serde(default = "default_input_label")]
        input_label: String,
        output_label: String,
        statistic: Statistic,
    },
}

/// Keep/drop rule evaluated on a feature's first segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum SelectionRule {
    MeanAbove(f32),
    MeanBelow(f32),
    RmsAbove(f32),
    MinSamples(usize),
}

fn default_input_label() -> String {
    Packet::TIMESERIES_LABEL.to_string()
}

fn default_selection_label() -> String {
    FeatureSelector::DEFAULT_OUTPUT_LABEL.to_string()
}

impl SelectionRule {
    pub fn keeps(&self, segment: &Segment) -> bool {
        match *self {
            SelectionRule::MeanAbove(threshold) => segment.stats().mean > threshold,
            SelectionRule::MeanBelow(threshold) => segment.stats().mean < threshold,
            SelectionRule::RmsAbove(threshold) => segment.stats().rms > threshold,
            SelectionRule::MinSamples(count) => segment.len() >= count,
        }
    }
}

impl UnitConfig {
    pub fn name(&self) -> &str {
        match self {
            UnitConfig::FeatureSelector { name, .. }
            | UnitConfig::ChannelPicker { name, .. }
            | UnitConfig::SegmentSummary { name, .. } => name,
        }
    }

    /// Instantiate the configured unit
    pub fn build(&self) -> Box<dyn PipelineUnit> {
        match self {
            UnitConfig::FeatureSelector { name, input_label, output_label, rule } => {
                let rule = *rule;
                Box::new(
                    FeatureSelector::new(name.clone(), move |segment: &Segment| Ok(rule.keeps(segment)))
                        .with_labels(input_label, output_label),
                )
            }
            UnitConfig::ChannelPicker { name, input_label, channel, output_label } => {
                Box::new(ChannelPicker::new(name.clone(), input_label, channel, output_label))
            }
            UnitConfig::SegmentSummary { name, input_label, output_label, statistic } => {
                Box::new(SegmentSummary::new(name.clone(), input_label, output_label, *statistic))
            }
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON pipeline description
    pub fn from_json(json: &str) -> BspResult<Self> {
        serde_json::from_str(json).map_err(|e| config_error!("invalid pipeline JSON: {}", e))
    }

    pub fn to_json(&self) -> BspResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| config_error!("cannot serialize pipeline: {}", e))
    }

    /// Select high-activity channels and summarize them
    pub fn default_selection() -> Self {
        PipelineConfig {
            name: "Default selection".to_string(),
            units: vec![
                UnitConfig::FeatureSelector {
                    name: "active channels".to_string(),
                    input_label: default_input_label(),
                    output_label: default_selection_label(),
                    rule: SelectionRule::MeanAbove(0.5),
                },
                UnitConfig::SegmentSummary {
                    name: "channel rms".to_string(),
                    input_label: default_selection_label(),
                    output_label: "rms".to_string(),
                    statistic: Statistic::Rms,
                },
            ],
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> BspResult<()> {
        if self.name.is_empty() {
            return Err(config_error!("Pipeline name cannot be empty"));
        }

        if self.units.is_empty() {
            return Err(config_error!("Pipeline must have at least one unit"));
        }

        let mut names = HashSet::new();
        for unit in &self.units {
            if unit.name().is_empty() {
                return Err(config_error!("Unit names cannot be empty"));
            }
            if !names.insert(unit.name()) {
                return Err(config_error!("Unit name '{}' is used more than once", unit.name()));
            }
        }

        Ok(())
    }

    /// Validate and assemble; unit compatibility is checked as each is added
    pub fn build(&self) -> BspResult<Pipeline> {
        self.validate()?;

        let mut pipeline = Pipeline::named(self.name.clone());
        for unit in &self.units {
            pipeline.add_boxed(unit.build())?;
        }
        Ok(pipeline)
    }
}
