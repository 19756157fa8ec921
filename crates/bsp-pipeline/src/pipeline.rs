//! Pipeline engine: assembly-time checking and stepwise execution

use crate::packet::{Packet, PayloadType};
use crate::unit::PipelineUnit;
use bsp_core::{Biosignal, BspError, BspResult, Timeseries};
use std::collections::{BTreeMap, HashMap};

/// Lifecycle of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No units added
    Empty,
    /// Units added, not started
    Built,
    /// Some but not all units applied
    Running,
    /// Every unit applied
    Completed,
}

/// Ordered chain of units executed over packets.
///
/// Units are type-checked against their predecessors when added. Execution
/// is strictly sequential in insertion order; every step produces a fresh
/// packet and earlier packets stay available through [`Pipeline::history`].
pub struct Pipeline {
    name: Option<String>,
    steps: Vec<Box<dyn PipelineUnit>>,
    current_step: usize,
    biosignals: Vec<Biosignal>,
    current_packet: Option<Packet>,
    history: Vec<Packet>,
}

impl Pipeline {
    /// Create new empty pipeline
    pub fn new() -> Self {
        Pipeline {
            name: None,
            steps: Vec::new(),
            current_step: 0,
            biosignals: Vec::new(),
            current_packet: None,
            history: Vec::new(),
        }
    }

    /// Create new empty pipeline with a display name
    pub fn named(name: impl Into<String>) -> Self {
        Pipeline {
            name: Some(name.into()),
            ..Pipeline::new()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Biosignals whose channels seed the first packet
    pub fn load(&mut self, biosignals: Vec<Biosignal>) -> BspResult<()> {
        self.ensure_not_started()?;
        self.biosignals = biosignals;
        Ok(())
    }

    pub fn biosignals(&self) -> &[Biosignal] {
        &self.biosignals
    }

    /// Append a unit after checking it against the units already present.
    /// A rejected unit leaves the pipeline unchanged.
    pub fn add(&mut self, unit: impl PipelineUnit + 'static) -> BspResult<()> {
        self.add_boxed(Box::new(unit))
    }

    /// [`Pipeline::add`] for units that are already boxed
    pub fn add_boxed(&mut self, unit: Box<dyn PipelineUnit>) -> BspResult<()> {
        self.ensure_not_started()?;

        if !self.steps.is_empty() {
            if let Err(error) = self.check_compatibility(unit.as_ref()) {
                tracing::warn!(unit = unit.name(), %error, "rejected pipeline unit");
                return Err(error);
            }
        }

        tracing::debug!(
            unit = unit.name(),
            output = %unit.signature().output().label,
            position = self.steps.len(),
            "added pipeline unit"
        );
        self.steps.push(unit);
        Ok(())
    }

    /// Check every input of `unit` against the most recent producer of its
    /// label. Nothing is executed.
    pub fn check_compatibility(&self, unit: &dyn PipelineUnit) -> BspResult<()> {
        // Later units override earlier ones for the same label
        let available: HashMap<&str, PayloadType> = self
            .steps
            .iter()
            .map(|step| {
                let output = step.signature().output();
                (output.label.as_str(), output.payload_type)
            })
            .collect();

        for input in unit.signature().inputs() {
            match available.get(input.label.as_str()) {
                Some(upstream) if *upstream == input.payload_type => continue,
                upstream => {
                    return Err(BspError::IncompatiblePipeline {
                        label: input.label.clone(),
                        parameter: input.parameter.clone(),
                        parameter_type: input.payload_type.as_str(),
                        upstream_type: upstream.map(PayloadType::as_str),
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply the unit at the current step and return the packet it produced.
    ///
    /// The first call seeds the packet from the loaded biosignals. On error
    /// the step index and current packet are left as they were.
    pub fn next(&mut self) -> BspResult<&Packet> {
        if self.current_step >= self.steps.len() {
            return Err(BspError::PipelineCompleted {
                steps: self.steps.len(),
            });
        }

        let seeded;
        let input = match &self.current_packet {
            Some(packet) if self.current_step > 0 => packet,
            _ => {
                seeded = self.seed_packet()?;
                &seeded
            }
        };

        let unit = &self.steps[self.current_step];
        let output = match unit.apply_to_packet(input) {
            Ok(packet) => packet,
            Err(error) => {
                tracing::warn!(
                    unit = unit.name(),
                    step = self.current_step,
                    %error,
                    "pipeline step failed"
                );
                return Err(error);
            }
        };

        tracing::debug!(
            unit = unit.name(),
            step = self.current_step + 1,
            labels = output.len(),
            "pipeline step completed"
        );

        self.current_step += 1;
        self.history.push(output.clone());
        if self.current_step == self.steps.len() {
            tracing::info!(
                pipeline = self.name().unwrap_or("unnamed"),
                steps = self.steps.len(),
                "pipeline completed"
            );
        }
        let packet: &Packet = self.current_packet.insert(output);
        Ok(packet)
    }

    /// Run every remaining unit in order and return the final packet
    /// (`None` only when the pipeline has no units)
    pub fn apply_all(&mut self) -> BspResult<Option<&Packet>> {
        while self.current_step < self.steps.len() {
            self.next()?;
        }
        Ok(self.current_packet.as_ref())
    }

    /// Number of units applied so far
    pub fn current_step(&self) -> BspResult<usize> {
        if self.current_step > 0 {
            Ok(self.current_step)
        } else {
            Err(BspError::NotStarted)
        }
    }

    pub fn current_packet(&self) -> Option<&Packet> {
        self.current_packet.as_ref()
    }

    /// Packet produced by each completed step, in order
    pub fn history(&self) -> &[Packet] {
        &self.history
    }

    pub fn state(&self) -> PipelineState {
        match (self.steps.len(), self.current_step) {
            (0, _) => PipelineState::Empty,
            (_, 0) => PipelineState::Built,
            (total, step) if step < total => PipelineState::Running,
            _ => PipelineState::Completed,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn unit_names(&self) -> Vec<&str> {
        self.steps.iter().map(|unit| unit.name()).collect()
    }

    /// Return to the not-started state, keeping units and biosignals
    pub fn reset(&mut self) {
        self.current_step = 0;
        self.current_packet = None;
        self.history.clear();
    }

    fn ensure_not_started(&self) -> BspResult<()> {
        if self.current_step > 0 {
            Err(BspError::PipelineAlreadyStarted {
                step: self.current_step,
            })
        } else {
            Ok(())
        }
    }

    fn seed_packet(&self) -> BspResult<Packet> {
        if self.biosignals.is_empty() {
            return Err(BspError::NoBiosignalsLoaded);
        }

        let mut channels: BTreeMap<String, Timeseries> = BTreeMap::new();
        for biosignal in &self.biosignals {
            for (label, timeseries) in biosignal.to_packet_seed() {
                if channels.contains_key(&label) {
                    return Err(BspError::DuplicateChannelLabel { label });
                }
                channels.insert(label, timeseries);
            }
        }

        tracing::debug!(
            biosignals = self.biosignals.len(),
            channels = channels.len(),
            "seeded first packet"
        );
        Ok(Packet::seed(channels))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("units", &self.unit_names())
            .field("current_step", &self.current_step)
            .field("biosignals", &self.biosignals.len())
            .finish()
    }
}
