//! Pipeline unit contract
//!
//! A unit declares which packet labels feed which of its parameters and
//! under which label its single result is stored, each with a payload type.
//! The declaration is what the pipeline checks at assembly time; `apply` is
//! only called at run time.

use crate::packet::{mismatch, Packet, Payload, PayloadType};
use bsp_core::{config_error, BspError, BspResult, Timeseries};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One declared input: parameter name, packet label and expected type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBinding {
    pub parameter: String,
    pub label: String,
    pub payload_type: PayloadType,
}

/// The declared output: result name, packet label and produced type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub result: String,
    pub label: String,
    pub payload_type: PayloadType,
}

/// Typed input/output declaration of a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSignature {
    inputs: Vec<InputBinding>,
    output: OutputBinding,
}

/// Builder for [`UnitSignature`]
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    inputs: Vec<InputBinding>,
}

impl UnitSignature {
    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    /// Signature with exactly one input
    pub fn single(input: InputBinding, output: OutputBinding) -> Self {
        UnitSignature {
            inputs: vec![input],
            output,
        }
    }

    pub fn inputs(&self) -> &[InputBinding] {
        &self.inputs
    }

    pub fn output(&self) -> &OutputBinding {
        &self.output
    }

    /// Input binding for a parameter name
    pub fn input(&self, parameter: &str) -> Option<&InputBinding> {
        self.inputs.iter().find(|binding| binding.parameter == parameter)
    }
}

impl SignatureBuilder {
    /// Bind `parameter` to packet `label` with the expected payload type
    pub fn input(
        mut self,
        parameter: impl Into<String>,
        label: impl Into<String>,
        payload_type: PayloadType,
    ) -> Self {
        self.inputs.push(InputBinding {
            parameter: parameter.into(),
            label: label.into(),
            payload_type,
        });
        self
    }

    /// Bind the single result and finish; parameter names must be unique
    pub fn output(
        self,
        result: impl Into<String>,
        label: impl Into<String>,
        payload_type: PayloadType,
    ) -> BspResult<UnitSignature> {
        for (i, binding) in self.inputs.iter().enumerate() {
            if self.inputs[..i].iter().any(|b| b.parameter == binding.parameter) {
                return Err(config_error!(
                    "parameter '{}' is bound more than once",
                    binding.parameter
                ));
            }
        }

        Ok(UnitSignature {
            inputs: self.inputs,
            output: OutputBinding {
                result: result.into(),
                label: label.into(),
                payload_type,
            },
        })
    }
}

/// Resolved inputs handed to [`PipelineUnit::apply`], keyed by parameter name
#[derive(Debug)]
pub struct UnitInputs<'a> {
    payloads: HashMap<&'a str, (&'a str, &'a Payload)>,
}

impl<'a> UnitInputs<'a> {
    /// Look up every declared input in `packet` and check its type
    pub fn resolve(signature: &'a UnitSignature, packet: &'a Packet) -> BspResult<Self> {
        let mut payloads = HashMap::with_capacity(signature.inputs().len());
        for binding in signature.inputs() {
            let payload = packet.get(&binding.label)?;
            if payload.payload_type() != binding.payload_type {
                return Err(mismatch(&binding.label, binding.payload_type, payload));
            }
            payloads.insert(binding.parameter.as_str(), (binding.label.as_str(), payload));
        }
        Ok(UnitInputs { payloads })
    }

    pub fn get(&self, parameter: &str) -> BspResult<&'a Payload> {
        self.payloads
            .get(parameter)
            .map(|(_, payload)| *payload)
            .ok_or_else(|| config_error!("parameter '{}' is not declared", parameter))
    }

    pub fn timeseries(&self, parameter: &str) -> BspResult<&'a Timeseries> {
        match self.get(parameter)? {
            Payload::Timeseries(timeseries) => Ok(timeseries),
            other => Err(mismatch(self.label(parameter), PayloadType::Timeseries, other)),
        }
    }

    pub fn timeseries_map(&self, parameter: &str) -> BspResult<&'a BTreeMap<String, Timeseries>> {
        match self.get(parameter)? {
            Payload::TimeseriesMap(map) => Ok(map),
            other => Err(mismatch(self.label(parameter), PayloadType::TimeseriesMap, other)),
        }
    }

    pub fn values(&self, parameter: &str) -> BspResult<&'a BTreeMap<String, f32>> {
        match self.get(parameter)? {
            Payload::Values(values) => Ok(values),
            other => Err(mismatch(self.label(parameter), PayloadType::Values, other)),
        }
    }

    fn label(&self, parameter: &str) -> &'a str {
        self.payloads.get(parameter).map(|(label, _)| *label).unwrap_or("")
    }
}

/// Core trait for all pipeline units
pub trait PipelineUnit: Send + Sync {
    /// Unit name/identifier
    fn name(&self) -> &str;

    /// Declared typed inputs and output
    fn signature(&self) -> &UnitSignature;

    /// Transformation over resolved inputs
    fn apply(&self, inputs: &UnitInputs<'_>) -> BspResult<Payload>;

    /// Run the unit against a packet and return the next packet.
    ///
    /// The result is checked against the declared output type and stored
    /// under the output label; other labels carry over unchanged.
    fn apply_to_packet(&self, packet: &Packet) -> BspResult<Packet> {
        let signature = self.signature();
        let inputs = UnitInputs::resolve(signature, packet)?;
        let result = self.apply(&inputs)?;

        let output = signature.output();
        if result.payload_type() != output.payload_type {
            return Err(BspError::UnitFailed {
                unit: self.name().to_string(),
                reason: format!(
                    "produced {} for '{}', declared {}",
                    result.payload_type(),
                    output.label,
                    output.payload_type
                ),
            });
        }

        Ok(packet.with(output.label.clone(), result))
    }
}

type Transform = dyn Fn(&UnitInputs<'_>) -> BspResult<Payload> + Send + Sync;

/// Unit backed by a caller-supplied function
pub struct FunctionUnit {
    name: String,
    signature: UnitSignature,
    transform: Box<Transform>,
}

impl FunctionUnit {
    pub fn new<F>(name: impl Into<String>, signature: UnitSignature, transform: F) -> Self
    where
        F: Fn(&UnitInputs<'_>) -> BspResult<Payload> + Send + Sync + 'static,
    {
        FunctionUnit {
            name: name.into(),
            signature,
            transform: Box::new(transform),
        }
    }
}

impl PipelineUnit for FunctionUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &UnitSignature {
        &self.signature
    }

    fn apply(&self, inputs: &UnitInputs<'_>) -> BspResult<Payload> {
        (self.transform)(inputs)
    }
}

impl std::fmt::Debug for FunctionUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionUnit")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
