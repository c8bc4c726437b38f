//! Host variables
//!
//! Variable definitions depend on the configured model and labels, so they
//! are rebuilt whenever the configuration changes. Values are recomputed from
//! a snapshot after every batch of device traffic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::state::ControllerSnapshot;

/// A variable exposed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub variable_id: String,
    pub name: String,
}

impl VariableDefinition {
    fn new(variable_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            variable_id: variable_id.into(),
            name: name.into(),
        }
    }
}

/// Current value of a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Text(String),
    Number(u64),
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<usize> for VariableValue {
    fn from(n: usize) -> Self {
        Self::Number(n as u64)
    }
}

/// Variable values keyed by variable id
pub type VariableValues = BTreeMap<String, VariableValue>;

/// Every variable for the configured model
pub fn variable_definitions(config: &ControllerConfig) -> Vec<VariableDefinition> {
    let mut defs = vec![
        VariableDefinition::new("connection_status", "Connection Status"),
        VariableDefinition::new("device_model", "Device Model"),
        VariableDefinition::new("device_version", "Device Version"),
        VariableDefinition::new("device_serial", "Device Serial Number"),
    ];

    for output in config.output_choices() {
        defs.push(VariableDefinition::new(
            format!("output_{}_source", output.id),
            format!("{} Source Input", output.label),
        ));
    }

    for input in config.input_choices() {
        defs.push(VariableDefinition::new(
            format!("input_{}_usage_count", input.id),
            format!("{} Usage Count", input.label),
        ));
    }

    defs.push(VariableDefinition::new(
        "total_active_routes",
        "Total Active Routes",
    ));
    defs.push(VariableDefinition::new(
        "disconnected_outputs",
        "Number of Disconnected Outputs",
    ));
    defs.push(VariableDefinition::new("matrix_size", "Matrix Size"));

    defs
}

/// Values before any device traffic has been seen
pub fn initial_values(config: &ControllerConfig) -> VariableValues {
    let mut values = VariableValues::new();
    values.insert("connection_status".into(), "Disconnected".into());
    values.insert("device_model".into(), "Unknown".into());
    values.insert("device_version".into(), "Unknown".into());
    values.insert("device_serial".into(), "Unknown".into());

    for output in 1..=config.output_count() {
        values.insert(format!("output_{}_source", output), "None".into());
    }
    for input in 1..=config.input_count() {
        values.insert(format!("input_{}_usage_count", input), 0usize.into());
    }

    values.insert("total_active_routes".into(), 0usize.into());
    values.insert(
        "disconnected_outputs".into(),
        usize::from(config.output_count()).into(),
    );
    values.insert("matrix_size".into(), matrix_size(config).into());
    values
}

/// Values computed from current state
pub fn variable_values(snapshot: &ControllerSnapshot) -> VariableValues {
    let config = &snapshot.config;
    let matrix = &snapshot.matrix;
    let info = &snapshot.device_info;

    let mut values = VariableValues::new();
    let status = if snapshot.connected {
        "Connected"
    } else {
        "Disconnected"
    };
    values.insert("connection_status".into(), status.into());
    values.insert("device_model".into(), info.model_display().into());
    values.insert("device_version".into(), info.version_display().into());
    values.insert("device_serial".into(), info.serial_display().into());

    for output in 1..=matrix.outputs() {
        let source = match matrix.source_of(output) {
            Some(input) => config.input_label(input),
            None => "None".to_string(),
        };
        values.insert(format!("output_{}_source", output), source.into());
    }
    for input in 1..=matrix.inputs() {
        values.insert(
            format!("input_{}_usage_count", input),
            matrix.usage_count(input).into(),
        );
    }

    values.insert("total_active_routes".into(), matrix.active_routes().into());
    values.insert(
        "disconnected_outputs".into(),
        matrix.disconnected_outputs().into(),
    );
    values.insert("matrix_size".into(), matrix_size(config).into());
    values
}

fn matrix_size(config: &ControllerConfig) -> String {
    format!("{}x{}", config.input_count(), config.output_count())
}
