//! Controller configuration
//!
//! Supplied by the host (or the console's settings file) and read-only to
//! the controller. Changing it goes through `ControllerCommand::UpdateConfig`.

use std::collections::BTreeMap;
use std::time::Duration;

use dxp_protocol::DxpModel;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Default Telnet port used by Extron devices
pub const DEFAULT_PORT: u16 = 23;

/// Default delay between reconnection attempts
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 5000;

/// A selectable input or output with its display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// 1-based number
    pub id: u8,
    /// Custom or default label
    pub label: String,
}

/// Configuration for one switcher connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Switcher IP address or host name
    #[serde(default)]
    pub host: String,
    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Delay between reconnection attempts (0 selects the default)
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_ms: u64,
    /// Selected model, which fixes the matrix size
    #[serde(default)]
    pub device_model: DxpModel,
    /// Custom input labels keyed by 1-based input number
    #[serde(default)]
    pub input_labels: BTreeMap<u8, String>,
    /// Custom output labels keyed by 1-based output number
    #[serde(default)]
    pub output_labels: BTreeMap<u8, String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_reconnect_interval() -> u64 {
    DEFAULT_RECONNECT_INTERVAL_MS
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            device_model: DxpModel::default(),
            input_labels: BTreeMap::new(),
            output_labels: BTreeMap::new(),
        }
    }
}

impl ControllerConfig {
    /// Create a configuration for a host and model with default settings
    pub fn new(host: impl Into<String>, port: u16, device_model: DxpModel) -> Self {
        Self {
            host: host.into(),
            port,
            device_model,
            ..Default::default()
        }
    }

    /// Number of inputs on the selected model
    pub fn input_count(&self) -> u8 {
        self.device_model.inputs()
    }

    /// Number of outputs on the selected model
    pub fn output_count(&self) -> u8 {
        self.device_model.outputs()
    }

    /// Delay before a reconnection attempt
    pub fn reconnect_interval(&self) -> Duration {
        match self.reconnect_interval_ms {
            0 => Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
            ms => Duration::from_millis(ms),
        }
    }

    /// `host:port` for logging and connecting
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check that a connection can be attempted
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.host.trim().is_empty() || self.port == 0 {
            return Err(ControlError::BadConfig(
                "IP and Port must be configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Label for a 1-based input, falling back to `Input N`
    pub fn input_label(&self, input: u8) -> String {
        custom_label(&self.input_labels, input).unwrap_or_else(|| format!("Input {}", input))
    }

    /// Label for a 1-based output, falling back to `Output N`
    pub fn output_label(&self, output: u8) -> String {
        custom_label(&self.output_labels, output).unwrap_or_else(|| format!("Output {}", output))
    }

    /// Inputs of the selected model with their labels
    pub fn input_choices(&self) -> Vec<Choice> {
        (1..=self.input_count())
            .map(|id| Choice {
                id,
                label: self.input_label(id),
            })
            .collect()
    }

    /// Outputs of the selected model with their labels
    pub fn output_choices(&self) -> Vec<Choice> {
        (1..=self.output_count())
            .map(|id| Choice {
                id,
                label: self.output_label(id),
            })
            .collect()
    }
}

fn custom_label(labels: &BTreeMap<u8, String>, number: u8) -> Option<String> {
    labels
        .get(&number)
        .filter(|label| !label.is_empty())
        .cloned()
}
