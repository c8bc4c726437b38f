//! Controller state tracking

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::matrix::MatrixState;

/// Information reported by the switcher
///
/// Only the model line is populated from device traffic; the other fields
/// stay empty until a response carries them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Model line as reported by the device
    pub model: String,
    /// Firmware version
    pub version: String,
    /// Serial number
    pub serial_number: String,
}

impl DeviceInfo {
    /// Model, or `Unknown` if not yet reported
    pub fn model_display(&self) -> &str {
        or_unknown(&self.model)
    }

    /// Firmware version, or `Unknown`
    pub fn version_display(&self) -> &str {
        or_unknown(&self.version)
    }

    /// Serial number, or `Unknown`
    pub fn serial_display(&self) -> &str {
        or_unknown(&self.serial_number)
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Unknown"
    } else {
        value
    }
}

/// Connection status reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// A connection attempt is in progress
    Connecting,
    /// Connected and exchanging data
    Ok,
    /// Host or port missing; no connection is attempted
    BadConfig(String),
    /// Socket error; a reconnect is scheduled
    ConnectionFailure(String),
    /// Remote side closed the connection; a reconnect is scheduled
    Disconnected,
}

impl ConnectionStatus {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Ok => "OK",
            Self::BadConfig(_) => "Bad Configuration",
            Self::ConnectionFailure(_) => "Connection Failure",
            Self::Disconnected => "Disconnected",
        }
    }

    /// Detail message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::BadConfig(msg) | Self::ConnectionFailure(msg) => Some(msg),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "{}: {}", self.name(), msg),
            None => f.write_str(self.name()),
        }
    }
}

/// Point-in-time copy of everything feedbacks and variables read
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    /// Active configuration
    pub config: ControllerConfig,
    /// Routing mirror
    pub matrix: MatrixState,
    /// Device information
    pub device_info: DeviceInfo,
    /// Whether the socket is connected
    pub connected: bool,
    /// Last reported status
    pub status: ConnectionStatus,
    /// Commands held back while disconnected
    pub queued_commands: usize,
}

impl ControllerSnapshot {
    /// Snapshot of a controller that has not connected yet
    pub fn initial(config: ControllerConfig) -> Self {
        let matrix = MatrixState::for_model(config.device_model);
        Self {
            config,
            matrix,
            device_info: DeviceInfo::default(),
            connected: false,
            status: ConnectionStatus::Connecting,
            queued_commands: 0,
        }
    }
}
