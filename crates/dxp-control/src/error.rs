//! Error types for the controller

use thiserror::Error;

/// Errors that can occur in the controller
#[derive(Debug, Error)]
pub enum ControlError {
    /// Host or port missing from the configuration
    #[error("bad configuration: {0}")]
    BadConfig(String),

    /// Input number outside the selected model
    #[error("input {input} out of range (model has {count} inputs)")]
    InputOutOfRange {
        /// Requested input (1-based)
        input: u8,
        /// Inputs on the model
        count: u8,
    },

    /// Output number outside the selected model
    #[error("output {output} out of range (model has {count} outputs)")]
    OutputOutOfRange {
        /// Requested output (1-based)
        output: u8,
        /// Outputs on the model
        count: u8,
    },

    /// Preset number outside 1-32
    #[error("preset {0} out of range (1-32)")]
    PresetOutOfRange(u8),

    /// Volume percentage above 100
    #[error("volume {0} out of range (0-100)")]
    VolumeOutOfRange(u8),

    /// The controller task is no longer running
    #[error("controller is not running")]
    ControllerClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Protocol error
    #[error("protocol error: {0}")]
    ProtocolError(#[from] dxp_protocol::ProtocolError),
}
