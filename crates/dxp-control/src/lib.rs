//! Extron DXP Controller Engine
//!
//! This crate keeps a live connection to an Extron DXP HD 4K Plus matrix
//! switcher and mirrors its routing so control surfaces can show it.
//!
//! # Architecture
//!
//! A single actor task ([`run_controller`]) owns the TCP link, the routing
//! mirror and the device information:
//!
//! - **Actions** are validated against the configured model and encoded as
//!   SIS commands
//! - **Responses** are split into lines, classified, and applied to the
//!   output-major [`MatrixState`]
//! - **Feedbacks** and **variables** are computed from a
//!   [`ControllerSnapshot`]
//! - All activity (traffic, lifecycle, state changes) is emitted through a
//!   single [`ControllerEvent`] stream
//!
//! Lost connections are retried on a fixed interval until the controller is
//! shut down.
//!
//! # Example
//!
//! ```rust,no_run
//! use dxp_control::{spawn_controller, Action, ControllerConfig, Feedback};
//! use dxp_protocol::DxpModel;
//!
//! # async fn demo() -> Result<(), dxp_control::ControlError> {
//! let config = ControllerConfig::new("192.168.1.100", 23, DxpModel::Dxp84);
//! let (handle, _events, _task) = spawn_controller(config);
//!
//! handle.run_action(Action::RouteInputToAll { input: 1 }).await?;
//!
//! let snapshot = handle.snapshot().await?;
//! let lit = Feedback::InputRoutedToOutput { input: 1, output: 4 }.evaluate(&snapshot);
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod actor;
pub mod config;
pub mod error;
pub mod events;
pub mod feedbacks;
pub mod matrix;
pub mod state;
pub mod variables;

// Re-export actor types
pub use actor::{
    run_controller, spawn_controller, ControllerCommand, ControllerHandle, CHANNEL_CAPACITY,
    MAX_QUEUED_COMMANDS,
};

// Re-export event types
pub use events::ControllerEvent;

pub use actions::Action;
pub use config::{Choice, ControllerConfig, DEFAULT_PORT, DEFAULT_RECONNECT_INTERVAL_MS};
pub use error::ControlError;
pub use feedbacks::{Feedback, FeedbackStyle, FeedbackValue, Rgb};
pub use matrix::MatrixState;
pub use state::{ConnectionStatus, ControllerSnapshot, DeviceInfo};
pub use variables::{
    initial_values, variable_definitions, variable_values, VariableDefinition, VariableValue,
    VariableValues,
};
