//! Unified event stream for the controller
//!
//! Connection lifecycle, line traffic and state changes are all emitted
//! through a single channel so observers see them in the order they happened.

use std::time::Duration;

use dxp_protocol::DeviceError;

use crate::state::{ConnectionStatus, DeviceInfo};
use crate::variables::VariableValues;

/// Everything the controller reports to its observers
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    // -------------------------------------------------------------------------
    // Lifecycle events
    // -------------------------------------------------------------------------
    /// The connection status changed
    StatusChanged {
        /// New status
        status: ConnectionStatus,
    },

    /// The TCP connection was established
    Connected {
        /// `host:port` of the switcher
        address: String,
    },

    /// The TCP connection was lost or closed
    Disconnected,

    /// A reconnection attempt will be made after `delay`
    ReconnectScheduled {
        /// Time until the attempt
        delay: Duration,
    },

    // -------------------------------------------------------------------------
    // Traffic events
    // -------------------------------------------------------------------------
    /// A complete line received from the switcher
    DataIn {
        /// Line without its terminator
        line: String,
    },

    /// Command text written to the switcher
    DataOut {
        /// Command without its terminator
        text: String,
    },

    /// A command was held back because the socket is not connected
    CommandQueued {
        /// Command without its terminator
        text: String,
    },

    // -------------------------------------------------------------------------
    // State events
    // -------------------------------------------------------------------------
    /// An output's source changed
    RouteChanged {
        /// 1-based output
        output: u8,
        /// 1-based input now feeding it
        input: u8,
    },

    /// Device information changed
    DeviceInfoChanged {
        /// Updated information
        info: DeviceInfo,
    },

    /// The switcher rejected a command
    DeviceError {
        /// Reported error
        error: DeviceError,
    },

    /// Variable values after a batch of received data
    VariablesUpdated {
        /// Every variable value
        values: VariableValues,
    },

    /// The matrix was re-created for a different model
    MatrixResized {
        /// New input count
        inputs: u8,
        /// New output count
        outputs: u8,
    },
}

impl ControllerEvent {
    /// Check if this is a traffic event
    pub fn is_traffic(&self) -> bool {
        matches!(
            self,
            ControllerEvent::DataIn { .. }
                | ControllerEvent::DataOut { .. }
                | ControllerEvent::CommandQueued { .. }
        )
    }
}
