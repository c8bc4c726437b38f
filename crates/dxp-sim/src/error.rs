//! Error types for the simulator

use thiserror::Error;

/// Errors that can occur while running a virtual switcher
#[derive(Debug, Error)]
pub enum SimError {
    /// I/O error on the listener
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server task is no longer running
    #[error("virtual switcher is not running")]
    Stopped,
}
