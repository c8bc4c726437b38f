//! Error types for DXP protocol parsing and encoding

use thiserror::Error;

/// Errors that can occur while parsing a response line
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line does not have the expected structure
    #[error("invalid line: {0}")]
    InvalidLine(String),

    /// A numeric field could not be parsed
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// An expected token was not present
    #[error("missing token: {0}")]
    MissingToken(&'static str),
}

/// Higher-level protocol errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Parse error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A command parameter is outside the range the device accepts
    #[error("{what} {value} out of range (1-{max})")]
    OutOfRange {
        /// Which parameter was rejected
        what: &'static str,
        /// Value supplied
        value: u32,
        /// Largest accepted value
        max: u32,
    },
}
