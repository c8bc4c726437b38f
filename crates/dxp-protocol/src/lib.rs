//! Extron DXP Protocol Library
//!
//! This crate provides encoding and parsing for the Extron SIS (Simple
//! Instruction Set) dialect spoken by DXP HD 4K Plus matrix switchers over
//! TCP/Telnet.
//!
//! # Architecture
//!
//! The crate is sans-IO:
//! - [`models`] describes the supported switcher models and their sizes
//! - [`command`] encodes control commands (`1*2!`, `3,`, `1X`, ...)
//! - [`codec`] splits a raw byte stream into CRLF-terminated lines
//! - [`response`] classifies each line (tie report, device info, error code)
//!
//! # Example
//!
//! ```rust
//! use dxp_protocol::{DxpCodec, DxpCommand, DxpResponse};
//!
//! assert_eq!(DxpCommand::Tie { input: 3, output: 2 }.encode(), "3*2!");
//!
//! let mut codec = DxpCodec::new();
//! codec.push_bytes(b"Out02 In03 All\r\n");
//!
//! assert_eq!(
//!     codec.next_response(),
//!     Some(DxpResponse::Tie { output: 2, input: 3 })
//! );
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod models;
pub mod response;

pub use codec::DxpCodec;
pub use command::{volume_to_device, DxpCommand, LINE_TERMINATOR, MAX_PRESET};
pub use error::{ParseError, ProtocolError};
pub use models::{DxpModel, ModelInfo, MAX_INPUTS, MAX_OUTPUTS};
pub use response::{DeviceError, DxpResponse};
