//! SIS command encoding
//!
//! Every control operation maps to one short text command. Commands are
//! sent followed by [`LINE_TERMINATOR`] and are fire-and-forget: the
//! switcher's reply arrives later as an ordinary response line.
//!
//! # Command set
//! - `3*2!` - tie input 3 to output 2
//! - `3*!` - tie input 3 to every output
//! - `0*2!` - untie output 2
//! - `5,` / `5.` - save / recall preset 5
//! - `I` - information request
//! - `0*!` - route status for every output
//! - `1Z` - reset
//! - `1X` / `0X` - front panel lock on / off
//! - `32*2V` - volume level 32 on output 2
//! - `2*Z` / `2*z` - mute / unmute output 2

use std::fmt;

use crate::error::ProtocolError;
use crate::models::DxpModel;

/// Terminator appended to every command on the wire
pub const LINE_TERMINATOR: &str = "\r\n";

/// Highest preset slot the switcher stores
pub const MAX_PRESET: u8 = 32;

/// Highest device volume level
pub const MAX_DEVICE_VOLUME: u8 = 64;

/// Map a 0-100 percentage onto the device's 0-64 volume range
///
/// Rounds half up, so 50% becomes 32. Values above 100 clamp to 64.
pub fn volume_to_device(percent: u8) -> u8 {
    let percent = u32::from(percent.min(100));
    ((percent * u32::from(MAX_DEVICE_VOLUME) + 50) / 100) as u8
}

/// A command that can be sent to a DXP switcher
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DxpCommand {
    /// Tie one input to one output: `{input}*{output}!`
    Tie { input: u8, output: u8 },
    /// Tie one input to every output: `{input}*!`
    TieAll { input: u8 },
    /// Remove the tie on an output: `0*{output}!`
    Untie { output: u8 },
    /// Save the current ties as a preset: `{preset},`
    SavePreset { preset: u8 },
    /// Recall a stored preset: `{preset}.`
    RecallPreset { preset: u8 },
    /// Request device information: `I`
    Information,
    /// Request the tie of every output: `0*!`
    RouteStatus,
    /// Reset the device: `1Z`
    Reset,
    /// Front panel lock: `1X` (locked) or `0X` (unlocked)
    FrontPanelLock { locked: bool },
    /// Audio volume in device units (0-64): `{level}*{output}V`
    Volume { output: u8, level: u8 },
    /// Audio mute: `{output}*Z` (muted) or `{output}*z` (unmuted)
    Mute { output: u8, muted: bool },
    /// Verbatim command text
    Raw(String),
}

impl DxpCommand {
    /// Encode this command to its wire text, without terminator
    pub fn encode(&self) -> String {
        match self {
            DxpCommand::Tie { input, output } => format!("{}*{}!", input, output),
            DxpCommand::TieAll { input } => format!("{}*!", input),
            DxpCommand::Untie { output } => format!("0*{}!", output),
            DxpCommand::SavePreset { preset } => format!("{},", preset),
            DxpCommand::RecallPreset { preset } => format!("{}.", preset),
            DxpCommand::Information => "I".to_string(),
            DxpCommand::RouteStatus => "0*!".to_string(),
            DxpCommand::Reset => "1Z".to_string(),
            DxpCommand::FrontPanelLock { locked: true } => "1X".to_string(),
            DxpCommand::FrontPanelLock { locked: false } => "0X".to_string(),
            DxpCommand::Volume { output, level } => format!("{}*{}V", level, output),
            DxpCommand::Mute {
                output,
                muted: true,
            } => format!("{}*Z", output),
            DxpCommand::Mute {
                output,
                muted: false,
            } => format!("{}*z", output),
            DxpCommand::Raw(text) => text.clone(),
        }
    }

    /// Encode this command with the line terminator appended
    pub fn encode_line(&self) -> Vec<u8> {
        let mut line = self.encode().into_bytes();
        line.extend_from_slice(LINE_TERMINATOR.as_bytes());
        line
    }

    /// Returns true if this command only reads device state
    pub fn is_query(&self) -> bool {
        matches!(self, DxpCommand::Information | DxpCommand::RouteStatus)
    }

    /// Check numeric parameters against the limits of a model
    pub fn check(&self, model: DxpModel) -> Result<(), ProtocolError> {
        let inputs = model.inputs();
        let outputs = model.outputs();

        match self {
            DxpCommand::Tie { input, output } => {
                check_range("input", *input, inputs)?;
                check_range("output", *output, outputs)
            }
            DxpCommand::TieAll { input } => check_range("input", *input, inputs),
            DxpCommand::Untie { output } | DxpCommand::Mute { output, .. } => {
                check_range("output", *output, outputs)
            }
            DxpCommand::SavePreset { preset } | DxpCommand::RecallPreset { preset } => {
                check_range("preset", *preset, MAX_PRESET)
            }
            DxpCommand::Volume { output, level } => {
                check_range("output", *output, outputs)?;
                if *level > MAX_DEVICE_VOLUME {
                    return Err(ProtocolError::OutOfRange {
                        what: "volume level",
                        value: u32::from(*level),
                        max: u32::from(MAX_DEVICE_VOLUME),
                    });
                }
                Ok(())
            }
            DxpCommand::Information
            | DxpCommand::RouteStatus
            | DxpCommand::Reset
            | DxpCommand::FrontPanelLock { .. }
            | DxpCommand::Raw(_) => Ok(()),
        }
    }
}

fn check_range(what: &'static str, value: u8, max: u8) -> Result<(), ProtocolError> {
    if value == 0 || value > max {
        return Err(ProtocolError::OutOfRange {
            what,
            value: u32::from(value),
            max: u32::from(max),
        });
    }
    Ok(())
}

impl fmt::Display for DxpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
