//! User-facing actions
//!
//! Each action a control surface can trigger maps to at most one SIS
//! command. Numbers are validated against the configured model before a
//! command is produced.

use dxp_protocol::{volume_to_device, DxpCommand, MAX_PRESET};
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::error::ControlError;

/// An action invokable from the host surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Route one input to one output
    #[serde(rename = "route_input_output")]
    RouteInputToOutput { input: u8, output: u8 },
    /// Route one input to every output
    #[serde(rename = "route_input_all")]
    RouteInputToAll { input: u8 },
    /// Remove the tie on an output
    DisconnectOutput { output: u8 },
    /// Store the current routing as a preset (1-32)
    SavePreset { preset: u8 },
    /// Recall a stored preset (1-32)
    RecallPreset { preset: u8 },
    /// Request device information
    GetDeviceInfo,
    /// Request the tie of every output
    GetRoutingStatus,
    /// Reboot the device; ignored unless confirmed
    ResetDevice { confirm: bool },
    /// Lock or unlock the front panel
    FrontPanelLock { lock: bool },
    /// Set an output's audio volume as a percentage (0-100)
    SetVolume { output: u8, volume: u8 },
    /// Mute or unmute an output's audio
    MuteOutput { output: u8, mute: bool },
}

impl Action {
    /// Host-facing identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::RouteInputToOutput { .. } => "route_input_output",
            Self::RouteInputToAll { .. } => "route_input_all",
            Self::DisconnectOutput { .. } => "disconnect_output",
            Self::SavePreset { .. } => "save_preset",
            Self::RecallPreset { .. } => "recall_preset",
            Self::GetDeviceInfo => "get_device_info",
            Self::GetRoutingStatus => "get_routing_status",
            Self::ResetDevice { .. } => "reset_device",
            Self::FrontPanelLock { .. } => "front_panel_lock",
            Self::SetVolume { .. } => "set_volume",
            Self::MuteOutput { .. } => "mute_output",
        }
    }

    /// Host-facing display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::RouteInputToOutput { .. } => "Route Input to Output",
            Self::RouteInputToAll { .. } => "Route Input to All Outputs",
            Self::DisconnectOutput { .. } => "Disconnect Output",
            Self::SavePreset { .. } => "Save Preset",
            Self::RecallPreset { .. } => "Recall Preset",
            Self::GetDeviceInfo => "Get Device Information",
            Self::GetRoutingStatus => "Get Routing Status",
            Self::ResetDevice { .. } => "Reset Device",
            Self::FrontPanelLock { .. } => "Front Panel Lock",
            Self::SetVolume { .. } => "Set Audio Volume",
            Self::MuteOutput { .. } => "Mute/Unmute Audio Output",
        }
    }

    /// Build the command for this action
    ///
    /// Returns `Ok(None)` for actions that send nothing, such as an
    /// unconfirmed reset.
    pub fn to_command(&self, config: &ControllerConfig) -> Result<Option<DxpCommand>, ControlError> {
        let command = match *self {
            Self::RouteInputToOutput { input, output } => {
                check_input(config, input)?;
                check_output(config, output)?;
                DxpCommand::Tie { input, output }
            }
            Self::RouteInputToAll { input } => {
                check_input(config, input)?;
                DxpCommand::TieAll { input }
            }
            Self::DisconnectOutput { output } => {
                check_output(config, output)?;
                DxpCommand::Untie { output }
            }
            Self::SavePreset { preset } => {
                check_preset(preset)?;
                DxpCommand::SavePreset { preset }
            }
            Self::RecallPreset { preset } => {
                check_preset(preset)?;
                DxpCommand::RecallPreset { preset }
            }
            Self::GetDeviceInfo => DxpCommand::Information,
            Self::GetRoutingStatus => DxpCommand::RouteStatus,
            Self::ResetDevice { confirm: false } => return Ok(None),
            Self::ResetDevice { confirm: true } => DxpCommand::Reset,
            Self::FrontPanelLock { lock } => DxpCommand::FrontPanelLock { locked: lock },
            Self::SetVolume { output, volume } => {
                check_output(config, output)?;
                if volume > 100 {
                    return Err(ControlError::VolumeOutOfRange(volume));
                }
                DxpCommand::Volume {
                    output,
                    level: volume_to_device(volume),
                }
            }
            Self::MuteOutput { output, mute } => {
                check_output(config, output)?;
                DxpCommand::Mute {
                    output,
                    muted: mute,
                }
            }
        };
        Ok(Some(command))
    }
}

fn check_input(config: &ControllerConfig, input: u8) -> Result<(), ControlError> {
    let count = config.input_count();
    if input == 0 || input > count {
        return Err(ControlError::InputOutOfRange { input, count });
    }
    Ok(())
}

fn check_output(config: &ControllerConfig, output: u8) -> Result<(), ControlError> {
    let count = config.output_count();
    if output == 0 || output > count {
        return Err(ControlError::OutputOutOfRange { output, count });
    }
    Ok(())
}

fn check_preset(preset: u8) -> Result<(), ControlError> {
    if preset == 0 || preset > MAX_PRESET {
        return Err(ControlError::PresetOutOfRange(preset));
    }
    Ok(())
}
