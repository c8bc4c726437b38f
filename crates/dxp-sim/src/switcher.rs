//! Virtual DXP switcher
//!
//! In-memory model of a DXP HD 4K Plus that answers SIS command lines the
//! way the hardware does. Used by the TCP server in [`crate::server`] and
//! directly by tests.

use std::collections::BTreeMap;

use dxp_protocol::{DeviceError, DxpModel, MAX_PRESET};
use tracing::debug;

/// Highest volume level the device accepts
const MAX_VOLUME: u8 = 64;

/// Simulated switcher state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualSwitcher {
    model: DxpModel,
    /// Input per output (index = output - 1, 0 = untied)
    ties: Vec<u8>,
    /// Stored tie tables keyed by preset number
    presets: BTreeMap<u8, Vec<u8>>,
    front_panel_locked: bool,
    volumes: Vec<u8>,
    mutes: Vec<bool>,
    /// Lines received (for test verification)
    received: Vec<String>,
}

impl VirtualSwitcher {
    /// Create a switcher with no ties, full volume and nothing muted
    pub fn new(model: DxpModel) -> Self {
        let outputs = usize::from(model.outputs());
        Self {
            model,
            ties: vec![0; outputs],
            presets: BTreeMap::new(),
            front_panel_locked: false,
            volumes: vec![MAX_VOLUME; outputs],
            mutes: vec![false; outputs],
            received: Vec::new(),
        }
    }

    /// Get the model
    pub fn model(&self) -> DxpModel {
        self.model
    }

    /// Input feeding a 1-based output, if any
    pub fn tie(&self, output: u8) -> Option<u8> {
        self.output_index(output)
            .map(|i| self.ties[i])
            .filter(|&input| input != 0)
    }

    /// Set a tie without going through the command parser
    ///
    /// Out-of-range numbers are ignored.
    pub fn set_tie(&mut self, output: u8, input: u8) {
        if input > self.model.inputs() {
            return;
        }
        if let Some(i) = self.output_index(output) {
            self.ties[i] = input;
        }
    }

    /// Whether the front panel is locked
    pub fn is_locked(&self) -> bool {
        self.front_panel_locked
    }

    /// Volume level (0-64) of a 1-based output
    pub fn volume(&self, output: u8) -> Option<u8> {
        self.output_index(output).map(|i| self.volumes[i])
    }

    /// Mute state of a 1-based output
    pub fn is_muted(&self, output: u8) -> Option<bool> {
        self.output_index(output).map(|i| self.mutes[i])
    }

    /// Whether a preset has been saved
    pub fn has_preset(&self, preset: u8) -> bool {
        self.presets.contains_key(&preset)
    }

    /// Every line processed so far
    pub fn received_commands(&self) -> &[String] {
        &self.received
    }

    /// Process one command line and return the response lines
    ///
    /// Responses are returned without terminators.
    pub fn process_line(&mut self, line: &str) -> Vec<String> {
        let line = line.trim();
        self.received.push(line.to_string());

        let responses = match self.dispatch(line) {
            Ok(responses) => responses,
            Err(error) => vec![format!("E{:02}", error.code())],
        };
        debug!("Virtual switcher: {:?} -> {:?}", line, responses);
        responses
    }

    fn dispatch(&mut self, line: &str) -> Result<Vec<String>, DeviceError> {
        match line {
            "I" => return Ok(vec![self.model.name().to_string()]),
            "0*!" => return Ok(self.status_lines()),
            "1X" | "0X" => {
                self.front_panel_locked = line == "1X";
                return Ok(vec![format!("Exe{}", &line[..1])]);
            }
            "1Z" => {
                self.ties.iter_mut().for_each(|tie| *tie = 0);
                return Ok(vec!["Zpx".to_string()]);
            }
            _ => {}
        }

        if let Some(body) = line.strip_suffix('!') {
            let (input, output) = body.split_once('*').ok_or(DeviceError::InvalidCommand)?;
            let input = number(input)?;
            return if output.is_empty() {
                self.tie_all(input)
            } else {
                self.tie_one(input, number(output)?)
            };
        }

        if let Some(preset) = line.strip_suffix(',') {
            return self.save_preset(number(preset)?);
        }

        if let Some(preset) = line.strip_suffix('.') {
            return self.recall_preset(number(preset)?);
        }

        if let Some(body) = line.strip_suffix('V') {
            let (level, output) = body.split_once('*').ok_or(DeviceError::InvalidCommand)?;
            return self.set_volume(number(output)?, number(level)?);
        }

        if let Some((output, mute)) = line.split_once('*') {
            let muted = match mute {
                "Z" => true,
                "z" => false,
                _ => return Err(DeviceError::InvalidCommand),
            };
            return self.set_mute(number(output)?, muted);
        }

        Err(DeviceError::InvalidCommand)
    }

    fn tie_one(&mut self, input: u8, output: u8) -> Result<Vec<String>, DeviceError> {
        if input > self.model.inputs() {
            return Err(DeviceError::InvalidInput);
        }
        let index = self.output_index(output).ok_or(DeviceError::InvalidOutput)?;
        self.ties[index] = input;
        Ok(vec![tie_line(output, input)])
    }

    fn tie_all(&mut self, input: u8) -> Result<Vec<String>, DeviceError> {
        if input == 0 || input > self.model.inputs() {
            return Err(DeviceError::InvalidInput);
        }
        self.ties.iter_mut().for_each(|tie| *tie = input);
        Ok(self.tie_lines())
    }

    fn save_preset(&mut self, preset: u8) -> Result<Vec<String>, DeviceError> {
        check_preset(preset)?;
        self.presets.insert(preset, self.ties.clone());
        Ok(vec![format!("Spr{:02}", preset)])
    }

    fn recall_preset(&mut self, preset: u8) -> Result<Vec<String>, DeviceError> {
        check_preset(preset)?;
        let ties = self
            .presets
            .get(&preset)
            .ok_or(DeviceError::InvalidPreset)?;
        self.ties.clone_from(ties);

        let mut lines = vec![format!("Rpr{:02}", preset)];
        lines.extend(self.tie_lines());
        Ok(lines)
    }

    fn set_volume(&mut self, output: u8, level: u8) -> Result<Vec<String>, DeviceError> {
        let index = self.output_index(output).ok_or(DeviceError::InvalidOutput)?;
        if level > MAX_VOLUME {
            return Err(DeviceError::InvalidValue);
        }
        self.volumes[index] = level;
        Ok(vec![format!("Out{:02} Vol{:02}", output, level)])
    }

    fn set_mute(&mut self, output: u8, muted: bool) -> Result<Vec<String>, DeviceError> {
        let index = self.output_index(output).ok_or(DeviceError::InvalidOutput)?;
        self.mutes[index] = muted;
        Ok(vec![format!("Amt{:02}*{}", output, u8::from(muted))])
    }

    /// Route report for every output
    fn status_lines(&self) -> Vec<String> {
        self.ties
            .iter()
            .enumerate()
            .map(|(i, &input)| format!("Out{:02} In{:02}", i + 1, input))
            .collect()
    }

    /// Tie confirmation for every output
    fn tie_lines(&self) -> Vec<String> {
        self.ties
            .iter()
            .enumerate()
            .map(|(i, &input)| tie_line(i as u8 + 1, input))
            .collect()
    }

    fn output_index(&self, output: u8) -> Option<usize> {
        (output >= 1 && output <= self.model.outputs()).then(|| usize::from(output - 1))
    }
}

fn tie_line(output: u8, input: u8) -> String {
    format!("Out{:02} In{:02} All", output, input)
}

fn check_preset(preset: u8) -> Result<(), DeviceError> {
    if preset == 0 || preset > MAX_PRESET {
        return Err(DeviceError::InvalidPreset);
    }
    Ok(())
}

/// Parse a decimal field; anything else is not a valid command
fn number(field: &str) -> Result<u8, DeviceError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DeviceError::InvalidCommand);
    }
    // Digits that overflow u8 are out of range for every field
    Ok(field.parse::<u8>().unwrap_or(u8::MAX))
}
