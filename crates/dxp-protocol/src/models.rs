//! Switcher model database
//!
//! This module contains the DXP HD 4K Plus models this stack can drive and
//! the size of each model's switching matrix.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Largest input count of any supported model
pub const MAX_INPUTS: u8 = 16;

/// Largest output count of any supported model
pub const MAX_OUTPUTS: u8 = 16;

/// Static information about a switcher model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Configuration identifier (e.g. `dxp88`)
    pub id: &'static str,
    /// Full product name
    pub name: &'static str,
    /// Number of video inputs
    pub inputs: u8,
    /// Number of video outputs
    pub outputs: u8,
}

/// Supported DXP HD 4K Plus models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DxpModel {
    /// DXP 44 HD 4K Plus (4x4)
    Dxp44,
    /// DXP 66 HD 4K Plus (6x6)
    Dxp66,
    /// DXP 84 HD 4K Plus (8 inputs, 4 outputs)
    Dxp84,
    /// DXP 88 HD 4K Plus (8x8)
    #[default]
    Dxp88,
    /// DXP 1212 HD 4K Plus (12x12)
    Dxp1212,
    /// DXP 1616 HD 4K Plus (16x16)
    Dxp1616,
}

static MODELS: &[(DxpModel, ModelInfo)] = &[
    (
        DxpModel::Dxp44,
        ModelInfo {
            id: "dxp44",
            name: "DXP 44 HD 4K Plus",
            inputs: 4,
            outputs: 4,
        },
    ),
    (
        DxpModel::Dxp66,
        ModelInfo {
            id: "dxp66",
            name: "DXP 66 HD 4K Plus",
            inputs: 6,
            outputs: 6,
        },
    ),
    (
        DxpModel::Dxp84,
        ModelInfo {
            id: "dxp84",
            name: "DXP 84 HD 4K Plus",
            inputs: 8,
            outputs: 4,
        },
    ),
    (
        DxpModel::Dxp88,
        ModelInfo {
            id: "dxp88",
            name: "DXP 88 HD 4K Plus",
            inputs: 8,
            outputs: 8,
        },
    ),
    (
        DxpModel::Dxp1212,
        ModelInfo {
            id: "dxp1212",
            name: "DXP 1212 HD 4K Plus",
            inputs: 12,
            outputs: 12,
        },
    ),
    (
        DxpModel::Dxp1616,
        ModelInfo {
            id: "dxp1616",
            name: "DXP 1616 HD 4K Plus",
            inputs: 16,
            outputs: 16,
        },
    ),
];

impl DxpModel {
    /// Every supported model, smallest first
    pub const ALL: [DxpModel; 6] = [
        DxpModel::Dxp44,
        DxpModel::Dxp66,
        DxpModel::Dxp84,
        DxpModel::Dxp88,
        DxpModel::Dxp1212,
        DxpModel::Dxp1616,
    ];

    /// Static information for this model
    pub fn info(&self) -> &'static ModelInfo {
        MODELS
            .iter()
            .find(|(model, _)| model == self)
            .map(|(_, info)| info)
            .unwrap_or(&MODELS[3].1)
    }

    /// Configuration identifier, e.g. `dxp1212`
    pub fn id(&self) -> &'static str {
        self.info().id
    }

    /// Full product name
    pub fn name(&self) -> &'static str {
        self.info().name
    }

    /// Product name without the series suffix, e.g. `DXP 88`
    pub fn short_name(&self) -> &'static str {
        let name = self.name();
        name.strip_suffix(" HD 4K Plus").unwrap_or(name)
    }

    /// Number of inputs
    pub fn inputs(&self) -> u8 {
        self.info().inputs
    }

    /// Number of outputs
    pub fn outputs(&self) -> u8 {
        self.info().outputs
    }

    /// Find the model named at the start of a device information line
    ///
    /// Matching ignores spaces so both `DXP 88 HD 4K Plus` and `DXP88`
    /// identify the 8x8 model.
    pub fn from_info_line(line: &str) -> Option<DxpModel> {
        let compact: String = line
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        Self::ALL.into_iter().find(|m| compact.starts_with(m.id()))
    }
}

impl fmt::Display for DxpModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DxpModel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.id() == wanted)
            .ok_or_else(|| ParseError::InvalidLine(format!("unknown model: {}", s)))
    }
}
