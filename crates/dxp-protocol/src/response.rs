//! Response line classification
//!
//! The switcher answers every command with a short text line and also
//! reports front-panel changes unsolicited. Only a few shapes matter to the
//! controller:
//!
//! - `Out02 In03` / `Out02 In03 All` - output 2 is now fed by input 3
//! - `DXP 88 HD 4K Plus ...` - device information
//! - `E10` - error code
//!
//! Everything else is reported as [`DxpResponse::Unknown`].

use std::fmt;

use crate::error::ParseError;

/// Error codes reported by the switcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceError {
    /// E01
    InvalidInput,
    /// E10
    InvalidCommand,
    /// E11
    InvalidPreset,
    /// E12
    InvalidOutput,
    /// E13
    InvalidValue,
    /// E14
    InvalidForConfiguration,
    /// E17
    Timeout,
    /// E22
    Busy,
    /// E24
    PrivilegeViolation,
    /// E25
    DeviceNotPresent,
    /// E26
    MaxConnectionsExceeded,
    /// Any other code
    Other(u8),
}

impl DeviceError {
    /// Map a numeric error code to its meaning
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::InvalidInput,
            10 => Self::InvalidCommand,
            11 => Self::InvalidPreset,
            12 => Self::InvalidOutput,
            13 => Self::InvalidValue,
            14 => Self::InvalidForConfiguration,
            17 => Self::Timeout,
            22 => Self::Busy,
            24 => Self::PrivilegeViolation,
            25 => Self::DeviceNotPresent,
            26 => Self::MaxConnectionsExceeded,
            other => Self::Other(other),
        }
    }

    /// Numeric error code
    pub fn code(&self) -> u8 {
        match self {
            Self::InvalidInput => 1,
            Self::InvalidCommand => 10,
            Self::InvalidPreset => 11,
            Self::InvalidOutput => 12,
            Self::InvalidValue => 13,
            Self::InvalidForConfiguration => 14,
            Self::Timeout => 17,
            Self::Busy => 22,
            Self::PrivilegeViolation => 24,
            Self::DeviceNotPresent => 25,
            Self::MaxConnectionsExceeded => 26,
            Self::Other(code) => *code,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid input number",
            Self::InvalidCommand => "invalid command",
            Self::InvalidPreset => "invalid preset number",
            Self::InvalidOutput => "invalid output number",
            Self::InvalidValue => "invalid value",
            Self::InvalidForConfiguration => "command invalid for this configuration",
            Self::Timeout => "timeout",
            Self::Busy => "busy",
            Self::PrivilegeViolation => "privilege violation",
            Self::DeviceNotPresent => "device not present",
            Self::MaxConnectionsExceeded => "maximum connections exceeded",
            Self::Other(_) => "unrecognized error",
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:02} ({})", self.code(), self.description())
    }
}

/// A classified response line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DxpResponse {
    /// Output is fed by input (1-based, as sent by the device; input 0 means untied)
    Tie { output: u8, input: u8 },
    /// Device information line, kept verbatim
    DeviceInfo { model: String },
    /// Error code
    Error(DeviceError),
    /// Unrecognized line
    Unknown(String),
}

impl DxpResponse {
    /// Classify one line (without terminator)
    pub fn parse(line: &str) -> Self {
        if line.contains("Out") && line.contains("In") {
            return match parse_tie(line) {
                Ok((output, input)) => DxpResponse::Tie { output, input },
                Err(e) => {
                    tracing::debug!("Ignoring route-like line {:?}: {}", line, e);
                    DxpResponse::Unknown(line.to_string())
                }
            };
        }

        if line.starts_with("DXP") {
            return DxpResponse::DeviceInfo {
                model: line.to_string(),
            };
        }

        if let Some(code) = parse_error_code(line) {
            return DxpResponse::Error(DeviceError::from_code(code));
        }

        DxpResponse::Unknown(line.to_string())
    }

    /// Returns true if this response reports a tie
    pub fn is_tie(&self) -> bool {
        matches!(self, DxpResponse::Tie { .. })
    }
}

/// Find `Out<digits><whitespace>In<digits>` anywhere in the line
fn parse_tie(line: &str) -> Result<(u8, u8), ParseError> {
    let mut last_err = ParseError::MissingToken("Out");

    for (start, _) in line.match_indices("Out") {
        match parse_tie_at(&line[start + 3..]) {
            Ok(tie) => return Ok(tie),
            Err(e) => last_err = e,
        }
    }

    Err(last_err)
}

fn parse_tie_at(rest: &str) -> Result<(u8, u8), ParseError> {
    let (output, rest) = take_number(rest)?;

    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return Err(ParseError::InvalidLine("expected whitespace after output".into()));
    }

    let rest = trimmed
        .strip_prefix("In")
        .ok_or(ParseError::MissingToken("In"))?;
    let (input, _) = take_number(rest)?;

    Ok((output, input))
}

/// Split leading ASCII digits off `s` and parse them
fn take_number(s: &str) -> Result<(u8, &str), ParseError> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return Err(ParseError::MissingToken("digits"));
    }

    let digits = &s[..end];
    let value = digits
        .parse::<u8>()
        .map_err(|_| ParseError::InvalidNumber(digits.to_string()))?;

    Ok((value, &s[end..]))
}

/// Recognize `E` followed by exactly two digits
fn parse_error_code(line: &str) -> Option<u8> {
    let digits = line.strip_prefix('E')?;
    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_tie() {
        assert_eq!(
            DxpResponse::parse("Out02 In03"),
            DxpResponse::Tie {
                output: 2,
                input: 3
            }
        );
        assert_eq!(
            DxpResponse::parse("Out12 In01 All"),
            DxpResponse::Tie {
                output: 12,
                input: 1
            }
        );
    }

    #[test]
    fn test_parse_tie_with_extra_whitespace() {
        assert_eq!(
            DxpResponse::parse("Out1\tIn16"),
            DxpResponse::Tie {
                output: 1,
                input: 16
            }
        );
        assert_eq!(
            DxpResponse::parse("Out04   In00 All"),
            DxpResponse::Tie {
                output: 4,
                input: 0
            }
        );
    }

    #[test]
    fn test_parse_tie_embedded() {
        assert_eq!(
            DxpResponse::parse("Qik Out03 In05 Vid"),
            DxpResponse::Tie {
                output: 3,
                input: 5
            }
        );
    }

    #[test]
    fn test_route_like_line_without_pattern_is_unknown() {
        assert_eq!(
            DxpResponse::parse("OutIn"),
            DxpResponse::Unknown("OutIn".into())
        );
        assert_eq!(
            DxpResponse::parse("Out02In03"),
            DxpResponse::Unknown("Out02In03".into())
        );
        assert_eq!(
            DxpResponse::parse("Out999 In1"),
            DxpResponse::Unknown("Out999 In1".into())
        );
    }

    #[test]
    fn test_parse_device_info() {
        assert_eq!(
            DxpResponse::parse("DXP 88 HD 4K Plus"),
            DxpResponse::DeviceInfo {
                model: "DXP 88 HD 4K Plus".into()
            }
        );
    }

    #[test]
    fn test_route_takes_priority_over_device_info() {
        assert!(DxpResponse::parse("DXP Out01 In02").is_tie());
    }

    #[test]
    fn test_parse_error_codes() {
        assert_eq!(
            DxpResponse::parse("E10"),
            DxpResponse::Error(DeviceError::InvalidCommand)
        );
        assert_eq!(
            DxpResponse::parse("E12"),
            DxpResponse::Error(DeviceError::InvalidOutput)
        );
        assert_eq!(
            DxpResponse::parse("E99"),
            DxpResponse::Error(DeviceError::Other(99))
        );
        assert_eq!(DxpResponse::parse("E1"), DxpResponse::Unknown("E1".into()));
        assert_eq!(
            DxpResponse::parse("Exe1"),
            DxpResponse::Unknown("Exe1".into())
        );
    }

    #[test]
    fn test_device_error_display() {
        assert_eq!(
            DeviceError::InvalidPreset.to_string(),
            "E11 (invalid preset number)"
        );
        assert_eq!(DeviceError::from_code(1).code(), 1);
    }

    #[test]
    fn test_unknown_lines() {
        assert_eq!(
            DxpResponse::parse("Spr05"),
            DxpResponse::Unknown("Spr05".into())
        );
        assert_eq!(
            DxpResponse::parse("Reconfig"),
            DxpResponse::Unknown("Reconfig".into())
        );
    }

    proptest! {
        #[test]
        fn tie_lines_parse_for_any_numbers(output in 0u8..=99, input in 0u8..=99, all: bool) {
            let line = if all {
                format!("Out{:02} In{:02} All", output, input)
            } else {
                format!("Out{:02} In{:02}", output, input)
            };
            prop_assert_eq!(DxpResponse::parse(&line), DxpResponse::Tie { output, input });
        }

        #[test]
        fn parse_never_panics(line in "\\PC{0,40}") {
            let _ = DxpResponse::parse(&line);
        }
    }
}
