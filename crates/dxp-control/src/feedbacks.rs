//! Status feedbacks
//!
//! Feedbacks turn controller state into button indicators: either a plain
//! boolean (the host applies the feedback's default style when true) or a
//! fully styled value with text and colours.

use serde::{Deserialize, Serialize};

use crate::state::ControllerSnapshot;

/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const ORANGE: Rgb = Rgb::new(255, 165, 0);
    pub const BLUE: Rgb = Rgb::new(0, 150, 255);
    pub const AMBER: Rgb = Rgb::new(255, 150, 0);
    pub const GREY: Rgb = Rgb::new(100, 100, 100);
    pub const DARK_GREY: Rgb = Rgb::new(80, 80, 80);
    pub const CHARCOAL: Rgb = Rgb::new(50, 50, 50);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into a single `0xRRGGBB` integer
    pub fn packed(&self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

/// Text and colours for a button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackStyle {
    /// Button text (None keeps the button's own text)
    pub text: Option<String>,
    /// Background colour
    pub bgcolor: Rgb,
    /// Text colour
    pub color: Rgb,
}

impl FeedbackStyle {
    fn text(text: impl Into<String>, bgcolor: Rgb) -> Self {
        Self {
            text: Some(text.into()),
            bgcolor,
            color: Rgb::WHITE,
        }
    }

    fn colors(bgcolor: Rgb, color: Rgb) -> Self {
        Self {
            text: None,
            bgcolor,
            color,
        }
    }
}

/// Result of evaluating a feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackValue {
    /// On/off indicator
    Boolean(bool),
    /// Styled indicator
    Styled(FeedbackStyle),
}

impl FeedbackValue {
    /// The boolean state, if this is a boolean feedback
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Styled(_) => None,
        }
    }

    /// The styled value, if this is a styled feedback
    pub fn as_style(&self) -> Option<&FeedbackStyle> {
        match self {
            Self::Boolean(_) => None,
            Self::Styled(style) => Some(style),
        }
    }
}

/// A feedback the host can attach to a button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "feedback", rename_all = "snake_case")]
pub enum Feedback {
    /// True while `input` feeds `output`
    InputRoutedToOutput { input: u8, output: u8 },
    /// True while connected
    ConnectionStatus,
    /// Label of the input feeding `output`
    OutputSource { output: u8 },
    /// Reported device model
    DeviceModel,
    /// True while `output` has no input
    OutputDisconnected { output: u8 },
    /// Number of outputs `input` feeds
    InputRoutingCount { input: u8 },
}

impl Feedback {
    /// Host-facing identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::InputRoutedToOutput { .. } => "input_routed_to_output",
            Self::ConnectionStatus => "connection_status",
            Self::OutputSource { .. } => "output_source",
            Self::DeviceModel => "device_model",
            Self::OutputDisconnected { .. } => "output_disconnected",
            Self::InputRoutingCount { .. } => "input_routing_count",
        }
    }

    /// Host-facing display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::InputRoutedToOutput { .. } => "Input Routed to Output",
            Self::ConnectionStatus => "Connection Status",
            Self::OutputSource { .. } => "Output Source Display",
            Self::DeviceModel => "Device Model",
            Self::OutputDisconnected { .. } => "Output Disconnected",
            Self::InputRoutingCount { .. } => "Input Routing Count",
        }
    }

    /// Style applied by the host while a boolean feedback is true
    pub fn default_style(&self) -> Option<FeedbackStyle> {
        match self {
            Self::InputRoutedToOutput { .. } | Self::ConnectionStatus => {
                Some(FeedbackStyle::colors(Rgb::GREEN, Rgb::WHITE))
            }
            Self::OutputDisconnected { .. } => {
                Some(FeedbackStyle::colors(Rgb::ORANGE, Rgb::BLACK))
            }
            _ => None,
        }
    }

    /// Evaluate against current state
    pub fn evaluate(&self, snapshot: &ControllerSnapshot) -> FeedbackValue {
        let matrix = &snapshot.matrix;
        let config = &snapshot.config;

        match *self {
            Self::InputRoutedToOutput { input, output } => {
                FeedbackValue::Boolean(matrix.is_routed(input, output))
            }
            Self::ConnectionStatus => FeedbackValue::Boolean(snapshot.connected),
            Self::OutputSource { output } => {
                let style = if output == 0 || output > matrix.outputs() {
                    FeedbackStyle::text("Error", Rgb::RED)
                } else {
                    match matrix.source_of(output) {
                        Some(input) => FeedbackStyle::text(config.input_label(input), Rgb::BLUE),
                        None => FeedbackStyle::text("No Input", Rgb::GREY),
                    }
                };
                FeedbackValue::Styled(style)
            }
            Self::DeviceModel => FeedbackValue::Styled(FeedbackStyle::text(
                snapshot.device_info.model_display(),
                Rgb::CHARCOAL,
            )),
            Self::OutputDisconnected { output } => {
                let valid = output >= 1 && output <= matrix.outputs();
                FeedbackValue::Boolean(valid && matrix.source_of(output).is_none())
            }
            Self::InputRoutingCount { input } => {
                let style = if input == 0 || input > matrix.inputs() {
                    FeedbackStyle::text("?", Rgb::RED)
                } else {
                    let count = matrix.usage_count(input);
                    let bgcolor = match count {
                        0 => Rgb::DARK_GREY,
                        1 => Rgb::BLUE,
                        _ => Rgb::AMBER,
                    };
                    FeedbackStyle::text(count.to_string(), bgcolor)
                };
                FeedbackValue::Styled(style)
            }
        }
    }
}
