//! Text rendering for the console

use std::fmt::Write;

use dxp_control::{
    variable_definitions, variable_values, ControllerEvent, ControllerSnapshot, Feedback,
    FeedbackValue,
};

/// Routing grid: one row per output, `X` where an input feeds it
pub fn format_matrix(snapshot: &ControllerSnapshot) -> String {
    let matrix = &snapshot.matrix;
    let mut out = String::from("        ");
    for input in 1..=matrix.inputs() {
        let _ = write!(out, "{:>3}", input);
    }
    out.push('\n');

    for (index, row) in matrix.rows().enumerate() {
        let _ = write!(out, "Out {:<3} ", index + 1);
        for &set in row {
            out.push_str(if set { "  X" } else { "  ." });
        }
        out.push('\n');
    }
    out
}

/// Every variable as `Name: value`, in definition order
pub fn format_variables(snapshot: &ControllerSnapshot) -> String {
    let values = variable_values(snapshot);
    let mut out = String::new();
    for def in variable_definitions(&snapshot.config) {
        if let Some(value) = values.get(&def.variable_id) {
            let _ = writeln!(out, "{}: {}", def.name, value);
        }
    }
    out
}

/// One evaluated feedback
pub fn format_feedback(feedback: &Feedback, value: &FeedbackValue) -> String {
    match value {
        FeedbackValue::Boolean(on) => {
            format!("{}: {}", feedback.name(), if *on { "on" } else { "off" })
        }
        FeedbackValue::Styled(style) => format!(
            "{}: {} (bg #{:06X}, fg #{:06X})",
            feedback.name(),
            style.text.as_deref().unwrap_or(""),
            style.bgcolor.packed(),
            style.color.packed()
        ),
    }
}

/// Line to print for an event, if it is worth showing
pub fn describe_event(event: &ControllerEvent, show_traffic: bool) -> Option<String> {
    if event.is_traffic() && !show_traffic {
        return None;
    }

    let line = match event {
        ControllerEvent::StatusChanged { status } => format!("Status: {}", status),
        ControllerEvent::Connected { address } => format!("Connected to {}", address),
        ControllerEvent::Disconnected => "Disconnected".to_string(),
        ControllerEvent::ReconnectScheduled { delay } => {
            format!("Reconnecting in {} ms", delay.as_millis())
        }
        ControllerEvent::DataIn { line } => format!("<< {}", line),
        ControllerEvent::DataOut { text } => format!(">> {}", text),
        ControllerEvent::CommandQueued { text } => format!("Queued (not connected): {}", text),
        ControllerEvent::RouteChanged { output, input } => {
            format!("Output {} <- Input {}", output, input)
        }
        ControllerEvent::DeviceInfoChanged { info } => {
            format!("Device: {}", info.model_display())
        }
        ControllerEvent::DeviceError { error } => format!("Device error {}", error),
        ControllerEvent::MatrixResized { inputs, outputs } => {
            format!("Matrix is now {}x{}", inputs, outputs)
        }
        ControllerEvent::VariablesUpdated { .. } => return None,
    };
    Some(line)
}
