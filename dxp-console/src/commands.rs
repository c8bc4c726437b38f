//! Console command parsing
//!
//! One command per stdin line. Numbers are 1-based as printed on the
//! switcher's rear panel.

use dxp_control::{Action, Feedback};
use thiserror::Error;

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Run a controller action
    Action(Action),
    /// Send command text verbatim
    Raw(String),
    /// Print every variable
    Show,
    /// Print the routing grid
    Matrix,
    /// Evaluate and print one feedback
    Feedback(Feedback),
    /// Print the command list
    Help,
    /// Leave the console
    Quit,
}

/// Errors from parsing a console line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

pub const HELP: &str = "\
Commands:
  route <in> <out>        route an input to an output
  route-all <in>          route an input to every output
  disconnect <out>        remove the tie on an output
  save <preset>           save current routing as preset 1-32
  recall <preset>         recall preset 1-32
  info                    request device information
  status                  request the routing of every output
  reset confirm           reboot the switcher
  lock | unlock           front panel lock
  volume <out> <0-100>    set output audio volume
  mute <out>              mute output audio
  unmute <out>            unmute output audio
  raw <text>              send SIS text verbatim
  show                    print variables
  matrix                  print the routing grid
  feedback <kind> [args]  routed <in> <out> | connection | source <out>
                          model | disconnected <out> | count <in>
  quit                    exit";

/// Parse one line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.to_ascii_lowercase().as_str() {
        "route" => {
            let [input, output] = numbers::<2>(&args, "route <in> <out>")?;
            ConsoleCommand::Action(Action::RouteInputToOutput { input, output })
        }
        "route-all" => {
            let [input] = numbers::<1>(&args, "route-all <in>")?;
            ConsoleCommand::Action(Action::RouteInputToAll { input })
        }
        "disconnect" => {
            let [output] = numbers::<1>(&args, "disconnect <out>")?;
            ConsoleCommand::Action(Action::DisconnectOutput { output })
        }
        "save" => {
            let [preset] = numbers::<1>(&args, "save <preset>")?;
            ConsoleCommand::Action(Action::SavePreset { preset })
        }
        "recall" => {
            let [preset] = numbers::<1>(&args, "recall <preset>")?;
            ConsoleCommand::Action(Action::RecallPreset { preset })
        }
        "info" => ConsoleCommand::Action(Action::GetDeviceInfo),
        "status" => ConsoleCommand::Action(Action::GetRoutingStatus),
        "reset" => match args.as_slice() {
            [] => ConsoleCommand::Action(Action::ResetDevice { confirm: false }),
            ["confirm"] => ConsoleCommand::Action(Action::ResetDevice { confirm: true }),
            _ => return Err(CommandError::Usage("reset confirm")),
        },
        "lock" => ConsoleCommand::Action(Action::FrontPanelLock { lock: true }),
        "unlock" => ConsoleCommand::Action(Action::FrontPanelLock { lock: false }),
        "volume" => {
            let [output, volume] = numbers::<2>(&args, "volume <out> <0-100>")?;
            ConsoleCommand::Action(Action::SetVolume { output, volume })
        }
        "mute" => {
            let [output] = numbers::<1>(&args, "mute <out>")?;
            ConsoleCommand::Action(Action::MuteOutput { output, mute: true })
        }
        "unmute" => {
            let [output] = numbers::<1>(&args, "unmute <out>")?;
            ConsoleCommand::Action(Action::MuteOutput {
                output,
                mute: false,
            })
        }
        "raw" if !rest.is_empty() => ConsoleCommand::Raw(rest.to_string()),
        "raw" => return Err(CommandError::Usage("raw <text>")),
        "show" | "vars" => ConsoleCommand::Show,
        "matrix" => ConsoleCommand::Matrix,
        "feedback" => ConsoleCommand::Feedback(parse_feedback(&args)?),
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(CommandError::Unknown(word.to_string())),
    };

    Ok(Some(command))
}

fn parse_feedback(args: &[&str]) -> Result<Feedback, CommandError> {
    const USAGE: &str =
        "feedback routed <in> <out> | connection | source <out> | model | disconnected <out> | count <in>";

    let Some((kind, rest)) = args.split_first() else {
        return Err(CommandError::Usage(USAGE));
    };

    let feedback = match *kind {
        "routed" => {
            let [input, output] = numbers::<2>(rest, USAGE)?;
            Feedback::InputRoutedToOutput { input, output }
        }
        "connection" if rest.is_empty() => Feedback::ConnectionStatus,
        "source" => {
            let [output] = numbers::<1>(rest, USAGE)?;
            Feedback::OutputSource { output }
        }
        "model" if rest.is_empty() => Feedback::DeviceModel,
        "disconnected" => {
            let [output] = numbers::<1>(rest, USAGE)?;
            Feedback::OutputDisconnected { output }
        }
        "count" => {
            let [input] = numbers::<1>(rest, USAGE)?;
            Feedback::InputRoutingCount { input }
        }
        _ => return Err(CommandError::Usage(USAGE)),
    };
    Ok(feedback)
}

/// Parse exactly `N` numeric arguments
fn numbers<const N: usize>(args: &[&str], usage: &'static str) -> Result<[u8; N], CommandError> {
    if args.len() != N {
        return Err(CommandError::Usage(usage));
    }

    let mut values = [0u8; N];
    for (slot, arg) in values.iter_mut().zip(args) {
        *slot = arg
            .parse()
            .map_err(|_| CommandError::InvalidNumber(arg.to_string()))?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn action(line: &str) -> Action {
        match parse(line) {
            Ok(Some(ConsoleCommand::Action(action))) => action,
            other => panic!("expected action for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn test_routing_commands() {
        assert_eq!(
            action("route 3 2"),
            Action::RouteInputToOutput { input: 3, output: 2 }
        );
        assert_eq!(action("ROUTE-ALL 4"), Action::RouteInputToAll { input: 4 });
        assert_eq!(action("  disconnect 1 "), Action::DisconnectOutput { output: 1 });
    }

    #[test]
    fn test_device_commands() {
        assert_eq!(action("save 5"), Action::SavePreset { preset: 5 });
        assert_eq!(action("recall 32"), Action::RecallPreset { preset: 32 });
        assert_eq!(action("info"), Action::GetDeviceInfo);
        assert_eq!(action("status"), Action::GetRoutingStatus);
        assert_eq!(action("lock"), Action::FrontPanelLock { lock: true });
        assert_eq!(action("unlock"), Action::FrontPanelLock { lock: false });
        assert_eq!(
            action("volume 2 75"),
            Action::SetVolume { output: 2, volume: 75 }
        );
        assert_eq!(action("mute 3"), Action::MuteOutput { output: 3, mute: true });
        assert_eq!(
            action("unmute 3"),
            Action::MuteOutput {
                output: 3,
                mute: false
            }
        );
    }

    #[test]
    fn test_reset_needs_confirm_word() {
        assert_eq!(action("reset"), Action::ResetDevice { confirm: false });
        assert_eq!(action("reset confirm"), Action::ResetDevice { confirm: true });
        assert_eq!(
            parse("reset now"),
            Err(CommandError::Usage("reset confirm"))
        );
    }

    #[test]
    fn test_raw_keeps_text() {
        assert_eq!(
            parse("raw  1*2!  "),
            Ok(Some(ConsoleCommand::Raw("1*2!".into())))
        );
        assert_eq!(parse("raw"), Err(CommandError::Usage("raw <text>")));
    }

    #[test]
    fn test_feedback_commands() {
        assert_eq!(
            parse("feedback routed 1 2"),
            Ok(Some(ConsoleCommand::Feedback(
                Feedback::InputRoutedToOutput { input: 1, output: 2 }
            )))
        );
        assert_eq!(
            parse("feedback count 4"),
            Ok(Some(ConsoleCommand::Feedback(Feedback::InputRoutingCount {
                input: 4
            })))
        );
        assert_eq!(
            parse("feedback model"),
            Ok(Some(ConsoleCommand::Feedback(Feedback::DeviceModel)))
        );
        assert!(parse("feedback").is_err());
        assert!(parse("feedback source").is_err());
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(
            parse("teleport 1"),
            Err(CommandError::Unknown("teleport".into()))
        );
        assert_eq!(
            parse("route 1"),
            Err(CommandError::Usage("route <in> <out>"))
        );
        assert_eq!(
            parse("route one 2"),
            Err(CommandError::InvalidNumber("one".into()))
        );
        assert_eq!(
            parse("volume 1 300"),
            Err(CommandError::InvalidNumber("300".into()))
        );
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(parse("show"), Ok(Some(ConsoleCommand::Show)));
        assert_eq!(parse("matrix"), Ok(Some(ConsoleCommand::Matrix)));
        assert_eq!(parse("help"), Ok(Some(ConsoleCommand::Help)));
        assert_eq!(parse("exit"), Ok(Some(ConsoleCommand::Quit)));
    }

    proptest! {
        #[test]
        fn parse_never_panics(line in "\\PC{0,40}") {
            let _ = parse(&line);
        }
    }
}
