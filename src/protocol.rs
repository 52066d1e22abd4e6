// File: src/protocol.rs
//! Line protocol spoken by the `simulator` binary. One command per input
//! line, one JSON notification per output line.

use crate::core::engine::{Command, Notification};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Engine(Command),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("{0}: bad argument '{1}'")]
    BadArgument(&'static str, String),
}

pub fn parse_line(line: &str) -> Result<Request, ParseError> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let request = match command {
        "" => return Err(ParseError::Empty),
        "TYPED_CODE" => Command::TypedCode(required("TYPED_CODE", rest)?.to_string()),
        "TYPED_TEXT" => Command::TypedText(required("TYPED_TEXT", rest)?.to_string()),
        "COMMIT" => Command::CommitTrigger,
        "SELECT" => Command::SelectIndex(number("SELECT", rest)?),
        "CANCEL" => Command::Cancel,
        "VR_MODE" => Command::ToggleVrMode(flag("VR_MODE", rest)?),
        "PRESELECT" => Command::TogglePreselectMode(flag("PRESELECT", rest)?),
        "CLEAR" => Command::ClearOutput,
        "CLEAR_HISTORY" => Command::ClearHistory,
        "RECALL" => Command::RecallHistory(number("RECALL", rest)?),
        "RELOAD" => Command::ReloadDictionary,
        "EXIT" => return Ok(Request::Exit),
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Request::Engine(request))
}

fn required<'a>(command: &'static str, arg: &'a str) -> Result<&'a str, ParseError> {
    if arg.is_empty() {
        Err(ParseError::MissingArgument(command))
    } else {
        Ok(arg)
    }
}

fn number(command: &'static str, arg: &str) -> Result<usize, ParseError> {
    required(command, arg)?
        .parse()
        .map_err(|_| ParseError::BadArgument(command, arg.to_string()))
}

fn flag(command: &'static str, arg: &str) -> Result<bool, ParseError> {
    match required(command, arg)? {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(ParseError::BadArgument(command, arg.to_string())),
    }
}

pub fn encode(notification: &Notification) -> serde_json::Result<String> {
    serde_json::to_string(notification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_engine_commands() {
        assert_eq!(
            parse_line("TYPED_CODE ABCv"),
            Ok(Request::Engine(Command::TypedCode("ABCv".into())))
        );
        assert_eq!(
            parse_line("  SELECT 2 "),
            Ok(Request::Engine(Command::SelectIndex(2)))
        );
        assert_eq!(
            parse_line("VR_MODE on"),
            Ok(Request::Engine(Command::ToggleVrMode(true)))
        );
        assert_eq!(
            parse_line("PRESELECT false"),
            Ok(Request::Engine(Command::TogglePreselectMode(false)))
        );
        assert_eq!(
            parse_line("TYPED_TEXT 1 2"),
            Ok(Request::Engine(Command::TypedText("1 2".into())))
        );
        assert_eq!(parse_line("EXIT"), Ok(Request::Exit));
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert_eq!(parse_line("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_line("JUMP"),
            Err(ParseError::UnknownCommand("JUMP".into()))
        );
        assert_eq!(
            parse_line("SELECT"),
            Err(ParseError::MissingArgument("SELECT"))
        );
        assert_eq!(
            parse_line("SELECT -1"),
            Err(ParseError::BadArgument("SELECT", "-1".into()))
        );
        assert_eq!(
            parse_line("VR_MODE maybe"),
            Err(ParseError::BadArgument("VR_MODE", "maybe".into()))
        );
    }

    #[test]
    fn test_encode_tags_notifications() {
        let json = encode(&Notification::CandidatesReady {
            candidates: vec!["捐".into(), "胡".into()],
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"candidates_ready","candidates":["捐","胡"]}"#);

        let json = encode(&Notification::SessionClosed).unwrap();
        assert_eq!(json, r#"{"event":"session_closed"}"#);
    }
}
