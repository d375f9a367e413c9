//! AT command line parser
//!
//! ```text
//! AT                 → Ack
//! AT CL              → Command(CL)
//! AT MX -10          → Command(MX, value=-10)
//! AT KP KEY_SPACE    → Command(KP, keystring="KEY_SPACE")
//! ```
//!
//! The body of a line (everything after `AT`) is what macros feed back
//! into [`parse_command`].

use super::{ActionCode, ParamType};
use crate::error::CoreError;

/// A parsed command ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub action: ActionCode,
    pub value: i16,
    pub keystring: String,
}

impl Command {
    pub fn new(action: ActionCode, value: i16, keystring: impl Into<String>) -> Self {
        Self {
            action,
            value,
            keystring: keystring.into(),
        }
    }

    /// Idle command used for empty macro pieces
    pub fn idle() -> Self {
        Self::new(ActionCode::NoCommand, 0, "")
    }
}

/// Result of parsing one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Blank line, nothing to do
    Empty,
    /// Bare `AT`, answered with OK
    Ack,
    Command(Command),
}

/// Parse a full input line starting with `AT`
pub fn parse_line(line: &str) -> Result<Line, CoreError> {
    let line = line.trim_end_matches(['\r', '\n']).trim_start();
    if line.trim().is_empty() {
        return Ok(Line::Empty);
    }

    let prefix = line.get(..2).unwrap_or(line);
    if !prefix.eq_ignore_ascii_case("AT") {
        return Err(CoreError::UnknownCommand(line.to_string()));
    }

    let body = &line[2..];
    if body.trim().is_empty() {
        return Ok(Line::Ack);
    }
    if !body.starts_with(char::is_whitespace) {
        return Err(CoreError::UnknownCommand(line.to_string()));
    }

    parse_command(body).map(Line::Command)
}

/// Parse a command body such as `MX 10` or `KW hello`.
///
/// An empty body is the idle command.
pub fn parse_command(body: &str) -> Result<Command, CoreError> {
    let body = body.trim_end_matches(['\r', '\n']).trim_start();
    if body.trim().is_empty() {
        return Ok(Command::idle());
    }

    let code = body.get(..2).unwrap_or(body);
    let action =
        ActionCode::from_code(code).ok_or_else(|| CoreError::UnknownCommand(body.to_string()))?;

    let rest = &body[code.len()..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(CoreError::UnknownCommand(body.to_string()));
    }

    match action.param_type() {
        ParamType::None => Ok(Command::new(action, 0, "")),
        ParamType::Uint => {
            let value = parse_number(action, rest)?;
            if value < 0 {
                return Err(CoreError::InvalidParameter {
                    command: action.code(),
                    value: rest.trim().to_string(),
                });
            }
            Ok(Command::new(action, value, ""))
        }
        ParamType::Int => Ok(Command::new(action, parse_number(action, rest)?, "")),
        ParamType::String => {
            // Exactly one separator is dropped; trailing spaces belong to the value
            let value = rest.strip_prefix(' ').unwrap_or(rest);
            Ok(Command::new(action, 0, value))
        }
    }
}

fn parse_number(action: ActionCode, rest: &str) -> Result<i16, CoreError> {
    let text = rest.trim();
    if text.is_empty() {
        return Err(CoreError::MissingParameter(action.code()));
    }
    text.parse::<i16>().map_err(|_| CoreError::InvalidParameter {
        command: action.code(),
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_variants() {
        assert_eq!(parse_line(""), Ok(Line::Empty));
        assert_eq!(parse_line("\r\n"), Ok(Line::Empty));
        assert_eq!(parse_line("AT"), Ok(Line::Ack));
        assert_eq!(parse_line("at \r"), Ok(Line::Ack));
        assert_eq!(
            parse_line("AT CL\r\n"),
            Ok(Line::Command(Command::new(ActionCode::ClickLeft, 0, "")))
        );
        assert!(parse_line("ATCL").is_err());
        assert!(parse_line("HELLO").is_err());
    }

    #[test]
    fn test_numeric_parameters() {
        assert_eq!(
            parse_command("MX -10"),
            Ok(Command::new(ActionCode::MoveX, -10, ""))
        );
        assert_eq!(
            parse_command("bm 3"),
            Ok(Command::new(ActionCode::BindMode, 3, ""))
        );
        assert_eq!(
            parse_command("WS"),
            Err(CoreError::MissingParameter("WS"))
        );
        assert!(matches!(
            parse_command("WS -1"),
            Err(CoreError::InvalidParameter { command: "WS", .. })
        ));
        assert!(matches!(
            parse_command("MY abc"),
            Err(CoreError::InvalidParameter { command: "MY", .. })
        ));
    }

    #[test]
    fn test_string_parameter_keeps_trailing_space() {
        assert_eq!(
            parse_command("KP KEY_SPACE "),
            Ok(Command::new(ActionCode::KeyPress, 0, "KEY_SPACE "))
        );
        assert_eq!(
            parse_command("KW  two"),
            Ok(Command::new(ActionCode::KeyWrite, 0, " two"))
        );
        assert_eq!(
            parse_command("DE"),
            Ok(Command::new(ActionCode::DeleteSlot, 0, ""))
        );
    }

    #[test]
    fn test_empty_body_is_idle() {
        assert_eq!(parse_command(""), Ok(Command::idle()));
        assert_eq!(parse_command("   "), Ok(Command::idle()));
    }

    #[test]
    fn test_unknown_commands() {
        assert!(matches!(
            parse_command("QQ"),
            Err(CoreError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse_command("CLX"),
            Err(CoreError::UnknownCommand(_))
        ));
        assert!(matches!(parse_command("C"), Err(CoreError::UnknownCommand(_))));
    }
}
