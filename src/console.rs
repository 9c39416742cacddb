//! Line-oriented command language of the risk console.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Show,
    Set { field: String, value: String },
    Presets,
    Load(usize),
    Clear,
    Submit,
    Result,
    Export(Option<PathBuf>),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (type 'help' for commands)", self.0)
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
Commands:
  help                 Show this message
  show                 Show current applicant fields
  set FIELD VALUE      Change one field (e.g. set AMT_CREDIT 450000)
  presets              List built-in test cases
  load N               Load test case N
  clear                Reset every field to its default
  submit               Score the current applicant
  result               Show the last result
  export [PATH]        Save the last result as JSON
  quit                 Exit";

impl ConsoleCommand {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "help" | "?" => ConsoleCommand::Help,
            "show" => ConsoleCommand::Show,
            "presets" => ConsoleCommand::Presets,
            "clear" | "reset" => ConsoleCommand::Clear,
            "submit" | "predict" => ConsoleCommand::Submit,
            "result" => ConsoleCommand::Result,
            "quit" | "exit" => ConsoleCommand::Quit,
            "load" => {
                let number = rest
                    .parse::<usize>()
                    .map_err(|_| ParseError("usage: load N".to_string()))?;
                ConsoleCommand::Load(number)
            }
            "export" => ConsoleCommand::Export(if rest.is_empty() {
                None
            } else {
                Some(PathBuf::from(rest))
            }),
            "set" => {
                // Values may contain spaces ("Business Entity Type 3").
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .filter(|(_, v)| !v.is_empty())
                    .ok_or_else(|| ParseError("usage: set FIELD VALUE".to_string()))?;
                ConsoleCommand::Set {
                    field: field.to_string(),
                    value: value.to_string(),
                }
            }
            other => return Err(ParseError(format!("unknown command '{}'", other))),
        };

        Ok(Some(command))
    }
}
