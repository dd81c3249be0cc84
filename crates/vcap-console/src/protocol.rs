//! Export commands and console responses

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest radius accepted by a one-shot `full` export
pub const MAX_FULL_RADIUS: u32 = 16;

/// Command parsing and validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown export command '{0}'")]
    Unknown(String),

    #[error("Missing argument <{0}>")]
    MissingArgument(&'static str),

    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("Invalid integer for <{arg}>: '{value}'")]
    InvalidNumber { arg: &'static str, value: String },

    #[error("Radius {0} is out of range (0-{max})", max = MAX_FULL_RADIUS)]
    RadiusOutOfRange(u32),

    #[error("Invalid name '{0}': use letters, digits, '_', '-', '.' or '+'")]
    InvalidName(String),

    #[error("Invalid command JSON: {0}")]
    Json(String),
}

/// Commands under `export`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params", rename_all = "snake_case")]
pub enum ExportCommand {
    /// Begin a live capture of `radius` chunks around the caller
    Start { name: String, radius: u32 },
    /// Report changes waiting for the next tick
    Frame,
    /// Write the texture atlas to `export/<name>.png`
    Atlas { name: String },
    /// Capture one keyframe and save it to `export/<name>.vcap`
    Full { name: String, radius: u32 },
    /// Stop the live capture and save it
    Save,
}

impl ExportCommand {
    /// Check argument ranges and names
    pub fn validate(&self) -> Result<(), CommandError> {
        match self {
            ExportCommand::Start { name, .. } | ExportCommand::Atlas { name } => validate_name(name),
            ExportCommand::Full { name, radius } => {
                validate_name(name)?;
                if *radius > MAX_FULL_RADIUS {
                    return Err(CommandError::RadiusOutOfRange(*radius));
                }
                Ok(())
            }
            ExportCommand::Frame | ExportCommand::Save => Ok(()),
        }
    }

    /// Parse a JSON command such as `{"cmd":"atlas","params":{"name":"blocks"}}`
    pub fn from_json(json: &str) -> Result<Self, CommandError> {
        let cmd: ExportCommand = serde_json::from_str(json).map_err(|e| CommandError::Json(e.to_string()))?;
        cmd.validate()?;
        Ok(cmd)
    }
}

fn validate_name(name: &str) -> Result<(), CommandError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'));
    if valid && name != "." && name != ".." {
        Ok(())
    } else {
        Err(CommandError::InvalidName(name.to_string()))
    }
}

impl FromStr for ExportCommand {
    type Err = CommandError;

    /// Parse chat text: `[/][export] <command> [args...]`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace().peekable();
        if matches!(words.peek(), Some(&"export" | &"/export")) {
            words.next();
        }
        let verb = words.next().ok_or(CommandError::Empty)?;

        let mut name = || words.next().map(str::to_string).ok_or(CommandError::MissingArgument("name"));
        let cmd = match verb {
            "start" => {
                let name = name()?;
                let radius = parse_radius(words.next())?;
                ExportCommand::Start { name, radius }
            }
            "frame" => ExportCommand::Frame,
            "atlas" => ExportCommand::Atlas { name: name()? },
            "full" => {
                let name = name()?;
                let radius = parse_radius(words.next())?;
                ExportCommand::Full { name, radius }
            }
            "save" => ExportCommand::Save,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        if let Some(extra) = words.next() {
            return Err(CommandError::UnexpectedArgument(extra.to_string()));
        }
        cmd.validate()?;
        Ok(cmd)
    }
}

fn parse_radius(word: Option<&str>) -> Result<u32, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument("radius"))?;
    word.parse().map_err(|_| CommandError::InvalidNumber {
        arg: "radius",
        value: word.to_string(),
    })
}

/// User-facing outcome of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ConsoleResponse {
    #[serde(rename = "ok")]
    Feedback { message: String },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ConsoleResponse {
    pub fn feedback(msg: impl Into<String>) -> Self {
        Self::Feedback { message: msg.into() }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { message: msg.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Feedback { message } | Self::Error { message } => message,
        }
    }
}

impl From<CommandError> for ConsoleResponse {
    fn from(e: CommandError) -> Self {
        Self::error(e.to_string())
    }
}
