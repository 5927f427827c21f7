//! One-shot block info command
//!
//! `/httpblockinfo <x> <y> <z> [extraData|@selector]` (alias
//! `/localblockinfo`) snapshots a single cell in the sender's world and sends
//! it to the command report endpoint. Input problems become feedback for the
//! sender and nothing is sent.

use std::sync::Arc;

use crate::extract::AttributeExtractor;
use crate::models::{AttributeMap, Coordinate, ExtraData};
use crate::report::{Endpoint, ReportSink};

/// Command names this handler answers to
pub const COMMAND_NAMES: [&str; 2] = ["httpblockinfo", "localblockinfo"];

/// Errors from resolving an entity selector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Malformed selector '{0}'")]
    Malformed(String),

    #[error("Selector '{selector}' failed: {reason}")]
    Failed { selector: String, reason: String },
}

/// Resolves `@`-selectors into entity names
pub trait SelectorResolver: Send + Sync {
    fn select(&self, sender: &CommandSender, selector: &str) -> Result<Vec<String>, SelectorError>;
}

/// Command input problems, each rendered as sender feedback
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Usage: /{label} <x> <y> <z> [extraData|@selector]")]
    Usage { label: String },

    #[error("Invalid coordinates. Please enter numbers for x, y, and z.")]
    InvalidCoordinates,

    #[error("No world is available to look up the block in.")]
    NoWorld,

    #[error("An error occurred: {0}")]
    Selector(#[from] SelectorError),

    #[error("An error occurred: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Who issued a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSender {
    pub name: String,
    /// World the sender is in; `None` for the console
    pub world: Option<String>,
}

impl CommandSender {
    pub fn console() -> Self {
        Self {
            name: "CONSOLE".to_string(),
            world: None,
        }
    }

    pub fn player(name: impl Into<String>, world: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world: Some(world.into()),
        }
    }
}

/// A message shown to the sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Error(String),
    Warning(String),
    Success(String),
}

impl Feedback {
    pub fn message(&self) -> &str {
        match self {
            Self::Error(msg) | Self::Warning(msg) | Self::Success(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Result of a handled command
#[derive(Debug, Clone, Default)]
pub struct CommandReply {
    pub feedback: Vec<Feedback>,
    /// Snapshot that was sent, if any
    pub sent: Option<AttributeMap>,
}

impl CommandReply {
    fn error(err: &CommandError) -> Self {
        Self {
            feedback: vec![Feedback::Error(err.to_string())],
            sent: None,
        }
    }
}

/// Handles the block info command
pub struct CommandHandler {
    extractor: AttributeExtractor,
    selector: Arc<dyn SelectorResolver>,
    sink: Arc<dyn ReportSink>,
    endpoint: Endpoint,
}

impl CommandHandler {
    pub fn new(
        extractor: AttributeExtractor,
        selector: Arc<dyn SelectorResolver>,
        sink: Arc<dyn ReportSink>,
        endpoint: Endpoint,
    ) -> Self {
        Self {
            extractor,
            selector,
            sink,
            endpoint,
        }
    }

    /// Whether `command` is one of ours
    pub fn handles(command: &str) -> bool {
        COMMAND_NAMES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(command))
    }

    /// Run a command; `None` if `command` is not handled here
    pub fn handle<S: AsRef<str>>(
        &self,
        sender: &CommandSender,
        command: &str,
        label: &str,
        args: &[S],
    ) -> Option<CommandReply> {
        if !Self::handles(command) {
            return None;
        }

        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let reply = self.run(sender, label, &args).unwrap_or_else(|e| {
            match &e {
                CommandError::Selector(_) | CommandError::Serialize(_) => {
                    tracing::error!(sender = %sender.name, error = %e, "Block info command failed");
                }
                _ => {
                    tracing::debug!(sender = %sender.name, error = %e, "Rejected block info command");
                }
            }
            CommandReply::error(&e)
        });
        Some(reply)
    }

    fn run(&self, sender: &CommandSender, label: &str, args: &[&str]) -> Result<CommandReply, CommandError> {
        if !(3..=4).contains(&args.len()) {
            return Err(CommandError::Usage {
                label: label.to_string(),
            });
        }

        let parse = |token: &str| token.parse::<i32>().map_err(|_| CommandError::InvalidCoordinates);
        let (x, y, z) = (parse(args[0])?, parse(args[1])?, parse(args[2])?);

        let world = sender
            .world
            .clone()
            .or_else(|| self.extractor.world().default_world())
            .ok_or(CommandError::NoWorld)?;

        let mut feedback = Vec::new();
        let extra = match args.get(3) {
            Some(token) if token.starts_with('@') => {
                let names = self.selector.select(sender, token)?;
                if names.is_empty() {
                    feedback.push(Feedback::Warning(format!(
                        "Target selector '{token}' did not match any entities. Sending as a string."
                    )));
                    Some(ExtraData::Text(token.to_string()))
                } else {
                    Some(ExtraData::Names(names))
                }
            }
            Some(token) => Some(ExtraData::Text(token.to_string())),
            None => None,
        };

        let coord = Coordinate::new(world, x, y, z);
        let attrs = self.extractor.extract(&coord, extra.as_ref());
        let body = attrs.to_json()?;

        let suffix = extra
            .as_ref()
            .map(|extra| format!(" with extra data: {extra}"))
            .unwrap_or_default();
        feedback.push(Feedback::Success(format!(
            "Retrieving and sending block information for {x}, {y}, {z}{suffix}..."
        )));

        tracing::info!(sender = %sender.name, coordinate = %coord, "Sending block info");
        self.sink.submit(&self.endpoint, body);

        Ok(CommandReply {
            feedback,
            sent: Some(attrs),
        })
    }
}
