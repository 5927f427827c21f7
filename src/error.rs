//! Unified error handling for the cellwatch crate
//!
//! Each component owns a domain error (`ConfigError`, `WatchEntryError`,
//! `CommandError`, `ReportError`). This module wraps them in a single
//! [`Error`] so they can cross module boundaries, and classifies them for
//! handling.
//!
//! None of these errors escape the runtime path: watch entries are skipped,
//! command errors become user feedback, and report errors are logged.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cellwatch::error::{CellwatchErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = ?err.category(), "{err}");
//!     } else {
//!         tracing::error!("{err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::command::{CommandError, SelectorError};
pub use crate::config::ConfigError;
pub use crate::registry::WatchEntryError;
pub use crate::report::ReportError;

/// Common trait for all cellwatch error types
pub trait CellwatchErrorTrait: std::error::Error {
    /// Check if this error is transient (a later attempt may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport-level failures (connect, timeout, DNS)
    Network,
    /// Non-2xx responses from the report endpoint
    HttpStatus,
    /// Invalid configuration or watch entries
    Config,
    /// Invalid interactive command input
    Command,
    /// Serialization failures
    Serialization,
    /// Storage and I/O errors
    Storage,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::HttpStatus => "http_status",
            Self::Config => "config",
            Self::Command => "command",
            Self::Serialization => "serialization",
            Self::Storage => "storage",
        }
    }
}

/// Unified error type for the cellwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A watch list entry that could not be loaded
    #[error("Watch entry error: {0}")]
    WatchEntry(#[from] WatchEntryError),

    /// Interactive command errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Report delivery errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CellwatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Report(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Config(_) | Self::WatchEntry(_) | Self::Command(_) | Self::Json(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::WatchEntry(_) => ErrorCategory::Config,
            Self::Command(_) => ErrorCategory::Command,
            Self::Report(e) => e.category(),
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Serialization,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
