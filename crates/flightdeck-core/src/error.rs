//! Error types for Flightdeck operations.
//!
//! This module defines [`FlightdeckError`], the error enum covering all
//! failure cases across the dashboard. Errors are designed for visibility:
//! no silent failures, clear actionable messages. Background workers contain
//! their errors locally; command failures are carried inside messages back to
//! the reducer and never cross a thread boundary as a panic.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`FlightdeckError`].
pub type Result<T> = std::result::Result<T, FlightdeckError>;

/// Comprehensive error type for all Flightdeck operations.
#[derive(Debug, Error)]
pub enum FlightdeckError {
    // =========================================================================
    // Terminal / Rendering Errors
    // =========================================================================
    /// Terminal initialization failed (raw mode, alternate screen)
    #[error("Terminal initialization failed: {message}")]
    TerminalInit { message: String },

    /// Terminal restore failed
    #[error("Failed to restore terminal: {message}")]
    TerminalRestore { message: String },

    /// A render attempt failed (transient, the next tick retries)
    #[error("Render failed: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // =========================================================================
    // Worker Lifecycle Errors
    // =========================================================================
    /// Background worker failed to start
    #[error("Worker {name} failed to start: {message}")]
    WorkerStart { name: String, message: String },

    /// Stop signal was never observed within the bounded wait
    #[error("Worker {name} did not acknowledge stop within {waited_ms}ms")]
    WorkerStopTimeout { name: String, waited_ms: u64 },

    // =========================================================================
    // Command Errors
    // =========================================================================
    /// External command could not be spawned
    #[error("Failed to run `{program}`: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External command exited with a failure status
    #[error("`{program}` exited with status {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: i32,
        stderr: String,
    },

    /// JSON parsing error for command output
    #[error("JSON parse error in {context}: {message}")]
    JsonParse {
        context: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in Flightdeck)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FlightdeckError {
    /// Create a render error from an I/O failure.
    pub fn render(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Render {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a command spawn error.
    pub fn command_spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandSpawn {
            program: program.into(),
            source,
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParse {
            context: context.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create an I/O error.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is transient and the operation can simply
    /// be retried on the next tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Render { .. } | Self::WorkerStopTimeout { .. } | Self::CommandFailed { .. }
        )
    }

    /// Returns true if this error should terminate the application.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TerminalInit { .. } | Self::Internal { .. })
    }

    /// Returns actionable guidance for the user, when there is any.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::TerminalInit { .. } => Some("Try running in a different terminal"),
            Self::CommandSpawn { .. } => {
                Some("Check that the tool is installed and on your PATH")
            }
            Self::WorkerStopTimeout { .. } => {
                Some("The worker will exit on its own via the safety timeout")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = FlightdeckError::CommandFailed {
            program: "gh".into(),
            status: 1,
            stderr: "not authenticated".into(),
        };
        assert!(err.to_string().contains("gh"));
        assert!(err.to_string().contains("not authenticated"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_classification() {
        assert!(FlightdeckError::TerminalInit {
            message: "no tty".into()
        }
        .is_fatal());
        assert!(!FlightdeckError::WorkerStopTimeout {
            name: "header".into(),
            waited_ms: 100,
        }
        .is_fatal());
        assert!(FlightdeckError::WorkerStopTimeout {
            name: "header".into(),
            waited_ms: 100,
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_guidance() {
        let err = FlightdeckError::command_spawn(
            "gh",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(
            err.guidance(),
            Some("Check that the tool is installed and on your PATH")
        );
    }
}
