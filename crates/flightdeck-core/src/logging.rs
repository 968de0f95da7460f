//! Logging infrastructure for Flightdeck.
//!
//! Structured logging via the `tracing` ecosystem:
//!
//! - JSON lines to `~/.flightdeck/logs/flightdeck.log` for machine parsing
//! - optional human-readable stderr output (disabled while the TUI owns the
//!   terminal, otherwise log lines would tear the alternate screen)
//! - a buffer layer that mirrors every event into the shared [`LogBuffer`]
//!   so the live log panel shows the process's own tracing output
//!
//! ## Example
//!
//! ```no_run
//! use flightdeck_core::logging;
//!
//! let _guard = logging::init_logging(None, false, true, None).expect("logging init");
//! tracing::info!("flightdeck started");
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::{Context, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::error::{FlightdeckError, Result};
use crate::logbuf::{LogBuffer, LogEntry, LogLevel};

/// Guard that must be held to ensure log flushing on shutdown.
///
/// When dropped, pending file writes are flushed. Keep it alive for the
/// lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the Flightdeck logging system.
///
/// # Arguments
///
/// * `log_dir` - Optional custom log directory. Defaults to `~/.flightdeck/logs/`
/// * `verbose` - If true, sets log level to DEBUG. Otherwise INFO.
/// * `console` - If true, also log human-readable lines to stderr. Pass
///   `false` for interactive sessions where the TUI owns the terminal.
/// * `ui_buffer` - Optional shared buffer that receives a copy of every event
///   for display in the live log panel.
///
/// Returns a [`LogGuard`] that must be held for the application lifetime.
pub fn init_logging(
    log_dir: Option<PathBuf>,
    verbose: bool,
    console: bool,
    ui_buffer: Option<Arc<LogBuffer>>,
) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| FlightdeckError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "flightdeck.log");
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "flightdeck={default_level},flightdeck_core={default_level},flightdeck_tui={default_level}"
        ))
    });

    // JSON layer for file output
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true);

    // Human-readable stderr layer, suppressed in TUI mode
    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_file(verbose)
            .with_line_number(verbose)
            .compact()
    });

    let buffer_layer = ui_buffer.map(|buffer| BufferLayer::new(buffer, session_id()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .with(buffer_layer)
        .try_init()
        .map_err(|e| FlightdeckError::Internal {
            message: format!("logging already initialized: {e}"),
        })?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, console, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Get the default log directory path (`~/.flightdeck/logs/`).
pub fn default_log_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").map_err(|_| FlightdeckError::Internal {
        message: "HOME environment variable not set".into(),
    })?;

    Ok(PathBuf::from(home).join(".flightdeck").join("logs"))
}

/// Process-unique session identifier stamped on every buffered log entry.
pub fn session_id() -> String {
    format!(
        "fd-{}-{}",
        std::process::id(),
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    )
}

/// Tracing layer that mirrors events into the shared [`LogBuffer`].
pub struct BufferLayer {
    buffer: Arc<LogBuffer>,
    session_id: String,
}

impl BufferLayer {
    pub fn new(buffer: Arc<LogBuffer>, session_id: String) -> Self {
        Self { buffer, session_id }
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for BufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let level = *metadata.level();
        let level = if level == tracing::Level::ERROR {
            LogLevel::Error
        } else if level == tracing::Level::WARN {
            LogLevel::Warn
        } else if level == tracing::Level::INFO {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };

        self.buffer.add_entry(LogEntry::new(
            level,
            metadata.target(),
            visitor.message,
            self.session_id.clone(),
        ));
    }
}

/// Extracts the `message` field from an event's values.
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_default_log_dir() {
        // SAFETY: test context, the only test mutating HOME in this crate
        unsafe { std::env::set_var("HOME", "/tmp/test-home") };
        let dir = default_log_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/test-home/.flightdeck/logs"));
    }

    #[test]
    fn test_session_id_shape() {
        let id = session_id();
        assert!(id.starts_with("fd-"));
        assert!(id.len() > 10);
    }

    #[test]
    fn test_buffer_layer_captures_events() {
        let buffer = Arc::new(LogBuffer::new(16));
        let layer = BufferLayer::new(Arc::clone(&buffer), "fd-test".into());
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("hello from the buffer layer");
            tracing::warn!("something looks off");
        });

        let entries = buffer.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert!(entries[0].message.contains("hello from the buffer layer"));
        assert_eq!(entries[1].level, LogLevel::Warn);
        assert_eq!(entries[1].session_id, "fd-test");
    }

    #[test]
    fn test_init_test_logging() {
        // Should not panic
        init_test_logging();
    }

    #[test]
    fn test_init_logging_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        // Another test may already own the global subscriber; directory
        // creation happens either way and a second init must not panic.
        let result = init_logging(Some(log_dir.clone()), true, false, None);
        assert!(log_dir.exists());
        drop(result);
    }
}
