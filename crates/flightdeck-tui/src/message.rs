//! Message contract for the Flightdeck reducer.
//!
//! Every state change flows through exactly one [`Message`]. Messages are
//! immutable once constructed and are delivered to the reducer over a single
//! mpsc channel; delivery order is FIFO per source, with no ordering
//! guarantee between independent sources.

use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;

use flightdeck_core::error::FlightdeckError;
use flightdeck_core::logbuf::LogEntry;
use flightdeck_core::types::{StepStatus, WorkItem};

use crate::doctor::DiagnosticResult;

/// Events consumed by the reducer.
#[derive(Debug)]
pub enum Message {
    /// Raw key input from the terminal
    Key(KeyEvent),
    /// Terminal resize (columns, rows)
    Resize(u16, u16),
    /// Periodic tick that refreshes the progress header and elapsed time
    HeaderTick,
    /// Result of the work-item fetch command
    ItemsLoaded(Result<Vec<WorkItem>, FlightdeckError>),
    /// Fresh snapshot of log entries for the log panel
    LogRefreshed {
        entries: Vec<LogEntry>,
        at: DateTime<Utc>,
    },
    /// A workflow step changed status
    ProgressStep { step_id: String, status: StepStatus },
    /// The whole workflow finished
    ProgressComplete,
    /// One diagnostic check finished
    DoctorCheckFinished(DiagnosticResult),
    /// Return to the main menu from any sub-screen
    BackToMenu,
    /// End the event loop
    Quit,
}

impl Message {
    /// Short description used in trace logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Key(_) => "key",
            Message::Resize(_, _) => "resize",
            Message::HeaderTick => "header-tick",
            Message::ItemsLoaded(_) => "items-loaded",
            Message::LogRefreshed { .. } => "log-refreshed",
            Message::ProgressStep { .. } => "progress-step",
            Message::ProgressComplete => "progress-complete",
            Message::DoctorCheckFinished(_) => "doctor-check",
            Message::BackToMenu => "back-to-menu",
            Message::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kinds() {
        assert_eq!(Message::HeaderTick.kind(), "header-tick");
        assert_eq!(Message::Quit.kind(), "quit");
        assert_eq!(
            Message::ProgressStep {
                step_id: "fetch".into(),
                status: StepStatus::Completed,
            }
            .kind(),
            "progress-step"
        );
        assert_eq!(
            Message::LogRefreshed {
                entries: Vec::new(),
                at: Utc::now(),
            }
            .kind(),
            "log-refreshed"
        );
    }
}
