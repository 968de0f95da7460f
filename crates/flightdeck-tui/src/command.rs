//! Deferred asynchronous work for the reducer.
//!
//! The reducer never performs I/O; it returns a [`Command`] and the
//! [`CommandRunner`] executes it on its own thread. Every non-batch command
//! resolves to exactly one [`Message`] posted back into the event loop, or to
//! none when the loop has already shut down. Failures are converted into
//! messages, never panics across the thread boundary.

use std::process;
use std::sync::Arc;
use std::sync::mpsc::SyncSender;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use flightdeck_core::error::{FlightdeckError, Result};
use flightdeck_core::logbuf::LogBuffer;
use flightdeck_core::types::WorkItem;

use crate::doctor::DiagnosticCheck;
use crate::message::Message;

/// Default issue-tracker invocation for fetching work items.
pub const DEFAULT_FETCH_COMMAND: &[&str] = &[
    "gh",
    "issue",
    "list",
    "--json",
    "number,title,state,labels",
    "--limit",
    "50",
];

/// A deferred unit of asynchronous work produced by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Post [`Message::HeaderTick`] after `interval`
    HeaderTick { interval: Duration },
    /// Snapshot the log buffer after `delay` and post the entries newer
    /// than `after`
    RefreshLogs {
        after: DateTime<Utc>,
        delay: Duration,
    },
    /// Empty the log buffer and post an empty snapshot
    ClearLogs,
    /// Fetch work items from the issue tracker
    FetchItems,
    /// Run one diagnostic check
    RunDoctorCheck(DiagnosticCheck),
    /// Run several commands, each still resolving to its own message
    Batch(Vec<Command>),
}

impl Command {
    /// Convenience constructor for a batch, dropping the wrapper for 0/1
    /// commands.
    pub fn batch(mut commands: Vec<Command>) -> Option<Command> {
        match commands.len() {
            0 => None,
            1 => commands.pop(),
            _ => Some(Command::Batch(commands)),
        }
    }
}

/// Executes commands on background threads and posts results back into the
/// reducer's message stream.
pub struct CommandRunner {
    tx: SyncSender<Message>,
    buffer: Arc<LogBuffer>,
    fetch_command: Vec<String>,
}

impl CommandRunner {
    pub fn new(tx: SyncSender<Message>, buffer: Arc<LogBuffer>) -> Self {
        Self {
            tx,
            buffer,
            fetch_command: DEFAULT_FETCH_COMMAND.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Override the work-item fetch invocation (used by tests and custom
    /// tracker setups).
    pub fn with_fetch_command(mut self, command: Vec<String>) -> Self {
        if !command.is_empty() {
            self.fetch_command = command;
        }
        self
    }

    /// Execute a command. Returns immediately; the result arrives as a
    /// message.
    pub fn run(&self, command: Command) {
        match command {
            Command::Batch(commands) => {
                for cmd in commands {
                    self.run(cmd);
                }
            }
            Command::HeaderTick { interval } => {
                let tx = self.tx.clone();
                thread::spawn(move || {
                    thread::sleep(interval);
                    let _ = tx.send(Message::HeaderTick);
                });
            }
            Command::RefreshLogs { after, delay } => {
                let tx = self.tx.clone();
                let buffer = Arc::clone(&self.buffer);
                thread::spawn(move || {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    let entries = buffer.entries_after(after);
                    let _ = tx.send(Message::LogRefreshed {
                        entries,
                        at: Utc::now(),
                    });
                });
            }
            Command::ClearLogs => {
                let tx = self.tx.clone();
                let buffer = Arc::clone(&self.buffer);
                thread::spawn(move || {
                    buffer.clear();
                    let _ = tx.send(Message::LogRefreshed {
                        entries: Vec::new(),
                        at: Utc::now(),
                    });
                });
            }
            Command::FetchItems => {
                let tx = self.tx.clone();
                let invocation = self.fetch_command.clone();
                thread::spawn(move || {
                    trace!(program = %invocation[0], "fetching work items");
                    let result = fetch_items(&invocation);
                    if let Err(ref e) = result {
                        debug!(error = %e, "work item fetch failed");
                    }
                    let _ = tx.send(Message::ItemsLoaded(result));
                });
            }
            Command::RunDoctorCheck(check) => {
                let tx = self.tx.clone();
                thread::spawn(move || {
                    let result = check.run();
                    let _ = tx.send(Message::DoctorCheckFinished(result));
                });
            }
        }
    }
}

/// Run the tracker CLI and parse its JSON output into work items.
fn fetch_items(invocation: &[String]) -> Result<Vec<WorkItem>> {
    let program = &invocation[0];
    let output = process::Command::new(program)
        .args(&invocation[1..])
        .output()
        .map_err(|e| FlightdeckError::command_spawn(program.clone(), e))?;

    if !output.status.success() {
        return Err(FlightdeckError::CommandFailed {
            program: program.clone(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| FlightdeckError::json_parse(format!("{program} output"), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightdeck_core::logbuf::{LogEntry, LogLevel};
    use std::sync::mpsc;

    fn runner_with_channel() -> (CommandRunner, mpsc::Receiver<Message>, Arc<LogBuffer>) {
        let (tx, rx) = mpsc::sync_channel(64);
        let buffer = Arc::new(LogBuffer::new(16));
        (CommandRunner::new(tx, Arc::clone(&buffer)), rx, buffer)
    }

    fn recv(rx: &mpsc::Receiver<Message>) -> Message {
        rx.recv_timeout(Duration::from_secs(5)).expect("message")
    }

    #[test]
    fn test_header_tick_posts_exactly_one_message() {
        let (runner, rx, _) = runner_with_channel();
        runner.run(Command::HeaderTick {
            interval: Duration::from_millis(5),
        });

        assert!(matches!(recv(&rx), Message::HeaderTick));
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_refresh_logs_snapshots_buffer() {
        let (runner, rx, buffer) = runner_with_channel();
        buffer.add_entry(LogEntry::new(LogLevel::Info, "test", "hello", "s"));

        runner.run(Command::RefreshLogs {
            after: Utc::now() - chrono::Duration::hours(1),
            delay: Duration::ZERO,
        });

        match recv(&rx) {
            Message::LogRefreshed { entries, .. } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].message, "hello");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_clear_logs_empties_buffer_and_reports() {
        let (runner, rx, buffer) = runner_with_channel();
        buffer.add_entry(LogEntry::new(LogLevel::Info, "test", "hello", "s"));

        runner.run(Command::ClearLogs);

        match recv(&rx) {
            Message::LogRefreshed { entries, .. } => assert!(entries.is_empty()),
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fetch_items_success() {
        let (runner, rx, _) = runner_with_channel();
        let runner = runner.with_fetch_command(vec![
            "echo".to_string(),
            r#"[{"number": 7, "title": "a bug", "state": "open"}]"#.to_string(),
        ]);

        runner.run(Command::FetchItems);

        match recv(&rx) {
            Message::ItemsLoaded(Ok(items)) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].number, 7);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_fetch_items_missing_program_becomes_message() {
        let (runner, rx, _) = runner_with_channel();
        let runner =
            runner.with_fetch_command(vec!["definitely-not-a-real-binary-9f2c".to_string()]);

        runner.run(Command::FetchItems);

        match recv(&rx) {
            Message::ItemsLoaded(Err(e)) => {
                assert!(matches!(e, FlightdeckError::CommandSpawn { .. }));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_fetch_items_bad_json_becomes_message() {
        let (runner, rx, _) = runner_with_channel();
        let runner =
            runner.with_fetch_command(vec!["echo".to_string(), "not json".to_string()]);

        runner.run(Command::FetchItems);

        match recv(&rx) {
            Message::ItemsLoaded(Err(e)) => {
                assert!(matches!(e, FlightdeckError::JsonParse { .. }));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_batch_runs_every_command() {
        let (runner, rx, _) = runner_with_channel();
        runner.run(Command::Batch(vec![
            Command::HeaderTick {
                interval: Duration::from_millis(1),
            },
            Command::HeaderTick {
                interval: Duration::from_millis(1),
            },
        ]));

        assert!(matches!(recv(&rx), Message::HeaderTick));
        assert!(matches!(recv(&rx), Message::HeaderTick));
    }

    #[test]
    fn test_batch_constructor_flattens() {
        assert_eq!(Command::batch(vec![]), None);
        assert_eq!(
            Command::batch(vec![Command::FetchItems]),
            Some(Command::FetchItems)
        );
        assert!(matches!(
            Command::batch(vec![Command::FetchItems, Command::ClearLogs]),
            Some(Command::Batch(_))
        ));
    }

    #[test]
    fn test_dropped_receiver_is_a_cancel_not_a_panic() {
        let (tx, rx) = mpsc::sync_channel(4);
        let buffer = Arc::new(LogBuffer::new(4));
        let runner = CommandRunner::new(tx, buffer);
        drop(rx);

        runner.run(Command::HeaderTick {
            interval: Duration::from_millis(1),
        });
        thread::sleep(Duration::from_millis(20));
    }
}
