//! Dashboard runtime: terminal lifecycle, the input thread, and the reducer
//! loop.
//!
//! The reducer loop is the only writer of [`Model`]. Everything else talks
//! to it through the message channel: the input thread posts keys and
//! resizes, the [`CommandRunner`] posts command results, background workers
//! and external callers post progress updates and log entries. The loop is
//! the terminal authority on lifecycle; on exit it stops the header worker
//! and any live spinners.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{Clear, ClearType};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use flightdeck_core::error::{FlightdeckError, Result};
use flightdeck_core::logbuf::{DEFAULT_LOG_CAPACITY, LogBuffer, LogEntry};
use flightdeck_core::platform;
use flightdeck_core::types::{ProgressTracker, StepStatus};

use crate::command::CommandRunner;
use crate::header::{HeaderUpdateWorker, HeaderWorkerConfig, progress_header};
use crate::message::Message;
use crate::model::Model;
use crate::spinner::{SpinnerHandle, SpinnerWorker};
use crate::theme::Theme;
use crate::view;

/// How often the reducer loop wakes up to check for shutdown when no
/// messages arrive.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);
/// Input thread poll period; bounds its shutdown latency.
const INPUT_POLL: Duration = Duration::from_millis(100);
/// Bounded capacity of the reducer's inbound message queue.
const MESSAGE_QUEUE_CAPACITY: usize = 1024;

/// Configuration for a [`Dashboard`].
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub theme: Theme,
    pub animations: bool,
    pub log_capacity: usize,
    /// Override for the work-item fetch invocation.
    pub fetch_command: Option<Vec<String>>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            animations: true,
            log_capacity: DEFAULT_LOG_CAPACITY,
            fetch_command: None,
        }
    }
}

/// Owns the event loop, the shared log buffer, the progress tracker, and
/// the background workers.
pub struct Dashboard {
    options: DashboardOptions,
    tx: SyncSender<Message>,
    rx: Option<Receiver<Message>>,
    buffer: Arc<LogBuffer>,
    progress: Arc<Mutex<ProgressTracker>>,
    header: HeaderUpdateWorker,
    spinners: Mutex<Vec<Arc<SpinnerHandle>>>,
    input_shutdown: Arc<AtomicBool>,
}

impl Dashboard {
    pub fn new(options: DashboardOptions) -> Self {
        let (tx, rx) = mpsc::sync_channel(MESSAGE_QUEUE_CAPACITY);
        let buffer = Arc::new(LogBuffer::new(options.log_capacity));
        let progress = Arc::new(Mutex::new(ProgressTracker::default()));

        let unicode = platform::supports_unicode();
        let header_progress = Arc::clone(&progress);
        let header = HeaderUpdateWorker::with_stdout(HeaderWorkerConfig::default(), move || {
            let tracker = match header_progress.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            progress_header(&tracker, unicode)
        });

        Self {
            options,
            tx,
            rx: Some(rx),
            buffer,
            progress,
            header,
            spinners: Mutex::new(Vec::new()),
            input_shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The shared log buffer, for wiring into `init_logging`.
    pub fn log_buffer(&self) -> Arc<LogBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Append a log entry. Thread-safe; any caller, any time.
    pub fn send_log(&self, entry: LogEntry) {
        self.buffer.add_entry(entry);
    }

    /// Update a workflow step. The shared tracker (read by the console
    /// header worker) updates immediately; the TUI model sees the change on
    /// the next reducer pass.
    pub fn set_progress_step(&self, step_id: &str, status: StepStatus) {
        {
            let mut tracker = match self.progress.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            tracker.set_step(step_id, status);
        }
        self.post(Message::ProgressStep {
            step_id: step_id.to_string(),
            status,
        });
    }

    /// Signal that the whole workflow finished.
    pub fn complete_progress(&self) {
        self.post(Message::ProgressComplete);
    }

    /// Request the interactive session to end.
    pub fn quit(&self) {
        self.post(Message::Quit);
    }

    /// Non-blocking post into the bounded queue. With no reducer draining
    /// it (console mode) a full queue drops the message rather than
    /// blocking the caller; the shared tracker already holds the state.
    fn post(&self, message: Message) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                debug!(kind = message.kind(), "message queue full, dropping")
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Start a loading spinner for a blocking console operation. Returns a
    /// no-op handle when animations are disabled.
    pub fn spinner(&self, label: &str) -> Arc<SpinnerHandle> {
        let handle = if self.options.animations {
            Arc::new(SpinnerWorker::start(label.to_string()))
        } else {
            Arc::new(SpinnerHandle::noop())
        };
        match self.spinners.lock() {
            Ok(mut guard) => guard.push(Arc::clone(&handle)),
            Err(poisoned) => poisoned.into_inner().push(Arc::clone(&handle)),
        }
        handle
    }

    /// Run the interactive session. Blocks the calling thread until the
    /// user quits. Owns the terminal for the duration.
    pub fn run(&mut self) -> Result<()> {
        let rx = self.rx.take().ok_or_else(|| {
            FlightdeckError::internal("interactive session already consumed")
        })?;

        crossterm::terminal::enable_raw_mode().map_err(|e| FlightdeckError::TerminalInit {
            message: e.to_string(),
        })?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen).map_err(|e| {
            FlightdeckError::TerminalInit {
                message: e.to_string(),
            }
        })?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|e| FlightdeckError::TerminalInit {
            message: e.to_string(),
        })?;

        // Input thread: posts keys and resizes, exits on the shutdown flag.
        let input_tx = self.tx.clone();
        let input_flag = Arc::clone(&self.input_shutdown);
        let input_thread = thread::spawn(move || input_loop(input_tx, input_flag));

        let runner = match &self.options.fetch_command {
            Some(cmd) => CommandRunner::new(self.tx.clone(), Arc::clone(&self.buffer))
                .with_fetch_command(cmd.clone()),
            None => CommandRunner::new(self.tx.clone(), Arc::clone(&self.buffer)),
        };

        let info = platform::terminal_info();
        let (model, startup) = Model::init(self.options.theme.clone(), info.width, info.height);
        runner.run(startup);

        info!("interactive session started");
        let result = reducer_loop(&mut terminal, model, &rx, &runner);

        // The loop is the terminal authority on lifecycle: stop workers
        // before giving the terminal back.
        self.shutdown();
        let _ = input_thread.join();

        restore_terminal(&mut terminal)?;
        info!("interactive session ended");
        result
    }

    /// Console-mode progress display: clear the screen, print the header
    /// once, then keep it fresh from the background worker.
    pub fn run_progress_console(&self) -> Result<()> {
        use std::io::Write;

        let unicode = platform::supports_unicode();
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, Clear(ClearType::All), crossterm::cursor::MoveTo(0, 0))
            .map_err(|e| FlightdeckError::render("clear screen", e))?;

        let content = {
            let tracker = match self.progress.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            progress_header(&tracker, unicode)
        };
        stdout
            .write_all(content.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| FlightdeckError::render("print header", e))?;

        if self.options.animations {
            self.header.start();
        }
        Ok(())
    }

    /// Stop the header worker and any live spinners. Idempotent.
    pub fn shutdown(&self) {
        self.input_shutdown.store(true, Ordering::SeqCst);
        self.header.stop();
        let spinners = match self.spinners.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for spinner in spinners {
            spinner.stop();
        }
        debug!("dashboard shut down");
    }
}

/// The single-threaded reducer loop. Owns the model; applies messages in
/// arrival order, hands returned commands to the runner, and redraws after
/// each processed batch.
fn reducer_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut model: Model,
    rx: &Receiver<Message>,
    runner: &CommandRunner,
) -> Result<()> {
    draw_frame(terminal, &model);

    while !model.should_quit {
        let first = match rx.recv_timeout(RECV_TIMEOUT) {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        model = apply(model, first, runner);

        // Drain whatever already queued up so one redraw covers the batch.
        while !model.should_quit {
            match rx.try_recv() {
                Ok(message) => model = apply(model, message, runner),
                Err(_) => break,
            }
        }

        draw_frame(terminal, &model);
    }

    Ok(())
}

fn apply(model: Model, message: Message, runner: &CommandRunner) -> Model {
    let (next, command) = model.update(message);
    if let Some(command) = command {
        runner.run(command);
    }
    next
}

/// Draw one frame. Render failures are transient: logged and skipped, the
/// next message redraws.
fn draw_frame(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, model: &Model) {
    if let Err(e) = terminal.draw(|frame| view::draw(model, frame)) {
        warn!(error = %e, "frame render failed");
    }
}

/// Blocking input loop with a bounded poll so shutdown never hangs on a
/// pending read.
fn input_loop(tx: SyncSender<Message>, shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::SeqCst) {
        match event::poll(INPUT_POLL) {
            Ok(false) => continue,
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if tx.send(Message::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(Event::Resize(width, height)) => {
                    if tx.send(Message::Resize(width, height)).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "input read failed");
                    break;
                }
            },
            Err(e) => {
                warn!(error = %e, "input poll failed");
                break;
            }
        }
    }
}

/// Restore the terminal to its normal state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode().map_err(|e| FlightdeckError::TerminalRestore {
        message: e.to_string(),
    })?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )
    .map_err(|e| FlightdeckError::TerminalRestore {
        message: e.to_string(),
    })?;
    terminal.show_cursor().map_err(|e| FlightdeckError::TerminalRestore {
        message: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightdeck_core::logbuf::LogLevel;

    fn dashboard() -> Dashboard {
        Dashboard::new(DashboardOptions {
            animations: false,
            ..DashboardOptions::default()
        })
    }

    #[test]
    fn test_send_log_is_thread_safe() {
        let dash = Arc::new(dashboard());
        let mut handles = Vec::new();
        for i in 0..4 {
            let dash = Arc::clone(&dash);
            handles.push(thread::spawn(move || {
                for j in 0..50 {
                    dash.send_log(LogEntry::new(
                        LogLevel::Info,
                        "test",
                        format!("{i}-{j}"),
                        "s",
                    ));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(dash.log_buffer().len(), 200);
    }

    #[test]
    fn test_set_progress_step_updates_tracker_and_posts_message() {
        let mut dash = dashboard();
        let rx = dash.rx.take().unwrap();

        dash.set_progress_step("setup", StepStatus::InProgress);

        let tracker = dash.progress.lock().unwrap();
        assert_eq!(tracker.steps[0].status, StepStatus::InProgress);
        drop(tracker);

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            Message::ProgressStep { step_id, status } => {
                assert_eq!(step_id, "setup");
                assert_eq!(status, StepStatus::InProgress);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_complete_and_quit_post_messages() {
        let mut dash = dashboard();
        let rx = dash.rx.take().unwrap();

        dash.complete_progress();
        dash.quit();

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            Message::ProgressComplete
        ));
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            Message::Quit
        ));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let dash = dashboard();
        let spinner = dash.spinner("op");
        dash.shutdown();
        dash.shutdown();
        spinner.stop();
        assert!(!dash.header.is_running());
    }

    #[test]
    fn test_spinner_disabled_without_animations() {
        let dash = dashboard();
        let handle = dash.spinner("op");
        handle.stop();
    }
}
