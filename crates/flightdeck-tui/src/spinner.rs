//! Loading spinner for blocking console operations.
//!
//! A background thread repeatedly overwrites one terminal line with the next
//! animation frame until stopped. The stop handle is idempotent and
//! non-blocking; whichever way the thread exits (signal, flag, or channel
//! disconnect) it clears its line exactly once before returning.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{RecvTimeoutError, SyncSender, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::trace;

/// Animation frames.
const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
/// Frame period.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);
/// Width of the line-clearing blank run.
const CLEAR_WIDTH: usize = 50;

/// Handle returned by [`SpinnerWorker::start`]; flips the running flag and
/// signals the thread. Safe to invoke any number of times.
pub struct SpinnerHandle {
    running: Option<Arc<Mutex<bool>>>,
    stop_tx: Option<SyncSender<()>>,
    stopped: AtomicBool,
}

impl SpinnerHandle {
    /// A handle that does nothing; used when animations are disabled.
    pub fn noop() -> Self {
        Self {
            running: None,
            stop_tx: None,
            stopped: AtomicBool::new(true),
        }
    }

    /// Stop the spinner. Idempotent, bounded, non-blocking: flips the flag,
    /// offers the stop signal once, and returns without waiting for the
    /// thread (which clears its own line on the way out).
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(running) = &self.running {
            let mut flag = match running.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *flag = false;
        }
        if let Some(tx) = &self.stop_tx {
            // Best effort; the thread also watches the flag.
            let _ = tx.try_send(());
        }
    }
}

/// Spawns spinner threads.
pub struct SpinnerWorker;

impl SpinnerWorker {
    /// Start a spinner on stdout.
    pub fn start(label: impl Into<String>) -> SpinnerHandle {
        Self::start_with_sink(label, io::stdout())
    }

    /// Start a spinner writing to an arbitrary sink (tests use a shared
    /// buffer).
    pub fn start_with_sink(label: impl Into<String>, sink: impl Write + Send + 'static) -> SpinnerHandle {
        let label = label.into();
        let running = Arc::new(Mutex::new(true));
        let (stop_tx, stop_rx) = sync_channel::<()>(1);

        let flag = Arc::clone(&running);
        thread::spawn(move || {
            let mut sink = sink;
            let mut index = 0usize;
            trace!(label = %label, "spinner started");

            loop {
                match stop_rx.recv_timeout(FRAME_INTERVAL) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                let still_running = match flag.lock() {
                    Ok(guard) => *guard,
                    Err(poisoned) => *poisoned.into_inner(),
                };
                if !still_running {
                    break;
                }

                let frame = FRAMES[index % FRAMES.len()];
                if write!(sink, "\r{frame} {label}          ").and_then(|()| sink.flush()).is_err() {
                    break;
                }
                index += 1;
            }

            // Always leave the line clean, whichever path ended the loop.
            let _ = write!(sink, "\r{}\r", " ".repeat(CLEAR_WIDTH));
            let _ = sink.flush();
            trace!(label = %label, "spinner stopped");
        });

        SpinnerHandle {
            running: Some(running),
            stop_tx: Some(stop_tx),
            stopped: AtomicBool::new(false),
        }
    }
}
