//! Background header refresh for console mode.
//!
//! The worker regenerates the progress header on an adaptive timer and
//! repaints it in place only when the content changed enough to warrant a
//! redraw. The repaint saves the cursor, writes the header at the top of the
//! screen, and restores the cursor, so output scrolling below the header is
//! never disturbed.
//!
//! Lifecycle: `Stopped -> Running -> Stopped`. `start` is idempotent while
//! running; `stop` is a best-effort cooperative shutdown with bounded signal
//! retries and a bounded poll of the running flag. A forgotten `stop` is
//! covered by an absolute lifetime ceiling inside the tick loop.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{RecvTimeoutError, SyncSender, TrySendError, sync_channel};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::cursor;
use tracing::{debug, warn};

use flightdeck_core::perf::{AdaptiveInterval, ChangeDetector};
use flightdeck_core::types::ProgressTracker;

/// Stop-signal send attempts before falling back to the flag poll.
const STOP_ATTEMPTS: usize = 3;
/// Per-attempt wait for the stop signal to be accepted.
const STOP_ATTEMPT_WAIT: Duration = Duration::from_millis(50);
/// Polls of the running flag after signalling.
const STOP_POLLS: usize = 10;
const STOP_POLL_WAIT: Duration = Duration::from_millis(10);

/// Produces the current header content.
pub type ContentFn = Arc<dyn Fn() -> String + Send + Sync>;
/// Paints the header. Stdout in production, a probe in tests.
pub type RenderFn = Arc<dyn Fn(&str) -> io::Result<()> + Send + Sync>;

/// Configuration for the header refresh worker.
#[derive(Debug, Clone)]
pub struct HeaderWorkerConfig {
    /// Initial tick interval.
    pub interval: Duration,
    /// Whether the interval adapts to change frequency and render cost.
    pub adaptive: bool,
    /// Minimum change magnitude that triggers a repaint.
    pub change_threshold: f64,
    /// Adaptive interval floor.
    pub min_interval: Duration,
    /// Adaptive interval ceiling.
    pub max_interval: Duration,
    /// Absolute lifetime ceiling; a missed stop cannot leak the thread.
    pub max_lifetime: Duration,
    /// Period between debug statistics emissions.
    pub stats_interval: Duration,
}

impl Default for HeaderWorkerConfig {
    fn default() -> Self {
        Self {
            interval: flightdeck_core::platform::default_refresh_interval(),
            adaptive: true,
            change_threshold: 0.1,
            min_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(1),
            max_lifetime: Duration::from_secs(300),
            stats_interval: Duration::from_secs(10),
        }
    }
}

/// Lifecycle fields shared between the owner and the worker thread.
#[derive(Default)]
struct Lifecycle {
    running: bool,
    stop_tx: Option<SyncSender<()>>,
}

/// Background task that keeps the console progress header fresh.
pub struct HeaderUpdateWorker {
    config: HeaderWorkerConfig,
    content: ContentFn,
    render: RenderFn,
    lifecycle: Arc<Mutex<Lifecycle>>,
    render_count: Arc<AtomicU64>,
}

impl HeaderUpdateWorker {
    /// Create a worker with an explicit render sink.
    pub fn new(
        config: HeaderWorkerConfig,
        content: impl Fn() -> String + Send + Sync + 'static,
        render: impl Fn(&str) -> io::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            content: Arc::new(content),
            render: Arc::new(render),
            lifecycle: Arc::new(Mutex::new(Lifecycle::default())),
            render_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a worker that paints to stdout with a save/home/restore cursor
    /// sequence.
    pub fn with_stdout(config: HeaderWorkerConfig, content: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::new(config, content, render_in_place)
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        match self.lifecycle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Whether the tick loop is currently running.
    pub fn is_running(&self) -> bool {
        self.lock_lifecycle().running
    }

    /// Total repaints performed since construction.
    pub fn render_count(&self) -> u64 {
        self.render_count.load(Ordering::Relaxed)
    }

    /// Spawn the tick loop. Returns false without spawning when the worker
    /// is already running; a double start never produces two loops.
    pub fn start(&self) -> bool {
        let mut lifecycle = self.lock_lifecycle();
        if lifecycle.running {
            return false;
        }

        let (stop_tx, stop_rx) = sync_channel::<()>(1);
        lifecycle.running = true;
        lifecycle.stop_tx = Some(stop_tx);
        drop(lifecycle);

        let config = self.config.clone();
        let content = Arc::clone(&self.content);
        let render = Arc::clone(&self.render);
        let lifecycle = Arc::clone(&self.lifecycle);
        let render_count = Arc::clone(&self.render_count);

        thread::spawn(move || {
            let mut detector = ChangeDetector::new();
            let mut adaptive = AdaptiveInterval::new(config.min_interval, config.max_interval);
            let mut interval = config.interval;
            let deadline = Instant::now() + config.max_lifetime;
            let mut last_stats = Instant::now();

            loop {
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                if Instant::now() >= deadline {
                    debug!("header worker hit lifetime ceiling, exiting");
                    break;
                }

                let current = (content)();
                let change = detector.observe(&current);

                let render_cost = if change.changed && change.magnitude >= config.change_threshold
                {
                    let started = Instant::now();
                    match (render)(&current) {
                        Ok(()) => {
                            detector.mark_rendered(&current);
                            render_count.fetch_add(1, Ordering::Relaxed);
                            started.elapsed()
                        }
                        Err(e) => {
                            // Transient terminal write failure; retried on
                            // the next changed tick.
                            warn!(error = %e, "header render failed");
                            Duration::ZERO
                        }
                    }
                } else {
                    Duration::ZERO
                };

                if config.adaptive {
                    interval = adaptive.next_interval(render_cost, detector.change_frequency());
                }

                if last_stats.elapsed() >= config.stats_interval {
                    debug!(
                        renders = render_count.load(Ordering::Relaxed),
                        interval_ms = interval.as_millis() as u64,
                        change_freq = detector.change_frequency(),
                        "header refresh stats"
                    );
                    last_stats = Instant::now();
                }
            }

            let mut lifecycle = match lifecycle.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            lifecycle.running = false;
        });

        true
    }

    /// Signal the tick loop to exit. No-op when not running. Best-effort:
    /// retries the signal with a bounded per-attempt wait, then polls the
    /// running flag with a bounded total wait. Does not guarantee the thread
    /// has exited when this returns.
    pub fn stop(&self) {
        let stop_tx = {
            let lifecycle = self.lock_lifecycle();
            if !lifecycle.running {
                return;
            }
            lifecycle.stop_tx.clone()
        };

        if let Some(tx) = stop_tx {
            for attempt in 1..=STOP_ATTEMPTS {
                match tx.try_send(()) {
                    Ok(()) | Err(TrySendError::Disconnected(())) => break,
                    Err(TrySendError::Full(())) => {
                        debug!(attempt, "stop signal not yet observed, retrying");
                        thread::sleep(STOP_ATTEMPT_WAIT);
                    }
                }
            }
        }

        for _ in 0..STOP_POLLS {
            if !self.is_running() {
                return;
            }
            thread::sleep(STOP_POLL_WAIT);
        }
        debug!("header worker still draining after stop; lifetime ceiling will reap it");
    }
}

/// Paint the header at the top of the screen without disturbing the cursor:
/// save position, home, write, restore.
fn render_in_place(content: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, cursor::SavePosition, cursor::MoveTo(0, 0))?;
    stdout.write_all(content.as_bytes())?;
    crossterm::execute!(stdout, cursor::RestorePosition)?;
    stdout.flush()
}

/// Inner width of the boxed header.
const HEADER_WIDTH: usize = 62;

/// Generate the boxed progress header for console mode.
pub fn progress_header(tracker: &ProgressTracker, unicode: bool) -> String {
    let (top, bottom, side) = if unicode {
        ("┌─ Workflow Progress ", "└", "│")
    } else {
        ("+- Workflow Progress ", "+", "|")
    };
    let horizontal = if unicode { '─' } else { '-' };

    let mut out = String::new();
    out.push_str(top);
    for _ in top.chars().count()..HEADER_WIDTH + 2 {
        out.push(horizontal);
    }
    out.push_str(if unicode { "┐\n" } else { "+\n" });

    let total = tracker.steps.len();
    for (i, step) in tracker.steps.iter().enumerate() {
        let icon = if unicode {
            step.status.indicator()
        } else {
            match step.status {
                flightdeck_core::types::StepStatus::Pending => "-",
                flightdeck_core::types::StepStatus::InProgress => ">",
                flightdeck_core::types::StepStatus::Completed => "+",
                flightdeck_core::types::StepStatus::Failed => "x",
            }
        };
        let line = format!("{}/{} {} {:<24} {}", i + 1, total, icon, step.name, step.description);
        out.push_str(&pad_row(side, &line, unicode));
    }

    let elapsed = tracker.elapsed();
    let line = format!("Elapsed: {}s", elapsed.num_seconds().max(0));
    out.push_str(&pad_row(side, &line, unicode));

    out.push_str(bottom);
    for _ in 0..HEADER_WIDTH + 1 {
        out.push(horizontal);
    }
    out.push_str(if unicode { "┘\n" } else { "+\n" });
    out
}

fn pad_row(side: &str, line: &str, unicode: bool) -> String {
    let width = line.chars().count();
    let truncated: String = if width > HEADER_WIDTH - 1 {
        line.chars().take(HEADER_WIDTH - 1).collect()
    } else {
        line.to_string()
    };
    let padding = HEADER_WIDTH - 1 - truncated.chars().count();
    let right = if unicode { "│" } else { "|" };
    format!("{side} {truncated}{} {right}\n", " ".repeat(padding))
}
