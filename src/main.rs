//! Flightdeck - interactive terminal dashboard for multi-step workflow runs.
//!
//! ## Usage
//!
//! ```bash
//! # Start the interactive dashboard
//! flightdeck
//!
//! # With verbose logging
//! flightdeck -v
//!
//! # Console-friendly progress output (also auto-detected in CI)
//! flightdeck --console
//!
//! # Pick a theme
//! flightdeck --theme dark
//! ```

use std::io::Write;
use std::panic;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use flightdeck_core::logbuf::DEFAULT_LOG_CAPACITY;
use flightdeck_core::{logging, platform};
use flightdeck_tui::{Dashboard, DashboardOptions, load_theme};

/// Flightdeck workflow dashboard
///
/// A terminal dashboard that drives multi-step workflow runs: pick work
/// items, watch progress and live logs, and check your environment.
#[derive(Parser, Debug)]
#[command(name = "flightdeck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.flightdeck/logs/)
    #[arg(long)]
    log_dir: Option<std::path::PathBuf>,

    /// Force console mode instead of the full-screen TUI
    #[arg(long)]
    console: bool,

    /// Color theme: default, dark, light, minimal
    #[arg(long)]
    theme: Option<String>,

    /// Number of log entries retained in the live log panel
    #[arg(long, default_value_t = DEFAULT_LOG_CAPACITY)]
    log_capacity: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let console_mode = cli.console || platform::is_console_mode();

    let options = DashboardOptions {
        theme: load_theme(cli.theme.as_deref()),
        animations: !console_mode || platform::supports_unicode(),
        log_capacity: cli.log_capacity,
        fetch_command: None,
    };
    let mut dashboard = Dashboard::new(options);

    // Stderr logging would tear the alternate screen, so it stays on only
    // in console mode; the TUI shows logs in its own panel via the buffer.
    let _guard = match logging::init_logging(
        cli.log_dir.clone(),
        cli.verbose > 0,
        console_mode,
        Some(dashboard.log_buffer()),
    ) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::from(1);
        }
    };

    install_panic_hook();

    info!(console_mode, "starting flightdeck");

    let result = if console_mode {
        dashboard.run_progress_console()
    } else {
        dashboard.run()
    };
    dashboard.shutdown();

    match result {
        Ok(()) => {
            info!("flightdeck exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("flightdeck error: {e}");
            eprintln!("Error: {e}");
            if let Some(hint) = e.guidance() {
                eprintln!("Hint: {hint}");
            }
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message, so a crash in raw mode doesn't leave the shell unusable.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore the terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();
    crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::execute!(stdout, crossterm::cursor::Show)?;
    stdout.flush()?;

    Ok(())
}
