//! Terminal capability probing and console-mode detection.
//!
//! Collaborator boundary for the UI: the dashboard asks once at startup for
//! the terminal's dimensions and capabilities and for whether the process
//! should run in console mode (CI pipelines, non-interactive shells).

use std::env;
use std::io::IsTerminal;
use std::time::Duration;

/// Terminal dimensions and capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalInfo {
    pub width: u16,
    pub height: u16,
    pub supports_color: bool,
    pub supports_unicode: bool,
}

impl TerminalInfo {
    /// Conservative fallback used when the terminal cannot be queried.
    pub const FALLBACK: TerminalInfo = TerminalInfo {
        width: 80,
        height: 24,
        supports_color: false,
        supports_unicode: false,
    };
}

/// Platform-dependent refresh interval for the header worker. Windows
/// terminals historically repaint slower than Unix ones.
pub fn default_refresh_interval() -> Duration {
    if cfg!(windows) {
        Duration::from_millis(500)
    } else {
        Duration::from_millis(250)
    }
}

/// Probe the current terminal.
pub fn terminal_info() -> TerminalInfo {
    let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
    TerminalInfo {
        width,
        height,
        supports_color: supports_color(),
        supports_unicode: supports_unicode(),
    }
}

/// Whether the terminal advertises color support. `NO_COLOR` always wins.
pub fn supports_color() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    match env::var("TERM") {
        Ok(term) if term == "dumb" => false,
        Ok(_) => true,
        Err(_) => env::var_os("COLORTERM").is_some(),
    }
}

/// Whether the locale advertises UTF-8 output.
pub fn supports_unicode() -> bool {
    for key in ["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Ok(value) = env::var(key) {
            if !value.is_empty() {
                let upper = value.to_uppercase();
                return upper.contains("UTF-8") || upper.contains("UTF8");
            }
        }
    }
    false
}

/// Whether the process should skip the full-screen TUI and run in
/// console-friendly mode. True under common CI environments, when stdout is
/// not a terminal, or when forced via `FLIGHTDECK_CONSOLE=true`.
pub fn is_console_mode() -> bool {
    if env_flag("FLIGHTDECK_CONSOLE") {
        return true;
    }
    if env_flag("CI") || env_flag("GITHUB_ACTIONS") || env_flag("GITLAB_CI") {
        return true;
    }
    if env::var_os("JENKINS_URL").is_some() {
        return true;
    }
    !std::io::stdout().is_terminal()
}

fn env_flag(key: &str) -> bool {
    matches!(env::var(key).as_deref(), Ok("true") | Ok("1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_dimensions() {
        assert_eq!(TerminalInfo::FALLBACK.width, 80);
        assert_eq!(TerminalInfo::FALLBACK.height, 24);
    }

    #[test]
    fn test_env_flag_matching() {
        // SAFETY: test-local variable name, not read anywhere else.
        unsafe { env::set_var("FLIGHTDECK_TEST_FLAG", "true") };
        assert!(env_flag("FLIGHTDECK_TEST_FLAG"));
        unsafe { env::set_var("FLIGHTDECK_TEST_FLAG", "false") };
        assert!(!env_flag("FLIGHTDECK_TEST_FLAG"));
        unsafe { env::remove_var("FLIGHTDECK_TEST_FLAG") };
        assert!(!env_flag("FLIGHTDECK_TEST_FLAG"));
    }

    #[test]
    fn test_default_refresh_interval_bounds() {
        let interval = default_refresh_interval();
        assert!(interval >= Duration::from_millis(250));
        assert!(interval <= Duration::from_millis(500));
    }
}
