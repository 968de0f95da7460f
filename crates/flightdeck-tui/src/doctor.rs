//! Environment diagnostics for the Doctor screen.
//!
//! Each check probes one external prerequisite (version control, issue
//! tracker CLI, terminal capabilities, log directory). Checks run as
//! commands on the runner's threads, one message per finished check; the
//! reducer aggregates results and flips the screen to "done" once every
//! check reported back.

use std::process::Command;

use flightdeck_core::logging::default_log_dir;
use flightdeck_core::platform;

/// Outcome of a single diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticStatus {
    Pass,
    Warn,
    Fail,
}

impl DiagnosticStatus {
    /// Display indicator for the doctor screen.
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Pass => "✓",
            Self::Warn => "!",
            Self::Fail => "✗",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

/// Result of one finished check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticResult {
    pub id: &'static str,
    pub name: &'static str,
    pub status: DiagnosticStatus,
    pub detail: String,
}

/// A diagnostic check definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticCheck {
    pub id: &'static str,
    pub name: &'static str,
    probe: Probe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Probe {
    /// Run `program args...` and expect a zero exit status.
    ToolVersion {
        program: &'static str,
        args: &'static [&'static str],
        /// Missing tool downgrades to a warning instead of a failure.
        optional: bool,
    },
    /// Probe terminal color and unicode capabilities.
    TerminalCaps,
    /// Verify the log directory exists or can be created.
    LogDirWritable,
}

/// The full check suite, in display order.
pub fn all_checks() -> Vec<DiagnosticCheck> {
    vec![
        DiagnosticCheck {
            id: "vcs",
            name: "Version control",
            probe: Probe::ToolVersion {
                program: "git",
                args: &["--version"],
                optional: false,
            },
        },
        DiagnosticCheck {
            id: "tracker",
            name: "Issue tracker CLI",
            probe: Probe::ToolVersion {
                program: "gh",
                args: &["--version"],
                optional: true,
            },
        },
        DiagnosticCheck {
            id: "tracker-auth",
            name: "Issue tracker auth",
            probe: Probe::ToolVersion {
                program: "gh",
                args: &["auth", "status"],
                optional: true,
            },
        },
        DiagnosticCheck {
            id: "terminal",
            name: "Terminal capabilities",
            probe: Probe::TerminalCaps,
        },
        DiagnosticCheck {
            id: "logdir",
            name: "Log directory",
            probe: Probe::LogDirWritable,
        },
    ]
}

impl DiagnosticCheck {
    /// Execute the probe. Never panics; every failure mode becomes a result.
    pub fn run(&self) -> DiagnosticResult {
        let (status, detail) = match &self.probe {
            Probe::ToolVersion {
                program,
                args,
                optional,
            } => run_tool_probe(program, args, *optional),
            Probe::TerminalCaps => terminal_probe(),
            Probe::LogDirWritable => log_dir_probe(),
        };

        DiagnosticResult {
            id: self.id,
            name: self.name,
            status,
            detail,
        }
    }
}

fn run_tool_probe(
    program: &str,
    args: &[&str],
    optional: bool,
) -> (DiagnosticStatus, String) {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            let first_line = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("ok")
                .trim()
                .to_string();
            (DiagnosticStatus::Pass, first_line)
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr)
                .lines()
                .next()
                .unwrap_or("non-zero exit")
                .trim()
                .to_string();
            let status = if optional {
                DiagnosticStatus::Warn
            } else {
                DiagnosticStatus::Fail
            };
            (status, stderr)
        }
        Err(_) => {
            let status = if optional {
                DiagnosticStatus::Warn
            } else {
                DiagnosticStatus::Fail
            };
            (status, format!("{program} not found on PATH"))
        }
    }
}

fn terminal_probe() -> (DiagnosticStatus, String) {
    let info = platform::terminal_info();
    let detail = format!(
        "{}x{}, color: {}, unicode: {}",
        info.width, info.height, info.supports_color, info.supports_unicode
    );
    if info.supports_color {
        (DiagnosticStatus::Pass, detail)
    } else {
        (DiagnosticStatus::Warn, detail)
    }
}

fn log_dir_probe() -> (DiagnosticStatus, String) {
    match default_log_dir() {
        Ok(dir) => match std::fs::create_dir_all(&dir) {
            Ok(()) => (DiagnosticStatus::Pass, dir.display().to_string()),
            Err(e) => (
                DiagnosticStatus::Fail,
                format!("{}: {e}", dir.display()),
            ),
        },
        Err(e) => (DiagnosticStatus::Fail, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_suite_shape() {
        let checks = all_checks();
        assert_eq!(checks.len(), 5);
        let ids: Vec<&str> = checks.iter().map(|c| c.id).collect();
        assert!(ids.contains(&"vcs"));
        assert!(ids.contains(&"terminal"));
        assert!(ids.contains(&"logdir"));
    }

    #[test]
    fn test_missing_tool_becomes_result_not_panic() {
        let (status, detail) = run_tool_probe("definitely-not-a-real-binary-9f2c", &[], false);
        assert_eq!(status, DiagnosticStatus::Fail);
        assert!(detail.contains("not found"));
    }

    #[test]
    fn test_missing_optional_tool_warns() {
        let (status, _) = run_tool_probe("definitely-not-a-real-binary-9f2c", &[], true);
        assert_eq!(status, DiagnosticStatus::Warn);
    }

    #[test]
    fn test_terminal_probe_reports_dimensions() {
        let (_, detail) = terminal_probe();
        assert!(detail.contains('x'));
        assert!(detail.contains("color"));
    }

    #[test]
    fn test_status_indicators() {
        assert_eq!(DiagnosticStatus::Pass.indicator(), "✓");
        assert_eq!(DiagnosticStatus::Fail.indicator(), "✗");
        assert_eq!(DiagnosticStatus::Warn.label(), "warn");
    }
}
