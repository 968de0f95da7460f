//! Screen types and navigation for the Flightdeck TUI.
//!
//! Screens represent the distinct top-level states of the dashboard. All
//! transitions are driven through the reducer: key messages in the main menu
//! select a screen, sub-screens return via an explicit back-to-menu message,
//! and progress tracking moves to the completed screen on a
//! progress-complete message.

use std::fmt;

/// Top-level screens of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Entry menu listing the available workflows
    #[default]
    MainMenu,
    /// Work-item selection list
    ItemSelection,
    /// Live workflow progress tracking
    ProgressTracking,
    /// Full-screen live log viewer
    LogViewer,
    /// Environment diagnostics
    DoctorCheck,
    /// Terminal state after the workflow finished
    Completed,
}

impl Screen {
    /// Returns the display title for this screen.
    pub fn title(&self) -> &'static str {
        match self {
            Screen::MainMenu => "Main Menu",
            Screen::ItemSelection => "Item Selection",
            Screen::ProgressTracking => "Workflow Progress",
            Screen::LogViewer => "Live Logs",
            Screen::DoctorCheck => "Doctor",
            Screen::Completed => "Complete",
        }
    }

    /// Short name for the status bar.
    pub fn short_name(&self) -> &'static str {
        match self {
            Screen::MainMenu => "Menu",
            Screen::ItemSelection => "Items",
            Screen::ProgressTracking => "Progress",
            Screen::LogViewer => "Logs",
            Screen::DoctorCheck => "Doctor",
            Screen::Completed => "Done",
        }
    }

    /// Returns true if the side log panel may be composed next to this
    /// screen. The full-screen log viewer already shows the logs.
    pub fn allows_log_panel(&self) -> bool {
        !matches!(self, Screen::LogViewer)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_screen() {
        assert_eq!(Screen::default(), Screen::MainMenu);
    }

    #[test]
    fn test_titles() {
        assert_eq!(Screen::MainMenu.title(), "Main Menu");
        assert_eq!(Screen::ProgressTracking.title(), "Workflow Progress");
        assert_eq!(Screen::DoctorCheck.title(), "Doctor");
    }

    #[test]
    fn test_log_panel_composition() {
        assert!(Screen::MainMenu.allows_log_panel());
        assert!(Screen::ProgressTracking.allows_log_panel());
        assert!(!Screen::LogViewer.allows_log_panel());
    }
}
