//! Keyboard input mapping for the Flightdeck TUI.
//!
//! Raw key events arrive at the reducer as [`Message::Key`]; the reducer
//! asks [`map_key`] for the semantic action given the current screen. The
//! mapping is a pure function so every combination is table-testable.
//!
//! [`Message::Key`]: crate::message::Message::Key

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use flightdeck_core::logbuf::LogLevel;

use crate::screen::Screen;

/// Semantic key actions interpreted by the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Return to the main menu
    Back,
    /// Select / confirm the current item
    Select,
    /// Move up in a list
    NavigateUp,
    /// Move down in a list
    NavigateDown,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Jump to the top
    GoToTop,
    /// Jump to the bottom
    GoToBottom,
    /// Toggle the side log panel
    ToggleLogPanel,
    /// Switch to / away from the full-screen log viewer
    ToggleLogViewer,
    /// Toggle selection of the highlighted work item
    ToggleSelect,
    /// Cycle the work-item sort order
    CycleSort,
    /// Start the workflow with the current selection
    StartWorkflow,
    /// Clear the log buffer
    ClearLogs,
    /// Toggle log auto-scroll
    ToggleAutoScroll,
    /// Toggle visibility of one log level
    ToggleLevel(LogLevel),
    /// Re-run the current screen's data (doctor re-check)
    Refresh,
    /// No action for this key
    None,
}

/// Map a key event to its action for the given screen.
pub fn map_key(screen: Screen, key: KeyEvent) -> KeyAction {
    // Global bindings first; Ctrl+C always force quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => KeyAction::ForceQuit,
            KeyCode::Char('l') => KeyAction::ToggleLogViewer,
            KeyCode::Char('s') if screen == Screen::ItemSelection => KeyAction::StartWorkflow,
            _ => KeyAction::None,
        };
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => return KeyAction::Quit,
        KeyCode::Tab => return KeyAction::ToggleLogPanel,
        KeyCode::Esc => return KeyAction::Back,
        _ => {}
    }

    match screen {
        Screen::LogViewer => map_log_viewer_key(key),
        Screen::ItemSelection => map_selection_key(key),
        Screen::DoctorCheck => match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Refresh,
            _ => map_list_key(key),
        },
        Screen::Completed => match key.code {
            KeyCode::Enter => KeyAction::Back,
            _ => KeyAction::None,
        },
        Screen::MainMenu | Screen::ProgressTracking => map_list_key(key),
    }
}

/// Shared list navigation: arrows plus vi keys.
fn map_list_key(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => KeyAction::NavigateUp,
        KeyCode::Down | KeyCode::Char('j') => KeyAction::NavigateDown,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        KeyCode::Home => KeyAction::GoToTop,
        KeyCode::End => KeyAction::GoToBottom,
        KeyCode::Enter | KeyCode::Char(' ') => KeyAction::Select,
        _ => KeyAction::None,
    }
}

fn map_selection_key(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => KeyAction::ToggleSelect,
        KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::CycleSort,
        _ => map_list_key(key),
    }
}

fn map_log_viewer_key(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('a') => KeyAction::ToggleAutoScroll,
        KeyCode::Char('c') => KeyAction::ClearLogs,
        KeyCode::Char('d') => KeyAction::ToggleLevel(LogLevel::Debug),
        KeyCode::Char('i') => KeyAction::ToggleLevel(LogLevel::Info),
        KeyCode::Char('w') => KeyAction::ToggleLevel(LogLevel::Warn),
        KeyCode::Char('e') => KeyAction::ToggleLevel(LogLevel::Error),
        _ => map_list_key(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    #[test]
    fn test_ctrl_c_force_quits_everywhere() {
        for screen in [
            Screen::MainMenu,
            Screen::ItemSelection,
            Screen::ProgressTracking,
            Screen::LogViewer,
            Screen::DoctorCheck,
            Screen::Completed,
        ] {
            assert_eq!(
                map_key(screen, ctrl(KeyCode::Char('c'))),
                KeyAction::ForceQuit,
                "Ctrl+C must force quit on {screen:?}"
            );
        }
    }

    #[test]
    fn test_quit_and_log_toggles_are_global() {
        assert_eq!(map_key(Screen::MainMenu, key(KeyCode::Char('q'))), KeyAction::Quit);
        assert_eq!(
            map_key(Screen::ProgressTracking, ctrl(KeyCode::Char('l'))),
            KeyAction::ToggleLogViewer
        );
        assert_eq!(map_key(Screen::DoctorCheck, key(KeyCode::Tab)), KeyAction::ToggleLogPanel);
    }

    #[test]
    fn test_menu_navigation() {
        assert_eq!(map_key(Screen::MainMenu, key(KeyCode::Up)), KeyAction::NavigateUp);
        assert_eq!(map_key(Screen::MainMenu, key(KeyCode::Char('k'))), KeyAction::NavigateUp);
        assert_eq!(map_key(Screen::MainMenu, key(KeyCode::Down)), KeyAction::NavigateDown);
        assert_eq!(map_key(Screen::MainMenu, key(KeyCode::Char('j'))), KeyAction::NavigateDown);
        assert_eq!(map_key(Screen::MainMenu, key(KeyCode::Enter)), KeyAction::Select);
    }

    #[test]
    fn test_selection_screen_keys() {
        assert_eq!(
            map_key(Screen::ItemSelection, key(KeyCode::Char(' '))),
            KeyAction::ToggleSelect
        );
        assert_eq!(
            map_key(Screen::ItemSelection, key(KeyCode::Char('s'))),
            KeyAction::CycleSort
        );
        assert_eq!(
            map_key(Screen::ItemSelection, ctrl(KeyCode::Char('s'))),
            KeyAction::StartWorkflow
        );
        assert_eq!(map_key(Screen::ItemSelection, key(KeyCode::Esc)), KeyAction::Back);
    }

    #[test]
    fn test_log_viewer_keys() {
        assert_eq!(map_key(Screen::LogViewer, key(KeyCode::Char('a'))), KeyAction::ToggleAutoScroll);
        assert_eq!(map_key(Screen::LogViewer, key(KeyCode::Char('c'))), KeyAction::ClearLogs);
        assert_eq!(
            map_key(Screen::LogViewer, key(KeyCode::Char('d'))),
            KeyAction::ToggleLevel(LogLevel::Debug)
        );
        assert_eq!(
            map_key(Screen::LogViewer, key(KeyCode::Char('e'))),
            KeyAction::ToggleLevel(LogLevel::Error)
        );
        assert_eq!(map_key(Screen::LogViewer, key(KeyCode::End)), KeyAction::GoToBottom);
    }

    #[test]
    fn test_doctor_refresh() {
        assert_eq!(map_key(Screen::DoctorCheck, key(KeyCode::Char('r'))), KeyAction::Refresh);
    }

    #[test]
    fn test_completed_screen_returns_to_menu() {
        assert_eq!(map_key(Screen::Completed, key(KeyCode::Enter)), KeyAction::Back);
        assert_eq!(map_key(Screen::Completed, key(KeyCode::Char('x'))), KeyAction::None);
    }

    #[test]
    fn test_unmapped_key_is_none() {
        assert_eq!(map_key(Screen::MainMenu, key(KeyCode::Char('z'))), KeyAction::None);
    }
}
