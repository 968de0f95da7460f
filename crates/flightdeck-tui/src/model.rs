//! Application model and the reducer.
//!
//! [`Model`] is the single source of truth for UI state, owned exclusively
//! by the event-loop thread. [`Model::update`] is a pure function: it
//! consumes the model and a [`Message`] and returns the next model plus an
//! optional [`Command`]. All I/O happens in commands; the reducer never
//! blocks, spawns, or touches shared state.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use flightdeck_core::logbuf::{LogEntry, LogLevel};
use flightdeck_core::types::{ProgressTracker, WorkItem};

use crate::command::Command;
use crate::doctor::{self, DiagnosticResult};
use crate::input::{KeyAction, map_key};
use crate::message::Message;
use crate::screen::Screen;
use crate::theme::Theme;

/// Header tick period while progress tracking is active.
const HEADER_TICK_ACTIVE: Duration = Duration::from_millis(250);
/// Header tick period on other screens.
const HEADER_TICK_IDLE: Duration = Duration::from_secs(1);
/// Delay between log panel refreshes.
const LOG_REFRESH_DELAY: Duration = Duration::from_millis(500);

/// Log refresh lookback window.
fn log_lookback() -> chrono::Duration {
    chrono::Duration::seconds(30)
}
/// Share of the screen width given to the side log panel.
pub const LOG_PANEL_PERCENT: u16 = 40;

/// Entries of the main menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    SelectItems,
    StartWorkflow,
    ViewLogs,
    Doctor,
    Exit,
}

impl MenuEntry {
    pub const ALL: [MenuEntry; 5] = [
        MenuEntry::SelectItems,
        MenuEntry::StartWorkflow,
        MenuEntry::ViewLogs,
        MenuEntry::Doctor,
        MenuEntry::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuEntry::SelectItems => "Select work items",
            MenuEntry::StartWorkflow => "Start workflow",
            MenuEntry::ViewLogs => "View live logs",
            MenuEntry::Doctor => "Doctor (environment diagnostics)",
            MenuEntry::Exit => "Exit",
        }
    }
}

/// Main menu cursor state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    pub cursor: usize,
}

impl MenuState {
    pub fn current(&self) -> MenuEntry {
        MenuEntry::ALL[self.cursor.min(MenuEntry::ALL.len() - 1)]
    }
}

/// Sort order for the work-item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Number,
    Title,
    State,
}

impl SortMode {
    pub fn next(&self) -> SortMode {
        match self {
            SortMode::Number => SortMode::Title,
            SortMode::Title => SortMode::State,
            SortMode::State => SortMode::Number,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Number => "number",
            SortMode::Title => "title",
            SortMode::State => "state",
        }
    }
}

/// Work-item selection state.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub items: Vec<WorkItem>,
    pub cursor: usize,
    pub selected: BTreeSet<u64>,
    pub sort: SortMode,
    pub loading: bool,
}

impl SelectionState {
    fn sort_items(&mut self) {
        match self.sort {
            SortMode::Number => self.items.sort_by_key(|i| i.number),
            SortMode::Title => self
                .items
                .sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase())),
            SortMode::State => self.items.sort_by(|a, b| {
                // Open items first, then by number.
                b.is_open()
                    .cmp(&a.is_open())
                    .then_with(|| a.number.cmp(&b.number))
            }),
        }
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }

    fn toggle_current(&mut self) {
        if let Some(item) = self.items.get(self.cursor) {
            if !self.selected.remove(&item.number) {
                self.selected.insert(item.number);
            }
        }
    }
}

/// Log panel / viewer state. The cached entries arrive inside
/// [`Message::LogRefreshed`]; the reducer never reads the shared buffer.
#[derive(Debug, Clone)]
pub struct LogViewState {
    pub entries: Vec<LogEntry>,
    pub scroll: usize,
    pub auto_scroll: bool,
    level_visible: [bool; 4],
    pub last_refresh: DateTime<Utc>,
}

impl Default for LogViewState {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            scroll: 0,
            auto_scroll: true,
            level_visible: [true; 4],
            last_refresh: DateTime::<Utc>::MIN_UTC,
        }
    }
}

impl LogViewState {
    fn level_index(level: LogLevel) -> usize {
        match level {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Warn => 2,
            LogLevel::Error => 3,
        }
    }

    pub fn is_visible(&self, level: LogLevel) -> bool {
        self.level_visible[Self::level_index(level)]
    }

    pub fn toggle_level(&mut self, level: LogLevel) {
        let idx = Self::level_index(level);
        self.level_visible[idx] = !self.level_visible[idx];
    }

    /// Entries passing the level filters, in insertion order.
    pub fn visible_entries(&self) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| self.is_visible(e.level))
            .collect()
    }
}

/// Workflow progress state.
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    pub tracker: ProgressTracker,
}

/// Doctor screen state.
#[derive(Debug, Clone, Default)]
pub struct DoctorState {
    pub results: Vec<DiagnosticResult>,
    pub total: usize,
    pub running: bool,
}

impl DoctorState {
    fn start(total: usize) -> Self {
        Self {
            results: Vec::new(),
            total,
            running: total > 0,
        }
    }
}

/// The single mutable UI state. Only the reducer thread writes it.
#[derive(Debug, Clone)]
pub struct Model {
    pub screen: Screen,
    pub menu: MenuState,
    pub selection: SelectionState,
    pub progress: ProgressState,
    pub log_view: LogViewState,
    pub doctor: DoctorState,
    pub width: u16,
    pub height: u16,
    pub show_logs: bool,
    pub status_line: Option<String>,
    pub error_banner: Option<String>,
    pub theme: Theme,
    pub should_quit: bool,
}

impl Model {
    /// Create the initial model and the commands that keep the loop ticking.
    pub fn init(theme: Theme, width: u16, height: u16) -> (Self, Command) {
        let model = Self {
            screen: Screen::MainMenu,
            menu: MenuState::default(),
            selection: SelectionState::default(),
            progress: ProgressState::default(),
            log_view: LogViewState::default(),
            doctor: DoctorState::default(),
            width,
            height,
            show_logs: true,
            status_line: None,
            error_banner: None,
            theme,
            should_quit: false,
        };
        let startup = Command::Batch(vec![
            Command::HeaderTick {
                interval: HEADER_TICK_IDLE,
            },
            Command::RefreshLogs {
                after: DateTime::<Utc>::MIN_UTC,
                delay: Duration::ZERO,
            },
        ]);
        (model, startup)
    }

    /// The reducer. Pure: no I/O, no spawning, no shared state.
    pub fn update(mut self, message: Message) -> (Self, Option<Command>) {
        match message {
            Message::Key(key) => {
                let action = map_key(self.screen, key);
                self.apply_key_action(action)
            }
            Message::Resize(width, height) => {
                self.width = width;
                self.height = height;
                (self, None)
            }
            Message::HeaderTick => {
                // Elapsed time and step spinners refresh on the next draw;
                // re-arm at a rate matching how busy the screen is.
                let interval = if self.screen == Screen::ProgressTracking {
                    HEADER_TICK_ACTIVE
                } else {
                    HEADER_TICK_IDLE
                };
                (self, Some(Command::HeaderTick { interval }))
            }
            Message::ItemsLoaded(Ok(items)) => {
                self.status_line = Some(format!("Loaded {} work items", items.len()));
                self.selection.items = items;
                self.selection.loading = false;
                self.selection.sort_items();
                (self, None)
            }
            Message::ItemsLoaded(Err(e)) => {
                self.selection.loading = false;
                self.error_banner = Some(match e.guidance() {
                    Some(hint) => format!("{e} ({hint})"),
                    None => e.to_string(),
                });
                (self, None)
            }
            Message::LogRefreshed { entries, at } => {
                self.log_view.entries = entries;
                self.log_view.last_refresh = at;
                let next = Command::RefreshLogs {
                    after: at - log_lookback(),
                    delay: LOG_REFRESH_DELAY,
                };
                (self, Some(next))
            }
            Message::ProgressStep { step_id, status } => {
                self.progress.tracker.set_step(&step_id, status);
                (self, None)
            }
            Message::ProgressComplete => {
                if self.screen == Screen::ProgressTracking {
                    self.screen = Screen::Completed;
                }
                self.status_line = Some("Workflow complete".to_string());
                (self, None)
            }
            Message::DoctorCheckFinished(result) => {
                self.doctor.results.push(result);
                if self.doctor.results.len() >= self.doctor.total {
                    self.doctor.running = false;
                    let failed = self
                        .doctor
                        .results
                        .iter()
                        .filter(|r| r.status == doctor::DiagnosticStatus::Fail)
                        .count();
                    self.status_line = Some(if failed == 0 {
                        "All checks passed".to_string()
                    } else {
                        format!("{failed} check(s) failed")
                    });
                }
                (self, None)
            }
            Message::BackToMenu => {
                self.go_to(Screen::MainMenu);
                (self, None)
            }
            Message::Quit => {
                self.should_quit = true;
                (self, None)
            }
        }
    }

    /// Switch screens, clearing transient chrome.
    fn go_to(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.error_banner = None;
            self.status_line = Some(screen.title().to_string());
        }
    }

    fn apply_key_action(mut self, action: KeyAction) -> (Self, Option<Command>) {
        match action {
            KeyAction::Quit | KeyAction::ForceQuit => {
                self.should_quit = true;
                (self, None)
            }
            KeyAction::ToggleLogPanel => {
                self.show_logs = !self.show_logs;
                (self, None)
            }
            KeyAction::ToggleLogViewer => {
                let target = if self.screen == Screen::LogViewer {
                    Screen::MainMenu
                } else {
                    Screen::LogViewer
                };
                self.go_to(target);
                (self, None)
            }
            KeyAction::Back => {
                if self.screen != Screen::MainMenu {
                    self.go_to(Screen::MainMenu);
                }
                (self, None)
            }
            KeyAction::None => (self, None),
            _ => match self.screen {
                Screen::MainMenu => self.update_menu(action),
                Screen::ItemSelection => self.update_selection(action),
                Screen::LogViewer => self.update_log_viewer(action),
                Screen::DoctorCheck => self.update_doctor(action),
                Screen::ProgressTracking | Screen::Completed => (self, None),
            },
        }
    }

    fn update_menu(mut self, action: KeyAction) -> (Self, Option<Command>) {
        match action {
            KeyAction::NavigateUp => {
                self.menu.cursor = self.menu.cursor.saturating_sub(1);
                (self, None)
            }
            KeyAction::NavigateDown => {
                if self.menu.cursor < MenuEntry::ALL.len() - 1 {
                    self.menu.cursor += 1;
                }
                (self, None)
            }
            KeyAction::Select => {
                let entry = self.menu.current();
                self.activate_menu_entry(entry)
            }
            _ => (self, None),
        }
    }

    fn activate_menu_entry(mut self, entry: MenuEntry) -> (Self, Option<Command>) {
        match entry {
            MenuEntry::SelectItems => {
                self.go_to(Screen::ItemSelection);
                if self.selection.items.is_empty() && !self.selection.loading {
                    self.selection.loading = true;
                    (self, Some(Command::FetchItems))
                } else {
                    (self, None)
                }
            }
            MenuEntry::StartWorkflow => {
                self.go_to(Screen::ProgressTracking);
                self.progress.tracker = ProgressTracker::default();
                (self, None)
            }
            MenuEntry::ViewLogs => {
                self.go_to(Screen::LogViewer);
                (self, None)
            }
            MenuEntry::Doctor => {
                self.go_to(Screen::DoctorCheck);
                self.start_doctor()
            }
            MenuEntry::Exit => {
                self.should_quit = true;
                (self, None)
            }
        }
    }

    fn start_doctor(mut self) -> (Self, Option<Command>) {
        let checks = doctor::all_checks();
        self.doctor = DoctorState::start(checks.len());
        let commands = checks.into_iter().map(Command::RunDoctorCheck).collect();
        (self, Command::batch(commands))
    }

    fn update_selection(mut self, action: KeyAction) -> (Self, Option<Command>) {
        match action {
            KeyAction::NavigateUp => {
                self.selection.cursor = self.selection.cursor.saturating_sub(1);
            }
            KeyAction::NavigateDown => {
                if self.selection.cursor + 1 < self.selection.items.len() {
                    self.selection.cursor += 1;
                }
            }
            KeyAction::GoToTop => self.selection.cursor = 0,
            KeyAction::GoToBottom => {
                self.selection.cursor = self.selection.items.len().saturating_sub(1);
            }
            KeyAction::ToggleSelect | KeyAction::Select => self.selection.toggle_current(),
            KeyAction::CycleSort => {
                self.selection.sort = self.selection.sort.next();
                self.selection.sort_items();
                self.status_line = Some(format!("Sorted by {}", self.selection.sort.label()));
            }
            KeyAction::StartWorkflow => {
                if !self.selection.selected.is_empty() {
                    self.go_to(Screen::ProgressTracking);
                    self.progress.tracker = ProgressTracker::default();
                }
            }
            _ => {}
        }
        (self, None)
    }

    fn update_log_viewer(mut self, action: KeyAction) -> (Self, Option<Command>) {
        match action {
            KeyAction::NavigateUp => {
                self.log_view.scroll = self.log_view.scroll.saturating_sub(1);
                self.log_view.auto_scroll = false;
            }
            KeyAction::NavigateDown => self.log_view.scroll += 1,
            KeyAction::PageUp => {
                self.log_view.scroll = self.log_view.scroll.saturating_sub(10);
                self.log_view.auto_scroll = false;
            }
            KeyAction::PageDown => self.log_view.scroll += 10,
            KeyAction::GoToTop => {
                self.log_view.scroll = 0;
                self.log_view.auto_scroll = false;
            }
            KeyAction::GoToBottom => self.log_view.auto_scroll = true,
            KeyAction::ToggleAutoScroll => {
                self.log_view.auto_scroll = !self.log_view.auto_scroll;
            }
            KeyAction::ToggleLevel(level) => self.log_view.toggle_level(level),
            KeyAction::ClearLogs => return (self, Some(Command::ClearLogs)),
            _ => {}
        }
        (self, None)
    }

    fn update_doctor(self, action: KeyAction) -> (Self, Option<Command>) {
        match action {
            KeyAction::Refresh if !self.doctor.running => self.start_doctor(),
            _ => (self, None),
        }
    }
}
