//! Rendering for the Flightdeck TUI.
//!
//! [`draw`] is a pure function of the model: it reads state and paints the
//! frame, never mutating anything. It is safe to call repeatedly, including
//! when the side log panel is composed next to the primary screen.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use flightdeck_core::logbuf::{LogEntry, LogLevel};
use flightdeck_core::types::StepStatus;

use crate::model::{LOG_PANEL_PERCENT, MenuEntry, Model};
use crate::screen::Screen;
use crate::theme::Theme;

/// Draw the complete UI for the current model state.
pub fn draw(model: &Model, frame: &mut Frame) {
    let area = frame.area();

    let banner_height = if model.error_banner.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Min(5),                // Content
            Constraint::Length(banner_height), // Error banner
            Constraint::Length(2),             // Footer
        ])
        .split(area);

    draw_header(model, frame, chunks[0]);
    draw_content(model, frame, chunks[1]);
    if let Some(banner) = &model.error_banner {
        draw_error_banner(&model.theme, banner, frame, chunks[2]);
    }
    draw_footer(model, frame, chunks[3]);
}

fn draw_header(model: &Model, frame: &mut Frame, area: Rect) {
    let theme = &model.theme;
    let title = format!(" Flightdeck - {} ", model.screen.title());
    let dimensions = format!("{}x{}", model.width, model.height);
    let status = model.status_line.clone().unwrap_or_default();

    let right_len = dimensions.len() + 2 + status.len();
    let spacing = (area.width as usize)
        .saturating_sub(title.len() + right_len + 2);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(theme.colors.header)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(spacing)),
        Span::styled(status, Style::default().fg(theme.colors.text_dim)),
        Span::raw("  "),
        Span::styled(dimensions, Style::default().fg(theme.colors.text_dim)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.colors.border_dim)),
    );

    frame.render_widget(header, area);
}

fn draw_content(model: &Model, frame: &mut Frame, area: Rect) {
    // Compose the side log panel next to every screen except the
    // full-screen viewer.
    if model.show_logs && model.screen.allows_log_panel() && area.width >= 60 {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(100 - LOG_PANEL_PERCENT),
                Constraint::Percentage(LOG_PANEL_PERCENT),
            ])
            .split(area);
        draw_screen(model, frame, columns[0]);
        draw_log_panel(model, frame, columns[1], false);
    } else {
        draw_screen(model, frame, area);
    }
}

fn draw_screen(model: &Model, frame: &mut Frame, area: Rect) {
    match model.screen {
        Screen::MainMenu => draw_menu(model, frame, area),
        Screen::ItemSelection => draw_selection(model, frame, area),
        Screen::ProgressTracking => draw_progress(model, frame, area),
        Screen::LogViewer => draw_log_panel(model, frame, area, true),
        Screen::DoctorCheck => draw_doctor(model, frame, area),
        Screen::Completed => draw_completed(model, frame, area),
    }
}

fn draw_menu(model: &Model, frame: &mut Frame, area: Rect) {
    let theme = &model.theme;
    let mut lines = Vec::new();
    lines.push(Line::raw(""));

    for (i, entry) in MenuEntry::ALL.iter().enumerate() {
        let selected = i == model.menu.cursor;
        let cursor = if selected { "▶ " } else { "  " };
        let style = if selected {
            Style::default()
                .fg(theme.colors.selection)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.colors.text)
        };
        lines.push(Line::from(vec![
            Span::styled(cursor, Style::default().fg(theme.colors.hotkey)),
            Span::styled(entry.label(), style),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "↑/↓ navigate · Enter select · Tab logs · q quit",
        Style::default().fg(theme.colors.text_dim),
    ));

    let menu = Paragraph::new(lines).block(bordered(theme, " Main Menu ", true));
    frame.render_widget(menu, area);
}

fn draw_selection(model: &Model, frame: &mut Frame, area: Rect) {
    let theme = &model.theme;
    let selection = &model.selection;
    let mut lines = Vec::new();

    if selection.loading {
        lines.push(Line::styled(
            "Fetching work items...",
            Style::default().fg(theme.colors.text_dim),
        ));
    } else if selection.items.is_empty() {
        lines.push(Line::styled(
            "No work items available",
            Style::default().fg(theme.colors.text_dim),
        ));
    } else {
        let visible_rows = area.height.saturating_sub(5) as usize;
        let top = selection
            .cursor
            .saturating_sub(visible_rows.saturating_sub(1));
        for (i, item) in selection.items.iter().enumerate().skip(top).take(visible_rows.max(1)) {
            let highlighted = i == selection.cursor;
            let marker = if selection.selected.contains(&item.number) {
                "[x]"
            } else {
                "[ ]"
            };
            let state_style = if item.is_open() {
                Style::default().fg(theme.colors.status_ok)
            } else {
                Style::default().fg(theme.colors.text_dim)
            };
            let row_style = if highlighted {
                Style::default()
                    .fg(theme.colors.selection)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.colors.text)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{marker} "), row_style),
                Span::styled(format!("#{:<5}", item.number), row_style),
                Span::styled(format!("{:<7}", item.state), state_style),
                Span::styled(item.title.clone(), row_style),
                Span::styled(
                    format!("  {}", item.label_summary(18)),
                    Style::default().fg(theme.colors.text_dim),
                ),
            ]));
        }
    }

    lines.push(Line::raw(""));
    let selected_info = if selection.selected.is_empty() {
        "No items selected".to_string()
    } else {
        format!(
            "Selected: {}",
            selection
                .selected
                .iter()
                .map(|n| format!("#{n}"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    };
    lines.push(Line::styled(
        selected_info,
        Style::default().fg(theme.colors.status_ok),
    ));
    lines.push(Line::styled(
        format!(
            "space toggle · s sort ({}) · ctrl+s start · esc back",
            selection.sort.label()
        ),
        Style::default().fg(theme.colors.text_dim),
    ));

    let panel = Paragraph::new(lines).block(bordered(theme, " Item Selection ", true));
    frame.render_widget(panel, area);
}

fn draw_progress(model: &Model, frame: &mut Frame, area: Rect) {
    let theme = &model.theme;
    let tracker = &model.progress.tracker;
    let mut lines = Vec::new();

    // Completion bar.
    let pct = tracker.completion();
    let bar_width: usize = 30;
    let filled = (pct * bar_width as f64).round() as usize;
    lines.push(Line::from(vec![
        Span::styled(
            format!(
                "[{}{}]",
                "█".repeat(filled),
                "░".repeat(bar_width.saturating_sub(filled))
            ),
            Style::default().fg(theme.colors.status_ok),
        ),
        Span::styled(
            format!(" {:.0}%", pct * 100.0),
            Style::default().fg(theme.colors.text),
        ),
    ]));
    lines.push(Line::raw(""));

    let total = tracker.steps.len();
    for (i, step) in tracker.steps.iter().enumerate() {
        let style = step_style(theme, step.status);
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", step.status.indicator()), style),
            Span::styled(
                format!("{}/{} ", i + 1, total),
                Style::default().fg(theme.colors.text_dim),
            ),
            Span::styled(format!("{:<24}", step.name), style),
            Span::styled(
                step.description.clone(),
                Style::default().fg(theme.colors.text_dim),
            ),
        ]));
    }

    lines.push(Line::raw(""));
    let elapsed = tracker.elapsed();
    lines.push(Line::from(vec![
        Span::styled("Elapsed: ", Style::default().fg(theme.colors.text)),
        Span::styled(
            format_elapsed(elapsed),
            Style::default().fg(theme.colors.text_dim),
        ),
    ]));
    lines.push(Line::styled(
        "esc back to menu",
        Style::default().fg(theme.colors.text_dim),
    ));

    let panel = Paragraph::new(lines).block(bordered(theme, " Workflow Progress ", true));
    frame.render_widget(panel, area);
}

fn draw_log_panel(model: &Model, frame: &mut Frame, area: Rect, full: bool) {
    let theme = &model.theme;
    let log_view = &model.log_view;
    let visible = log_view.visible_entries();

    let content_rows = area.height.saturating_sub(if full { 4 } else { 2 }) as usize;
    let top = if log_view.auto_scroll {
        visible.len().saturating_sub(content_rows)
    } else {
        log_view.scroll.min(visible.len().saturating_sub(1))
    };

    let mut lines: Vec<Line> = visible
        .iter()
        .skip(top)
        .take(content_rows.max(1))
        .map(|entry| format_log_line(theme, entry))
        .collect();

    if lines.is_empty() {
        lines.push(Line::styled(
            "No log entries yet",
            Style::default().fg(theme.colors.text_dim),
        ));
    }

    if full {
        let filters: Vec<String> = LogLevel::all()
            .iter()
            .filter(|l| log_view.is_visible(**l))
            .map(|l| l.label().to_string())
            .collect();
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!(
                "Showing: {} {}",
                filters.join(" "),
                if log_view.auto_scroll { "(auto)" } else { "" }
            ),
            Style::default().fg(theme.colors.text_dim),
        ));
        lines.push(Line::styled(
            "j/k scroll · a auto · c clear · d/i/w/e levels · esc back",
            Style::default().fg(theme.colors.text_dim),
        ));
    }

    let title = if full { " Live Logs " } else { " Logs " };
    let panel = Paragraph::new(lines)
        .block(bordered(theme, title, full))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

fn draw_doctor(model: &Model, frame: &mut Frame, area: Rect) {
    let theme = &model.theme;
    let doctor = &model.doctor;
    let mut lines = Vec::new();

    if doctor.running {
        lines.push(Line::styled(
            format!("Running checks... {}/{}", doctor.results.len(), doctor.total),
            Style::default().fg(theme.colors.text_dim),
        ));
        lines.push(Line::raw(""));
    }

    for result in &doctor.results {
        let style = match result.status {
            crate::doctor::DiagnosticStatus::Pass => Style::default().fg(theme.colors.status_ok),
            crate::doctor::DiagnosticStatus::Warn => {
                Style::default().fg(theme.colors.status_warning)
            }
            crate::doctor::DiagnosticStatus::Fail => Style::default().fg(theme.colors.status_error),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", result.status.indicator()), style),
            Span::styled(format!("{:<24}", result.name), Style::default().fg(theme.colors.text)),
            Span::styled(
                result.detail.clone(),
                Style::default().fg(theme.colors.text_dim),
            ),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "r re-run · esc back",
        Style::default().fg(theme.colors.text_dim),
    ));

    let panel = Paragraph::new(lines).block(bordered(theme, " Doctor ", true));
    frame.render_widget(panel, area);
}

fn draw_completed(model: &Model, frame: &mut Frame, area: Rect) {
    let theme = &model.theme;
    let lines = vec![
        Line::raw(""),
        Line::styled(
            "Workflow completed!",
            Style::default()
                .fg(theme.colors.status_ok)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::styled(
            "Enter back to menu · q quit",
            Style::default().fg(theme.colors.text_dim),
        ),
    ];
    let panel = Paragraph::new(lines).block(bordered(theme, " Complete ", true));
    frame.render_widget(panel, area);
}

fn draw_error_banner(theme: &Theme, banner: &str, frame: &mut Frame, area: Rect) {
    let line = Paragraph::new(Line::styled(
        format!(" ✗ {banner}"),
        Style::default()
            .fg(theme.colors.status_error)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(line, area);
}

fn draw_footer(model: &Model, frame: &mut Frame, area: Rect) {
    let theme = &model.theme;
    let hotkey = Style::default().fg(theme.colors.hotkey);
    let hints = vec![
        Span::styled("[Tab]", hotkey),
        Span::raw(" Logs panel  "),
        Span::styled("[Ctrl+L]", hotkey),
        Span::raw(" Log viewer  "),
        Span::styled("[Esc]", hotkey),
        Span::raw(" Menu  "),
        Span::styled("[q]", hotkey),
        Span::raw(" Quit"),
    ];

    let state = format!(
        "{} | Logs: {}",
        model.screen.short_name(),
        if model.show_logs { "ON" } else { "OFF" }
    );

    let footer = Paragraph::new(Line::from(hints))
        .style(Style::default().fg(theme.colors.text_dim))
        .block(
            Block::default()
                .borders(Borders::TOP)
                .title(Span::styled(state, Style::default().fg(theme.colors.border_dim)))
                .title_alignment(ratatui::layout::Alignment::Right),
        );

    frame.render_widget(footer, area);
}

fn bordered<'a>(theme: &Theme, title: &'a str, focused: bool) -> Block<'a> {
    let border_style = if focused {
        Style::default().fg(theme.colors.header)
    } else {
        Style::default().fg(theme.colors.border_dim)
    };
    let title_style = if focused {
        Style::default()
            .fg(theme.colors.header)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.colors.text)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title, title_style))
}

fn step_style(theme: &Theme, status: StepStatus) -> Style {
    match status {
        StepStatus::Completed => Style::default().fg(theme.colors.status_ok),
        StepStatus::InProgress => Style::default().fg(theme.colors.status_warning),
        StepStatus::Failed => Style::default().fg(theme.colors.status_error),
        StepStatus::Pending => Style::default().fg(theme.colors.text_dim),
    }
}

fn format_log_line<'a>(theme: &Theme, entry: &'a LogEntry) -> Line<'a> {
    let level_style = match entry.level {
        LogLevel::Debug => Style::default().fg(theme.colors.text_dim),
        LogLevel::Info => Style::default().fg(theme.colors.text),
        LogLevel::Warn => Style::default().fg(theme.colors.status_warning),
        LogLevel::Error => Style::default().fg(theme.colors.status_error),
    };
    Line::from(vec![
        Span::styled(
            entry.timestamp.format("%H:%M:%S ").to_string(),
            Style::default().fg(theme.colors.text_dim),
        ),
        Span::styled(format!("{:<5} ", entry.level.label()), level_style),
        Span::styled(
            format!("[{}] ", entry.component),
            Style::default().fg(theme.colors.text_dim),
        ),
        Span::styled(&entry.message, Style::default().fg(theme.colors.text)),
    ])
}

/// Format an elapsed duration as `MmSSs` / `HhMMm`.
fn format_elapsed(elapsed: chrono::Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use flightdeck_core::error::FlightdeckError;
    use flightdeck_core::logbuf::LogEntry;
    use flightdeck_core::types::{StepStatus, WorkItem};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn render(model: &Model, width: u16, height: u16) -> Buffer {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(model, frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn buffer_to_string(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut result = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                result.push(buffer[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            result.push('\n');
        }
        result
    }

    fn contains(buffer: &Buffer, text: &str) -> bool {
        buffer_to_string(buffer).contains(text)
    }

    fn model() -> Model {
        Model::init(Theme::default(), 120, 40).0
    }

    #[test]
    fn test_menu_renders_entries_and_cursor() {
        let m = model();
        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "Main Menu"));
        assert!(contains(&buffer, "Select work items"));
        assert!(contains(&buffer, "Doctor"));
        assert!(contains(&buffer, "▶"));
    }

    #[test]
    fn test_header_shows_screen_and_dimensions() {
        let m = model();
        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "Flightdeck - Main Menu"));
        assert!(contains(&buffer, "120x40"));
    }

    #[test]
    fn test_log_panel_composed_beside_menu() {
        let m = model();
        assert!(m.show_logs);
        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, " Logs "));
        assert!(contains(&buffer, "No log entries yet"));
    }

    #[test]
    fn test_log_panel_hidden_when_toggled_off() {
        let mut m = model();
        m.show_logs = false;
        let buffer = render(&m, 120, 40);
        assert!(!contains(&buffer, "No log entries yet"));
    }

    #[test]
    fn test_progress_screen_shows_steps_and_bar() {
        let mut m = model();
        m.screen = Screen::ProgressTracking;
        m.progress.tracker.set_step("setup", StepStatus::Completed);
        m.progress.tracker.set_step("fetch", StepStatus::InProgress);

        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "Workflow Progress"));
        assert!(contains(&buffer, "Preparing workspace"));
        assert!(contains(&buffer, "Elapsed:"));
        assert!(contains(&buffer, "█"));
    }

    #[test]
    fn test_log_viewer_full_screen() {
        let mut m = model();
        m.screen = Screen::LogViewer;
        m.log_view.entries = vec![LogEntry::new(
            flightdeck_core::logbuf::LogLevel::Warn,
            "header",
            "render skipped",
            "s",
        )];
        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "Live Logs"));
        assert!(contains(&buffer, "render skipped"));
        assert!(contains(&buffer, "WARN"));
        assert!(contains(&buffer, "Showing:"));
    }

    #[test]
    fn test_selection_screen_rows_and_markers() {
        let mut m = model();
        m.screen = Screen::ItemSelection;
        m.selection.items = vec![WorkItem {
            number: 12,
            title: "Flickering header".into(),
            state: "open".into(),
            labels: Vec::new(),
        }];
        m.selection.selected.insert(12);

        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "#12"));
        assert!(contains(&buffer, "[x]"));
        assert!(contains(&buffer, "Flickering header"));
        assert!(contains(&buffer, "Selected: #12"));
    }

    #[test]
    fn test_doctor_screen_lists_results() {
        let mut m = model();
        m.screen = Screen::DoctorCheck;
        m.doctor.results.push(crate::doctor::DiagnosticResult {
            id: "vcs",
            name: "Version control",
            status: crate::doctor::DiagnosticStatus::Pass,
            detail: "git version 2.43".into(),
        });
        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "Version control"));
        assert!(contains(&buffer, "git version 2.43"));
    }

    #[test]
    fn test_error_banner_rendered() {
        let mut m = model();
        let err = FlightdeckError::CommandFailed {
            program: "gh".into(),
            status: 1,
            stderr: "auth".into(),
        };
        m.error_banner = Some(err.to_string());
        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "gh"));
    }

    #[test]
    fn test_completed_screen() {
        let mut m = model();
        m.screen = Screen::Completed;
        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "Workflow completed!"));
    }

    #[test]
    fn test_small_terminal_does_not_panic() {
        let m = model();
        for (w, h) in [(20, 10), (40, 12), (59, 20)] {
            let buffer = render(&m, w, h);
            assert_eq!(buffer.area.width, w);
            assert_eq!(buffer.area.height, h);
        }
    }

    #[test]
    fn test_view_is_repeatable() {
        let m = model();
        let first = buffer_to_string(&render(&m, 100, 30));
        let second = buffer_to_string(&render(&m, 100, 30));
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_elapsed(chrono::Duration::seconds(90)), "1m30s");
        assert_eq!(format_elapsed(chrono::Duration::seconds(3700)), "1h01m");
    }

    #[test]
    fn test_footer_shows_global_hotkeys() {
        let m = model();
        let buffer = render(&m, 120, 40);
        assert!(contains(&buffer, "[Tab]"));
        assert!(contains(&buffer, "[q]"));
        assert!(contains(&buffer, "Logs: ON"));
    }
}
