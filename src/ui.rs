use chrono::{DateTime, Local};
use ratatui::{prelude::*, widgets::*};

use crate::{
    app::App,
    config::Preset,
    timer::{Phase, TimerStatus, format_clock},
};

// ============================================================================
// View State
// ============================================================================

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum View {
    Timer,
    Tasks,
    Stats,
    Settings,
    Help,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum TaskMode {
    Browsing,
    Adding,
    ConfirmingDelete,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum AddField {
    Text,
    Pomodoros,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum SettingsField {
    WorkMinutes,
    BreakMinutes,
    Preset,
    DarkMode,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            Self::WorkMinutes => Self::BreakMinutes,
            Self::BreakMinutes => Self::Preset,
            Self::Preset => Self::DarkMode,
            Self::DarkMode => Self::WorkMinutes,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::WorkMinutes => Self::DarkMode,
            Self::BreakMinutes => Self::WorkMinutes,
            Self::Preset => Self::BreakMinutes,
            Self::DarkMode => Self::Preset,
        }
    }
}

/// Presentation-only state: which screen is up, cursors and form buffers.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub view: View,
    pub focus_mode: bool,
    pub task_mode: TaskMode,
    pub add_field: AddField,
    pub task_input: String,
    pub pomodoro_input: String,
    pub cursor: usize,
    pub settings_field: SettingsField,
    pub preset: Preset,
    pub animation_frame: u8,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view: View::Timer,
            focus_mode: false,
            task_mode: TaskMode::Browsing,
            add_field: AddField::Text,
            task_input: String::new(),
            pomodoro_input: "1".into(),
            cursor: 0,
            settings_field: SettingsField::WorkMinutes,
            preset: Preset::Classic,
            animation_frame: 0,
        }
    }
}

impl ViewState {
    pub fn advance_animation(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1) % 20;
    }

    /// Id of the visible task under the cursor.
    pub fn cursor_task_id(&self, app: &App) -> Option<String> {
        app.tasks().visible().get(self.cursor).map(|t| t.id.clone())
    }

    pub fn clamp_cursor(&mut self, app: &App) {
        let len = app.tasks().visible().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}

// ============================================================================
// Theme
// ============================================================================

#[derive(Clone, Copy)]
struct Theme {
    work_color: Color,
    break_color: Color,
    border_color: Color,
    accent_color: Color,
    text_color: Color,
    muted_color: Color,
    background: Color,
}

fn get_theme(dark: bool) -> Theme {
    if dark {
        Theme {
            work_color: Color::Rgb(255, 110, 90),
            break_color: Color::Rgb(110, 210, 140),
            border_color: Color::Rgb(90, 110, 140),
            accent_color: Color::Rgb(255, 170, 60),
            text_color: Color::Rgb(225, 225, 230),
            muted_color: Color::Rgb(120, 125, 135),
            background: Color::Rgb(24, 26, 32),
        }
    } else {
        Theme {
            work_color: Color::Rgb(220, 70, 50),
            break_color: Color::Rgb(40, 150, 80),
            border_color: Color::Rgb(120, 140, 170),
            accent_color: Color::Rgb(200, 110, 0),
            text_color: Color::Rgb(30, 30, 35),
            muted_color: Color::Rgb(120, 120, 120),
            background: Color::Rgb(250, 248, 244),
        }
    }
}

impl Theme {
    fn phase_color(&self, phase: Phase) -> Color {
        match phase {
            Phase::Work => self.work_color,
            Phase::Break => self.break_color,
        }
    }

    fn block<'a>(&self, title: &'a str) -> Block<'a> {
        Block::default()
            .title(title)
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border_color))
    }
}

// ============================================================================
// UI Rendering
// ============================================================================

pub fn render_ui(f: &mut Frame, app: &App, view: &ViewState, now: DateTime<Local>) {
    let theme = get_theme(app.dark_mode());
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background).fg(theme.text_color)),
        f.size(),
    );

    if view.focus_mode {
        render_focus(f, app, view, &theme);
    } else {
        match view.view {
            View::Timer => render_timer(f, app, view, &theme, now),
            View::Tasks => render_tasks(f, app, view, &theme),
            View::Stats => render_stats(f, app, &theme, now),
            View::Settings => render_settings(f, app, view, &theme),
            View::Help => render_help(f, &theme),
        }
    }

    if let Some(ended) = app.flash(now) {
        render_flash(f, ended, view);
    }
}

fn render_flash(f: &mut Frame, ended: Phase, view: &ViewState) {
    // Blinks on/off over the flash window.
    if view.animation_frame % 10 >= 5 {
        return;
    }
    let color = match ended {
        Phase::Work => Color::Rgb(255, 99, 71),
        Phase::Break => Color::Rgb(76, 175, 80),
    };
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .border_style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
        f.size(),
    );
}

fn render_focus(f: &mut Frame, app: &App, view: &ViewState, theme: &Theme) {
    let area = centered_rect(40, 30, f.size());
    let timer = app.timer();
    let color = theme.phase_color(timer.phase());

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(timer.phase().name(), Style::default().fg(color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(timer.display_time(), Style::default().fg(color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(status_text(app, view), status_style(app))),
        Line::from(""),
        Line::from(Span::styled("Press M to leave focus mode", Style::default()
            .fg(theme.muted_color).add_modifier(Modifier::ITALIC))),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(theme.block(" 🍅 FLOWSTATE (Focus) ")),
        area,
    );
}

fn status_text(app: &App, view: &ViewState) -> String {
    let label = app.timer().status_label();
    match app.timer().status() {
        TimerStatus::Running => format!("{} {}", if view.animation_frame < 10 { "●" } else { "○" }, label),
        _ => label.to_string(),
    }
}

fn status_style(app: &App) -> Style {
    let color = match app.timer().status() {
        TimerStatus::Running => Color::Green,
        TimerStatus::Paused => Color::Yellow,
        TimerStatus::Idle => Color::Gray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn render_timer(f: &mut Frame, app: &App, view: &ViewState, theme: &Theme, now: DateTime<Local>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border_color))
            .title(Span::styled(" 🍅 FLOWSTATE ", Style::default()
                .fg(theme.accent_color).add_modifier(Modifier::BOLD))),
        chunks[0],
    );

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(10),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(2), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Percentage(10),
        ])
        .split(chunks[1]);

    let timer = app.timer();
    let color = theme.phase_color(timer.phase());

    f.render_widget(
        Paragraph::new(timer.phase().name())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[1],
    );

    f.render_widget(
        Paragraph::new(timer.display_time())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[3],
    );

    f.render_widget(
        Paragraph::new(status_text(app, view)).style(status_style(app)).alignment(Alignment::Center),
        sections[5],
    );

    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(color).bg(theme.background))
            .ratio(timer.progress().clamp(0.0, 1.0)),
        sections[7],
    );

    let today = app.today(now);
    let active = app.active_task_text().unwrap_or("none (select one in Tasks)");
    let info = vec![
        Line::from(format!(
            "🍅 {} total  •  {} today  •  {} focus min today",
            timer.completed_pomodoros(),
            today.pomodoros,
            today.focus_time
        )),
        Line::from(Span::styled(format!("Active task: {}", active), Style::default().fg(theme.muted_color))),
    ];
    f.render_widget(Paragraph::new(info).alignment(Alignment::Center), sections[9]);

    let controls = vec![
        Line::from(vec![
            span_key("Space", theme), Span::raw(" Start/Pause  •  "),
            span_key("R", theme), Span::raw(" Reset  •  "),
            span_key("M", theme), Span::raw(" Focus mode  •  "),
            span_key("X", theme), Span::raw(" Dark mode"),
        ]),
        Line::from(vec![
            span_key("T", theme), Span::raw(" Tasks  •  "),
            span_key("S", theme), Span::raw(" Stats  •  "),
            span_key("D", theme), Span::raw(" Settings  •  "),
            span_key("H", theme), Span::raw(" Help  •  "),
            span_key("Q", theme), Span::raw(" Quit"),
        ]),
    ];
    f.render_widget(
        Paragraph::new(controls).alignment(Alignment::Center).style(Style::default().fg(theme.muted_color)),
        chunks[2],
    );
}

fn span_key<'a>(text: &'a str, theme: &Theme) -> Span<'a> {
    Span::styled(text, Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD))
}

fn render_tasks(f: &mut Frame, app: &App, view: &ViewState, theme: &Theme) {
    let area = centered_rect(80, 85, f.size());
    let tasks = app.tasks();
    let (total, completed) = tasks.counts();

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("📋 TASKS  ({} total, {} completed)", total, completed),
            Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    let help = match view.task_mode {
        TaskMode::Browsing => "  a: Add  •  Enter: Set active  •  Space: Done  •  d: Delete  •  J/K: Move  •  c: Hide done  •  Esc: Back",
        TaskMode::Adding => "  Tab: Switch field  •  Enter: Save  •  Esc: Cancel",
        TaskMode::ConfirmingDelete => "  Y: Confirm  •  N/Esc: Cancel",
    };
    lines.push(Line::from(Span::styled(help, Style::default().fg(theme.muted_color).add_modifier(Modifier::ITALIC))));
    lines.push(Line::from(""));

    if view.task_mode == TaskMode::Adding {
        let field_style = |field: AddField| {
            if view.add_field == field {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted_color)
            }
        };
        let cursor = |field: AddField| if view.add_field == field { "█" } else { "" };

        lines.push(Line::from(Span::styled("  ✏️  NEW TASK", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))));
        lines.push(Line::from(vec![
            Span::raw("  Task: "),
            Span::styled(view.task_input.as_str(), field_style(AddField::Text)),
            Span::styled(cursor(AddField::Text), Style::default().fg(Color::Green)),
        ]));
        lines.push(Line::from(vec![
            Span::raw("  Pomodoros: "),
            Span::styled(view.pomodoro_input.as_str(), field_style(AddField::Pomodoros)),
            Span::styled(cursor(AddField::Pomodoros), Style::default().fg(Color::Green)),
        ]));
        lines.push(Line::from(""));
    }

    if view.task_mode == TaskMode::ConfirmingDelete {
        if let Some(task) = view.cursor_task_id(app).and_then(|id| tasks.get(&id)) {
            lines.push(Line::from(Span::styled("  ⚠️  DELETE TASK?", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))));
            lines.push(Line::from(format!("  {}", task.text)));
            lines.push(Line::from(""));
        }
    }

    let visible = tasks.visible();
    if visible.is_empty() {
        let msg = if total == 0 { "  No tasks yet! Press 'a' to add one." } else { "  All tasks are completed and hidden." };
        lines.push(Line::from(Span::styled(msg, Style::default().fg(theme.muted_color))));
    }

    for (idx, task) in visible.iter().enumerate() {
        let selected = idx == view.cursor;
        let active = tasks.selected_task_id() == Some(task.id.as_str());
        let check = if task.completed { "☑" } else { "☐" };
        let prefix = if selected { "► " } else { "  " };
        let mut style = if selected {
            Style::default().fg(theme.text_color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted_color)
        };
        if task.completed {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }

        lines.push(Line::from(vec![
            Span::styled(prefix, Style::default().fg(theme.accent_color)),
            Span::raw(format!("{} ", check)),
            Span::styled(task.text.as_str(), style),
            Span::styled(
                format!("  {}/{} 🍅", task.completed_pomodoros, task.planned_pomodoros),
                Style::default().fg(theme.work_color),
            ),
            Span::styled(if active { "  ◀ active" } else { "" }, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        ]));
    }

    if tasks.hide_completed() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("  (completed tasks hidden)", Style::default().fg(theme.muted_color).add_modifier(Modifier::ITALIC))));
    }

    f.render_widget(Paragraph::new(lines).block(theme.block(" Tasks ")), area);
}

fn render_stats(f: &mut Frame, app: &App, theme: &Theme, now: DateTime<Local>) {
    let area = centered_rect(80, 85, f.size());
    let block = theme.block(" Statistics ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(6)])
        .split(inner);

    let today = app.today(now);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("  📅 Today:", Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD))),
        stat_line("Pomodoros", today.pomodoros.to_string(), theme),
        stat_line("Focus time", format!("{} min", today.focus_time), theme),
        stat_line("Completed tasks (all time)", app.stats().stats().completed_tasks.to_string(), theme),
        Line::from(""),
        Line::from(Span::styled("  Tab: switch chart", Style::default().fg(theme.muted_color).add_modifier(Modifier::ITALIC))),
    ];
    f.render_widget(Paragraph::new(lines), parts[0]);

    let chart = app.chart();
    if chart.is_empty() {
        f.render_widget(
            Paragraph::new("No data yet").alignment(Alignment::Center).style(Style::default().fg(theme.muted_color)),
            parts[1],
        );
        return;
    }

    let bar_color = match chart.mode {
        crate::chart::ChartMode::Pomodoros => theme.work_color,
        crate::chart::ChartMode::FocusMinutes => theme.break_color,
    };
    let bars: Vec<Bar> = chart
        .bars
        .iter()
        .map(|b| {
            Bar::default()
                .value(b.value.round() as u64)
                .text_value(format!("{}", b.value))
                .label(Line::from(format!("{} {}", b.label, b.weekday)))
                .style(Style::default().fg(bar_color))
        })
        .collect();

    f.render_widget(
        BarChart::default()
            .block(Block::default().title(chart.mode.title()).title_alignment(Alignment::Center))
            .data(BarGroup::default().bars(&bars))
            .bar_width(9)
            .bar_gap(2)
            .max(chart.max.ceil() as u64)
            .value_style(Style::default().fg(theme.background).bg(bar_color).add_modifier(Modifier::BOLD))
            .label_style(Style::default().fg(theme.text_color)),
        parts[1],
    );
}

fn stat_line(label: &str, value: String, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("     {}: ", label)),
        Span::styled(value, Style::default().fg(theme.text_color).add_modifier(Modifier::BOLD)),
    ])
}

fn render_settings(f: &mut Frame, app: &App, view: &ViewState, theme: &Theme) {
    let area = centered_rect(70, 85, f.size());
    let settings = app.settings();

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("⚙️  SETTINGS", Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("  ↑↓/jk: Navigate  •  ←→/hl: Adjust  •  Enter: Apply preset  •  Space: Toggle",
            Style::default().fg(theme.muted_color).add_modifier(Modifier::ITALIC))),
        Line::from(""),
    ];

    let fields = [
        (SettingsField::WorkMinutes, "🎯 Work Duration", slider(settings.work_minutes(), crate::config::WORK_MINUTES_RANGE)),
        (SettingsField::BreakMinutes, "☕ Break Duration", slider(settings.break_minutes(), crate::config::BREAK_MINUTES_RANGE)),
        (SettingsField::Preset, "⏱  Preset", format!("< {} >  (Enter to apply)", view.preset.label())),
        (SettingsField::DarkMode, "🌙 Dark Mode", if app.dark_mode() { "ON" } else { "OFF" }.into()),
    ];

    for (field, label, value) in fields {
        let selected = view.settings_field == field;
        let (prefix, label_style, value_style) = if selected {
            ("  > ", Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD),
             Style::default().fg(theme.text_color).add_modifier(Modifier::BOLD))
        } else {
            ("    ", Style::default().fg(theme.muted_color), Style::default().fg(theme.muted_color))
        };

        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(prefix, label_style), Span::styled(label, label_style)]));
        lines.push(Line::from(vec![Span::raw("    "), Span::styled(value, value_style)]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  💾 Auto-saved", Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC))));

    f.render_widget(Paragraph::new(lines).block(theme.block(" Settings ")), area);
}

fn slider(value: u32, (lo, hi): (u32, u32)) -> String {
    const WIDTH: u32 = 20;
    let filled = ((value - lo) * WIDTH / (hi - lo).max(1)) as usize;
    format!(
        "{} min  [{}{}]  {}",
        value,
        "━".repeat(filled),
        "─".repeat(WIDTH as usize - filled),
        format_clock(value as u64 * 60)
    )
}

fn render_help(f: &mut Frame, theme: &Theme) {
    let area = centered_rect(70, 85, f.size());

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("⌨️  KEYBOARD SHORTCUTS", Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("  Timer:"),
        help_line("Space", "Start / pause"),
        help_line("R", "Reset to a fresh work phase"),
        help_line("M", "Toggle focus mode"),
        help_line("X", "Toggle dark mode"),
        Line::from(""),
        Line::from("  Navigation:"),
        help_line("T", "Tasks"),
        help_line("S", "Statistics"),
        help_line("D", "Settings"),
        help_line("H / ?", "Toggle help"),
        Line::from(""),
        Line::from("  Tasks:"),
        help_line("A", "Add task (Tab switches field)"),
        help_line("Enter", "Make task active (again to clear)"),
        help_line("Space", "Toggle completed"),
        help_line("D", "Delete task"),
        help_line("Shift+J / Shift+K", "Move task down / up"),
        help_line("C", "Hide / show completed"),
        Line::from(""),
        Line::from("  General:"),
        help_line("Q / Esc", "Exit / Go back"),
        help_line("Ctrl+C", "Force quit"),
    ];

    f.render_widget(
        Paragraph::new(help_text).alignment(Alignment::Left).block(theme.block(" Help ")),
        area,
    );
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("    "),
        Span::styled(key, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}", desc)),
    ])
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(v[1])[1]
}
