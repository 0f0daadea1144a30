use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    app::{App, Command},
    ui::{AddField, SettingsField, TaskMode, View, ViewState},
};

// ============================================================================
// Event Handlers
// ============================================================================

/// Maps a key press to view changes and app commands. Returns true to quit.
pub fn handle_input(key: KeyEvent, app: &mut App, view: &mut ViewState, now: DateTime<Local>) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view.view == View::Tasks {
        match view.task_mode {
            TaskMode::Adding => {
                handle_add_form(key, app, view, now);
                return false;
            }
            TaskMode::ConfirmingDelete => {
                handle_delete_confirm(key, app, view, now);
                return false;
            }
            TaskMode::Browsing => {}
        }
    }

    match view.view {
        View::Tasks => handle_tasks_view(key, app, view, now),
        View::Settings => handle_settings_view(key, app, view, now),
        View::Stats => handle_stats_view(key, app, view, now),
        _ => handle_main_view(key, app, view, now),
    }
}

fn handle_add_form(key: KeyEvent, app: &mut App, view: &mut ViewState, now: DateTime<Local>) {
    let field = match view.add_field {
        AddField::Text => &mut view.task_input,
        AddField::Pomodoros => &mut view.pomodoro_input,
    };

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            view.add_field = match view.add_field {
                AddField::Text => AddField::Pomodoros,
                AddField::Pomodoros => AddField::Text,
            };
        }
        KeyCode::Char(c) => field.push(c),
        KeyCode::Backspace => { field.pop(); }
        KeyCode::Enter => {
            let text = std::mem::take(&mut view.task_input);
            let planned = std::mem::replace(&mut view.pomodoro_input, "1".into());
            app.dispatch(Command::AddTask { text, planned }, now);
            view.task_mode = TaskMode::Browsing;
            view.add_field = AddField::Text;
        }
        KeyCode::Esc => {
            view.task_input.clear();
            view.pomodoro_input = "1".into();
            view.task_mode = TaskMode::Browsing;
            view.add_field = AddField::Text;
        }
        _ => {}
    }
}

fn handle_delete_confirm(key: KeyEvent, app: &mut App, view: &mut ViewState, now: DateTime<Local>) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(id) = view.cursor_task_id(app) {
                app.dispatch(Command::DeleteTask(id), now);
            }
            view.clamp_cursor(app);
            view.task_mode = TaskMode::Browsing;
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view.task_mode = TaskMode::Browsing;
        }
        _ => {}
    }
}

fn handle_tasks_view(key: KeyEvent, app: &mut App, view: &mut ViewState, now: DateTime<Local>) -> bool {
    let current = view.cursor_task_id(app);

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('t') => view.view = View::Timer,
        KeyCode::Char('a') | KeyCode::Char('n') => {
            view.task_mode = TaskMode::Adding;
            view.add_field = AddField::Text;
            view.task_input.clear();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let len = app.tasks().visible().len();
            if len > 0 {
                view.cursor = (view.cursor + 1).min(len - 1);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => view.cursor = view.cursor.saturating_sub(1),
        KeyCode::Char('J') => {
            if let Some(id) = current {
                app.dispatch(Command::MoveTaskDown(id.clone()), now);
                follow_task(view, app, &id);
            }
        }
        KeyCode::Char('K') => {
            if let Some(id) = current {
                app.dispatch(Command::MoveTaskUp(id.clone()), now);
                follow_task(view, app, &id);
            }
        }
        KeyCode::Enter => {
            if let Some(id) = current {
                if app.tasks().selected_task_id() == Some(id.as_str()) {
                    app.dispatch(Command::ClearSelection, now);
                } else {
                    app.dispatch(Command::SelectTask(id), now);
                }
            }
        }
        KeyCode::Char(' ') => {
            if let Some(id) = current {
                app.dispatch(Command::ToggleTask(id), now);
                view.clamp_cursor(app);
            }
        }
        KeyCode::Char('d') => {
            if current.is_some() {
                view.task_mode = TaskMode::ConfirmingDelete;
            }
        }
        KeyCode::Char('c') => {
            app.dispatch(Command::ToggleHideCompleted, now);
            view.clamp_cursor(app);
        }
        _ => {}
    }
    false
}

fn handle_settings_view(key: KeyEvent, app: &mut App, view: &mut ViewState, now: DateTime<Local>) -> bool {
    let settings = app.settings().clone();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('d') => view.view = View::Timer,
        KeyCode::Down | KeyCode::Char('j') => view.settings_field = view.settings_field.next(),
        KeyCode::Up | KeyCode::Char('k') => view.settings_field = view.settings_field.prev(),
        KeyCode::Left | KeyCode::Char('h') => match view.settings_field {
            SettingsField::WorkMinutes => {
                app.dispatch(Command::SetWorkMinutes(settings.work_minutes().saturating_sub(1)), now);
            }
            SettingsField::BreakMinutes => {
                app.dispatch(Command::SetBreakMinutes(settings.break_minutes().saturating_sub(1)), now);
            }
            SettingsField::Preset => view.preset = view.preset.prev(),
            SettingsField::DarkMode => {}
        },
        KeyCode::Right | KeyCode::Char('l') => match view.settings_field {
            SettingsField::WorkMinutes => {
                app.dispatch(Command::SetWorkMinutes(settings.work_minutes() + 1), now);
            }
            SettingsField::BreakMinutes => {
                app.dispatch(Command::SetBreakMinutes(settings.break_minutes() + 1), now);
            }
            SettingsField::Preset => view.preset = view.preset.next(),
            SettingsField::DarkMode => {}
        },
        KeyCode::Enter if view.settings_field == SettingsField::Preset => {
            app.dispatch(Command::ApplyPreset(view.preset), now);
        }
        KeyCode::Char(' ') if view.settings_field == SettingsField::DarkMode => {
            app.dispatch(Command::ToggleDarkMode, now);
        }
        _ => {}
    }
    false
}

fn handle_stats_view(key: KeyEvent, app: &mut App, view: &mut ViewState, now: DateTime<Local>) -> bool {
    match key.code {
        KeyCode::Tab => {
            app.dispatch(Command::ToggleChartMode, now);
            false
        }
        _ => handle_main_view(key, app, view, now),
    }
}

fn handle_main_view(key: KeyEvent, app: &mut App, view: &mut ViewState, now: DateTime<Local>) -> bool {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        if view.view == View::Timer && !view.focus_mode {
            return true;
        }
        view.view = View::Timer;
        view.focus_mode = false;
        return false;
    }

    if matches!(key.code, KeyCode::Char('m') | KeyCode::Char('M')) {
        view.focus_mode = !view.focus_mode;
        return false;
    }

    match key.code {
        KeyCode::Char(' ') => app.dispatch(Command::ToggleStartPause, now),
        KeyCode::Char('r') => app.dispatch(Command::Reset, now),
        KeyCode::Char('x') => app.dispatch(Command::ToggleDarkMode, now),
        _ if view.focus_mode => {}
        KeyCode::Char('t') => {
            view.view = View::Tasks;
            view.task_mode = TaskMode::Browsing;
            view.clamp_cursor(app);
        }
        KeyCode::Char('d') => view.view = View::Settings,
        KeyCode::Char('s') => {
            view.view = if view.view == View::Stats { View::Timer } else { View::Stats };
        }
        KeyCode::Char('h') | KeyCode::Char('?') => {
            view.view = if view.view == View::Help { View::Timer } else { View::Help };
        }
        _ => {}
    }

    false
}

/// Keeps the cursor on `id` after the list order changed.
fn follow_task(view: &mut ViewState, app: &App, id: &str) {
    if let Some(pos) = app.tasks().visible().iter().position(|t| t.id == id) {
        view.cursor = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{notify::Notifier, store::Store, timer::Phase};
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Silent;

    impl Notifier for Silent {
        fn phase_completed(&self, _ended: Phase) {}
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 15, 10, 0, 0).unwrap()
    }

    fn setup(dir: &TempDir) -> (App, ViewState) {
        let store = Store::open(dir.path()).unwrap();
        (App::load(store, Box::new(Silent), now()), ViewState::default())
    }

    fn press(app: &mut App, view: &mut ViewState, code: KeyCode) -> bool {
        handle_input(KeyEvent::new(code, KeyModifiers::NONE), app, view, now())
    }

    fn type_text(app: &mut App, view: &mut ViewState, text: &str) {
        for c in text.chars() {
            press(app, view, KeyCode::Char(c));
        }
    }

    #[test]
    fn q_quits_from_timer_view_only() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut view) = setup(&dir);
        press(&mut app, &mut view, KeyCode::Char('s'));
        assert!(!press(&mut app, &mut view, KeyCode::Char('q')));
        assert_eq!(view.view, View::Timer);
        assert!(press(&mut app, &mut view, KeyCode::Char('q')));
    }

    #[test]
    fn add_form_creates_task_with_planned_count() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut view) = setup(&dir);

        press(&mut app, &mut view, KeyCode::Char('t'));
        press(&mut app, &mut view, KeyCode::Char('a'));
        type_text(&mut app, &mut view, "Write tests");
        press(&mut app, &mut view, KeyCode::Tab);
        press(&mut app, &mut view, KeyCode::Backspace);
        type_text(&mut app, &mut view, "3");
        press(&mut app, &mut view, KeyCode::Enter);

        let task = &app.tasks().tasks()[0];
        assert_eq!(task.text, "Write tests");
        assert_eq!(task.planned_pomodoros, 3);
        assert_eq!(view.task_mode, TaskMode::Browsing);
    }

    #[test]
    fn enter_toggles_active_task() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut view) = setup(&dir);
        app.dispatch(Command::AddTask { text: "Read".into(), planned: "1".into() }, now());
        let id = app.tasks().tasks()[0].id.clone();

        press(&mut app, &mut view, KeyCode::Char('t'));
        press(&mut app, &mut view, KeyCode::Enter);
        assert_eq!(app.tasks().selected_task_id(), Some(id.as_str()));
        press(&mut app, &mut view, KeyCode::Enter);
        assert_eq!(app.tasks().selected_task_id(), None);
    }

    #[test]
    fn shift_moves_follow_the_task_with_completed_hidden() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut view) = setup(&dir);
        for (i, text) in ["Alpha", "Beta", "Gamma"].iter().enumerate() {
            let at = now() + chrono::Duration::milliseconds(i as i64);
            app.dispatch(Command::AddTask { text: (*text).into(), planned: "1".into() }, at);
        }
        let beta = app.tasks().tasks()[1].id.clone();
        app.dispatch(Command::ToggleTask(beta), now());

        press(&mut app, &mut view, KeyCode::Char('t'));
        press(&mut app, &mut view, KeyCode::Char('c'));
        press(&mut app, &mut view, KeyCode::Char('J'));

        let visible: Vec<&str> = app.tasks().visible().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(visible, vec!["Gamma", "Alpha"]);
        assert_eq!(view.cursor, 1);
        let under_cursor = view.cursor_task_id(&app).unwrap();
        assert_eq!(app.tasks().get(&under_cursor).unwrap().text, "Alpha");
    }

    #[test]
    fn delete_needs_confirmation() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut view) = setup(&dir);
        app.dispatch(Command::AddTask { text: "Read".into(), planned: "1".into() }, now());

        press(&mut app, &mut view, KeyCode::Char('t'));
        press(&mut app, &mut view, KeyCode::Char('d'));
        press(&mut app, &mut view, KeyCode::Char('n'));
        assert_eq!(app.tasks().tasks().len(), 1);
        press(&mut app, &mut view, KeyCode::Char('d'));
        press(&mut app, &mut view, KeyCode::Char('y'));
        assert!(app.tasks().tasks().is_empty());
    }

    #[test]
    fn settings_arrows_adjust_sliders() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut view) = setup(&dir);

        press(&mut app, &mut view, KeyCode::Char('d'));
        press(&mut app, &mut view, KeyCode::Right);
        assert_eq!(app.settings().work_minutes(), 26);
        assert_eq!(app.timer().display_time(), "26:00");

        press(&mut app, &mut view, KeyCode::Down);
        press(&mut app, &mut view, KeyCode::Left);
        assert_eq!(app.settings().break_minutes(), 4);
    }

    #[test]
    fn focus_mode_blocks_navigation() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut view) = setup(&dir);
        press(&mut app, &mut view, KeyCode::Char('m'));
        press(&mut app, &mut view, KeyCode::Char('t'));
        assert_eq!(view.view, View::Timer);
        press(&mut app, &mut view, KeyCode::Char(' '));
        assert!(app.timer().is_running());
    }
}
