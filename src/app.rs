use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::{
    chart::{Chart, ChartMode, build_chart},
    config::{Preset, Settings},
    notify::Notifier,
    stats::{DailyStat, Statistics, StatsTracker},
    store::{self, Store, StoreError},
    tasks::{TaskList, parse_planned},
    timer::{Phase, TickHandle, TickOutcome, Timer},
};

/// How long the post-completion flash lasts.
pub const FLASH_MS: i64 = 2_400;

/// Every user action the UI can request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    ToggleStartPause,
    Reset,
    SetWorkMinutes(u32),
    SetBreakMinutes(u32),
    ApplyPreset(Preset),
    ToggleDarkMode,
    AddTask { text: String, planned: String },
    ToggleTask(String),
    DeleteTask(String),
    ReorderTasks(Vec<String>),
    MoveTaskUp(String),
    MoveTaskDown(String),
    SelectTask(String),
    ClearSelection,
    ToggleHideCompleted,
    ToggleChartMode,
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    settings: Settings,
    dark_mode: bool,
    timer: Timer,
    tick: Option<TickHandle>,
    tasks: TaskList,
    stats: StatsTracker,
    chart_mode: ChartMode,
    last_completed: Option<(Phase, i64)>,
    store: Store,
    notifier: Box<dyn Notifier>,
}

impl App {
    /// Restores everything from `store`, falling back to defaults for anything
    /// missing or corrupt, then runs the start-up rollover check.
    pub fn load(store: Store, notifier: Box<dyn Notifier>, now: DateTime<Local>) -> Self {
        let today = now.date_naive();

        let settings = store
            .load::<Settings>(store::SETTINGS_KEY)
            .map(Settings::sanitized)
            .unwrap_or_default();
        let tasks = store.load(store::TASKS_KEY).unwrap_or_default();
        let (stats, last_date) = match store.load::<Statistics>(store::STATS_KEY) {
            Some(stats) => (stats, store.load::<NaiveDate>(store::LAST_DATE_KEY)),
            None => (Statistics::seeded(today), Some(today)),
        };
        let dark_mode = store.load(store::DARK_MODE_KEY).unwrap_or(false);
        let count = store.load(store::POMODORO_COUNT_KEY).unwrap_or(0);

        let mut app = Self {
            timer: Timer::new(settings.work_time, settings.break_time, count),
            settings,
            dark_mode,
            tick: None,
            tasks: TaskList::new(tasks),
            stats: StatsTracker::new(stats, last_date),
            chart_mode: ChartMode::default(),
            last_completed: None,
            store,
            notifier,
        };

        app.check_date_rollover(now);
        app.persist();
        app
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn chart_mode(&self) -> ChartMode {
        self.chart_mode
    }

    pub fn chart(&self) -> Chart {
        build_chart(&self.stats.stats().weekly_data, self.chart_mode)
    }

    pub fn today(&self, now: DateTime<Local>) -> DailyStat {
        self.stats.today(now.date_naive())
    }

    pub fn active_task_text(&self) -> Option<&str> {
        let id = self.tasks.selected_task_id()?;
        self.tasks.get(id).map(|t| t.text.as_str())
    }

    /// The phase that just ended, while its completion flash is still showing.
    pub fn flash(&self, now: DateTime<Local>) -> Option<Phase> {
        let (phase, at) = self.last_completed?;
        (now.timestamp_millis() - at < FLASH_MS).then_some(phase)
    }

    pub fn dispatch(&mut self, command: Command, now: DateTime<Local>) {
        let now_ms = now.timestamp_millis();
        debug!(?command, "dispatch");

        match command {
            Command::Start => self.start(now_ms),
            Command::Pause => self.pause(now_ms),
            Command::ToggleStartPause => {
                if self.timer.is_running() {
                    self.pause(now_ms);
                } else {
                    self.start(now_ms);
                }
            }
            Command::Reset => {
                self.tick = None;
                self.timer.reset();
            }
            Command::SetWorkMinutes(minutes) => {
                self.settings.set_work_minutes(minutes);
                self.timer.set_work_secs(self.settings.work_time);
            }
            Command::SetBreakMinutes(minutes) => {
                self.settings.set_break_minutes(minutes);
                self.timer.set_break_secs(self.settings.break_time);
            }
            Command::ApplyPreset(preset) => {
                self.settings.apply_preset(preset);
                self.timer.set_work_secs(self.settings.work_time);
                self.timer.set_break_secs(self.settings.break_time);
            }
            Command::ToggleDarkMode => self.dark_mode = !self.dark_mode,
            Command::AddTask { text, planned } => {
                self.tasks.add(&text, parse_planned(&planned), now_ms);
            }
            Command::ToggleTask(id) => match self.tasks.toggle_complete(&id) {
                Some(true) => self.stats.record_task_completed(),
                Some(false) => self.stats.record_task_uncompleted(),
                None => {}
            },
            Command::DeleteTask(id) => {
                if let Some(task) = self.tasks.delete(&id) {
                    if task.completed {
                        self.stats.record_task_uncompleted();
                    }
                }
            }
            Command::ReorderTasks(ids) => self.tasks.reorder(&ids),
            Command::MoveTaskUp(id) => {
                self.tasks.move_up(&id);
            }
            Command::MoveTaskDown(id) => {
                self.tasks.move_down(&id);
            }
            Command::SelectTask(id) => {
                self.tasks.select(&id);
            }
            Command::ClearSelection => self.tasks.clear_selection(),
            Command::ToggleHideCompleted => self.tasks.toggle_hide_completed(),
            Command::ToggleChartMode => self.chart_mode = self.chart_mode.toggle(),
        }

        self.persist();
    }

    /// Driven by the ~100 ms loop tick. Does nothing unless a run is active.
    pub fn tick(&mut self, now: DateTime<Local>) {
        let Some(handle) = self.tick else {
            return;
        };

        match self.timer.tick(handle, now.timestamp_millis()) {
            TickOutcome::Running { .. } => {}
            TickOutcome::Stale => self.tick = None,
            TickOutcome::Completed(ended) => {
                self.tick = None;
                self.complete_phase(ended, now);
            }
        }
    }

    /// Driven on start-up and every minute, independent of the timer tick.
    pub fn check_date_rollover(&mut self, now: DateTime<Local>) -> bool {
        let changed = self.stats.check_date_rollover(now.date_naive());
        if changed {
            self.persist();
        }
        changed
    }

    fn start(&mut self, now_ms: i64) {
        if let Some(handle) = self.timer.start(now_ms) {
            self.tick = Some(handle);
        }
    }

    fn pause(&mut self, now_ms: i64) {
        self.timer.pause(now_ms);
        self.tick = None;
    }

    fn complete_phase(&mut self, ended: Phase, now: DateTime<Local>) {
        info!(phase = ?ended, count = self.timer.completed_pomodoros(), "phase completed");

        if ended == Phase::Work {
            let minutes = self.settings.work_time as f64 / 60.0;
            self.stats.record_work_phase(now.date_naive(), minutes);
            if let Some(task) = self.tasks.increment_active_pomodoro() {
                debug!(id = %task.id, done = task.completed_pomodoros, "active task credited");
            }
        }

        self.last_completed = Some((ended, now.timestamp_millis()));
        self.notifier.phase_completed(ended);
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.try_persist() {
            warn!(%err, "failed to persist state");
        }
    }

    fn try_persist(&self) -> Result<(), StoreError> {
        self.store.save(store::SETTINGS_KEY, &self.settings)?;
        self.store.save(store::TASKS_KEY, &self.tasks.tasks())?;
        self.store.save(store::STATS_KEY, self.stats.stats())?;
        if let Some(date) = self.stats.last_date() {
            self.store.save(store::LAST_DATE_KEY, &date)?;
        }
        self.store.save(store::DARK_MODE_KEY, &self.dark_mode)?;
        self.store.save(store::POMODORO_COUNT_KEY, &self.timer.completed_pomodoros())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::{cell::RefCell, rc::Rc};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Phase>>>);

    impl Notifier for Recorder {
        fn phase_completed(&self, ended: Phase) {
            self.0.borrow_mut().push(ended);
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 15, h, m, s).unwrap()
    }

    fn app(dir: &TempDir) -> (App, Recorder) {
        let recorder = Recorder::default();
        let store = Store::open(dir.path()).unwrap();
        let app = App::load(store, Box::new(recorder.clone()), at(9, 0, 0));
        (app, recorder)
    }

    #[test]
    fn toggle_starts_then_pauses() {
        let dir = TempDir::new().unwrap();
        let (mut app, _) = app(&dir);
        let t0 = at(9, 0, 0);

        app.dispatch(Command::ToggleStartPause, t0);
        assert!(app.timer().is_running());
        app.dispatch(Command::ToggleStartPause, t0 + Duration::seconds(10));
        assert!(!app.timer().is_running());
        assert_eq!(app.timer().paused_remaining_secs(), Some(1490));
    }

    #[test]
    fn tick_after_pause_does_nothing() {
        let dir = TempDir::new().unwrap();
        let (mut app, recorder) = app(&dir);
        let t0 = at(9, 0, 0);

        app.dispatch(Command::Start, t0);
        app.dispatch(Command::Pause, t0 + Duration::seconds(1));
        app.tick(t0 + Duration::hours(1));
        assert!(recorder.0.borrow().is_empty());
        assert_eq!(app.timer().completed_pomodoros(), 0);
    }

    #[test]
    fn break_completion_does_not_touch_stats() {
        let dir = TempDir::new().unwrap();
        let (mut app, recorder) = app(&dir);
        let t0 = at(9, 0, 0);

        app.dispatch(Command::Start, t0);
        app.tick(t0 + Duration::minutes(25));
        app.dispatch(Command::Start, t0 + Duration::minutes(26));
        app.tick(t0 + Duration::minutes(31));

        assert_eq!(*recorder.0.borrow(), vec![Phase::Work, Phase::Break]);
        assert_eq!(app.today(t0).pomodoros, 1);
        assert_eq!(app.timer().phase(), Phase::Work);
    }

    #[test]
    fn flash_shows_briefly_after_completion() {
        let dir = TempDir::new().unwrap();
        let (mut app, _) = app(&dir);
        let t0 = at(9, 0, 0);

        app.dispatch(Command::Start, t0);
        let done = t0 + Duration::minutes(25);
        app.tick(done);
        assert_eq!(app.flash(done + Duration::milliseconds(500)), Some(Phase::Work));
        assert_eq!(app.flash(done + Duration::seconds(5)), None);
    }

    #[test]
    fn toggling_task_adjusts_completed_counter() {
        let dir = TempDir::new().unwrap();
        let (mut app, _) = app(&dir);
        let t0 = at(9, 0, 0);

        app.dispatch(Command::AddTask { text: "Email".into(), planned: "x".into() }, t0);
        let id = app.tasks().tasks()[0].id.clone();
        assert_eq!(app.tasks().tasks()[0].planned_pomodoros, 1);

        app.dispatch(Command::ToggleTask(id.clone()), t0);
        assert_eq!(app.stats().stats().completed_tasks, 1);
        app.dispatch(Command::ToggleTask(id), t0);
        assert_eq!(app.stats().stats().completed_tasks, 0);
    }

    #[test]
    fn presets_update_idle_display() {
        let dir = TempDir::new().unwrap();
        let (mut app, _) = app(&dir);
        app.dispatch(Command::ApplyPreset(Preset::Long), at(9, 0, 0));
        assert_eq!(app.timer().display_time(), "50:00");
        assert_eq!(app.settings().break_minutes(), 10);
    }

    #[test]
    fn corrupt_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        for key in [store::SETTINGS_KEY, store::TASKS_KEY, store::STATS_KEY] {
            std::fs::write(dir.path().join(format!("{}.json", key)), "garbage").unwrap();
        }
        let (app, _) = app(&dir);

        assert_eq!(app.settings(), &Settings::default());
        assert!(app.tasks().tasks().is_empty());
        assert_eq!(app.stats().stats().weekly_data.len(), 1);
        assert_eq!(app.today(at(9, 0, 0)).pomodoros, 0);
    }
}
