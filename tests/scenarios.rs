use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use flowstate::{
    app::{App, Command},
    notify::Notifier,
    store::Store,
    timer::{Phase, TimerStatus},
};
use std::{cell::RefCell, rc::Rc};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Phase>>>);

impl Notifier for Recorder {
    fn phase_completed(&self, ended: Phase) {
        self.0.borrow_mut().push(ended);
    }
}

fn at(day: u32, h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, day, h, m, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
}

fn load(dir: &TempDir, now: DateTime<Local>) -> (App, Recorder) {
    let recorder = Recorder::default();
    let store = Store::open(dir.path()).unwrap();
    (App::load(store, Box::new(recorder.clone()), now), recorder)
}

fn add_task(app: &mut App, text: &str, planned: &str, now: DateTime<Local>) -> String {
    app.dispatch(Command::AddTask { text: text.into(), planned: planned.into() }, now);
    app.tasks().tasks().last().unwrap().id.clone()
}

/// Runs one full phase from `now`, ticking every 100 ms. Returns the end time.
fn run_phase(app: &mut App, now: DateTime<Local>) -> DateTime<Local> {
    app.dispatch(Command::Start, now);
    let secs = app.timer().phase_duration(app.timer().phase()) as i64;
    let mut t = now;
    while app.timer().is_running() {
        t += Duration::milliseconds(100);
        app.tick(t);
        assert!(t - now <= Duration::seconds(secs + 1));
    }
    t
}

#[test]
fn work_expiry_feeds_stats_and_switches_to_break() {
    let dir = TempDir::new().unwrap();
    let t0 = at(15, 9, 0);
    let (mut app, recorder) = load(&dir, t0);
    assert_eq!(app.settings().work_time, 1500);
    assert_eq!(app.settings().break_time, 300);
    let focus_before = app.today(t0).focus_time;

    app.dispatch(Command::Start, t0);
    app.tick(t0 + Duration::seconds(1500));

    assert_eq!(app.timer().phase(), Phase::Break);
    assert_eq!(app.timer().status(), TimerStatus::Idle);
    assert_eq!(app.timer().completed_pomodoros(), 1);
    assert_eq!(app.today(t0).pomodoros, 1);
    assert_eq!(app.today(t0).focus_time - focus_before, 25.0);
    assert_eq!(*recorder.0.borrow(), vec![Phase::Work]);
}

#[test]
fn ticking_a_short_phase_completes_exactly_once() {
    let dir = TempDir::new().unwrap();
    let t0 = at(15, 9, 0);
    let (mut app, recorder) = load(&dir, t0);
    app.dispatch(Command::SetWorkMinutes(1), t0);

    let end = run_phase(&mut app, t0);
    for step in 1..=20 {
        app.tick(end + Duration::milliseconds(step * 100));
    }

    assert_eq!(recorder.0.borrow().len(), 1);
    assert_eq!(app.timer().completed_pomodoros(), 1);
    assert_eq!(app.timer().display_time(), "05:00");
}

#[test]
fn active_task_collects_pomodoros() {
    let dir = TempDir::new().unwrap();
    let mut t = at(15, 9, 0);
    let (mut app, _) = load(&dir, t);
    let active = add_task(&mut app, "Write report", "2", t);
    let idle = add_task(&mut app, "Inbox zero", "1", t);
    app.dispatch(Command::SelectTask(active.clone()), t);

    t = run_phase(&mut app, t);
    assert_eq!(app.tasks().get(&active).unwrap().completed_pomodoros, 1);

    // Break phase credits nothing.
    t = run_phase(&mut app, t);
    assert_eq!(app.tasks().get(&active).unwrap().completed_pomodoros, 1);

    run_phase(&mut app, t);
    assert_eq!(app.tasks().get(&active).unwrap().completed_pomodoros, 2);
    assert_eq!(app.tasks().get(&idle).unwrap().completed_pomodoros, 0);
}

#[test]
fn deleting_completed_task_decrements_counter() {
    let dir = TempDir::new().unwrap();
    let t = at(15, 9, 0);
    let (mut app, _) = load(&dir, t);
    let done = add_task(&mut app, "Done", "1", t);
    let open = add_task(&mut app, "Open", "1", t);

    app.dispatch(Command::ToggleTask(done.clone()), t);
    assert_eq!(app.stats().stats().completed_tasks, 1);

    app.dispatch(Command::DeleteTask(open), t);
    assert_eq!(app.stats().stats().completed_tasks, 1);

    app.dispatch(Command::DeleteTask(done), t);
    assert_eq!(app.stats().stats().completed_tasks, 0);
}

#[test]
fn reorder_swaps_and_ignores_unknown_ids() {
    let dir = TempDir::new().unwrap();
    let t = at(15, 9, 0);
    let (mut app, _) = load(&dir, t);
    let a = add_task(&mut app, "A", "1", t);
    let b = add_task(&mut app, "B", "1", t + Duration::milliseconds(1));

    app.dispatch(Command::ReorderTasks(vec![b.clone(), "nope".into(), a.clone()]), t);
    let order: Vec<&str> = app.tasks().tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(order, vec![b.as_str(), a.as_str()]);
}

#[test]
fn midnight_rollover_adds_zero_entry_once() {
    let dir = TempDir::new().unwrap();
    let (mut app, _) = load(&dir, at(14, 23, 0));
    assert!(!app.check_date_rollover(at(14, 23, 59)));

    assert!(app.check_date_rollover(at(15, 0, 1)));
    assert!(!app.check_date_rollover(at(15, 0, 2)));

    let window = &app.stats().stats().weekly_data;
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].date, date(15));
    assert_eq!(window[0].pomodoros, 0);
    assert_eq!(app.stats().last_date(), Some(date(15)));
}

#[test]
fn rollover_between_ticks_leaves_running_phase_alone() {
    let dir = TempDir::new().unwrap();
    let t0 = at(14, 23, 50);
    let (mut app, _) = load(&dir, t0);

    app.dispatch(Command::Start, t0);
    app.tick(t0 + Duration::minutes(5));
    app.check_date_rollover(at(15, 0, 0));
    assert!(app.timer().is_running());

    app.tick(t0 + Duration::minutes(25));
    assert_eq!(app.today(at(15, 0, 15)).pomodoros, 1);
    assert_eq!(app.today(at(14, 23, 0)).pomodoros, 0);
    assert_eq!(app.stats().stats().weekly_data.len(), 2);
}

#[test]
fn window_never_exceeds_seven_days() {
    let dir = TempDir::new().unwrap();
    let (mut app, _) = load(&dir, at(1, 8, 0));
    for day in 2..=12 {
        let t = at(day, 8, 0);
        app.check_date_rollover(t);
        app.dispatch(Command::Start, t);
        app.tick(t + Duration::minutes(25));
        app.dispatch(Command::Reset, t + Duration::minutes(26));
    }

    let window = &app.stats().stats().weekly_data;
    assert_eq!(window.len(), 7);
    assert_eq!(window[0].date, date(12));
    assert_eq!(window[6].date, date(6));
    assert!(window.iter().all(|e| e.pomodoros == 1));
    assert_eq!(app.chart().bars.len(), 7);
}

#[test]
fn pause_and_resume_preserve_remaining_time() {
    let dir = TempDir::new().unwrap();
    let t0 = at(15, 9, 0);
    let (mut app, recorder) = load(&dir, t0);

    app.dispatch(Command::Start, t0);
    app.tick(t0 + Duration::milliseconds(60_300));
    app.dispatch(Command::Pause, t0 + Duration::milliseconds(60_300));
    assert_eq!(app.timer().display_time(), "24:00");

    // Long idle gap while paused.
    let resume = t0 + Duration::hours(2);
    app.dispatch(Command::Start, resume);
    assert_eq!(app.timer().target_end_ms(), Some(resume.timestamp_millis() + 1_440_000));

    app.tick(resume + Duration::seconds(1_439));
    assert!(recorder.0.borrow().is_empty());
    app.tick(resume + Duration::seconds(1_440));
    assert_eq!(*recorder.0.borrow(), vec![Phase::Work]);
}

#[test]
fn changing_work_time_mid_run_waits_for_next_phase() {
    let dir = TempDir::new().unwrap();
    let t0 = at(15, 9, 0);
    let (mut app, _) = load(&dir, t0);

    app.dispatch(Command::Start, t0);
    app.dispatch(Command::SetWorkMinutes(10), t0 + Duration::seconds(1));
    app.tick(t0 + Duration::seconds(2));
    assert_eq!(app.timer().display_time(), "24:58");

    app.dispatch(Command::Reset, t0 + Duration::seconds(3));
    assert_eq!(app.timer().display_time(), "10:00");
}
