use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Canonical calendar-day key, shared by the rollover check and the weekly entries.
pub const DAY_KEY_FMT: &str = "%Y-%m-%d";
pub const WINDOW_DAYS: usize = 7;

pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FMT).to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: NaiveDate,
    pub pomodoros: u32,
    pub focus_time: f64,
}

impl DailyStat {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            pomodoros: 0,
            focus_time: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub completed_tasks: u32,
    /// Newest first, at most `WINDOW_DAYS` entries, one per date.
    pub weekly_data: Vec<DailyStat>,
}

impl Statistics {
    pub fn seeded(today: NaiveDate) -> Self {
        Self {
            completed_tasks: 0,
            weekly_data: vec![DailyStat::empty(today)],
        }
    }
}

// ============================================================================
// Statistics Tracker
// ============================================================================

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Statistics,
    last_date: Option<NaiveDate>,
}

impl StatsTracker {
    /// Stored windows are normalized: newest first, one entry per date, at most
    /// `WINDOW_DAYS` long. Entries sharing a date are merged.
    pub fn new(mut stats: Statistics, last_date: Option<NaiveDate>) -> Self {
        stats.weekly_data = normalize_window(std::mem::take(&mut stats.weekly_data));
        Self { stats, last_date }
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    pub fn today(&self, today: NaiveDate) -> DailyStat {
        self.stats
            .weekly_data
            .iter()
            .find(|e| e.date == today)
            .cloned()
            .unwrap_or_else(|| DailyStat::empty(today))
    }

    pub fn record_work_phase(&mut self, today: NaiveDate, work_minutes: f64) -> Option<&DailyStat> {
        let entry = self.ensure_day(today)?;
        entry.pomodoros += 1;
        entry.focus_time += work_minutes;
        Some(entry)
    }

    /// Makes sure a (possibly zero) entry exists for `today` once the calendar day
    /// changes. Returns whether anything changed.
    pub fn check_date_rollover(&mut self, today: NaiveDate) -> bool {
        if self.last_date == Some(today) {
            return false;
        }

        self.ensure_day(today);
        self.last_date = Some(today);
        info!(today = %day_key(today), "day rollover");
        true
    }

    pub fn record_task_completed(&mut self) {
        self.stats.completed_tasks += 1;
    }

    pub fn record_task_uncompleted(&mut self) {
        self.stats.completed_tasks = self.stats.completed_tasks.saturating_sub(1);
    }

    /// Returns `None` only when `today` is older than a full window, which
    /// happens if the clock went back more than a week.
    fn ensure_day(&mut self, today: NaiveDate) -> Option<&mut DailyStat> {
        let window = &mut self.stats.weekly_data;
        let idx = match window.iter().position(|e| e.date <= today) {
            Some(idx) if window[idx].date == today => idx,
            Some(idx) => {
                window.insert(idx, DailyStat::empty(today));
                idx
            }
            None => {
                window.push(DailyStat::empty(today));
                window.len() - 1
            }
        };
        window.truncate(WINDOW_DAYS);
        window.get_mut(idx)
    }
}

fn normalize_window(mut entries: Vec<DailyStat>) -> Vec<DailyStat> {
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    let mut window: Vec<DailyStat> = Vec::with_capacity(entries.len());
    for entry in entries {
        match window.last_mut() {
            Some(prev) if prev.date == entry.date => {
                prev.pomodoros += entry.pomodoros;
                prev.focus_time += entry.focus_time;
            }
            _ => window.push(entry),
        }
    }
    window.truncate(WINDOW_DAYS);
    window
}
