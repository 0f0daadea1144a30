use chrono::{Datelike, NaiveDate};

use crate::stats::{DailyStat, WINDOW_DAYS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChartMode {
    #[default]
    Pomodoros,
    FocusMinutes,
}

impl ChartMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Pomodoros => Self::FocusMinutes,
            Self::FocusMinutes => Self::Pomodoros,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Pomodoros => "Pomodoros per day",
            Self::FocusMinutes => "Focus minutes per day",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartBar {
    pub date: NaiveDate,
    pub label: String,
    pub weekday: &'static str,
    pub value: f64,
    /// Bar height relative to the tallest bar, in `[0, 1]`.
    pub ratio: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub mode: ChartMode,
    pub max: f64,
    pub bars: Vec<ChartBar>,
}

impl Chart {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Bars for the newest `WINDOW_DAYS` entries, oldest on the left.
pub fn build_chart(window: &[DailyStat], mode: ChartMode) -> Chart {
    let mut entries: Vec<&DailyStat> = window.iter().collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries.truncate(WINDOW_DAYS);
    entries.reverse();

    let value_of = |e: &DailyStat| match mode {
        ChartMode::Pomodoros => e.pomodoros as f64,
        ChartMode::FocusMinutes => e.focus_time,
    };

    let max = entries.iter().map(|e| value_of(e)).fold(1.0, f64::max);

    let bars = entries
        .into_iter()
        .map(|e| {
            let value = value_of(e);
            ChartBar {
                date: e.date,
                label: e.date.format("%m/%d").to_string(),
                weekday: weekday_short(e.date),
                value,
                ratio: value / max,
            }
        })
        .collect();

    Chart { mode, max, bars }
}

fn weekday_short(date: NaiveDate) -> &'static str {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    DAYS[date.weekday().num_days_from_monday() as usize]
}
