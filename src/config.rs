use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const WORK_MINUTES_RANGE: (u32, u32) = (1, 60);
pub const BREAK_MINUTES_RANGE: (u32, u32) = (1, 30);

/// Timer durations, stored in seconds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub work_time: u64,
    pub break_time: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_time: DEFAULT_WORK_MINUTES as u64 * 60,
            break_time: DEFAULT_BREAK_MINUTES as u64 * 60,
        }
    }
}

impl Settings {
    pub fn work_minutes(&self) -> u32 {
        (self.work_time / 60) as u32
    }

    pub fn break_minutes(&self) -> u32 {
        (self.break_time / 60) as u32
    }

    pub fn set_work_minutes(&mut self, minutes: u32) {
        self.work_time = clamp_minutes(minutes, WORK_MINUTES_RANGE) as u64 * 60;
    }

    pub fn set_break_minutes(&mut self, minutes: u32) {
        self.break_time = clamp_minutes(minutes, BREAK_MINUTES_RANGE) as u64 * 60;
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        let (work, rest) = preset.minutes();
        self.set_work_minutes(work);
        self.set_break_minutes(rest);
    }

    /// Stored values are trusted only as far as the slider bounds allow.
    pub fn sanitized(mut self) -> Self {
        self.set_work_minutes(self.work_minutes());
        self.set_break_minutes(self.break_minutes());
        self
    }
}

fn clamp_minutes(minutes: u32, (lo, hi): (u32, u32)) -> u32 {
    minutes.clamp(lo, hi)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Classic,
    Long,
    Short,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Classic, Preset::Long, Preset::Short];

    /// (work, break) in minutes
    pub fn minutes(&self) -> (u32, u32) {
        match self {
            Self::Classic => (25, 5),
            Self::Long => (50, 10),
            Self::Short => (15, 3),
        }
    }

    pub fn label(&self) -> String {
        let (work, rest) = self.minutes();
        format!("{}/{}", work, rest)
    }

    pub fn next(self) -> Self {
        match self {
            Self::Classic => Self::Long,
            Self::Long => Self::Short,
            Self::Short => Self::Classic,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Classic => Self::Short,
            Self::Long => Self::Classic,
            Self::Short => Self::Long,
        }
    }
}

/// Parses `25m`, `1h30m`, `90s`, or a bare number of minutes. Returns minutes.
pub fn parse_duration(s: &str) -> Result<f64, String> {
    let s = s.trim().to_lowercase();
    let mut total = 0.0;
    let mut num = String::new();

    for c in s.chars() {
        match c {
            '0'..='9' | '.' => num.push(c),
            'h' => { total += num.parse::<f64>().map_err(|_| "Invalid hours")? * 60.0; num.clear(); }
            'm' => { total += num.parse::<f64>().map_err(|_| "Invalid minutes")?; num.clear(); }
            's' => { total += num.parse::<f64>().map_err(|_| "Invalid seconds")? / 60.0; num.clear(); }
            _ => return Err("Invalid format".into()),
        }
    }

    if !num.is_empty() {
        total += num.parse::<f64>().map_err(|_| "Invalid minutes")?;
    }

    if total > 0.0 { Ok(total) } else { Err("Duration must be > 0".into()) }
}
