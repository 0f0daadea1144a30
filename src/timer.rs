use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Phase & Status
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Work => "🎯 FOCUS TIME",
            Self::Break => "☕ BREAK",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// Identifies one run of the countdown. Ticks carrying an older handle are ignored,
/// so a late tick after pause/reset/expiry can never process a phase twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Stale,
    Running { remaining_secs: u64 },
    Completed(Phase),
}

// ============================================================================
// Timer Engine
// ============================================================================

/// Countdown anchored on an absolute end timestamp (epoch millis) rather than a
/// decrementing counter, so tick jitter and suspended loops never drift it.
#[derive(Debug, Clone)]
pub struct Timer {
    work_secs: u64,
    break_secs: u64,
    phase: Phase,
    running: bool,
    target_end_ms: Option<i64>,
    paused_remaining_secs: Option<u64>,
    current_secs: u64,
    progress: f64,
    completed_pomodoros: u32,
    generation: u64,
}

impl Timer {
    pub fn new(work_secs: u64, break_secs: u64, completed_pomodoros: u32) -> Self {
        let work_secs = work_secs.max(1);
        Self {
            work_secs,
            break_secs: break_secs.max(1),
            phase: Phase::Work,
            running: false,
            target_end_ms: None,
            paused_remaining_secs: None,
            current_secs: work_secs,
            progress: 0.0,
            completed_pomodoros,
            generation: 0,
        }
    }

    pub fn status(&self) -> TimerStatus {
        if self.running {
            TimerStatus::Running
        } else if self.paused_remaining_secs.is_some() {
            TimerStatus::Paused
        } else {
            TimerStatus::Idle
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn work_secs(&self) -> u64 {
        self.work_secs
    }

    pub fn break_secs(&self) -> u64 {
        self.break_secs
    }

    pub fn current_secs(&self) -> u64 {
        self.current_secs
    }

    pub fn target_end_ms(&self) -> Option<i64> {
        self.target_end_ms
    }

    pub fn paused_remaining_secs(&self) -> Option<u64> {
        self.paused_remaining_secs
    }

    pub fn completed_pomodoros(&self) -> u32 {
        self.completed_pomodoros
    }

    /// Fraction of the current phase already elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn phase_duration(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_secs,
            Phase::Break => self.break_secs,
        }
    }

    pub fn display_time(&self) -> String {
        format_clock(self.current_secs)
    }

    pub fn status_label(&self) -> &'static str {
        match (self.status(), self.phase) {
            (TimerStatus::Running, Phase::Work) => "🔥 WORKING",
            (TimerStatus::Running, Phase::Break) => "☕ ON BREAK",
            (TimerStatus::Paused, Phase::Work) => "⏸  PAUSED (work)",
            (TimerStatus::Paused, Phase::Break) => "⏸  PAUSED (break)",
            (TimerStatus::Idle, Phase::Work) => "WORK",
            (TimerStatus::Idle, Phase::Break) => "BREAK",
        }
    }

    /// Starts fresh from idle or resumes a paused run. Returns `None` when already running.
    pub fn start(&mut self, now_ms: i64) -> Option<TickHandle> {
        if self.running {
            return None;
        }

        let remaining = match self.paused_remaining_secs.take() {
            Some(secs) => secs,
            None => {
                self.current_secs = self.phase_duration(self.phase);
                self.progress = 0.0;
                self.current_secs
            }
        };

        self.target_end_ms = Some(now_ms + remaining as i64 * 1000);
        self.running = true;
        self.generation += 1;
        debug!(phase = ?self.phase, remaining, "timer started");
        Some(TickHandle(self.generation))
    }

    pub fn pause(&mut self, now_ms: i64) -> bool {
        if !self.running {
            return false;
        }

        let target = self.target_end_ms.take().unwrap_or(now_ms);
        let secs = ceil_secs(target - now_ms);
        self.paused_remaining_secs = Some(secs);
        self.current_secs = secs;
        self.progress = elapsed_fraction(secs, self.phase_duration(self.phase));
        self.running = false;
        self.invalidate();
        debug!(phase = ?self.phase, remaining = secs, "timer paused");
        true
    }

    pub fn reset(&mut self) {
        self.invalidate();
        self.running = false;
        self.phase = Phase::Work;
        self.target_end_ms = None;
        self.paused_remaining_secs = None;
        self.current_secs = self.work_secs;
        self.progress = 0.0;
    }

    pub fn tick(&mut self, handle: TickHandle, now_ms: i64) -> TickOutcome {
        if !self.running || handle.0 != self.generation {
            return TickOutcome::Stale;
        }
        let Some(target) = self.target_end_ms else {
            return TickOutcome::Stale;
        };

        let remaining_ms = target - now_ms;
        if remaining_ms <= 0 {
            return TickOutcome::Completed(self.expire());
        }

        self.current_secs = ceil_secs(remaining_ms);
        self.progress = elapsed_fraction(self.current_secs, self.phase_duration(self.phase));
        TickOutcome::Running { remaining_secs: self.current_secs }
    }

    /// Takes effect on the display only while idle in the work phase.
    pub fn set_work_secs(&mut self, secs: u64) {
        self.work_secs = secs.max(1);
        if self.status() == TimerStatus::Idle && self.phase == Phase::Work {
            self.current_secs = self.work_secs;
            self.progress = 0.0;
        }
    }

    pub fn set_break_secs(&mut self, secs: u64) {
        self.break_secs = secs.max(1);
        if self.status() == TimerStatus::Idle && self.phase == Phase::Break {
            self.current_secs = self.break_secs;
            self.progress = 0.0;
        }
    }

    fn expire(&mut self) -> Phase {
        let ended = self.phase;
        self.running = false;
        self.target_end_ms = None;
        self.paused_remaining_secs = None;
        self.invalidate();

        if ended == Phase::Work {
            self.completed_pomodoros += 1;
        }

        self.phase = ended.opposite();
        self.current_secs = self.phase_duration(self.phase);
        self.progress = 1.0;
        ended
    }

    fn invalidate(&mut self) {
        self.generation += 1;
    }
}

pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn ceil_secs(ms: i64) -> u64 {
    (ms.max(0) as u64).div_ceil(1000)
}

fn elapsed_fraction(remaining: u64, total: u64) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (1.0 - remaining as f64 / total as f64).clamp(0.0, 1.0)
}
