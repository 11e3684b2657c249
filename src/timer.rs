/// Pomodoro timer state machine for focus mode

use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_SESSIONS_BEFORE_LONG_BREAK: u32 = 4;

/// User-configurable durations, stored under `timerSettings`.
///
/// Durations are in minutes. Missing fields fall back to the defaults so a
/// partially written record still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    pub work_duration: u32,
    pub break_duration: u32,
    pub long_break_duration: u32,
    pub sessions_before_long_break: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        TimerSettings {
            work_duration: DEFAULT_WORK_MINUTES,
            break_duration: DEFAULT_BREAK_MINUTES,
            long_break_duration: DEFAULT_LONG_BREAK_MINUTES,
            sessions_before_long_break: DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
        }
    }
}

impl TimerSettings {
    /// Clamp every field to at least 1
    pub fn sanitized(self) -> Self {
        TimerSettings {
            work_duration: self.work_duration.max(1),
            break_duration: self.break_duration.max(1),
            long_break_duration: self.long_break_duration.max(1),
            sessions_before_long_break: self.sessions_before_long_break.max(1),
        }
    }

    pub fn work_seconds(&self) -> u32 {
        minutes_to_seconds(self.work_duration)
    }

    /// Length of the break that follows the `session_count`-th completed work phase
    pub fn break_seconds_after(&self, session_count: u32) -> u32 {
        let every = self.sessions_before_long_break.max(1);
        if session_count % every == 0 {
            minutes_to_seconds(self.long_break_duration)
        } else {
            minutes_to_seconds(self.break_duration)
        }
    }
}

fn minutes_to_seconds(minutes: u32) -> u32 {
    minutes.max(1).saturating_mul(60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Focus Time",
            Phase::Break => "Break Time",
        }
    }
}

/// Persisted timer record, stored under `timerState`.
///
/// `last_updated` is wall-clock milliseconds since the epoch at the moment
/// the record was written. It is what lets [`reconcile`] recover the elapsed
/// time after the dashboard was closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_running: bool,
    pub time_left: u32,
    pub is_break: bool,
    pub session_count: u32,
    pub last_updated: f64,
}

impl TimerState {
    /// Work-Stopped with a full work phase ahead
    pub fn fresh(settings: &TimerSettings, now_ms: f64) -> Self {
        TimerState {
            is_running: false,
            time_left: settings.work_seconds(),
            is_break: false,
            session_count: 0,
            last_updated: now_ms,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_break { Phase::Break } else { Phase::Work }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::fresh(&TimerSettings::default(), 0.0)
    }
}

/// Emitted once when a phase runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseComplete {
    pub ended: Phase,
    pub session_count: u32,
    pub next_time_left: u32,
}

impl PhaseComplete {
    /// Announces the phase that starts next
    pub fn message(&self) -> &'static str {
        match self.ended {
            Phase::Work => "Time for a break!",
            Phase::Break => "Time to work!",
        }
    }
}

/// Rebuild the timer after the dashboard was unmounted.
///
/// A stopped timer comes back verbatim. A running one loses the whole
/// seconds that passed since `last_updated`; if that exhausts the phase the
/// timer falls back to Work-Stopped with a full work phase, keeping
/// `session_count`, instead of replaying the phases it missed.
pub fn reconcile(stored: Option<&TimerState>, settings: &TimerSettings, now_ms: f64) -> TimerState {
    let Some(stored) = stored else {
        return TimerState::fresh(settings, now_ms);
    };

    if !stored.is_running {
        return TimerState {
            last_updated: now_ms,
            ..stored.clone()
        };
    }

    let elapsed = elapsed_seconds(stored.last_updated, now_ms);
    let remaining = u64::from(stored.time_left).saturating_sub(elapsed) as u32;

    if remaining == 0 {
        log::info!("Timer ran out while unobserved; restarting at a fresh work phase");
        TimerState {
            session_count: stored.session_count,
            ..TimerState::fresh(settings, now_ms)
        }
    } else {
        TimerState {
            is_running: true,
            time_left: remaining,
            is_break: stored.is_break,
            session_count: stored.session_count,
            last_updated: now_ms,
        }
    }
}

/// Whole seconds between two epoch-millisecond stamps, never negative
fn elapsed_seconds(since_ms: f64, now_ms: f64) -> u64 {
    let seconds = ((now_ms - since_ms) / 1000.0).floor();
    // NaN and clock skew both land on 0
    seconds.max(0.0) as u64
}

/// In-memory timer driven by the dashboard.
///
/// Every mutation is synchronous and side-effect free; persisting and
/// notifying are left to the caller, which stamps `last_updated` through
/// [`FocusTimer::snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct FocusTimer {
    state: TimerState,
    settings: TimerSettings,
}

impl FocusTimer {
    pub fn new(settings: TimerSettings) -> Self {
        let settings = settings.sanitized();
        FocusTimer {
            state: TimerState::fresh(&settings, 0.0),
            settings,
        }
    }

    /// Restore from a persisted record, see [`reconcile`]
    pub fn restore(stored: Option<&TimerState>, settings: TimerSettings, now_ms: f64) -> Self {
        let settings = settings.sanitized();
        FocusTimer {
            state: reconcile(stored, &settings, now_ms),
            settings,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn time_left(&self) -> u32 {
        self.state.time_left
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn session_count(&self) -> u32 {
        self.state.session_count
    }

    /// Returns false when already running
    pub fn start(&mut self) -> bool {
        if self.state.is_running {
            return false;
        }
        self.state.is_running = true;
        true
    }

    /// Returns false when already stopped
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }
        self.state.is_running = false;
        true
    }

    pub fn toggle(&mut self) {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// One elapsed second. Ignored while stopped.
    pub fn tick(&mut self) -> Option<PhaseComplete> {
        if !self.state.is_running {
            return None;
        }
        self.state.time_left = self.state.time_left.saturating_sub(1);
        if self.state.time_left == 0 {
            Some(self.complete_phase())
        } else {
            None
        }
    }

    fn complete_phase(&mut self) -> PhaseComplete {
        let ended = self.state.phase();
        match ended {
            Phase::Work => {
                self.state.session_count += 1;
                self.state.time_left = self.settings.break_seconds_after(self.state.session_count);
                self.state.is_break = true;
            }
            Phase::Break => {
                self.state.time_left = self.settings.work_seconds();
                self.state.is_break = false;
            }
        }
        // The next phase always waits for an explicit start
        self.state.is_running = false;

        PhaseComplete {
            ended,
            session_count: self.state.session_count,
            next_time_left: self.state.time_left,
        }
    }

    /// Back to Work-Stopped, discarding session progress
    pub fn reset(&mut self) {
        self.state = TimerState {
            last_updated: self.state.last_updated,
            ..TimerState::fresh(&self.settings, 0.0)
        };
    }

    /// New durations apply to the current countdown only while stopped
    pub fn apply_settings(&mut self, settings: TimerSettings) {
        self.settings = settings.sanitized();
        if !self.state.is_running {
            self.state.time_left = self.settings.work_seconds();
        }
    }

    /// The record to persist, stamped with `now_ms`
    pub fn snapshot(&self, now_ms: f64) -> TimerState {
        TimerState {
            last_updated: now_ms,
            ..self.state.clone()
        }
    }
}

impl Default for FocusTimer {
    fn default() -> Self {
        FocusTimer::new(TimerSettings::default())
    }
}

/// Render seconds as `MM:SS`; minutes are not wrapped at 60
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
