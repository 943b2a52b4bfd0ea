use std::fmt::Display;

use tracing::{debug, info};

use crate::utils::time::format_countdown;

/// Execution state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Focus => write!(f, "focus"),
            Phase::ShortBreak => write!(f, "short break"),
            Phase::LongBreak => write!(f, "long break"),
        }
    }
}

pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_CYCLES: u32 = 4;
/// Longest phase accepted from user input, one day.
pub const MAX_PHASE_MINUTES: u32 = 24 * 60;

/// Durations are whole minutes and are expected to stay within [MAX_PHASE_MINUTES]. `cycles` is
/// the amount of focus segments before a long break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub cycles: u32,
}

impl TimerConfig {
    /// Length of the phase in seconds. Saturates instead of overflowing for oversized durations.
    pub fn seconds(&self, phase: Phase) -> u32 {
        let minutes = match phase {
            Phase::Focus => self.focus_minutes,
            Phase::ShortBreak => self.short_break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        };
        minutes.saturating_mul(60)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            cycles: DEFAULT_CYCLES,
        }
    }
}

/// Emitted when a countdown runs out and the timer moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
    pub cycle_count: u32,
}

/// Everything a view needs to draw the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFrame {
    pub display: String,
    pub status: &'static str,
    pub state: TimerState,
    pub phase: Phase,
    pub cycle_count: u32,
    pub time_left: u32,
}

/// Pomodoro state machine. It knows nothing about real time: every [tick](PomodoroTimer::tick)
/// is one elapsed second and the caller decides when ticks happen.
#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    config: TimerConfig,
    pending_config: Option<TimerConfig>,
    state: TimerState,
    phase: Phase,
    cycle_count: u32,
    time_left: u32,
}

impl PomodoroTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            pending_config: None,
            state: TimerState::Idle,
            phase: Phase::Focus,
            cycle_count: 0,
            time_left: config.seconds(Phase::Focus),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    /// Configuration waiting for the next reset.
    pub fn pending_config(&self) -> Option<TimerConfig> {
        self.pending_config
    }

    /// Starts from idle or resumes after a pause. Returns whether anything changed.
    pub fn start(&mut self) -> bool {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                debug!("Starting {} with {}s left", self.phase, self.time_left);
                self.state = TimerState::Running;
                true
            }
            TimerState::Running => false,
        }
    }

    /// Halts the countdown keeping the remaining time.
    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        debug!("Pausing {} with {}s left", self.phase, self.time_left);
        self.state = TimerState::Paused;
        true
    }

    /// Returns to an idle focus phase, applying configuration received in the meantime.
    pub fn reset(&mut self) {
        if let Some(config) = self.pending_config.take() {
            self.config = config;
        }
        self.state = TimerState::Idle;
        self.phase = Phase::Focus;
        self.cycle_count = 0;
        self.time_left = self.config.seconds(Phase::Focus);
    }

    /// New configuration is applied right away only while idle. Otherwise it waits for the next
    /// reset. Returns whether it was applied.
    pub fn configure(&mut self, config: TimerConfig) -> bool {
        if self.state == TimerState::Idle {
            self.pending_config = Some(config);
            self.reset();
            true
        } else {
            info!("Timer is busy, new configuration will apply after reset");
            self.pending_config = Some(config);
            false
        }
    }

    /// Advances the countdown by one second. Does nothing unless running.
    pub fn tick(&mut self) -> Option<PhaseChange> {
        if self.state != TimerState::Running {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            Some(self.complete())
        } else {
            None
        }
    }

    /// Moves to the next phase and keeps running.
    fn complete(&mut self) -> PhaseChange {
        let from = self.phase;
        self.phase = match from {
            Phase::Focus => {
                self.cycle_count += 1;
                if self.cycle_count < self.config.cycles {
                    Phase::ShortBreak
                } else {
                    self.cycle_count = 0;
                    Phase::LongBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Focus,
        };
        self.time_left = self.config.seconds(self.phase);
        self.state = TimerState::Running;
        info!("Finished {from}, starting {}", self.phase);

        PhaseChange {
            from,
            to: self.phase,
            cycle_count: self.cycle_count,
        }
    }

    pub fn display(&self) -> String {
        format_countdown(self.time_left)
    }

    pub fn status(&self) -> &'static str {
        match (self.state, self.phase) {
            (TimerState::Idle, _) => "Ready",
            (TimerState::Paused, _) => "Paused",
            (TimerState::Running, Phase::Focus) => "Focusing...",
            (TimerState::Running, Phase::ShortBreak) => "Short break...",
            (TimerState::Running, Phase::LongBreak) => "Long break...",
        }
    }

    pub fn frame(&self) -> TimerFrame {
        TimerFrame {
            display: self.display(),
            status: self.status(),
            state: self.state,
            phase: self.phase,
            cycle_count: self.cycle_count,
            time_left: self.time_left,
        }
    }
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}
