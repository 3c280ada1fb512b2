//! Countdown and the periodic timer task
//!
//! `Countdown` is the per-level clock. `TimerTask` stands for the host's
//! periodic callback: every start hands out a new token, and only ticks that
//! carry the current token while the task is active are accepted.

use serde::{Deserialize, Serialize};

use crate::consts::{TIME_CRITICAL_SECS, TIME_WARNING_SECS};

/// Per-level countdown in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: u32,
    limit: u32,
}

impl Countdown {
    pub fn new(limit: u32) -> Self {
        Self {
            remaining: limit,
            limit,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn elapsed(&self) -> u32 {
        self.limit.saturating_sub(self.remaining)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Take one second off; saturates at zero. Returns true once expired.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.is_expired()
    }
}

/// Identifies one run of the periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }
}

/// Start/cancel bookkeeping for the periodic tick source
#[derive(Debug, Clone, Default)]
pub struct TimerTask {
    generation: u64,
    active: bool,
}

impl TimerTask {
    /// Start a new run, invalidating any previous token
    pub fn start(&mut self) -> TimerToken {
        self.generation += 1;
        self.active = true;
        TimerToken(self.generation)
    }

    /// Stop the current run. Returns true if it was running.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    pub fn current(&self) -> Option<TimerToken> {
        self.active.then_some(TimerToken(self.generation))
    }

    /// Whether a tick carrying `token` should be applied
    pub fn accepts(&self, token: TimerToken) -> bool {
        self.active && token.0 == self.generation
    }
}

/// HUD colouring for the remaining time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerUrgency {
    Normal,
    Warning,
    Critical,
}

impl TimerUrgency {
    pub fn for_remaining(seconds: u32) -> Self {
        if seconds <= TIME_CRITICAL_SECS {
            TimerUrgency::Critical
        } else if seconds <= TIME_WARNING_SECS {
            TimerUrgency::Warning
        } else {
            TimerUrgency::Normal
        }
    }

    /// CSS class for the HUD timer
    pub fn css_class(&self) -> &'static str {
        match self {
            TimerUrgency::Normal => "timer-normal",
            TimerUrgency::Warning => "timer-warning",
            TimerUrgency::Critical => "timer-critical",
        }
    }
}
