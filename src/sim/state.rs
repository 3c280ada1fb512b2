//! Session state and end-of-level summaries
//!
//! Everything the UI reads lives here. Mutation goes through `Game`.

use serde::{Deserialize, Serialize};

use super::timer::{Countdown, TimerToken};

/// Overall session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    /// Level select / title screen
    Menu,
    /// Clock running, clicks accepted
    Playing,
    /// Clock stopped until the player resumes
    Paused,
    /// Every object found
    Completed,
    /// Ran out of time
    GameOver,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Menu => "menu",
            GameStatus::Playing => "playing",
            GameStatus::Paused => "paused",
            GameStatus::Completed => "completed",
            GameStatus::GameOver => "game-over",
        }
    }

    /// Level attempt has ended (success or timeout)
    pub fn is_concluded(&self) -> bool {
        matches!(self, GameStatus::Completed | GameStatus::GameOver)
    }
}

/// Summary of a finished level attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub level: u32,
    /// Final score, time bonus included
    pub score: u64,
    pub time_bonus: u64,
    /// Seconds spent on the level
    pub total_time: u32,
    pub objects_found: usize,
    pub total_objects: usize,
}

impl GameStats {
    pub fn is_success(&self) -> bool {
        self.objects_found == self.total_objects
    }

    pub fn completion_percent(&self) -> f32 {
        if self.total_objects == 0 {
            return 0.0;
        }
        self.objects_found as f32 / self.total_objects as f32 * 100.0
    }
}

/// Notifications for the shell, drained after each intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { level: u32, name: String },
    ObjectFound { id: String, name: String, points: u32 },
    LevelCompleted(GameStats),
    TimeUp(GameStats),
    Paused,
    Resumed,
    ReturnedToMenu,
    /// Host should schedule its periodic callback with this token
    TimerStarted(TimerToken),
    /// Host should cancel its periodic callback
    TimerStopped,
}

/// Runtime state of the current session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub(crate) current_level: u32,
    pub(crate) score: u64,
    /// Score when the current attempt started (restored on retry)
    pub(crate) level_start_score: u64,
    pub(crate) countdown: Countdown,
    /// In the order they were found
    pub(crate) found_objects: Vec<String>,
    pub(crate) status: GameStatus,
    pub(crate) total_levels: u32,
}

impl GameSession {
    pub fn new(total_levels: u32) -> Self {
        Self {
            current_level: 1,
            score: 0,
            level_start_score: 0,
            countdown: Countdown::new(0),
            found_objects: Vec::new(),
            status: GameStatus::Menu,
            total_levels,
        }
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn time_left(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn time_limit(&self) -> u32 {
        self.countdown.limit()
    }

    pub fn found_objects(&self) -> &[String] {
        &self.found_objects
    }

    pub fn is_found(&self, id: &str) -> bool {
        self.found_objects.iter().any(|f| f == id)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn total_levels(&self) -> u32 {
        self.total_levels
    }

    pub fn is_last_level(&self) -> bool {
        self.current_level >= self.total_levels
    }
}
