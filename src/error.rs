//! Error types for the gameplay core
//!
//! Every error here is recoverable: the session is left exactly as it was
//! before the rejected call.

use std::fmt;

use crate::sim::GameStatus;

/// Errors raised by the catalog, the state machine and configuration loading
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// Requested level is zero, negative, or past the last level
    InvalidLevelNumber(i64),
    /// Level number from the UI is not a whole number
    NonIntegerLevel(f64),
    /// Found-reference to an object that is not part of the current level
    UnknownObjectId(String),
    /// Intent is not allowed in the current status
    InvalidTransition {
        from: GameStatus,
        intent: &'static str,
    },
    /// Level is not unlocked yet (only when unlock enforcement is on)
    LevelLocked(u32),
    /// Level definition violates a catalog invariant
    InvalidLevel(String),
    /// Settings or catalog data could not be parsed
    Config(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidLevelNumber(n) => write!(f, "invalid level number: {}", n),
            GameError::NonIntegerLevel(n) => write!(f, "level number is not an integer: {}", n),
            GameError::UnknownObjectId(id) => write!(f, "unknown object id: {}", id),
            GameError::InvalidTransition { from, intent } => {
                write!(f, "cannot {} while {}", intent, from.as_str())
            }
            GameError::LevelLocked(n) => write!(f, "level {} is locked", n),
            GameError::InvalidLevel(msg) => write!(f, "invalid level: {}", msg),
            GameError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for GameError {}

impl From<serde_json::Error> for GameError {
    fn from(e: serde_json::Error) -> Self {
        GameError::Config(e.to_string())
    }
}
