//! Hidden Objects - find every item in the scene before time runs out
//!
//! Core modules:
//! - `sim`: Gameplay core (levels, hit detection, scoring, countdown, state machine)
//! - `settings`: Gameplay rules and shell preferences
//! - `error`: Typed, recoverable errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::GameError;
pub use settings::{Rules, Settings};

/// Game configuration constants
pub mod consts {
    /// Click margin on every edge of an object's box (percentage units)
    pub const HIT_TOLERANCE: f32 = 2.0;
    /// Points per second remaining when a level is completed
    pub const TIME_BONUS_PER_SECOND: u32 = 5;
    /// Award range for a found object, `[AWARD_MIN, AWARD_MAX)`
    pub const AWARD_MIN: u32 = 100;
    pub const AWARD_MAX: u32 = 200;

    /// Levels offered by the menu
    pub const TOTAL_LEVELS: u32 = 50;
    /// The menu lets the player jump this many levels ahead
    pub const UNLOCK_AHEAD: u32 = 2;
    /// Countdown period
    pub const TICK_INTERVAL_MS: u32 = 1000;

    /// HUD turns amber at this many seconds left
    pub const TIME_WARNING_SECS: u32 = 60;
    /// HUD turns red at this many seconds left
    pub const TIME_CRITICAL_SECS: u32 = 30;
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Convert a client-space pointer position into scene percentages
///
/// `rect` is the scene's bounding box as `(left, top, width, height)`.
/// Returns `None` for a degenerate box.
#[inline]
pub fn normalize_click(client: glam::Vec2, rect: (f32, f32, f32, f32)) -> Option<glam::Vec2> {
    let (left, top, width, height) = rect;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(glam::Vec2::new(
        (client.x - left) / width * 100.0,
        (client.y - top) / height * 100.0,
    ))
}
