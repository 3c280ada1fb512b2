//! Gameplay core
//!
//! All gameplay logic lives here. This module must stay free of rendering and
//! platform code:
//! - Randomness only through the injected `Rng`
//! - Level object order is the hit tie-break order
//! - Every state change goes through `Game`

pub mod game;
pub mod hit;
pub mod level;
pub mod score;
pub mod state;
pub mod tick;
pub mod timer;

pub use game::{Game, Hit};
pub use hit::{contains_point, find_hit};
pub use level::{GameLevel, GameObject, LevelCatalog, generate_level, parse_level_number};
pub use score::{award_points, completion_stats, time_bonus, timeout_stats};
pub use state::{GameEvent, GameSession, GameStats, GameStatus};
pub use tick::Intent;
pub use timer::{Countdown, TimerTask, TimerToken, TimerUrgency};
