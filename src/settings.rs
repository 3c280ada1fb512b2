//! Game settings and gameplay rules
//!
//! Rules drive the core (tolerance, bonus rate, unlock policy); preferences
//! only affect the shell. Persisted in LocalStorage on the web.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;

/// Tunable gameplay rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Margin added to every edge of an object's box (percentage units)
    pub hit_tolerance: f32,
    /// Bonus points per second left on completion
    pub time_bonus_per_second: u32,
    /// Smallest award for a found object (inclusive)
    pub award_min: u32,
    /// Upper bound of the award range (exclusive)
    pub award_max: u32,
    /// Number of levels offered by the menu and reachable via "next level"
    pub total_levels: u32,
    /// How many levels past the current one are selectable
    pub unlock_ahead: u32,
    /// Countdown period in milliseconds
    pub tick_interval_ms: u32,
    /// Reject explicit starts of levels the menu would show as locked
    pub enforce_unlock: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            hit_tolerance: HIT_TOLERANCE,
            time_bonus_per_second: TIME_BONUS_PER_SECOND,
            award_min: AWARD_MIN,
            award_max: AWARD_MAX,
            total_levels: TOTAL_LEVELS,
            unlock_ahead: UNLOCK_AHEAD,
            tick_interval_ms: TICK_INTERVAL_MS,
            enforce_unlock: false,
        }
    }
}

impl Rules {
    /// Check ranges the engine relies on
    pub fn validate(&self) -> Result<(), GameError> {
        if !self.hit_tolerance.is_finite() || self.hit_tolerance < 0.0 {
            return Err(GameError::Config(format!(
                "hit_tolerance must be a non-negative number, got {}",
                self.hit_tolerance
            )));
        }
        if self.award_min >= self.award_max {
            return Err(GameError::Config(format!(
                "award range {}..{} is empty",
                self.award_min, self.award_max
            )));
        }
        if self.total_levels == 0 {
            return Err(GameError::Config("total_levels must be at least 1".into()));
        }
        if self.unlock_ahead > self.total_levels {
            return Err(GameError::Config(format!(
                "unlock_ahead {} exceeds total_levels {}",
                self.unlock_ahead, self.total_levels
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(GameError::Config("tick_interval_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rules: Rules,

    // === Shell ===
    /// Pause when the tab is hidden or the window loses focus
    pub auto_pause_on_blur: bool,
    /// Show "Object Found!" / "Level Complete!" toasts
    pub show_toasts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            auto_pause_on_blur: true,
            show_toasts: true,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.rules.validate()?;
        Ok(settings)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "hidden_objects_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from a JSON file, falling back to defaults (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: Option<&std::path::Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
