//! Level definitions and the level catalog
//!
//! The catalog holds a fixed list of hand-made levels. Anything past the end
//! of that list is generated on demand with fresh randomness on every lookup.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Background used by the built-in level and every generated level
pub const DEFAULT_BACKGROUND: &str = "game-scene-1.jpg";

/// Generated levels never have more objects than this
pub const MAX_GENERATED_OBJECTS: usize = 15;
/// Generated levels never get less time than this (seconds)
pub const MIN_GENERATED_TIME_LIMIT: u32 = 120;

/// A hidden object: a named box in scene percentages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    /// Unique within its level
    pub id: String,
    pub name: String,
    /// Left edge (0-100)
    pub x: f32,
    /// Top edge (0-100)
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl GameObject {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Center of the box, handy for scripted clicks
    pub fn center(&self) -> glam::Vec2 {
        glam::Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn validate(&self) -> Result<(), GameError> {
        let in_scene = |v: f32| v.is_finite() && (0.0..100.0).contains(&v);
        if !in_scene(self.x) || !in_scene(self.y) {
            return Err(GameError::InvalidLevel(format!(
                "object {} origin ({}, {}) is outside the scene",
                self.id, self.x, self.y
            )));
        }
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !(positive(self.width) && positive(self.height)) {
            return Err(GameError::InvalidLevel(format!(
                "object {} has a non-positive size {}x{}",
                self.id, self.width, self.height
            )));
        }
        Ok(())
    }
}

/// A playable level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLevel {
    /// 1-based, defines ordering
    pub id: u32,
    pub name: String,
    /// Opaque handle resolved by the host page
    pub background: String,
    /// Catalog order decides hit tie-breaks
    pub objects: Vec<GameObject>,
    /// Seconds
    pub time_limit: u32,
    /// Informational only
    pub target_score: u64,
}

impl GameLevel {
    pub fn object(&self, id: &str) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn contains_object(&self, id: &str) -> bool {
        self.object(id).is_some()
    }

    /// Check the level invariants
    pub fn validate(&self) -> Result<(), GameError> {
        if self.id == 0 {
            return Err(GameError::InvalidLevel("level id must be positive".into()));
        }
        if self.time_limit == 0 {
            return Err(GameError::InvalidLevel(format!(
                "level {} has no time limit",
                self.id
            )));
        }
        if self.objects.is_empty() {
            return Err(GameError::InvalidLevel(format!("level {} has no objects", self.id)));
        }
        for (i, obj) in self.objects.iter().enumerate() {
            obj.validate()?;
            if self.objects[..i].iter().any(|o| o.id == obj.id) {
                return Err(GameError::InvalidLevel(format!(
                    "level {} repeats object id {}",
                    self.id, obj.id
                )));
            }
        }
        Ok(())
    }
}

/// Turn a raw level number from the UI into a level id
pub fn parse_level_number(raw: f64) -> Result<u32, GameError> {
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(GameError::NonIntegerLevel(raw));
    }
    if raw < 1.0 || raw > u32::MAX as f64 {
        return Err(GameError::InvalidLevelNumber(raw as i64));
    }
    Ok(raw as u32)
}

/// Fixed levels plus the generator for everything after them
#[derive(Debug, Clone, PartialEq)]
pub struct LevelCatalog {
    levels: Vec<GameLevel>,
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self {
            levels: vec![cozy_living_room()],
        }
    }
}

impl LevelCatalog {
    /// Catalog with a custom fixed list (ids must run 1..=len in order)
    pub fn with_levels(levels: Vec<GameLevel>) -> Result<Self, GameError> {
        for (i, level) in levels.iter().enumerate() {
            let expected = i as u32 + 1;
            if level.id != expected {
                return Err(GameError::InvalidLevel(format!(
                    "expected level id {}, found {}",
                    expected, level.id
                )));
            }
            level.validate()?;
        }
        log::info!("Level catalog ready with {} fixed levels", levels.len());
        Ok(Self { levels })
    }

    /// Catalog from a JSON array of levels
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let levels: Vec<GameLevel> = serde_json::from_str(json)?;
        Self::with_levels(levels)
    }

    /// Number of hand-made levels
    pub fn fixed_count(&self) -> usize {
        self.levels.len()
    }

    /// Stored definition of a fixed level
    pub fn fixed(&self, number: u32) -> Option<&GameLevel> {
        let index = (number as usize).checked_sub(1)?;
        self.levels.get(index)
    }

    /// Resolve a level: stored definition if fixed, freshly generated otherwise
    pub fn get_level<R: Rng>(&self, number: u32, rng: &mut R) -> Result<GameLevel, GameError> {
        if number == 0 {
            return Err(GameError::InvalidLevelNumber(0));
        }
        match self.fixed(number) {
            Some(level) => Ok(level.clone()),
            None => Ok(generate_level(number, rng)),
        }
    }
}

/// Placeholder generator for levels past the fixed list
///
/// `number` must be positive.
pub fn generate_level<R: Rng>(number: u32, rng: &mut R) -> GameLevel {
    let count = (8 + number as usize / 5).min(MAX_GENERATED_OBJECTS);
    let time_limit = 180u32.saturating_sub(number.saturating_mul(2)).max(MIN_GENERATED_TIME_LIMIT);
    let target_score = 1000 + 100 * (number as u64).saturating_sub(1);

    let objects = (0..count)
        .map(|i| GameObject {
            id: format!("object-{}-{}", number, i),
            name: format!("Hidden Item {}", i + 1),
            x: rng.random_range(5.0..90.0),
            y: rng.random_range(15.0..85.0),
            width: rng.random_range(2.0..5.0),
            height: rng.random_range(2.0..5.0),
        })
        .collect();

    log::debug!("Generated level {} with {} objects", number, count);

    GameLevel {
        id: number,
        name: format!("Level {}", number),
        background: DEFAULT_BACKGROUND.to_string(),
        objects,
        time_limit,
        target_score,
    }
}

fn cozy_living_room() -> GameLevel {
    GameLevel {
        id: 1,
        name: "Cozy Living Room".to_string(),
        background: DEFAULT_BACKGROUND.to_string(),
        time_limit: 180,
        target_score: 1000,
        objects: vec![
            GameObject::new("keys", "Keys", 15.0, 45.0, 3.0, 4.0),
            GameObject::new("glasses", "Glasses", 68.0, 32.0, 4.0, 3.0),
            GameObject::new("book", "Red Book", 82.0, 25.0, 2.0, 8.0),
            GameObject::new("clock", "Clock", 45.0, 15.0, 6.0, 6.0),
            GameObject::new("toy-car", "Toy Car", 25.0, 75.0, 4.0, 3.0),
            GameObject::new("coffee-cup", "Coffee Cup", 55.0, 55.0, 3.0, 4.0),
            GameObject::new("remote", "Remote Control", 38.0, 48.0, 2.0, 5.0),
            GameObject::new("pen", "Pen", 72.0, 68.0, 1.0, 4.0),
        ],
    }
}
