//! The game state machine
//!
//! `Game` owns the session, the level resolved for the current attempt, the
//! catalog, the rules and the RNG. Every state change goes through one of the
//! named operations below (or the timer entry points in `tick.rs`), and each
//! one queues `GameEvent`s for the shell.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::hit::find_hit;
use super::level::{GameLevel, LevelCatalog};
use super::score::{award_points, completion_stats};
use super::state::{GameEvent, GameSession, GameStats, GameStatus};
use super::timer::{Countdown, TimerTask, TimerToken};
use crate::error::GameError;
use crate::settings::Rules;

/// A successful click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: String,
    pub name: String,
    pub points: u32,
}

/// Session state machine with an injected random source
#[derive(Debug)]
pub struct Game<R: Rng = Pcg32> {
    pub(super) session: GameSession,
    /// Level resolved when the current attempt started
    pub(super) level: Option<GameLevel>,
    pub(super) stats: Option<GameStats>,
    pub(super) catalog: LevelCatalog,
    pub(super) rules: Rules,
    pub(super) rng: R,
    pub(super) timer: TimerTask,
    pub(super) events: Vec<GameEvent>,
}

impl Game<Pcg32> {
    /// Default catalog and rules, PCG seeded with `seed`
    pub fn new(seed: u64) -> Self {
        let rules = Rules::default();
        Self::build(LevelCatalog::default(), rules, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// Assemble a game from its parts; rules are validated first
    pub fn with_parts(catalog: LevelCatalog, rules: Rules, rng: R) -> Result<Self, GameError> {
        rules.validate()?;
        Ok(Self::build(catalog, rules, rng))
    }

    fn build(catalog: LevelCatalog, rules: Rules, rng: R) -> Self {
        Self {
            session: GameSession::new(rules.total_levels),
            level: None,
            stats: None,
            catalog,
            rules,
            rng,
            timer: TimerTask::default(),
            events: Vec::new(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn status(&self) -> GameStatus {
        self.session.status
    }

    /// Level of the current (or last) attempt
    pub fn level(&self) -> Option<&GameLevel> {
        self.level.as_ref()
    }

    /// Summary of the concluded attempt, if any
    pub fn stats(&self) -> Option<&GameStats> {
        self.stats.as_ref()
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Token of the running timer, if any
    pub fn timer_token(&self) -> Option<TimerToken> {
        self.timer.current()
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Highest level the menu offers
    pub fn unlocked_levels(&self) -> u32 {
        self.session
            .current_level
            .saturating_add(self.rules.unlock_ahead)
            .min(self.rules.total_levels)
    }

    pub fn is_level_unlocked(&self, number: u32) -> bool {
        number >= 1 && number <= self.unlocked_levels()
    }

    /// Start a level.
    ///
    /// With an explicit level the score starts from zero; without one the
    /// current level is (re)started and the score carries over.
    pub fn start_game(&mut self, target_level: Option<u32>) -> Result<(), GameError> {
        match target_level {
            Some(number) => {
                if self.rules.enforce_unlock && !self.is_level_unlocked(number) {
                    log::warn!("Level {} is locked", number);
                    return Err(GameError::LevelLocked(number));
                }
                self.begin_attempt(number, 0)
            }
            None => self.begin_attempt(self.session.current_level, self.session.score),
        }
    }

    /// Restart the concluded level from the score it started with
    pub fn retry(&mut self) -> Result<(), GameError> {
        self.require_concluded("retry")?;
        self.begin_attempt(self.session.current_level, self.session.level_start_score)
    }

    /// Move on to the following level, keeping the score
    pub fn next_level(&mut self) -> Result<(), GameError> {
        self.require_concluded("go to the next level")?;
        let current = self.session.current_level;
        let next = current
            .checked_add(1)
            .filter(|n| *n <= self.session.total_levels)
            .ok_or(GameError::InvalidLevelNumber(current as i64 + 1))?;
        self.begin_attempt(next, self.session.score)
    }

    /// Record a found object. Duplicates are ignored.
    ///
    /// Returns whether the object was newly found. Unknown ids leave the
    /// session untouched.
    pub fn handle_object_found(&mut self, id: &str, points: u32) -> Result<bool, GameError> {
        if self.session.status != GameStatus::Playing {
            log::debug!("Ignoring found object {} while {}", id, self.session.status.as_str());
            return Ok(false);
        }
        let Some(name) = self
            .level
            .as_ref()
            .and_then(|level| level.object(id))
            .map(|obj| obj.name.clone())
        else {
            log::warn!("Unknown object id {} in level {}", id, self.session.current_level);
            return Err(GameError::UnknownObjectId(id.to_string()));
        };
        if self.session.is_found(id) {
            return Ok(false);
        }

        self.session.found_objects.push(id.to_string());
        self.session.score += points as u64;
        log::debug!("Found {} (+{} points, score {})", id, points, self.session.score);
        self.events.push(GameEvent::ObjectFound {
            id: id.to_string(),
            name,
            points,
        });

        self.check_completion();
        Ok(true)
    }

    /// Click at a point in scene percentages
    pub fn click(&mut self, point: Vec2) -> Result<Option<Hit>, GameError> {
        if self.session.status != GameStatus::Playing {
            return Ok(None);
        }
        let Some(level) = self.level.as_ref() else {
            return Ok(None);
        };
        let Some(obj) = find_hit(
            &level.objects,
            &self.session.found_objects,
            point,
            self.rules.hit_tolerance,
        ) else {
            log::debug!("Miss at ({:.1}, {:.1})", point.x, point.y);
            return Ok(None);
        };
        let (id, name) = (obj.id.clone(), obj.name.clone());

        let points = award_points(&mut self.rng, &self.rules);
        self.handle_object_found(&id, points)?;
        Ok(Some(Hit { id, name, points }))
    }

    /// Toggle between playing and paused. No-op in any other status.
    pub fn toggle_pause(&mut self) -> bool {
        match self.session.status {
            GameStatus::Playing => {
                self.session.status = GameStatus::Paused;
                self.stop_timer();
                self.events.push(GameEvent::Paused);
                log::info!("Paused with {}s left", self.session.time_left());
                true
            }
            GameStatus::Paused => {
                self.session.status = GameStatus::Playing;
                self.start_timer();
                self.events.push(GameEvent::Resumed);
                log::info!("Resumed");
                true
            }
            _ => false,
        }
    }

    /// Back to the menu from anywhere; pending stats are dropped
    pub fn go_home(&mut self) {
        self.session.status = GameStatus::Menu;
        self.stats = None;
        self.stop_timer();
        self.events.push(GameEvent::ReturnedToMenu);
        log::info!(
            "Returned to menu (level {}, score {})",
            self.session.current_level,
            self.session.score
        );
    }

    fn require_concluded(&self, intent: &'static str) -> Result<(), GameError> {
        if self.session.status.is_concluded() {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                from: self.session.status,
                intent,
            })
        }
    }

    fn begin_attempt(&mut self, number: u32, score: u64) -> Result<(), GameError> {
        let level = self.catalog.get_level(number, &mut self.rng)?;

        self.session.current_level = number;
        self.session.score = score;
        self.session.level_start_score = score;
        self.session.countdown = Countdown::new(level.time_limit);
        self.session.found_objects.clear();
        self.session.status = GameStatus::Playing;
        self.stats = None;

        log::info!(
            "Level {} \"{}\": {} objects, {}s",
            number,
            level.name,
            level.objects.len(),
            level.time_limit
        );
        self.events.push(GameEvent::LevelStarted {
            level: number,
            name: level.name.clone(),
        });
        self.level = Some(level);
        self.start_timer();
        Ok(())
    }

    /// Conclude the level if every object is found. Returns true if it did.
    pub(super) fn check_completion(&mut self) -> bool {
        if self.session.status != GameStatus::Playing {
            return false;
        }
        let Some(level) = self.level.as_ref() else {
            return false;
        };
        if self.session.found_objects.len() != level.objects.len() {
            return false;
        }

        let stats = completion_stats(
            level,
            self.session.score,
            &self.session.countdown,
            self.session.found_objects.len(),
            &self.rules,
        );
        log::info!(
            "Level {} complete: +{} time bonus, score {}",
            stats.level,
            stats.time_bonus,
            stats.score
        );
        self.session.score = stats.score;
        self.session.status = GameStatus::Completed;
        self.stop_timer();
        self.events.push(GameEvent::LevelCompleted(stats.clone()));
        self.stats = Some(stats);
        true
    }

    pub(super) fn start_timer(&mut self) {
        self.stop_timer();
        let token = self.timer.start();
        self.events.push(GameEvent::TimerStarted(token));
    }

    pub(super) fn stop_timer(&mut self) {
        if self.timer.cancel() {
            self.events.push(GameEvent::TimerStopped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn playing(seed: u64) -> Game {
        let mut game = Game::new(seed);
        game.start_game(Some(1)).unwrap();
        game
    }

    fn object_ids(game: &Game) -> Vec<String> {
        game.level().unwrap().objects.iter().map(|o| o.id.clone()).collect()
    }

    #[test]
    fn test_starts_in_menu() {
        let game = Game::new(1);
        assert_eq!(game.status(), GameStatus::Menu);
        assert!(game.level().is_none());
        assert!(game.timer_token().is_none());
    }

    #[test]
    fn test_start_game_sets_up_attempt() {
        let mut game = playing(1);
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.session().time_left(), 180);
        assert!(game.session().found_objects().is_empty());
        assert!(game.timer_token().is_some());

        let events = game.drain_events();
        assert!(matches!(events[0], GameEvent::LevelStarted { level: 1, .. }));
        assert!(matches!(events.last(), Some(GameEvent::TimerStarted(_))));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_start_game_rejects_level_zero() {
        let mut game = Game::new(1);
        assert_eq!(game.start_game(Some(0)), Err(GameError::InvalidLevelNumber(0)));
        assert_eq!(game.status(), GameStatus::Menu);
    }

    #[test]
    fn test_handle_object_found_is_idempotent() {
        let mut game = playing(1);
        assert_eq!(game.handle_object_found("keys", 150), Ok(true));
        assert_eq!(game.handle_object_found("keys", 150), Ok(false));
        assert_eq!(game.session().score(), 150);
        assert_eq!(game.session().found_objects(), ["keys".to_string()]);
    }

    #[test]
    fn test_unknown_object_is_rejected() {
        let mut game = playing(1);
        assert_eq!(
            game.handle_object_found("unicorn", 150),
            Err(GameError::UnknownObjectId("unicorn".into()))
        );
        assert_eq!(game.session().score(), 0);
        assert!(game.session().found_objects().is_empty());
    }

    #[test]
    fn test_found_ignored_unless_playing() {
        let mut game = playing(1);
        game.toggle_pause();
        assert_eq!(game.handle_object_found("keys", 150), Ok(false));
        assert_eq!(game.session().score(), 0);
    }

    #[test]
    fn test_click_awards_points_in_range() {
        let mut game = playing(9);
        let hit = game.click(Vec2::new(16.0, 46.0)).unwrap().unwrap();
        assert_eq!(hit.id, "keys");
        assert_eq!(hit.name, "Keys");
        assert!((100..200).contains(&hit.points));
        assert_eq!(game.session().score(), hit.points as u64);

        // Same spot again: keys are found, nothing else is there
        assert_eq!(game.click(Vec2::new(16.0, 46.0)).unwrap(), None);
        assert_eq!(game.click(Vec2::new(25.0, 46.0)).unwrap(), None);
    }

    #[test]
    fn test_click_ignored_when_paused() {
        let mut game = playing(9);
        game.toggle_pause();
        assert_eq!(game.click(Vec2::new(16.0, 46.0)).unwrap(), None);
        assert!(game.session().found_objects().is_empty());
    }

    #[test]
    fn test_completion_is_eager() {
        let mut game = playing(1);
        game.session.countdown = Countdown::new(180);
        for _ in 0..120 {
            game.tick();
        }
        let ids = object_ids(&game);
        for id in &ids {
            game.handle_object_found(id, 100).unwrap();
        }
        assert_eq!(game.status(), GameStatus::Completed);
        let stats = game.stats().unwrap();
        assert_eq!(stats.time_bonus, 300);
        assert_eq!(stats.score, 800 + 300);
        assert_eq!(stats.total_time, 120);
        assert_eq!(game.session().score(), 1100);
        assert!(game.timer_token().is_none());
    }

    #[test]
    fn test_toggle_pause_keeps_other_state() {
        let mut game = playing(1);
        game.handle_object_found("pen", 120).unwrap();
        game.tick();
        let before = (game.session().score(), game.session().time_left());
        game.drain_events();

        assert!(game.toggle_pause());
        assert_eq!(game.status(), GameStatus::Paused);
        assert!(game.timer_token().is_none());
        assert_eq!(game.drain_events(), vec![GameEvent::TimerStopped, GameEvent::Paused]);

        assert!(game.toggle_pause());
        assert_eq!(game.status(), GameStatus::Playing);
        assert!(game.timer_token().is_some());
        assert_eq!((game.session().score(), game.session().time_left()), before);
        assert_eq!(game.session().found_objects(), ["pen".to_string()]);
    }

    #[test]
    fn test_toggle_pause_noop_outside_play() {
        let mut game = Game::new(1);
        assert!(!game.toggle_pause());
        assert_eq!(game.status(), GameStatus::Menu);
    }

    #[test]
    fn test_go_home_discards_stats() {
        let mut game = playing(1);
        for id in object_ids(&game) {
            game.handle_object_found(&id, 100).unwrap();
        }
        assert!(game.stats().is_some());
        game.go_home();
        assert_eq!(game.status(), GameStatus::Menu);
        assert!(game.stats().is_none());
    }

    #[test]
    fn test_go_home_stops_timer_while_playing() {
        let mut game = playing(1);
        game.drain_events();
        game.go_home();
        assert!(game.timer_token().is_none());
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::TimerStopped, GameEvent::ReturnedToMenu]
        );
    }

    #[test]
    fn test_retry_restores_level_start_score() {
        let mut game = Game::new(4);
        game.start_game(Some(1)).unwrap();
        game.session.score = 800;
        game.session.level_start_score = 800;
        game.handle_object_found("keys", 150).unwrap();
        for _ in 0..180 {
            game.tick();
        }
        assert_eq!(game.status(), GameStatus::GameOver);
        assert_eq!(game.session().score(), 950);

        game.retry().unwrap();
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.session().score(), 800);
        assert_eq!(game.session().current_level(), 1);
        assert!(game.session().found_objects().is_empty());
        assert!(game.stats().is_none());
    }

    #[test]
    fn test_retry_after_completion_drops_level_awards() {
        let mut game = Game::new(4);
        game.start_game(Some(1)).unwrap();
        game.session.score = 800;
        game.session.level_start_score = 800;
        for _ in 0..30 {
            game.tick();
        }
        let centers: Vec<Vec2> = game.level().unwrap().objects.iter().map(|o| o.center()).collect();
        for center in centers {
            game.click(center).unwrap();
        }
        assert_eq!(game.status(), GameStatus::Completed);
        let stats = game.stats().unwrap();
        assert_eq!(stats.time_bonus, 150 * 5);
        assert!(game.session().score() >= 800 + 8 * 100 + 750);

        game.retry().unwrap();
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.session().score(), 800);
        assert_eq!(game.session().time_left(), 180);
        assert!(game.stats().is_none());
    }

    #[test]
    fn test_retry_requires_concluded_level() {
        let mut game = playing(1);
        assert_eq!(
            game.retry(),
            Err(GameError::InvalidTransition {
                from: GameStatus::Playing,
                intent: "retry",
            })
        );
        assert!(game.next_level().is_err());
    }

    #[test]
    fn test_next_level_carries_score() {
        let mut game = playing(2);
        for id in object_ids(&game) {
            game.handle_object_found(&id, 100).unwrap();
        }
        let total = game.session().score();
        assert_eq!(total, 800 + 180 * 5);

        game.next_level().unwrap();
        assert_eq!(game.session().current_level(), 2);
        assert_eq!(game.session().score(), total);
        assert_eq!(game.session().time_left(), 176);
        assert_eq!(game.level().unwrap().objects.len(), 8);
    }

    #[test]
    fn test_next_level_stops_at_last_level() {
        let mut game = Game::new(3);
        game.start_game(Some(50)).unwrap();
        assert!(game.session().is_last_level());
        for id in object_ids(&game) {
            game.handle_object_found(&id, 100).unwrap();
        }
        assert_eq!(game.next_level(), Err(GameError::InvalidLevelNumber(51)));
        assert_eq!(game.status(), GameStatus::Completed);
    }

    #[test]
    fn test_next_level_after_highest_level_number() {
        let mut game = Game::new(3);
        game.apply(crate::sim::Intent::SelectLevel(u32::MAX as f64)).unwrap();
        for id in object_ids(&game) {
            game.handle_object_found(&id, 100).unwrap();
        }
        assert_eq!(game.status(), GameStatus::Completed);
        assert_eq!(
            game.next_level(),
            Err(GameError::InvalidLevelNumber(u32::MAX as i64 + 1))
        );
        assert_eq!(game.session().current_level(), u32::MAX);
    }

    #[test]
    fn test_generated_level_is_stable_within_attempt() {
        let mut game = Game::new(11);
        game.start_game(Some(7)).unwrap();
        let before = game.level().unwrap().clone();
        game.click(Vec2::new(-50.0, -50.0)).unwrap();
        game.tick();
        assert_eq!(game.level().unwrap(), &before);
    }

    #[test]
    fn test_unlock_rule() {
        let mut game = Game::new(1);
        assert_eq!(game.unlocked_levels(), 3);
        assert!(game.is_level_unlocked(3));
        assert!(!game.is_level_unlocked(4));
        assert!(!game.is_level_unlocked(0));

        // Not enforced by default
        game.start_game(Some(10)).unwrap();
        assert_eq!(game.session().current_level(), 10);
        assert_eq!(game.unlocked_levels(), 12);

        game.start_game(Some(49)).unwrap();
        assert_eq!(game.unlocked_levels(), 50);
    }

    #[test]
    fn test_unlock_rule_near_level_limit() {
        let mut game = Game::new(1);
        game.start_game(Some(u32::MAX - 1)).unwrap();
        assert_eq!(game.unlocked_levels(), 50);
        assert!(!game.is_level_unlocked(u32::MAX));
    }

    #[test]
    fn test_unlock_rule_enforced_when_enabled() {
        let rules = Rules {
            enforce_unlock: true,
            ..Rules::default()
        };
        let mut game =
            Game::with_parts(LevelCatalog::default(), rules, Pcg32::seed_from_u64(1)).unwrap();
        assert_eq!(game.start_game(Some(4)), Err(GameError::LevelLocked(4)));
        assert_eq!(game.status(), GameStatus::Menu);
        game.start_game(Some(3)).unwrap();
        assert_eq!(game.status(), GameStatus::Playing);
    }

    #[test]
    fn test_with_parts_validates_rules() {
        let rules = Rules {
            award_min: 10,
            award_max: 10,
            ..Rules::default()
        };
        let game = Game::with_parts(LevelCatalog::default(), rules, Pcg32::seed_from_u64(1));
        assert!(matches!(game, Err(GameError::Config(_))));

        let rules = Rules {
            unlock_ahead: u32::MAX,
            ..Rules::default()
        };
        let game = Game::with_parts(LevelCatalog::default(), rules, Pcg32::seed_from_u64(1));
        assert!(matches!(game, Err(GameError::Config(_))));
    }

    proptest! {
        #[test]
        fn prop_time_bonus_ignores_hit_order(
            ids in Just(object_ids(&playing(1))).prop_shuffle(),
            time_left in 1u32..=180,
        ) {
            let mut game = playing(1);
            for _ in 0..(180 - time_left) {
                game.tick();
            }
            for id in &ids {
                game.handle_object_found(id, 100).unwrap();
            }

            prop_assert_eq!(game.status(), GameStatus::Completed);
            let stats = game.stats().unwrap();
            prop_assert_eq!(stats.time_bonus, time_left as u64 * 5);
            prop_assert_eq!(stats.total_time, 180 - time_left);
            prop_assert_eq!(stats.score, 800 + time_left as u64 * 5);
        }
    }
}
