//! Countdown ticks and UI intent dispatch
//!
//! The host calls `tick_timer` from its periodic callback and `apply` for
//! everything the player does. Both run to completion before the next one.

use glam::Vec2;
use rand::Rng;

use super::game::Game;
use super::level::parse_level_number;
use super::score::timeout_stats;
use super::state::{GameEvent, GameStatus};
use super::timer::TimerToken;
use crate::error::GameError;

/// Intents raised by the UI
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Continue with the current level, keeping the score
    Continue,
    /// Start a specific level from the menu (raw number from the page)
    SelectLevel(f64),
    /// Click in scene percentages
    Click(Vec2),
    TogglePause,
    Home,
    Retry,
    NextLevel,
    /// Periodic timer callback
    Tick(TimerToken),
}

impl<R: Rng> Game<R> {
    /// Advance the countdown by one second.
    ///
    /// Only applies while playing. Returns whether the clock moved.
    pub fn tick(&mut self) -> bool {
        if self.session.status != GameStatus::Playing {
            log::debug!("Tick ignored while {}", self.session.status.as_str());
            return false;
        }
        // All found wins over running out of time
        if self.check_completion() {
            return false;
        }

        let expired = self.session.countdown.tick();
        if expired {
            self.time_up();
        }
        true
    }

    /// Tick from a scheduled callback; stale tokens are ignored
    pub fn tick_timer(&mut self, token: TimerToken) -> bool {
        if !self.timer.accepts(token) {
            log::warn!("Stale timer tick {:?} ignored", token);
            return false;
        }
        self.tick()
    }

    /// Dispatch one UI intent
    pub fn apply(&mut self, intent: Intent) -> Result<(), GameError> {
        match intent {
            Intent::Continue => self.start_game(None),
            Intent::SelectLevel(raw) => {
                let number = parse_level_number(raw)?;
                self.start_game(Some(number))
            }
            Intent::Click(point) => self.click(point).map(|_| ()),
            Intent::TogglePause => {
                self.toggle_pause();
                Ok(())
            }
            Intent::Home => {
                self.go_home();
                Ok(())
            }
            Intent::Retry => self.retry(),
            Intent::NextLevel => self.next_level(),
            Intent::Tick(token) => {
                self.tick_timer(token);
                Ok(())
            }
        }
    }

    fn time_up(&mut self) {
        let Some(level) = self.level.as_ref() else {
            return;
        };
        let stats = timeout_stats(level, self.session.score, self.session.found_objects.len());
        log::info!(
            "Time up on level {}: {}/{} found, score {}",
            stats.level,
            stats.objects_found,
            stats.total_objects,
            stats.score
        );
        self.session.status = GameStatus::GameOver;
        self.stop_timer();
        self.events.push(GameEvent::TimeUp(stats.clone()));
        self.stats = Some(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameStats;
    use proptest::prelude::*;

    fn playing(seed: u64) -> Game {
        let mut game = Game::new(seed);
        game.start_game(Some(1)).unwrap();
        game
    }

    #[test]
    fn test_tick_counts_down() {
        let mut game = playing(1);
        assert!(game.tick());
        assert_eq!(game.session().time_left(), 179);
    }

    #[test]
    fn test_tick_ignored_when_not_playing() {
        let mut game = Game::new(1);
        assert!(!game.tick());

        let mut game = playing(1);
        game.toggle_pause();
        assert!(!game.tick());
        assert_eq!(game.session().time_left(), 180);
    }

    #[test]
    fn test_timeout_happens_once_at_zero() {
        let mut game = playing(1);
        game.handle_object_found("keys", 100).unwrap();
        game.drain_events();

        for _ in 0..179 {
            game.tick();
        }
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.session().time_left(), 1);

        game.tick();
        assert_eq!(game.status(), GameStatus::GameOver);
        assert_eq!(game.session().time_left(), 0);

        // Further ticks change nothing
        assert!(!game.tick());
        assert_eq!(game.session().time_left(), 0);

        let time_ups: Vec<GameStats> = game
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::TimeUp(stats) => Some(stats),
                _ => None,
            })
            .collect();
        assert_eq!(time_ups.len(), 1);
        assert_eq!(time_ups[0].time_bonus, 0);
        assert_eq!(time_ups[0].total_time, 180);
        assert_eq!(time_ups[0].objects_found, 1);
        assert_eq!(time_ups[0].score, 100);
    }

    #[test]
    fn test_stale_token_is_noop() {
        let mut game = playing(1);
        let first = game.timer_token().unwrap();

        game.toggle_pause();
        assert!(!game.tick_timer(first));

        game.toggle_pause();
        let second = game.timer_token().unwrap();
        assert_ne!(first, second);
        assert!(!game.tick_timer(first));
        assert!(game.tick_timer(second));
        assert_eq!(game.session().time_left(), 179);
    }

    #[test]
    fn test_apply_dispatch() {
        let mut game = Game::new(1);
        game.apply(Intent::SelectLevel(1.0)).unwrap();
        assert_eq!(game.status(), GameStatus::Playing);

        game.apply(Intent::Click(Vec2::new(16.0, 46.0))).unwrap();
        assert_eq!(game.session().found_objects(), ["keys".to_string()]);

        game.apply(Intent::TogglePause).unwrap();
        assert_eq!(game.status(), GameStatus::Paused);

        game.apply(Intent::Home).unwrap();
        assert_eq!(game.status(), GameStatus::Menu);

        game.apply(Intent::Continue).unwrap();
        assert_eq!(game.status(), GameStatus::Playing);

        let err = game.apply(Intent::Retry).unwrap_err();
        assert_eq!(err.to_string(), "cannot retry while playing");
        assert!(matches!(
            game.apply(Intent::SelectLevel(1.5)),
            Err(GameError::NonIntegerLevel(_))
        ));
        assert!(matches!(
            game.apply(Intent::SelectLevel(-2.0)),
            Err(GameError::InvalidLevelNumber(-2))
        ));
    }

    #[derive(Debug, Clone)]
    enum Step {
        Click(f32, f32),
        Found(usize),
        Tick,
        Pause,
        Home,
        Continue,
        Select(u32),
        Retry,
        Next,
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => (0.0f32..100.0, 0.0f32..100.0).prop_map(|(x, y)| Step::Click(x, y)),
            4 => (0usize..16).prop_map(Step::Found),
            8 => Just(Step::Tick),
            1 => Just(Step::Pause),
            1 => Just(Step::Home),
            1 => Just(Step::Continue),
            1 => (1u32..6).prop_map(Step::Select),
            1 => Just(Step::Retry),
            1 => Just(Step::Next),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_session_stays_consistent(
            seed in any::<u64>(),
            steps in prop::collection::vec(step_strategy(), 1..400),
        ) {
            let mut game = Game::new(seed);
            game.start_game(Some(1)).unwrap();

            for step in steps {
                match step {
                    Step::Click(x, y) => { let _ = game.click(Vec2::new(x, y)); }
                    Step::Found(i) => {
                        let id = game.level().and_then(|l| l.objects.get(i)).map(|o| o.id.clone());
                        if let Some(id) = id {
                            let _ = game.handle_object_found(&id, 150);
                        }
                    }
                    Step::Tick => { game.tick(); }
                    Step::Pause => { game.toggle_pause(); }
                    Step::Home => game.go_home(),
                    Step::Continue => { let _ = game.start_game(None); }
                    Step::Select(n) => { let _ = game.start_game(Some(n)); }
                    Step::Retry => { let _ = game.retry(); }
                    Step::Next => { let _ = game.next_level(); }
                }

                let session = game.session();
                let level = game.level().unwrap();
                prop_assert!(session.time_left() <= level.time_limit);
                prop_assert!(session.found_objects().len() <= level.objects.len());
                for id in session.found_objects() {
                    prop_assert!(level.contains_object(id));
                }
                if session.status() == GameStatus::Playing {
                    prop_assert!(session.found_objects().len() < level.objects.len());
                    prop_assert!(session.time_left() > 0);
                }
                prop_assert_eq!(
                    game.timer_token().is_some(),
                    session.status() == GameStatus::Playing
                );
                if session.status().is_concluded() {
                    let stats = game.stats().unwrap();
                    prop_assert_eq!(stats.is_success(), session.status() == GameStatus::Completed);
                }
            }
        }
    }
}
