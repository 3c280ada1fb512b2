//! Point awards, time bonus, and end-of-level stats

use rand::Rng;

use super::level::GameLevel;
use super::state::GameStats;
use super::timer::Countdown;
use crate::settings::Rules;

/// Points for one found object, uniform in `[award_min, award_max)`
pub fn award_points<R: Rng>(rng: &mut R, rules: &Rules) -> u32 {
    rng.random_range(rules.award_min..rules.award_max)
}

/// Bonus for the seconds left on the clock
#[inline]
pub fn time_bonus(time_left: u32, rules: &Rules) -> u64 {
    time_left as u64 * rules.time_bonus_per_second as u64
}

/// Stats for a level where every object was found
pub fn completion_stats(
    level: &GameLevel,
    score: u64,
    clock: &Countdown,
    found: usize,
    rules: &Rules,
) -> GameStats {
    let bonus = time_bonus(clock.remaining(), rules);
    GameStats {
        level: level.id,
        score: score + bonus,
        time_bonus: bonus,
        total_time: clock.elapsed(),
        objects_found: found,
        total_objects: level.objects.len(),
    }
}

/// Stats for a level that ran out of time
pub fn timeout_stats(level: &GameLevel, score: u64, found: usize) -> GameStats {
    GameStats {
        level: level.id,
        score,
        time_bonus: 0,
        total_time: level.time_limit,
        objects_found: found,
        total_objects: level.objects.len(),
    }
}
