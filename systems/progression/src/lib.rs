#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic experience and level progression for defenders.

/// Highest level a defender can reach.
pub const MAX_LEVEL: u32 = 10;

/// Experience required to advance from `level` to `level + 1`,
/// `floor(100 * level^1.5)`.
///
/// Returns `None` at or beyond [`MAX_LEVEL`], where no further level exists.
#[must_use]
pub fn experience_for_level(level: u32) -> Option<u32> {
    if level >= MAX_LEVEL {
        return None;
    }

    let required = (100.0 * f64::from(level.max(1)).powf(1.5)).floor();
    Some(required as u32)
}

/// Returns `level + 1` when `experience` meets the threshold for `level`,
/// otherwise `level` unchanged.
///
/// A single check advances at most one level even when the experience would
/// cover several thresholds.
#[must_use]
pub fn check_level_up(level: u32, experience: u32) -> u32 {
    match experience_for_level(level) {
        Some(required) if experience >= required => level + 1,
        _ => level,
    }
}

/// Experience granted for a kill, `floor(reward * (1 + wave * 5%))`.
#[must_use]
pub fn kill_experience(reward: u32, wave: u32) -> u32 {
    let percent = 100 + u64::from(wave) * 5;
    let granted = u64::from(reward) * percent / 100;
    u32::try_from(granted).unwrap_or(u32::MAX)
}

/// Level and experience after an award was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advancement {
    /// Level after the award.
    pub level: u32,
    /// Experience carried toward the next level.
    pub experience: u32,
    /// Whether the award crossed a level threshold.
    pub leveled_up: bool,
}

/// Adds `gained` experience and performs a single level-up check.
///
/// On level-up the threshold is subtracted and the overflow carries into the
/// new level.
#[must_use]
pub fn award(level: u32, experience: u32, gained: u32) -> Advancement {
    let total = experience.saturating_add(gained);
    let next = check_level_up(level, total);
    if next == level {
        return Advancement {
            level,
            experience: total,
            leveled_up: false,
        };
    }

    let spent = experience_for_level(level).unwrap_or(0);
    Advancement {
        level: next,
        experience: total - spent,
        leveled_up: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_follow_power_curve() {
        assert_eq!(experience_for_level(1), Some(100));
        assert_eq!(experience_for_level(2), Some(282));
        assert_eq!(experience_for_level(4), Some(800));
        assert_eq!(experience_for_level(MAX_LEVEL), None);
    }

    #[test]
    fn thresholds_strictly_increase_below_cap() {
        let thresholds: Vec<u32> = (1..MAX_LEVEL)
            .map(|level| experience_for_level(level).expect("below cap"))
            .collect();
        assert!(thresholds.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn level_up_check_never_decreases_level() {
        for level in 1..=MAX_LEVEL {
            for experience in [0, 99, 100, 5_000, u32::MAX] {
                assert!(check_level_up(level, experience) >= level);
            }
        }
    }

    #[test]
    fn level_up_advances_a_single_level() {
        assert_eq!(check_level_up(1, 99), 1);
        assert_eq!(check_level_up(1, 100), 2);
        assert_eq!(check_level_up(1, 10_000), 2);
        assert_eq!(check_level_up(MAX_LEVEL, u32::MAX), MAX_LEVEL);
    }

    #[test]
    fn kill_experience_scales_with_wave() {
        assert_eq!(kill_experience(20, 5), 25);
        assert_eq!(kill_experience(10, 0), 10);
        assert_eq!(kill_experience(7, 3), 8);
    }

    #[test]
    fn award_below_threshold_accumulates() {
        let advancement = award(1, 0, 25);
        assert_eq!(
            advancement,
            Advancement {
                level: 1,
                experience: 25,
                leveled_up: false,
            }
        );
    }

    #[test]
    fn award_carries_overflow_into_new_level() {
        let advancement = award(1, 90, 30);
        assert_eq!(
            advancement,
            Advancement {
                level: 2,
                experience: 20,
                leveled_up: true,
            }
        );
    }

    #[test]
    fn award_crossing_two_thresholds_stops_after_one() {
        let advancement = award(1, 0, 500);
        assert_eq!(advancement.level, 2);
        assert_eq!(advancement.experience, 400);
        assert!(advancement.experience >= experience_for_level(2).unwrap_or(u32::MAX));
    }
}
