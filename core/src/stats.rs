//! Combat stat blocks and the modifiers skills and items contribute.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Individual combat stat addressed by a modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// Damage dealt per attack.
    Damage,
    /// Milliseconds between attacks; lower is faster.
    AttackSpeed,
    /// Attack reach in world units.
    Range,
    /// Maximum health.
    Health,
}

/// Bonus contributed by a skill or item toward a single stat.
///
/// Flat values and multipliers accumulate separately across every source
/// before being applied as `(stat + Σvalue) * (1 + Σmultiplier)`. Attack-speed
/// reductions are expressed as negative multipliers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Stat affected by the modifier.
    pub stat: StatKind,
    /// Flat amount added before multipliers apply.
    #[serde(default)]
    pub value: f64,
    /// Fractional multiplier, `0.2` meaning +20 %.
    #[serde(default)]
    pub multiplier: f64,
}

impl StatModifier {
    /// Creates a modifier contributing only a flat amount.
    #[must_use]
    pub const fn flat(stat: StatKind, value: f64) -> Self {
        Self {
            stat,
            value,
            multiplier: 0.0,
        }
    }

    /// Creates a modifier contributing only a multiplier.
    #[must_use]
    pub const fn scaled(stat: StatKind, multiplier: f64) -> Self {
        Self {
            stat,
            value: 0.0,
            multiplier,
        }
    }
}

/// Unmodified stats defined by a person type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseStats {
    /// Damage dealt per attack.
    pub damage: u32,
    /// Milliseconds between attacks.
    pub attack_speed_ms: u32,
    /// Attack reach in world units.
    pub range: u32,
    /// Maximum health.
    pub health: u32,
}

impl BaseStats {
    /// Retrieves the value of the provided stat.
    #[must_use]
    pub const fn get(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Damage => self.damage,
            StatKind::AttackSpeed => self.attack_speed_ms,
            StatKind::Range => self.range,
            StatKind::Health => self.health,
        }
    }

    /// Adds every field of `other` to the matching field of `self`.
    #[must_use]
    pub const fn saturating_add(&self, other: &BaseStats) -> BaseStats {
        BaseStats {
            damage: self.damage.saturating_add(other.damage),
            attack_speed_ms: self.attack_speed_ms.saturating_add(other.attack_speed_ms),
            range: self.range.saturating_add(other.range),
            health: self.health.saturating_add(other.health),
        }
    }
}

/// Fully composed stats driving a defender in combat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatStats {
    /// Damage dealt per projectile.
    pub damage: u32,
    /// Milliseconds between shots.
    pub attack_speed_ms: u32,
    /// Targeting radius in world units.
    pub range: u32,
    /// Maximum health.
    pub max_health: u32,
}

impl CombatStats {
    /// Interval that must elapse between consecutive attacks.
    #[must_use]
    pub fn attack_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.attack_speed_ms))
    }

    /// Damage per second, `damage * 1000 / attack_speed`.
    #[must_use]
    pub fn damage_per_second(&self) -> f64 {
        if self.attack_speed_ms == 0 {
            return 0.0;
        }
        f64::from(self.damage) * 1000.0 / f64::from(self.attack_speed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_per_second_scales_by_cadence() {
        let stats = CombatStats {
            damage: 30,
            attack_speed_ms: 1500,
            range: 100,
            max_health: 10,
        };
        assert!((stats.damage_per_second() - 20.0).abs() < f64::EPSILON);
        assert_eq!(stats.attack_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn zero_cadence_reports_no_damage_per_second() {
        let stats = CombatStats::default();
        assert_eq!(stats.damage_per_second(), 0.0);
    }

    #[test]
    fn modifier_deserializes_with_missing_components() {
        let modifier: StatModifier =
            toml::from_str("stat = \"attack_speed\"\nmultiplier = -0.1").expect("parse");
        assert_eq!(modifier, StatModifier::scaled(StatKind::AttackSpeed, -0.1));
    }
}
