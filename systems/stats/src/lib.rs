#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure stat composer that derives a defender's combat stats.
//!
//! Composition runs a fixed four-stage pipeline per stat, each stage feeding
//! the next: level bonus (floored), skill bonuses, item bonuses, and a final
//! floor. Skills and items accumulate flat values and multipliers separately
//! and apply them as `(stat + Σvalue) * (1 + Σmultiplier)`.

use cultivator_defence_core::{
    BaseStats, Catalog, CombatStats, ItemId, SkillId, StatKind, StatModifier,
};

/// Percentage added to levelled stats for every level above the first.
pub const LEVEL_STAT_BONUS_PERCENT: u32 = 10;

/// Lowest attack interval a defender can reach, in milliseconds.
pub const MIN_ATTACK_SPEED_MS: u32 = 1;

// Absorbs representation error so that e.g. 11.0 computed as 10.999999 floors to 11.
const FLOOR_EPSILON: f64 = 1e-9;

/// Composes final stats from the catalog definitions of the equipped skills
/// and carried items. Identifiers missing from the catalog contribute nothing.
#[must_use]
pub fn compose(
    catalog: &Catalog,
    base: &BaseStats,
    level: u32,
    skills: &[SkillId],
    items: &[ItemId],
) -> CombatStats {
    let skill_modifiers: Vec<StatModifier> = skills
        .iter()
        .filter_map(|id| catalog.skill(*id))
        .flat_map(|skill| skill.modifiers.iter().copied())
        .collect();
    let item_modifiers: Vec<StatModifier> = items
        .iter()
        .filter_map(|id| catalog.item(*id))
        .flat_map(|item| item.modifiers.iter().copied())
        .collect();

    compose_with(base, level, &skill_modifiers, &item_modifiers)
}

/// Composes final stats from explicit modifier lists.
#[must_use]
pub fn compose_with(
    base: &BaseStats,
    level: u32,
    skill_modifiers: &[StatModifier],
    item_modifiers: &[StatModifier],
) -> CombatStats {
    let stat = |kind: StatKind| {
        let levelled = f64::from(level_bonus(kind, base.get(kind), level));
        let skilled = apply_modifiers(kind, levelled, skill_modifiers);
        floor_stat(apply_modifiers(kind, skilled, item_modifiers))
    };

    CombatStats {
        damage: stat(StatKind::Damage),
        attack_speed_ms: stat(StatKind::AttackSpeed).max(MIN_ATTACK_SPEED_MS),
        range: stat(StatKind::Range),
        max_health: stat(StatKind::Health),
    }
}

/// Applies the level bonus stage, `floor(stat * (1 + (level - 1) * 10%))`.
///
/// Attack speed is a millisecond interval and is left untouched; scaling it up
/// would make higher-level defenders slower.
#[must_use]
pub fn level_bonus(kind: StatKind, value: u32, level: u32) -> u32 {
    if kind == StatKind::AttackSpeed {
        return value;
    }

    let percent = 100 + u64::from(level.saturating_sub(1)) * u64::from(LEVEL_STAT_BONUS_PERCENT);
    let scaled = u64::from(value) * percent / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Rescales current health so that its ratio to the maximum is preserved.
///
/// A previous maximum of zero yields full health. A living unit keeps at least
/// one point of health, so recomposition alone never defeats it.
#[must_use]
pub fn rescale_health(health: u32, old_max_health: u32, new_max_health: u32) -> u32 {
    if old_max_health == 0 {
        return new_max_health;
    }

    let scaled = u64::from(health) * u64::from(new_max_health) / u64::from(old_max_health);
    let scaled = u32::try_from(scaled)
        .unwrap_or(u32::MAX)
        .min(new_max_health);
    if health > 0 && new_max_health > 0 {
        scaled.max(1)
    } else {
        scaled
    }
}

fn apply_modifiers(kind: StatKind, value: f64, modifiers: &[StatModifier]) -> f64 {
    let (flat, multiplier) = modifiers
        .iter()
        .filter(|modifier| modifier.stat == kind)
        .fold((0.0, 0.0), |(flat, multiplier), modifier| {
            (flat + modifier.value, multiplier + modifier.multiplier)
        });
    (value + flat) * (1.0 + multiplier)
}

fn floor_stat(value: f64) -> u32 {
    // `as` saturates and maps NaN to zero.
    (value + FLOOR_EPSILON).floor().max(0.0) as u32
}
