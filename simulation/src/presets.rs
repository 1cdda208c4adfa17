//! Built-in catalog, map and authored waves used when no content files are
//! supplied.

use cultivator_defence_core::{
    BaseStats, CatalogDefinition, CompositionDefinition, DaoDefinition, ItemDefinition,
    MapDefinition, PersonTypeDefinition, SkillDefinition, SpawnGroup, SpeciesDefinition,
    StatKind, StatModifier, TileTypeDefinition, TitleDefinition, UnitRole, WaveConfig,
};

/// Tile layout of the standard valley. Rivers on rows three and nine are
/// crossed by narrow bridges that funnel attackers toward the castle.
const VALLEY: [&str; 12] = [
    "..ff......ff..^^",
    "..ff..........^^",
    "......^^........",
    "~~~~~.~~~~~~.~~~",
    "................",
    "..ff........ff..",
    "....^^....^^....",
    "................",
    "..ff..........ff",
    "~~~~~~.~~.~~~~~~",
    "................",
    "................",
];

fn tile_key(glyph: char) -> &'static str {
    match glyph {
        'f' => "forest",
        '~' => "water",
        '^' => "mountain",
        _ => "grass",
    }
}

fn tile_type(key: &str, walkable: bool, movement_cost: u32, deployable: bool) -> TileTypeDefinition {
    TileTypeDefinition {
        key: key.to_owned(),
        walkable,
        movement_cost,
        deployable,
    }
}

/// Sixteen by twelve valley with the castle at the bottom centre.
#[must_use]
pub fn standard_map() -> MapDefinition {
    MapDefinition {
        columns: 16,
        rows: 12,
        tile_types: vec![
            tile_type("grass", true, 1, true),
            tile_type("forest", true, 2, true),
            tile_type("water", false, 1, false),
            tile_type("mountain", false, 1, true),
        ],
        tiles: VALLEY
            .iter()
            .map(|row| row.chars().map(|glyph| tile_key(glyph).to_owned()).collect())
            .collect(),
        castle: None,
    }
}

fn skill(key: &str, name: &str, modifiers: Vec<StatModifier>) -> SkillDefinition {
    SkillDefinition {
        key: key.to_owned(),
        name: name.to_owned(),
        modifiers,
    }
}

fn item(key: &str, name: &str, modifier: StatModifier, drop_weight: u32) -> ItemDefinition {
    ItemDefinition {
        key: key.to_owned(),
        name: name.to_owned(),
        modifiers: vec![modifier],
        drop_weight,
    }
}

const fn stats(damage: u32, attack_speed_ms: u32, range: u32, health: u32) -> BaseStats {
    BaseStats {
        damage,
        attack_speed_ms,
        range,
        health,
    }
}

#[allow(clippy::too_many_arguments)]
fn person(
    key: &str,
    name: &str,
    emoji: &str,
    role: UnitRole,
    stats: BaseStats,
    speed: f32,
    reward: u32,
    cost: u32,
    spawn_weight: u32,
    first_wave: u32,
    skills: &[&str],
) -> PersonTypeDefinition {
    PersonTypeDefinition {
        key: key.to_owned(),
        name: name.to_owned(),
        emoji: emoji.to_owned(),
        role,
        stats,
        speed,
        reward,
        cost,
        spawn_weight,
        first_wave,
        skills: skills.iter().map(|skill| (*skill).to_owned()).collect(),
        items: Vec::new(),
    }
}

/// Sect disciples, roaming threats and the techniques they trade in.
#[must_use]
pub fn standard_catalog() -> CatalogDefinition {
    CatalogDefinition {
        skills: vec![
            skill(
                "sword_intent",
                "Sword Intent",
                vec![StatModifier::scaled(StatKind::Damage, 0.25)],
            ),
            skill(
                "flowing_strikes",
                "Flowing Strikes",
                vec![StatModifier::scaled(StatKind::AttackSpeed, -0.2)],
            ),
            skill(
                "spirit_sense",
                "Spirit Sense",
                vec![StatModifier::flat(StatKind::Range, 40.0)],
            ),
            skill(
                "iron_skin",
                "Iron Skin",
                vec![StatModifier::scaled(StatKind::Health, 0.3)],
            ),
            skill(
                "flame_palm",
                "Flame Palm",
                vec![
                    StatModifier::flat(StatKind::Damage, 8.0),
                    StatModifier::scaled(StatKind::AttackSpeed, 0.1),
                ],
            ),
        ],
        items: vec![
            item(
                "spirit_stone",
                "Spirit Stone",
                StatModifier::flat(StatKind::Damage, 5.0),
                5,
            ),
            item(
                "jade_pendant",
                "Jade Pendant",
                StatModifier::flat(StatKind::Health, 40.0),
                4,
            ),
            item(
                "wind_talisman",
                "Wind Talisman",
                StatModifier::scaled(StatKind::AttackSpeed, -0.1),
                3,
            ),
            item(
                "crane_feather",
                "Crane Feather",
                StatModifier::flat(StatKind::Range, 20.0),
                2,
            ),
        ],
        person_types: vec![
            person(
                "outer_disciple",
                "Outer Disciple",
                "🧘",
                UnitRole::Defender,
                stats(12, 1000, 120, 100),
                0.0,
                0,
                100,
                0,
                1,
                &["sword_intent", "iron_skin"],
            ),
            person(
                "inner_disciple",
                "Inner Disciple",
                "🥋",
                UnitRole::Defender,
                stats(20, 800, 140, 150),
                0.0,
                0,
                200,
                0,
                1,
                &["sword_intent", "flowing_strikes", "spirit_sense"],
            ),
            person(
                "sect_elder",
                "Sect Elder",
                "🧙",
                UnitRole::Defender,
                stats(45, 1500, 200, 220),
                0.0,
                0,
                400,
                0,
                1,
                &["spirit_sense", "flame_palm", "iron_skin", "flowing_strikes"],
            ),
            person(
                "mountain_bandit",
                "Mountain Bandit",
                "🗡",
                UnitRole::Attacker,
                stats(5, 1000, 0, 60),
                1.0,
                10,
                0,
                5,
                1,
                &[],
            ),
            person(
                "wolf_demon",
                "Wolf Demon",
                "🐺",
                UnitRole::Attacker,
                stats(4, 700, 0, 45),
                1.8,
                12,
                0,
                3,
                2,
                &[],
            ),
            person(
                "rogue_cultivator",
                "Rogue Cultivator",
                "👤",
                UnitRole::Attacker,
                stats(10, 1200, 60, 160),
                0.8,
                25,
                0,
                2,
                3,
                &[],
            ),
        ],
        species: vec![
            SpeciesDefinition {
                key: "human".into(),
                name: "Swordsman".into(),
                emoji: "⚔".into(),
                role: UnitRole::Defender,
                stats: stats(16, 900, 130, 120),
                speed: 0.0,
                reward: 0,
                cost: 160,
                spawn_weight: 0,
                first_wave: 1,
            },
            SpeciesDefinition {
                key: "fox_spirit".into(),
                name: "Fox Spirit".into(),
                emoji: "🦊".into(),
                role: UnitRole::Attacker,
                stats: stats(8, 900, 0, 120),
                speed: 1.4,
                reward: 30,
                cost: 0,
                spawn_weight: 1,
                first_wave: 5,
            },
        ],
        daos: vec![
            DaoDefinition {
                key: "sword".into(),
                name: "Sword Dao".into(),
                bonus: stats(6, 0, 0, 0),
                skills: vec!["sword_intent".into(), "flowing_strikes".into()],
            },
            DaoDefinition {
                key: "shadow".into(),
                name: "Shadow Dao".into(),
                bonus: stats(2, 0, 0, 40),
                skills: Vec::new(),
            },
        ],
        titles: vec![
            TitleDefinition {
                key: "young_master".into(),
                name: "Young Master".into(),
                cost_percent: 150,
                reward_percent: 100,
            },
            TitleDefinition {
                key: "ancient".into(),
                name: "Ancient".into(),
                cost_percent: 100,
                reward_percent: 200,
            },
        ],
        compositions: vec![
            CompositionDefinition {
                key: "young_master_swordsman".into(),
                species: "human".into(),
                dao: "sword".into(),
                title: Some("young_master".into()),
            },
            CompositionDefinition {
                key: "ancient_shadow_fox".into(),
                species: "fox_spirit".into(),
                dao: "shadow".into(),
                title: Some("ancient".into()),
            },
        ],
    }
}

fn group(person_type: &str, count: u32, spawn_interval_ms: u64, spawn_delay_ms: u64) -> SpawnGroup {
    SpawnGroup {
        person_type: person_type.to_owned(),
        count,
        spawn_interval_ms,
        spawn_delay_ms,
    }
}

/// Authored set-piece waves. Every other wave is synthesized.
#[must_use]
pub fn standard_waves() -> Vec<WaveConfig> {
    vec![
        WaveConfig {
            wave: 5,
            groups: vec![
                group("mountain_bandit", 8, 800, 0),
                group("rogue_cultivator", 3, 2000, 3000),
            ],
        },
        WaveConfig {
            wave: 10,
            groups: vec![
                group("ancient_shadow_fox", 5, 1500, 0),
                group("rogue_cultivator", 6, 1200, 2000),
                group("wolf_demon", 10, 500, 5000),
            ],
        },
    ]
}
