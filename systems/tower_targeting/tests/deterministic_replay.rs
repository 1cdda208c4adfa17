use std::time::Duration;

use cultivator_defence_core::{
    BaseStats, Catalog, CatalogDefinition, CellCoord, Command, MapDefinition,
    PersonTypeDefinition, PersonTypeId, SpeedMultiplier, TileTypeDefinition, TowerTarget,
    UnitId, UnitRole,
};
use cultivator_defence_system_tower_targeting::TowerTargeting;
use cultivator_defence_world::{self as world, query, TileGrid, World, WorldSettings};

#[test]
fn deterministic_replay_focuses_oldest_enemy_and_clears_when_paused() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");

    let spawned = first
        .iter()
        .flatten()
        .map(|target| target.enemy)
        .min()
        .expect("at least one assignment");
    // Both towers take identifiers 0 and 1, so the first attacker is 2.
    assert_eq!(spawned, UnitId::new(2));

    let with_both = first
        .iter()
        .find(|targets| targets.len() == 2)
        .expect("both towers acquire a target");
    assert!(with_both.iter().all(|target| target.enemy == UnitId::new(2)));

    let paused = first.last().expect("script is not empty");
    assert!(paused.is_empty(), "paused sessions must clear targets");
}

fn replay(commands: Vec<Command>) -> Vec<Vec<TowerTarget>> {
    let mut world = world();
    let mut targeting = TowerTargeting::new();
    let mut current_targets = Vec::new();
    let mut assignments = Vec::new();

    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);

        targeting.handle(
            query::status(&world),
            &query::tower_view(&world),
            &query::enemy_view(&world),
            &mut current_targets,
        );
        assignments.push(current_targets.clone());
    }

    assignments
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = vec![
        Command::PlaceTower {
            person_type: PersonTypeId::new(0),
            cell: CellCoord::new(1, 3),
        },
        Command::PlaceTower {
            person_type: PersonTypeId::new(0),
            cell: CellCoord::new(4, 3),
        },
        Command::SpawnEnemy {
            person_type: PersonTypeId::new(1),
            health_multiplier: 1.0,
        },
        Command::SpawnEnemy {
            person_type: PersonTypeId::new(1),
            health_multiplier: 1.0,
        },
    ];
    commands.extend((0..20).map(|_| Command::Tick {
        dt: Duration::from_millis(50),
    }));
    commands.push(Command::SetSpeed {
        multiplier: SpeedMultiplier::PAUSED,
    });
    commands
}

fn world() -> World {
    let grid = TileGrid::from_definition(&MapDefinition::uniform(
        6,
        6,
        TileTypeDefinition {
            key: "grass".into(),
            walkable: true,
            movement_cost: 1,
            deployable: true,
        },
    ))
    .expect("valid map");
    World::new(catalog(), grid, WorldSettings::default())
}

fn catalog() -> Catalog {
    let person = |key: &str, role, range| PersonTypeDefinition {
        key: key.to_owned(),
        name: key.to_owned(),
        emoji: String::new(),
        role,
        stats: BaseStats {
            damage: 10,
            attack_speed_ms: 1000,
            range,
            health: 100,
        },
        speed: 1.0,
        reward: 10,
        cost: 100,
        spawn_weight: 1,
        first_wave: 1,
        skills: Vec::new(),
        items: Vec::new(),
    };
    Catalog::from_definition(CatalogDefinition {
        person_types: vec![
            person("disciple", UnitRole::Defender, 400),
            person("bandit", UnitRole::Attacker, 0),
        ],
        ..CatalogDefinition::default()
    })
    .expect("valid catalog")
}
