//! Immutable snapshots exposed to systems and presentation layers.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    CellCoord, CombatStats, DropId, GameStatus, ItemId, PersonTypeId, ProjectileId, SkillId,
    SpeedMultiplier, UnitId,
};

/// Immutable representation of a single defender.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSnapshot {
    /// Identifier allocated to the defender.
    pub id: UnitId,
    /// Archetype of the defender.
    pub person_type: PersonTypeId,
    /// Tile hosting the defender.
    pub cell: CellCoord,
    /// World-space centre of the defender.
    pub position: Vec2,
    /// Fully composed stats.
    pub stats: CombatStats,
    /// Current health.
    pub health: u32,
    /// Current level.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub experience: u32,
    /// Experience required for the next level, `None` at the level cap.
    pub experience_to_next: Option<u32>,
    /// Attackers defeated by the defender.
    pub kills: u32,
    /// Equipped skills in equip order.
    pub skills: Vec<SkillId>,
    /// Carried items in pickup order.
    pub inventory: Vec<ItemId>,
    /// Remaining cooldown before the defender may fire again.
    pub ready_in: Duration,
}

/// Immutable representation of a single attacker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Identifier allocated to the attacker.
    pub id: UnitId,
    /// Archetype of the attacker.
    pub person_type: PersonTypeId,
    /// World-space position.
    pub position: Vec2,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Movement speed in tiles per second.
    pub speed: f32,
    /// Damage dealt per attack.
    pub damage: u32,
    /// Qi granted when defeated.
    pub reward: u32,
    /// Waypoints left to visit, `None` while no route exists.
    pub path_remaining: Option<usize>,
    /// Whether the attacker is assaulting the castle.
    pub attacking_castle: bool,
    /// Defender being assaulted, if any.
    pub attacking_tower: Option<UnitId>,
    /// Castle assault bounce animation progress in `[0, 1)`.
    pub bounce: f32,
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Defender that fired the projectile.
    pub tower: UnitId,
    /// Attacker targeted by the projectile.
    pub target: UnitId,
    /// Launch position.
    pub start: Vec2,
    /// Target position captured at launch.
    pub end: Vec2,
    /// Damage applied on impact.
    pub damage: u32,
    /// Flight progress in `[0, 1)`.
    pub progress: f32,
}

/// Immutable representation of an unclaimed item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DroppedItemSnapshot {
    /// Identifier allocated to the drop.
    pub id: DropId,
    /// Item lying on the ground.
    pub item: ItemId,
    /// World-space position.
    pub position: Vec2,
    /// Game time at which the item dropped.
    pub spawned_at: Duration,
}

/// Complete game-state snapshot consumed by rendering each tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Session status.
    pub status: GameStatus,
    /// Playback speed.
    pub speed: SpeedMultiplier,
    /// Current one-based wave number; zero before the first wave.
    pub wave: u32,
    /// Castle health remaining.
    pub castle_health: u32,
    /// Castle health at full strength.
    pub castle_max_health: u32,
    /// Currency available for deployments.
    pub qi: u32,
    /// Score accumulated from kills.
    pub score: u64,
    /// Simulated time elapsed since the session began.
    pub elapsed: Duration,
    /// Every defender in identifier order.
    pub towers: Vec<TowerSnapshot>,
    /// Every attacker in identifier order.
    pub enemies: Vec<EnemySnapshot>,
    /// Every projectile in flight.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Every unclaimed item.
    pub dropped_items: Vec<DroppedItemSnapshot>,
    /// Units currently showing the damage flash.
    pub damaged: Vec<UnitId>,
    /// Defenders currently celebrating a level-up.
    pub leveled_up: Vec<UnitId>,
    /// Defenders that fired during the latest tick.
    pub firing: Vec<UnitId>,
}

/// Read-only snapshot describing all defenders.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Read-only snapshot describing all attackers.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Target assignment produced by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Defender that will fire.
    pub tower: UnitId,
    /// Attacker that will be targeted.
    pub enemy: UnitId,
}
