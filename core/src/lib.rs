#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Cultivator Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation layers to react to. Systems consume event
//! streams, query immutable snapshots, and respond exclusively with new command
//! batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod catalog;
mod map;
mod snapshot;
mod stats;
mod wave;

pub use catalog::{
    Catalog, CatalogDefinition, CatalogError, CompositionDefinition, DaoDefinition, Item,
    ItemDefinition, PersonType, PersonTypeDefinition, Skill, SkillDefinition, SpeciesDefinition,
    TitleDefinition,
};
pub use map::{MapDefinition, MapError, TileTypeDefinition};
pub use snapshot::{
    DroppedItemSnapshot, EnemySnapshot, EnemyView, GameSnapshot, ProjectileSnapshot,
    TowerSnapshot, TowerTarget, TowerView,
};
pub use stats::{BaseStats, CombatStats, StatKind, StatModifier};
pub use wave::{GenerationError, SpawnGroup, WaveConfig, WaveConfigError};

/// Side length of a single square tile expressed in world units.
pub const TILE_SIZE: f32 = 40.0;

/// Edge length of the square castle footprint measured in tiles.
pub const CASTLE_SIZE: i32 = 2;

/// Maximum number of skills a defender may equip at once.
pub const MAX_EQUIPPED_SKILLS: usize = 3;

/// Maximum number of items a defender may carry at once.
pub const MAX_INVENTORY_ITEMS: usize = 3;

/// Share of the deployment cost refunded when a defender is sold.
pub const SELL_REFUND_PERCENT: u32 = 70;

/// Simulated time that elapses during a single tick at any speed multiplier.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Computes the qi refunded when selling a defender with the provided cost.
#[must_use]
pub const fn sell_refund(cost: u32) -> u32 {
    ((cost as u64 * SELL_REFUND_PERCENT as u64) / 100) as u32
}

/// Lifecycle status of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// The simulation advances every tick.
    Playing,
    /// The simulation is suspended; persistent state is frozen.
    Paused,
    /// The castle fell. No further ticks are processed.
    GameOver,
    /// Every configured wave was cleared.
    Victory,
}

impl GameStatus {
    /// Reports whether the session reached a terminal state.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

/// Integer speed multiplier applied to the real-time tick cadence.
///
/// Zero suspends the simulation entirely; one through three shorten the real
/// interval between ticks without changing the simulated time per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeedMultiplier(u8);

impl SpeedMultiplier {
    /// Multiplier that suspends the simulation.
    pub const PAUSED: Self = Self(0);
    /// Real-time playback.
    pub const NORMAL: Self = Self(1);
    /// Fastest supported playback.
    pub const MAX: Self = Self(3);

    /// Creates a multiplier, rejecting values above [`SpeedMultiplier::MAX`].
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric multiplier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether the multiplier suspends the simulation.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.0 == 0
    }

    /// Real-world time between ticks for the provided base interval.
    ///
    /// Returns `None` while paused.
    #[must_use]
    pub fn real_tick_interval(&self, base: Duration) -> Option<Duration> {
        if self.is_paused() {
            None
        } else {
            Some(base / u32::from(self.0))
        }
    }
}

impl Default for SpeedMultiplier {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Role a unit plays on the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    /// Player-placed stationary cultivator.
    Defender,
    /// AI-controlled unit advancing toward the castle.
    Attacker,
}

/// Unique identifier assigned to a unit, shared by defenders and attackers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item lying on the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DropId(u32);

impl DropId {
    /// Creates a new drop identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u16);

        impl $name {
            /// Creates a new identifier with the provided dense index.
            #[must_use]
            pub const fn new(value: u16) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u16 {
                self.0
            }

            /// Position of the definition inside its catalog table.
            #[must_use]
            pub const fn index(&self) -> usize {
                self.0 as usize
            }
        }
    };
}

catalog_id!(
    /// Dense identifier of a resolved person type.
    PersonTypeId
);
catalog_id!(
    /// Dense identifier of a resolved skill.
    SkillId
);
catalog_id!(
    /// Dense identifier of a resolved item.
    ItemId
);

/// Location of a single grid tile expressed as column and row indices.
///
/// Coordinates are signed so that callers may probe neighbours beyond the map
/// edge; the tile oracle reports such tiles as absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the cell displaced by the provided column and row deltas.
    #[must_use]
    pub const fn offset(&self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }

    /// World-space centre of the cell.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.column as f32 + 0.5) * TILE_SIZE,
            (self.row as f32 + 0.5) * TILE_SIZE,
        )
    }

    /// Cell that contains the provided world-space point.
    #[must_use]
    pub fn containing(point: Vec2) -> Self {
        Self::new(
            (point.x / TILE_SIZE).floor() as i32,
            (point.y / TILE_SIZE).floor() as i32,
        )
    }

    /// Computes the Chebyshev (king-move) distance between two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by one tick of the provided duration.
    Tick {
        /// Simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Changes the playback speed; zero pauses the simulation.
    SetSpeed {
        /// Requested multiplier.
        multiplier: SpeedMultiplier,
    },
    /// Begins the next wave.
    StartWave,
    /// Declares the active wave cleared.
    CompleteWave,
    /// Requests that an attacker of the provided type enter the map.
    SpawnEnemy {
        /// Archetype of the attacker.
        person_type: PersonTypeId,
        /// Multiplier applied to the archetype's base health.
        health_multiplier: f32,
    },
    /// Requests deployment of a defender on the provided tile.
    PlaceTower {
        /// Archetype of the defender.
        person_type: PersonTypeId,
        /// Tile that will host the defender.
        cell: CellCoord,
    },
    /// Requests that a defender be sold for a partial refund.
    SellTower {
        /// Defender targeted for removal.
        tower: UnitId,
    },
    /// Requests that a defender launch a projectile at an attacker.
    FireProjectile {
        /// Defender that fires.
        tower: UnitId,
        /// Attacker that is targeted.
        target: UnitId,
    },
    /// Requests that a defender equip a skill.
    EquipSkill {
        /// Defender receiving the skill.
        tower: UnitId,
        /// Skill to equip.
        skill: SkillId,
    },
    /// Requests that a defender drop an equipped skill.
    UnequipSkill {
        /// Defender losing the skill.
        tower: UnitId,
        /// Skill to remove.
        skill: SkillId,
    },
    /// Requests that a defender discard an item from its inventory.
    DiscardItem {
        /// Defender holding the item.
        tower: UnitId,
        /// Item to discard.
        item: ItemId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the playback speed changed.
    SpeedChanged {
        /// Multiplier that became active.
        multiplier: SpeedMultiplier,
    },
    /// Announces that the session status changed.
    StatusChanged {
        /// Status that became active.
        status: GameStatus,
    },
    /// Announces the start of a wave.
    WaveStarted {
        /// One-based number of the wave.
        wave: u32,
    },
    /// Announces that a wave was cleared.
    WaveCompleted {
        /// One-based number of the wave.
        wave: u32,
    },
    /// Confirms that an attacker entered the map.
    EnemySpawned {
        /// Identifier assigned to the attacker.
        enemy: UnitId,
        /// Archetype of the attacker.
        person_type: PersonTypeId,
        /// Tile the attacker entered on.
        cell: CellCoord,
    },
    /// Reports that an attacker has no route to the castle.
    EnemyBlocked {
        /// Attacker whose route is blocked.
        enemy: UnitId,
    },
    /// Reports that a blocked attacker chose a defender to break through.
    EnemyRetargeted {
        /// Attacker that changed behaviour.
        enemy: UnitId,
        /// Defender that is now targeted.
        tower: UnitId,
    },
    /// Reports that an attacker reached the castle and began its assault.
    EnemyReachedCastle {
        /// Attacker at the castle.
        enemy: UnitId,
    },
    /// Reports that a projectile struck an attacker.
    EnemyHit {
        /// Attacker that was struck.
        enemy: UnitId,
        /// Defender that launched the projectile.
        tower: UnitId,
        /// Damage dealt by the impact.
        damage: u32,
    },
    /// Reports that an attacker was defeated.
    EnemyDefeated {
        /// Attacker that was defeated.
        enemy: UnitId,
        /// Defender credited with the kill, if it still exists.
        tower: Option<UnitId>,
        /// Qi granted for the kill.
        reward: u32,
        /// Experience granted to the credited defender.
        experience: u32,
    },
    /// Confirms that a defender was deployed.
    TowerPlaced {
        /// Identifier assigned to the defender.
        tower: UnitId,
        /// Archetype of the defender.
        person_type: PersonTypeId,
        /// Tile hosting the defender.
        cell: CellCoord,
        /// Qi spent on the deployment.
        cost: u32,
    },
    /// Reports that a deployment request was rejected.
    TowerPlacementRejected {
        /// Requested archetype.
        person_type: PersonTypeId,
        /// Requested tile.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a defender was sold.
    TowerSold {
        /// Defender that was sold.
        tower: UnitId,
        /// Qi refunded to the player.
        refund: u32,
    },
    /// Reports that a sale request was rejected.
    TowerSaleRejected {
        /// Defender targeted by the request.
        tower: UnitId,
        /// Specific reason the sale failed.
        reason: SaleError,
    },
    /// Reports that an attacker struck a defender.
    TowerDamaged {
        /// Defender that was struck.
        tower: UnitId,
        /// Attacker that dealt the blow.
        enemy: UnitId,
        /// Damage dealt.
        damage: u32,
    },
    /// Reports that a defender was destroyed by attackers.
    TowerDestroyed {
        /// Defender that was destroyed.
        tower: UnitId,
    },
    /// Reports that a defender advanced a level.
    TowerLeveledUp {
        /// Defender that levelled up.
        tower: UnitId,
        /// Level reached.
        level: u32,
    },
    /// Confirms that a skill was equipped.
    SkillEquipped {
        /// Defender that received the skill.
        tower: UnitId,
        /// Skill that was equipped.
        skill: SkillId,
    },
    /// Confirms that a skill was removed.
    SkillUnequipped {
        /// Defender that lost the skill.
        tower: UnitId,
        /// Skill that was removed.
        skill: SkillId,
    },
    /// Reports that a skill request was rejected.
    SkillRejected {
        /// Defender targeted by the request.
        tower: UnitId,
        /// Skill named by the request.
        skill: SkillId,
        /// Specific reason the request failed.
        reason: SkillError,
    },
    /// Confirms that a projectile was launched.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Defender that fired.
        tower: UnitId,
        /// Attacker that is targeted.
        target: UnitId,
    },
    /// Reports that a defeated attacker left an item behind.
    ItemDropped {
        /// Identifier of the dropped item.
        drop: DropId,
        /// Item lying on the ground.
        item: ItemId,
        /// World-space position of the drop.
        position: Vec2,
    },
    /// Reports that a defender claimed a dropped item.
    ItemPickedUp {
        /// Identifier of the drop that was claimed.
        drop: DropId,
        /// Item that was claimed.
        item: ItemId,
        /// Defender that now carries the item.
        tower: UnitId,
    },
    /// Reports that an unclaimed item vanished.
    ItemDespawned {
        /// Identifier of the drop that vanished.
        drop: DropId,
    },
    /// Reports that a defender discarded an item.
    ItemDiscarded {
        /// Defender that discarded the item.
        tower: UnitId,
        /// Item that was discarded.
        item: ItemId,
    },
    /// Reports that a discard request was rejected.
    ItemDiscardRejected {
        /// Defender targeted by the request.
        tower: UnitId,
        /// Item named by the request.
        item: ItemId,
        /// Specific reason the request failed.
        reason: InventoryError,
    },
    /// Reports that an attacker struck the castle.
    CastleDamaged {
        /// Attacker that dealt the blow.
        enemy: UnitId,
        /// Damage dealt.
        damage: u32,
        /// Castle health remaining after the blow.
        remaining: u32,
    },
    /// Announces that the castle fell.
    GameOver {
        /// Final score.
        score: u64,
    },
    /// Announces that every wave was cleared.
    Victory {
        /// Final score.
        score: u64,
    },
}

/// Reasons a defender deployment may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum PlacementError {
    /// The session already ended.
    #[error("the game has ended")]
    GameEnded,
    /// The requested archetype does not exist.
    #[error("unknown person type")]
    UnknownPersonType,
    /// The requested archetype cannot be deployed as a defender.
    #[error("person type cannot defend")]
    NotADefender,
    /// The requested tile lies outside the map or on the castle.
    #[error("tile is outside the deployable area")]
    OutOfBounds,
    /// The requested tile forbids deployment.
    #[error("tile does not allow deployment")]
    NotDeployable,
    /// Another defender already occupies the tile.
    #[error("tile is occupied")]
    Occupied,
    /// The player cannot afford the deployment.
    #[error("not enough qi")]
    InsufficientQi,
}

/// Reasons a defender sale may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum SaleError {
    /// The session already ended.
    #[error("the game has ended")]
    GameEnded,
    /// No defender with the provided identifier exists.
    #[error("no such defender")]
    MissingTower,
}

/// Reasons a skill request may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum SkillError {
    /// The session already ended.
    #[error("the game has ended")]
    GameEnded,
    /// No defender with the provided identifier exists.
    #[error("no such defender")]
    MissingTower,
    /// The skill does not exist in the catalog.
    #[error("unknown skill")]
    UnknownSkill,
    /// The defender's archetype cannot learn the skill.
    #[error("skill is not compatible with the defender")]
    Incompatible,
    /// The skill is already equipped.
    #[error("skill already equipped")]
    AlreadyEquipped,
    /// Every skill slot is in use.
    #[error("all skill slots are in use")]
    SlotsFull,
    /// The skill is not equipped.
    #[error("skill is not equipped")]
    NotEquipped,
}

/// Reasons an inventory request may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum InventoryError {
    /// The session already ended.
    #[error("the game has ended")]
    GameEnded,
    /// No defender with the provided identifier exists.
    #[error("no such defender")]
    MissingTower,
    /// The defender does not carry the item.
    #[error("item is not carried")]
    NotCarried,
}
