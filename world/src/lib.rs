#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Cultivator Defence.
//!
//! The world owns every unit, projectile and dropped item. It is mutated only
//! through [`apply`], which executes a single [`Command`] and reports the
//! outcome as [`Event`] values. Read-only access goes through [`query`].

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use cultivator_defence_core::{
    sell_refund, Catalog, CellCoord, Command, DropId, Event, GameStatus, InventoryError, ItemId,
    PersonTypeId, PlacementError, ProjectileId, SaleError, SkillError, SkillId, SpeedMultiplier,
    UnitId, UnitRole, MAX_EQUIPPED_SKILLS,
};
use cultivator_defence_system_stats::compose;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

mod combat;
mod grid;
mod items;
pub mod navigation;
mod units;

pub use grid::{TileGrid, TileProperties};

use combat::Projectile;
use items::DroppedItem;
use units::{Attacker, Behavior, Defender, Role, Route, Unit};

const DEFAULT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

const DAMAGE_FLASH: Duration = Duration::from_millis(200);
const LEVEL_UP_CELEBRATION: Duration = Duration::from_secs(2);

/// Session parameters that are fixed when the world is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldSettings {
    /// Qi available before the first deployment.
    pub starting_qi: u32,
    /// Castle health at full strength.
    pub castle_health: u32,
    /// Number of waves that must be cleared for victory.
    pub total_waves: u32,
    /// Seed for spawn placement and item drops.
    pub seed: u64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            starting_qi: 500,
            castle_health: 100,
            total_waves: 10,
            seed: DEFAULT_SEED,
        }
    }
}

/// Short-lived presentation markers.
#[derive(Debug, Default)]
struct Effects {
    damaged: BTreeMap<UnitId, Duration>,
    leveled_up: BTreeMap<UnitId, Duration>,
    firing: BTreeSet<UnitId>,
}

impl Effects {
    fn flash_damage(&mut self, unit: UnitId, now: Duration) {
        let _ = self.damaged.insert(unit, now + DAMAGE_FLASH);
    }

    fn celebrate(&mut self, unit: UnitId, now: Duration) {
        let _ = self.leveled_up.insert(unit, now + LEVEL_UP_CELEBRATION);
    }

    fn expire(&mut self, now: Duration) {
        self.damaged.retain(|_, until| *until > now);
        self.leveled_up.retain(|_, until| *until > now);
    }

    fn forget(&mut self, unit: UnitId) {
        let _ = self.damaged.remove(&unit);
        let _ = self.leveled_up.remove(&unit);
        let _ = self.firing.remove(&unit);
    }

    fn clear(&mut self) {
        self.damaged.clear();
        self.leveled_up.clear();
        self.firing.clear();
    }
}

/// Represents the authoritative Cultivator Defence world state.
#[derive(Debug)]
pub struct World {
    catalog: Catalog,
    grid: TileGrid,
    status: GameStatus,
    speed: SpeedMultiplier,
    clock: Duration,
    wave: u32,
    wave_active: bool,
    total_waves: u32,
    castle_health: u32,
    castle_max_health: u32,
    qi: u32,
    score: u64,
    units: BTreeMap<UnitId, Unit>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    drops: BTreeMap<DropId, DroppedItem>,
    next_unit_id: u32,
    next_projectile_id: u32,
    next_drop_id: u32,
    effects: Effects,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world ready for the first wave.
    #[must_use]
    pub fn new(catalog: Catalog, grid: TileGrid, settings: WorldSettings) -> Self {
        Self {
            catalog,
            grid,
            status: GameStatus::Playing,
            speed: SpeedMultiplier::NORMAL,
            clock: Duration::ZERO,
            wave: 0,
            wave_active: false,
            total_waves: settings.total_waves,
            castle_health: settings.castle_health,
            castle_max_health: settings.castle_health,
            qi: settings.starting_qi,
            score: 0,
            units: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            drops: BTreeMap::new(),
            next_unit_id: 0,
            next_projectile_id: 0,
            next_drop_id: 0,
            effects: Effects::default(),
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
        }
    }

    fn allocate_unit_id(&mut self) -> UnitId {
        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.wrapping_add(1);
        id
    }

    fn allocate_projectile_id(&mut self) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        id
    }

    fn allocate_drop_id(&mut self) -> DropId {
        let id = DropId::new(self.next_drop_id);
        self.next_drop_id = self.next_drop_id.wrapping_add(1);
        id
    }

    /// Tiles currently hosting a defender.
    fn obstacles(&self) -> BTreeSet<CellCoord> {
        self.units
            .values()
            .filter_map(|unit| unit.defender().map(|defender| defender.cell))
            .collect()
    }

    fn tower_on(&self, cell: CellCoord) -> Option<UnitId> {
        self.units.values().find_map(|unit| {
            unit.defender()
                .filter(|defender| defender.cell == cell)
                .map(|_| unit.id)
        })
    }

    fn finish(&mut self, status: GameStatus, out_events: &mut Vec<Event>) {
        self.status = status;
        self.wave_active = false;
        out_events.push(Event::StatusChanged { status });
        match status {
            GameStatus::GameOver => {
                info!(score = self.score, wave = self.wave, "castle fell");
                out_events.push(Event::GameOver { score: self.score });
            }
            GameStatus::Victory => {
                info!(score = self.score, wave = self.wave, "all waves cleared");
                out_events.push(Event::Victory { score: self.score });
            }
            GameStatus::Playing | GameStatus::Paused => {}
        }
    }

    /// Recomputes routes for attackers whose path may be stale.
    ///
    /// Moving attackers always replan. Attackers assaulting one of `removed`
    /// return to pursuit with a fresh route.
    fn replan_attackers(&mut self, removed: &[UnitId], out_events: &mut Vec<Event>) {
        let obstacles = self.obstacles();
        let mut replanned = 0_usize;

        for unit in self.units.values_mut() {
            let Role::Attacker(attacker) = &mut unit.role else {
                continue;
            };
            let stale = match attacker.behavior {
                Behavior::Moving => true,
                Behavior::AttackingTower(tower) => removed.contains(&tower),
                Behavior::AttackingCastle => false,
            };
            if !stale {
                continue;
            }

            let was_blocked = attacker.route == Route::Unreachable;
            attacker.route =
                Route::from_path(navigation::find_path(unit.position, &obstacles, &self.grid));
            attacker.behavior = Behavior::Moving;
            replanned += 1;

            if attacker.route == Route::Unreachable && !was_blocked {
                out_events.push(Event::EnemyBlocked { enemy: unit.id });
            }
        }

        if replanned > 0 {
            debug!(replanned, "recomputed attacker routes");
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.status != GameStatus::Playing {
            return;
        }

        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });
        self.effects.firing.clear();
        self.effects.expire(self.clock);

        self.advance_attackers(dt, out_events);
        if self.status.is_over() {
            return;
        }

        self.destroy_fallen_towers(out_events);
        self.advance_projectiles(out_events);
        self.collect_items(out_events);
        self.despawn_items(out_events);
    }

    fn set_speed(&mut self, multiplier: SpeedMultiplier, out_events: &mut Vec<Event>) {
        if self.status.is_over() {
            return;
        }

        self.speed = multiplier;
        out_events.push(Event::SpeedChanged { multiplier });

        if multiplier.is_paused() {
            if self.status == GameStatus::Playing {
                self.status = GameStatus::Paused;
                self.effects.clear();
                for unit in self.units.values_mut() {
                    if let Role::Attacker(attacker) = &mut unit.role {
                        attacker.bounce = 0.0;
                    }
                }
                out_events.push(Event::StatusChanged {
                    status: GameStatus::Paused,
                });
            }
        } else if self.status == GameStatus::Paused {
            self.status = GameStatus::Playing;
            out_events.push(Event::StatusChanged {
                status: GameStatus::Playing,
            });
        }
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.status.is_over() || self.wave_active {
            return;
        }

        self.wave = self.wave.saturating_add(1);
        self.wave_active = true;
        info!(wave = self.wave, "wave started");
        out_events.push(Event::WaveStarted { wave: self.wave });
    }

    fn complete_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.status.is_over() || !self.wave_active {
            return;
        }
        if self.units.values().any(|unit| unit.attacker().is_some()) {
            return;
        }

        self.wave_active = false;
        info!(wave = self.wave, "wave completed");
        out_events.push(Event::WaveCompleted { wave: self.wave });

        if self.wave >= self.total_waves {
            self.finish(GameStatus::Victory, out_events);
        }
    }

    fn spawn_enemy(
        &mut self,
        person_type: PersonTypeId,
        health_multiplier: f32,
        out_events: &mut Vec<Event>,
    ) {
        if self.status.is_over() {
            return;
        }

        let Some(archetype) = self
            .catalog
            .person_type(person_type)
            .filter(|archetype| archetype.role == UnitRole::Attacker)
        else {
            warn!(?person_type, "skipping spawn of unknown or non-attacker type");
            return;
        };

        let entries = self.grid.entry_cells();
        if entries.is_empty() {
            warn!("skipping spawn: no walkable tile on the top row");
            return;
        }
        let cell = entries[self.rng.gen_range(0..entries.len())];

        let health = scaled_health(archetype.stats.health, health_multiplier);
        let position = cell.center();
        let attacker = Attacker {
            route: Route::from_path(navigation::find_path(position, &self.obstacles(), &self.grid)),
            behavior: Behavior::Moving,
            speed: archetype.speed,
            damage: archetype.stats.damage,
            attack_interval: Duration::from_millis(u64::from(archetype.stats.attack_speed_ms)),
            range: archetype.stats.range as f32,
            reward: archetype.reward,
            last_attack: None,
            bounce: 0.0,
        };
        let blocked = attacker.route == Route::Unreachable;

        let id = self.allocate_unit_id();
        let _ = self.units.insert(
            id,
            Unit {
                id,
                person_type,
                position,
                health,
                max_health: health,
                role: Role::Attacker(attacker),
            },
        );
        out_events.push(Event::EnemySpawned {
            enemy: id,
            person_type,
            cell,
        });
        if blocked {
            out_events.push(Event::EnemyBlocked { enemy: id });
        }
    }

    fn place_tower(
        &mut self,
        person_type: PersonTypeId,
        cell: CellCoord,
    ) -> Result<(UnitId, u32), PlacementError> {
        if self.status.is_over() {
            return Err(PlacementError::GameEnded);
        }
        let archetype = self
            .catalog
            .person_type(person_type)
            .ok_or(PlacementError::UnknownPersonType)?;
        if archetype.role != UnitRole::Defender {
            return Err(PlacementError::NotADefender);
        }
        if !self.grid.contains(cell) || self.grid.is_castle(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if !self.grid.is_deployable(cell) {
            return Err(PlacementError::NotDeployable);
        }
        if self.tower_on(cell).is_some() {
            return Err(PlacementError::Occupied);
        }
        if self.qi < archetype.cost {
            return Err(PlacementError::InsufficientQi);
        }

        let cost = archetype.cost;
        let base = archetype.stats;
        let stats = compose(&self.catalog, &base, 1, &[], &[]);
        self.qi -= cost;

        let id = self.allocate_unit_id();
        let _ = self.units.insert(
            id,
            Unit {
                id,
                person_type,
                position: cell.center(),
                health: stats.max_health,
                max_health: stats.max_health,
                role: Role::Defender(Defender {
                    cell,
                    cost,
                    base,
                    stats,
                    level: 1,
                    experience: 0,
                    kills: 0,
                    skills: Vec::new(),
                    inventory: Vec::new(),
                    last_attack: None,
                }),
            },
        );
        Ok((id, cost))
    }

    fn sell_tower(&mut self, tower: UnitId) -> Result<u32, SaleError> {
        if self.status.is_over() {
            return Err(SaleError::GameEnded);
        }
        let cost = self
            .units
            .get(&tower)
            .and_then(Unit::defender)
            .map(|defender| defender.cost)
            .ok_or(SaleError::MissingTower)?;

        let _ = self.units.remove(&tower);
        self.effects.forget(tower);
        let refund = sell_refund(cost);
        self.qi = self.qi.saturating_add(refund);
        Ok(refund)
    }

    fn equip_skill(&mut self, tower: UnitId, skill: SkillId) -> Result<(), SkillError> {
        if self.status.is_over() {
            return Err(SkillError::GameEnded);
        }
        let unit = self.units.get_mut(&tower).ok_or(SkillError::MissingTower)?;
        let person_type = unit.person_type;
        let defender = unit.defender_mut().ok_or(SkillError::MissingTower)?;

        if self.catalog.skill(skill).is_none() {
            return Err(SkillError::UnknownSkill);
        }
        let compatible = self
            .catalog
            .person_type(person_type)
            .is_some_and(|archetype| archetype.can_equip(skill));
        if !compatible {
            return Err(SkillError::Incompatible);
        }
        if defender.skills.contains(&skill) {
            return Err(SkillError::AlreadyEquipped);
        }
        if defender.skills.len() >= MAX_EQUIPPED_SKILLS {
            return Err(SkillError::SlotsFull);
        }

        defender.skills.push(skill);
        unit.refresh_stats(&self.catalog);
        Ok(())
    }

    fn unequip_skill(&mut self, tower: UnitId, skill: SkillId) -> Result<(), SkillError> {
        if self.status.is_over() {
            return Err(SkillError::GameEnded);
        }
        let unit = self.units.get_mut(&tower).ok_or(SkillError::MissingTower)?;
        let defender = unit.defender_mut().ok_or(SkillError::MissingTower)?;
        let position = defender
            .skills
            .iter()
            .position(|equipped| *equipped == skill)
            .ok_or(SkillError::NotEquipped)?;

        let _ = defender.skills.remove(position);
        unit.refresh_stats(&self.catalog);
        Ok(())
    }

    fn discard_item(&mut self, tower: UnitId, item: ItemId) -> Result<(), InventoryError> {
        if self.status.is_over() {
            return Err(InventoryError::GameEnded);
        }
        let unit = self
            .units
            .get_mut(&tower)
            .ok_or(InventoryError::MissingTower)?;
        let defender = unit.defender_mut().ok_or(InventoryError::MissingTower)?;
        let position = defender
            .inventory
            .iter()
            .position(|carried| *carried == item)
            .ok_or(InventoryError::NotCarried)?;

        let _ = defender.inventory.remove(position);
        unit.refresh_stats(&self.catalog);
        Ok(())
    }
}

/// Base health scaled by a wave multiplier, floored and never below one.
fn scaled_health(base: u32, multiplier: f32) -> u32 {
    // Tolerates multipliers such as 1.3 that f32 stores slightly low.
    let scaled = (base as f32 * multiplier + 1e-3).floor();
    (scaled as u32).max(1)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SetSpeed { multiplier } => world.set_speed(multiplier, out_events),
        Command::StartWave => world.start_wave(out_events),
        Command::CompleteWave => world.complete_wave(out_events),
        Command::SpawnEnemy {
            person_type,
            health_multiplier,
        } => world.spawn_enemy(person_type, health_multiplier, out_events),
        Command::PlaceTower { person_type, cell } => match world.place_tower(person_type, cell) {
            Ok((tower, cost)) => {
                debug!(tower = tower.get(), ?cell, cost, "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    person_type,
                    cell,
                    cost,
                });
                world.replan_attackers(&[], out_events);
            }
            Err(reason) => {
                debug!(?cell, %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected {
                    person_type,
                    cell,
                    reason,
                });
            }
        },
        Command::SellTower { tower } => match world.sell_tower(tower) {
            Ok(refund) => {
                debug!(tower = tower.get(), refund, "tower sold");
                out_events.push(Event::TowerSold { tower, refund });
                world.replan_attackers(&[tower], out_events);
            }
            Err(reason) => out_events.push(Event::TowerSaleRejected { tower, reason }),
        },
        Command::FireProjectile { tower, target } => world.fire(tower, target, out_events),
        Command::EquipSkill { tower, skill } => match world.equip_skill(tower, skill) {
            Ok(()) => out_events.push(Event::SkillEquipped { tower, skill }),
            Err(reason) => out_events.push(Event::SkillRejected {
                tower,
                skill,
                reason,
            }),
        },
        Command::UnequipSkill { tower, skill } => match world.unequip_skill(tower, skill) {
            Ok(()) => out_events.push(Event::SkillUnequipped { tower, skill }),
            Err(reason) => out_events.push(Event::SkillRejected {
                tower,
                skill,
                reason,
            }),
        },
        Command::DiscardItem { tower, item } => match world.discard_item(tower, item) {
            Ok(()) => out_events.push(Event::ItemDiscarded { tower, item }),
            Err(reason) => out_events.push(Event::ItemDiscardRejected {
                tower,
                item,
                reason,
            }),
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use cultivator_defence_core::{
        Catalog, DroppedItemSnapshot, EnemySnapshot, EnemyView, GameSnapshot, GameStatus,
        ProjectileSnapshot, SpeedMultiplier, TowerSnapshot, TowerView,
    };
    use cultivator_defence_system_progression::experience_for_level;

    use super::{Behavior, TileGrid, Unit, World};

    /// Provides read-only access to the resolved catalog.
    #[must_use]
    pub fn catalog(world: &World) -> &Catalog {
        &world.catalog
    }

    /// Provides read-only access to the tile oracle.
    #[must_use]
    pub fn grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Current session status.
    #[must_use]
    pub fn status(world: &World) -> GameStatus {
        world.status
    }

    /// Current playback speed.
    #[must_use]
    pub fn speed(world: &World) -> SpeedMultiplier {
        world.speed
    }

    /// Simulated time elapsed since the session began.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.clock
    }

    /// One-based number of the latest wave; zero before the first wave.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Reports whether a wave was started and not yet completed.
    #[must_use]
    pub fn wave_in_progress(world: &World) -> bool {
        world.wave_active
    }

    /// Number of waves that must be cleared for victory.
    #[must_use]
    pub fn total_waves(world: &World) -> u32 {
        world.total_waves
    }

    /// Number of attackers on the battlefield.
    #[must_use]
    pub fn attacker_count(world: &World) -> usize {
        world
            .units
            .values()
            .filter(|unit| unit.attacker().is_some())
            .count()
    }

    /// Currency available for deployments.
    #[must_use]
    pub fn qi(world: &World) -> u32 {
        world.qi
    }

    /// Castle health remaining.
    #[must_use]
    pub fn castle_health(world: &World) -> u32 {
        world.castle_health
    }

    /// Captures a read-only view of every defender.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .units
                .values()
                .filter_map(|unit| tower_snapshot(world, unit))
                .collect(),
        )
    }

    /// Captures a read-only view of every attacker.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.units.values().filter_map(enemy_snapshot).collect())
    }

    /// Captures the complete game state for presentation layers.
    #[must_use]
    pub fn snapshot(world: &World) -> GameSnapshot {
        GameSnapshot {
            status: world.status,
            speed: world.speed,
            wave: world.wave,
            castle_health: world.castle_health,
            castle_max_health: world.castle_max_health,
            qi: world.qi,
            score: world.score,
            elapsed: world.clock,
            towers: tower_view(world).into_vec(),
            enemies: enemy_view(world).into_vec(),
            projectiles: world
                .projectiles
                .iter()
                .map(|(id, projectile)| ProjectileSnapshot {
                    id: *id,
                    tower: projectile.tower,
                    target: projectile.target,
                    start: projectile.start,
                    end: projectile.end,
                    damage: projectile.damage,
                    progress: projectile.progress,
                })
                .collect(),
            dropped_items: world
                .drops
                .iter()
                .map(|(id, dropped)| DroppedItemSnapshot {
                    id: *id,
                    item: dropped.item,
                    position: dropped.position,
                    spawned_at: dropped.spawned_at,
                })
                .collect(),
            damaged: world.effects.damaged.keys().copied().collect(),
            leveled_up: world.effects.leveled_up.keys().copied().collect(),
            firing: world.effects.firing.iter().copied().collect(),
        }
    }

    fn tower_snapshot(world: &World, unit: &Unit) -> Option<TowerSnapshot> {
        let defender = unit.defender()?;
        Some(TowerSnapshot {
            id: unit.id,
            person_type: unit.person_type,
            cell: defender.cell,
            position: unit.position,
            stats: defender.stats,
            health: unit.health,
            level: defender.level,
            experience: defender.experience,
            experience_to_next: experience_for_level(defender.level),
            kills: defender.kills,
            skills: defender.skills.clone(),
            inventory: defender.inventory.clone(),
            ready_in: defender.ready_in(world.clock),
        })
    }

    fn enemy_snapshot(unit: &Unit) -> Option<EnemySnapshot> {
        let attacker = unit.attacker()?;
        let attacking_tower = match attacker.behavior {
            Behavior::AttackingTower(tower) => Some(tower),
            Behavior::Moving | Behavior::AttackingCastle => None,
        };
        Some(EnemySnapshot {
            id: unit.id,
            person_type: unit.person_type,
            position: unit.position,
            health: unit.health,
            max_health: unit.max_health,
            speed: attacker.speed,
            damage: attacker.damage,
            reward: attacker.reward,
            path_remaining: attacker.route.remaining(),
            attacking_castle: attacker.behavior == Behavior::AttackingCastle,
            attacking_tower,
            bounce: attacker.bounce,
        })
    }
}
