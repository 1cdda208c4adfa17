//! Per-tick combat: attacker behaviour, tower destruction and projectiles.

use std::time::Duration;

use cultivator_defence_core::{Event, GameStatus, ProjectileId, UnitId, TILE_SIZE};
use cultivator_defence_system_progression::{award, kill_experience};
use glam::Vec2;
use tracing::debug;

use crate::{
    navigation,
    units::{Behavior, Role, Route, Unit},
    World,
};

/// Flight progress added to every projectile each tick.
pub(crate) const PROJECTILE_SPEED: f32 = 0.2;

/// Bounce animation progress added each tick while assaulting the castle.
const CASTLE_BOUNCE_STEP: f32 = 0.1;

// Five increments of 0.2 land a hair below 1.0 in f32.
const IMPACT_THRESHOLD: f32 = 1.0 - 1e-4;

/// Projectile in flight. Damage is captured when fired.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) tower: UnitId,
    pub(crate) target: UnitId,
    pub(crate) start: Vec2,
    pub(crate) end: Vec2,
    pub(crate) damage: u32,
    pub(crate) progress: f32,
}

impl World {
    /// Runs the attacker state machine for one tick.
    pub(crate) fn advance_attackers(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let attackers: Vec<UnitId> = self
            .units
            .values()
            .filter(|unit| unit.attacker().is_some())
            .map(|unit| unit.id)
            .collect();
        let stride = dt.as_secs_f32() * TILE_SIZE;

        for id in attackers {
            if self.status.is_over() {
                return;
            }
            let Some(behavior) = self
                .units
                .get(&id)
                .and_then(Unit::attacker)
                .map(|attacker| attacker.behavior)
            else {
                continue;
            };

            match behavior {
                Behavior::Moving => self.pursue(id, stride, out_events),
                Behavior::AttackingCastle => self.assault_castle(id, out_events),
                Behavior::AttackingTower(tower) => {
                    self.assault_tower(id, tower, stride, out_events);
                }
            }
        }
    }

    fn pursue(&mut self, id: UnitId, stride: f32, out_events: &mut Vec<Event>) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let blocked = unit
            .attacker()
            .is_some_and(|attacker| attacker.route == Route::Unreachable);
        if blocked {
            if let Some(tower) = self.nearest_tower(unit.position) {
                if let Some(Role::Attacker(attacker)) =
                    self.units.get_mut(&id).map(|unit| &mut unit.role)
                {
                    attacker.behavior = Behavior::AttackingTower(tower);
                }
                out_events.push(Event::EnemyRetargeted { enemy: id, tower });
            }
            return;
        }

        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let Role::Attacker(attacker) = &mut unit.role else {
            return;
        };
        let Route::Following { waypoints, index } = &mut attacker.route else {
            return;
        };

        if let Some(waypoint) = waypoints.get(*index).copied() {
            let distance = unit.position.distance(waypoint);
            let step = attacker.speed * stride;
            if distance <= step {
                unit.position = waypoint;
                *index += 1;
            } else {
                unit.position += (waypoint - unit.position) / distance * step;
            }
        }

        if *index >= waypoints.len() {
            attacker.behavior = Behavior::AttackingCastle;
            out_events.push(Event::EnemyReachedCastle { enemy: id });
        }
    }

    fn assault_castle(&mut self, id: UnitId, out_events: &mut Vec<Event>) {
        let now = self.clock;
        let Some(Role::Attacker(attacker)) = self.units.get_mut(&id).map(|unit| &mut unit.role)
        else {
            return;
        };

        attacker.bounce = (attacker.bounce + CASTLE_BOUNCE_STEP) % 1.0;
        if !attacker.can_strike(now) {
            return;
        }
        attacker.last_attack = Some(now);
        let damage = attacker.damage;

        self.castle_health = self.castle_health.saturating_sub(damage);
        out_events.push(Event::CastleDamaged {
            enemy: id,
            damage,
            remaining: self.castle_health,
        });
        if self.castle_health == 0 {
            self.finish(GameStatus::GameOver, out_events);
        }
    }

    fn assault_tower(
        &mut self,
        id: UnitId,
        tower: UnitId,
        stride: f32,
        out_events: &mut Vec<Event>,
    ) {
        let target = self
            .units
            .get(&tower)
            .filter(|unit| unit.health > 0 && unit.defender().is_some())
            .map(|unit| unit.position);
        let Some(target) = target else {
            self.replan_attacker(id, out_events);
            return;
        };

        let now = self.clock;
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let Role::Attacker(attacker) = &mut unit.role else {
            return;
        };

        let reach = attacker.range.max(TILE_SIZE);
        let distance = unit.position.distance(target);
        if distance > reach {
            let step = (attacker.speed * stride).min(distance - reach);
            unit.position += (target - unit.position) / distance * step;
            return;
        }

        if !attacker.can_strike(now) {
            return;
        }
        attacker.last_attack = Some(now);
        let damage = attacker.damage;

        if let Some(defender) = self.units.get_mut(&tower) {
            defender.health = defender.health.saturating_sub(damage);
        }
        self.effects.flash_damage(tower, now);
        out_events.push(Event::TowerDamaged {
            tower,
            enemy: id,
            damage,
        });
    }

    /// Sends a single attacker back to pursuit with a fresh route.
    fn replan_attacker(&mut self, id: UnitId, out_events: &mut Vec<Event>) {
        let obstacles = self.obstacles();
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let Role::Attacker(attacker) = &mut unit.role else {
            return;
        };

        attacker.route =
            Route::from_path(navigation::find_path(unit.position, &obstacles, &self.grid));
        attacker.behavior = Behavior::Moving;
        if attacker.route == Route::Unreachable {
            out_events.push(Event::EnemyBlocked { enemy: id });
        }
    }

    /// Defender closest to `position`; ties go to the lower identifier.
    fn nearest_tower(&self, position: Vec2) -> Option<UnitId> {
        let mut best: Option<(UnitId, f32)> = None;
        for unit in self.units.values() {
            if unit.defender().is_none() || unit.health == 0 {
                continue;
            }
            let distance = unit.position.distance(position);
            match best {
                Some((_, closest)) if distance >= closest => {}
                _ => best = Some((unit.id, distance)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Removes defenders whose health reached zero and reroutes their assailants.
    pub(crate) fn destroy_fallen_towers(&mut self, out_events: &mut Vec<Event>) {
        let fallen: Vec<UnitId> = self
            .units
            .values()
            .filter(|unit| unit.defender().is_some() && unit.health == 0)
            .map(|unit| unit.id)
            .collect();
        if fallen.is_empty() {
            return;
        }

        for tower in &fallen {
            let _ = self.units.remove(tower);
            self.effects.forget(*tower);
            debug!(tower = tower.get(), "tower destroyed");
            out_events.push(Event::TowerDestroyed { tower: *tower });
        }
        self.replan_attackers(&fallen, out_events);
    }

    /// Launches a projectile when the defender is ready and the target in range.
    pub(crate) fn fire(&mut self, tower: UnitId, target: UnitId, out_events: &mut Vec<Event>) {
        if self.status != GameStatus::Playing {
            return;
        }
        let Some(end) = self
            .units
            .get(&target)
            .filter(|unit| unit.attacker().is_some())
            .map(|unit| unit.position)
        else {
            return;
        };

        let now = self.clock;
        let Some(unit) = self.units.get_mut(&tower) else {
            return;
        };
        let start = unit.position;
        let Some(defender) = unit.defender_mut() else {
            return;
        };
        if !defender.ready_in(now).is_zero() {
            return;
        }
        if start.distance(end) > defender.stats.range as f32 {
            return;
        }
        defender.last_attack = Some(now);
        let damage = defender.stats.damage;

        let projectile = self.allocate_projectile_id();
        let _ = self.projectiles.insert(
            projectile,
            Projectile {
                tower,
                target,
                start,
                end,
                damage,
                progress: 0.0,
            },
        );
        let _ = self.effects.firing.insert(tower);
        out_events.push(Event::ProjectileFired {
            projectile,
            tower,
            target,
        });
    }

    /// Moves every projectile forward and resolves those that arrived.
    pub(crate) fn advance_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let mut arrived: Vec<ProjectileId> = Vec::new();
        for (id, projectile) in &mut self.projectiles {
            projectile.progress += PROJECTILE_SPEED;
            if projectile.progress >= IMPACT_THRESHOLD {
                arrived.push(*id);
            }
        }

        for id in arrived {
            if let Some(projectile) = self.projectiles.remove(&id) {
                self.resolve_impact(&projectile, out_events);
            }
        }
    }

    fn resolve_impact(&mut self, projectile: &Projectile, out_events: &mut Vec<Event>) {
        let now = self.clock;
        let enemy = projectile.target;
        let Some(unit) = self.units.get_mut(&enemy) else {
            return;
        };
        let Role::Attacker(attacker) = &unit.role else {
            return;
        };
        let reward = attacker.reward;

        unit.health = unit.health.saturating_sub(projectile.damage);
        let defeated = unit.health == 0;
        let position = unit.position;
        self.effects.flash_damage(enemy, now);
        out_events.push(Event::EnemyHit {
            enemy,
            tower: projectile.tower,
            damage: projectile.damage,
        });
        if !defeated {
            return;
        }

        let _ = self.units.remove(&enemy);
        self.effects.forget(enemy);
        self.qi = self.qi.saturating_add(reward);
        self.score = self.score.saturating_add(u64::from(reward));

        let credited = self
            .units
            .get(&projectile.tower)
            .and_then(Unit::defender)
            .map(|_| projectile.tower);
        let experience = match credited {
            Some(_) => kill_experience(reward, self.wave),
            None => 0,
        };
        out_events.push(Event::EnemyDefeated {
            enemy,
            tower: credited,
            reward,
            experience,
        });

        if let Some(tower) = credited {
            self.award_experience(tower, experience, out_events);
        }
        self.roll_drop(position, out_events);
    }

    fn award_experience(&mut self, tower: UnitId, experience: u32, out_events: &mut Vec<Event>) {
        let now = self.clock;
        let Some(unit) = self.units.get_mut(&tower) else {
            return;
        };
        let Some(defender) = unit.defender_mut() else {
            return;
        };

        defender.kills = defender.kills.saturating_add(1);
        let advancement = award(defender.level, defender.experience, experience);
        defender.level = advancement.level;
        defender.experience = advancement.experience;
        if !advancement.leveled_up {
            return;
        }

        unit.refresh_stats(&self.catalog);
        self.effects.celebrate(tower, now);
        debug!(tower = tower.get(), level = advancement.level, "tower levelled up");
        out_events.push(Event::TowerLeveledUp {
            tower,
            level: advancement.level,
        });
    }
}
