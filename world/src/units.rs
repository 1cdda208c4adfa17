//! Unit records shared by defenders and attackers.

use std::time::Duration;

use cultivator_defence_core::{
    BaseStats, Catalog, CellCoord, CombatStats, ItemId, PersonTypeId, SkillId, UnitId,
};
use cultivator_defence_system_stats::{compose, rescale_health};
use glam::Vec2;

/// Canonical unit instance. Role-specific state lives in [`Role`].
#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) person_type: PersonTypeId,
    pub(crate) position: Vec2,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) role: Role,
}

#[derive(Clone, Debug)]
pub(crate) enum Role {
    Defender(Defender),
    Attacker(Attacker),
}

#[derive(Clone, Debug)]
pub(crate) struct Defender {
    pub(crate) cell: CellCoord,
    pub(crate) cost: u32,
    pub(crate) base: BaseStats,
    pub(crate) stats: CombatStats,
    pub(crate) level: u32,
    pub(crate) experience: u32,
    pub(crate) kills: u32,
    pub(crate) skills: Vec<SkillId>,
    pub(crate) inventory: Vec<ItemId>,
    pub(crate) last_attack: Option<Duration>,
}

impl Defender {
    /// Remaining cooldown at `now`.
    pub(crate) fn ready_in(&self, now: Duration) -> Duration {
        match self.last_attack {
            Some(last) => (last + self.stats.attack_interval()).saturating_sub(now),
            None => Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Attacker {
    pub(crate) route: Route,
    pub(crate) behavior: Behavior,
    pub(crate) speed: f32,
    pub(crate) damage: u32,
    pub(crate) attack_interval: Duration,
    pub(crate) range: f32,
    pub(crate) reward: u32,
    pub(crate) last_attack: Option<Duration>,
    pub(crate) bounce: f32,
}

impl Attacker {
    /// Whether the attack cadence allows a blow at `now`.
    pub(crate) fn can_strike(&self, now: Duration) -> bool {
        self.last_attack
            .map_or(true, |last| now.saturating_sub(last) >= self.attack_interval)
    }
}

/// Waypoints an attacker follows, or the absence of any route.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Route {
    Following { waypoints: Vec<Vec2>, index: usize },
    Unreachable,
}

impl Route {
    pub(crate) fn from_path(path: Option<Vec<Vec2>>) -> Self {
        match path {
            Some(waypoints) => Self::Following {
                waypoints,
                index: 0,
            },
            None => Self::Unreachable,
        }
    }

    pub(crate) fn remaining(&self) -> Option<usize> {
        match self {
            Self::Following { waypoints, index } => Some(waypoints.len().saturating_sub(*index)),
            Self::Unreachable => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Behavior {
    Moving,
    AttackingCastle,
    AttackingTower(UnitId),
}

impl Unit {
    pub(crate) fn defender(&self) -> Option<&Defender> {
        match &self.role {
            Role::Defender(defender) => Some(defender),
            Role::Attacker(_) => None,
        }
    }

    pub(crate) fn defender_mut(&mut self) -> Option<&mut Defender> {
        match &mut self.role {
            Role::Defender(defender) => Some(defender),
            Role::Attacker(_) => None,
        }
    }

    pub(crate) fn attacker(&self) -> Option<&Attacker> {
        match &self.role {
            Role::Attacker(attacker) => Some(attacker),
            Role::Defender(_) => None,
        }
    }

    /// Recomposes a defender's stats, keeping its health ratio.
    pub(crate) fn refresh_stats(&mut self, catalog: &Catalog) {
        let Role::Defender(defender) = &mut self.role else {
            return;
        };
        let stats = compose(
            catalog,
            &defender.base,
            defender.level,
            &defender.skills,
            &defender.inventory,
        );
        self.health = rescale_health(self.health, self.max_health, stats.max_health);
        self.max_health = stats.max_health;
        defender.stats = stats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_remaining_counts_unvisited_waypoints() {
        let route = Route::Following {
            waypoints: vec![Vec2::ZERO, Vec2::ONE, Vec2::X],
            index: 1,
        };
        assert_eq!(route.remaining(), Some(2));
        assert_eq!(Route::from_path(None).remaining(), None);
    }

    #[test]
    fn attacker_cadence_waits_for_full_interval() {
        let mut attacker = Attacker {
            route: Route::Unreachable,
            behavior: Behavior::AttackingCastle,
            speed: 1.0,
            damage: 5,
            attack_interval: Duration::from_millis(1000),
            range: 40.0,
            reward: 10,
            last_attack: None,
            bounce: 0.0,
        };
        assert!(attacker.can_strike(Duration::ZERO));

        attacker.last_attack = Some(Duration::from_millis(500));
        assert!(!attacker.can_strike(Duration::from_millis(1450)));
        assert!(attacker.can_strike(Duration::from_millis(1500)));
    }
}
