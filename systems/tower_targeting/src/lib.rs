#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects a target for every defender from world snapshots.
//!
//! Only defenders whose attack cooldown has elapsed take part, so every
//! assignment is a shot the host can fire this tick. A defender picks the
//! first attacker, in identifier order, whose position lies within its range.
//! Proximity does not influence the choice beyond the range check, so
//! neighbouring defenders focus the oldest attacker in reach.

use cultivator_defence_core::{EnemyView, GameStatus, TowerTarget, TowerView, UnitId};
use glam::Vec2;

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    tower_workspace: Vec<TowerWorkspace>,
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments.
    pub fn handle(
        &mut self,
        status: GameStatus,
        towers: &TowerView,
        enemies: &EnemyView,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        if status != GameStatus::Playing {
            return;
        }

        if towers.iter().next().is_none() || enemies.iter().next().is_none() {
            return;
        }

        self.prepare_tower_workspace(towers);
        if self.tower_workspace.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);
        if self.enemy_workspace.is_empty() {
            return;
        }

        for tower in &self.tower_workspace {
            let first_in_range = self
                .enemy_workspace
                .iter()
                .find(|candidate| candidate.position.distance_squared(tower.position) <= tower.range_sq);

            if let Some(candidate) = first_in_range {
                out.push(TowerTarget {
                    tower: tower.id,
                    enemy: candidate.id,
                });
            }
        }
    }

    fn prepare_tower_workspace(&mut self, towers: &TowerView) {
        self.tower_workspace.clear();
        let (lower, _) = towers.iter().size_hint();
        self.tower_workspace.reserve(lower);

        for snapshot in towers.iter() {
            if snapshot.health == 0 || !snapshot.ready_in.is_zero() {
                continue;
            }
            let range = snapshot.stats.range as f32;
            self.tower_workspace.push(TowerWorkspace {
                id: snapshot.id,
                position: snapshot.position,
                range_sq: range * range,
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        let (lower, _) = enemies.iter().size_hint();
        self.enemy_workspace.reserve(lower);

        for snapshot in enemies.iter() {
            if snapshot.health == 0 {
                continue;
            }
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerWorkspace {
    id: UnitId,
    position: Vec2,
    range_sq: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: UnitId,
    position: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cultivator_defence_core::{
        CellCoord, CombatStats, EnemySnapshot, PersonTypeId, TowerSnapshot,
    };
    use std::time::Duration;

    fn tower_snapshot(id: u32, cell: (i32, i32), range: u32) -> TowerSnapshot {
        let cell = CellCoord::new(cell.0, cell.1);
        TowerSnapshot {
            id: UnitId::new(id),
            person_type: PersonTypeId::new(0),
            cell,
            position: cell.center(),
            stats: CombatStats {
                damage: 10,
                attack_speed_ms: 1000,
                range,
                max_health: 100,
            },
            health: 100,
            level: 1,
            experience: 0,
            experience_to_next: Some(100),
            kills: 0,
            skills: Vec::new(),
            inventory: Vec::new(),
            ready_in: Duration::ZERO,
        }
    }

    fn enemy_snapshot(id: u32, position: (f32, f32)) -> EnemySnapshot {
        EnemySnapshot {
            id: UnitId::new(id),
            person_type: PersonTypeId::new(1),
            position: Vec2::new(position.0, position.1),
            health: 30,
            max_health: 30,
            speed: 1.0,
            damage: 5,
            reward: 10,
            path_remaining: Some(4),
            attacking_castle: false,
            attacking_tower: None,
            bounce: 0.0,
        }
    }

    fn target(tower: u32, enemy: u32) -> TowerTarget {
        TowerTarget {
            tower: UnitId::new(tower),
            enemy: UnitId::new(enemy),
        }
    }

    #[test]
    fn targets_enemy_within_range() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (2, 2), 100)]);
        let enemies = EnemyView::from_snapshots(vec![enemy_snapshot(2, (180.0, 100.0))]);

        let mut out = Vec::new();
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(1, 2)]);
    }

    #[test]
    fn cooling_down_defender_is_skipped() {
        let mut system = TowerTargeting::new();
        let mut cooling = tower_snapshot(1, (2, 2), 100);
        cooling.ready_in = Duration::from_millis(300);
        let towers = TowerView::from_snapshots(vec![cooling, tower_snapshot(3, (2, 2), 100)]);
        let enemies = EnemyView::from_snapshots(vec![enemy_snapshot(2, (180.0, 100.0))]);

        let mut out = Vec::new();
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(3, 2)]);
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0, 0), 80)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy_snapshot(3, (100.0, 20.0)),
            enemy_snapshot(4, (100.5, 20.0)),
        ]);

        let mut out = Vec::new();
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(1, 3)]);
    }

    #[test]
    fn enemy_outside_range_is_ignored() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0, 0), 100)]);
        let enemies = EnemyView::from_snapshots(vec![enemy_snapshot(2, (800.0, 800.0))]);

        let mut out = Vec::new();
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn first_enemy_in_range_wins_over_closer_one() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (2, 2), 120)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy_snapshot(9, (101.0, 101.0)),
            enemy_snapshot(4, (200.0, 100.0)),
        ]);

        let mut out = Vec::new();
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(1, 4)]);
    }

    #[test]
    fn every_tower_is_assigned_independently() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![
            tower_snapshot(7, (9, 0), 60),
            tower_snapshot(2, (0, 0), 60),
        ]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy_snapshot(1, (380.0, 20.0)),
            enemy_snapshot(5, (20.0, 60.0)),
        ]);

        let mut out = Vec::new();
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(2, 5), target(7, 1)]);
    }

    #[test]
    fn paused_or_finished_sessions_clear_output() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0, 0), 100)]);
        let enemies = EnemyView::from_snapshots(vec![enemy_snapshot(1, (20.0, 20.0))]);

        for status in [GameStatus::Paused, GameStatus::GameOver, GameStatus::Victory] {
            let mut out = vec![target(99, 99)];
            system.handle(status, &towers, &enemies, &mut out);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn empty_collections_produce_no_targets() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(Vec::new());
        let enemies = EnemyView::from_snapshots(vec![enemy_snapshot(1, (20.0, 20.0))]);

        let mut out = Vec::new();
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);
        assert!(out.is_empty());

        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0, 0), 100)]);
        let enemies = EnemyView::from_snapshots(Vec::new());
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn removing_enemies_does_not_select_out_of_range_candidates() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0, 0), 100)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy_snapshot(1, (60.0, 20.0)),
            enemy_snapshot(2, (800.0, 20.0)),
        ]);
        let mut out = Vec::new();
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);
        assert_eq!(out, vec![target(1, 1)]);

        let enemies = EnemyView::from_snapshots(vec![enemy_snapshot(2, (800.0, 20.0))]);
        system.handle(GameStatus::Playing, &towers, &enemies, &mut out);
        assert!(out.is_empty(), "far enemy should not be targeted when alone");
    }
}
