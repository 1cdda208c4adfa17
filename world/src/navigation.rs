//! Grid A* search used to route attackers toward the castle or a defender.
//!
//! The search runs over the 8-connected neighbourhood with a Chebyshev
//! heuristic against the nearest goal tile. Entering a tile costs that tile's
//! movement cost. The open list is a plain vector scanned for the lowest
//! f-score, so ties resolve in insertion order.

use std::collections::BTreeSet;

use cultivator_defence_core::CellCoord;
use glam::Vec2;

use crate::grid::TileGrid;

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Finds a route from `start` to any walkable tile touching the castle.
///
/// Returns waypoint centres beginning with the start tile's centre, or `None`
/// when every tile around the castle is unreachable.
#[must_use]
pub fn find_path(start: Vec2, obstacles: &BTreeSet<CellCoord>, grid: &TileGrid) -> Option<Vec<Vec2>> {
    let goals: Vec<CellCoord> = grid
        .castle_ring()
        .into_iter()
        .filter(|cell| grid.is_walkable(*cell) && !obstacles.contains(cell))
        .collect();
    search(CellCoord::containing(start), &goals, obstacles, grid)
}

/// Finds a route from `start` to any walkable tile touching the defender on
/// `tower`. The defender's own tile is not treated as an obstacle.
#[must_use]
pub fn find_path_to_tower(
    start: Vec2,
    tower: CellCoord,
    obstacles: &BTreeSet<CellCoord>,
    grid: &TileGrid,
) -> Option<Vec<Vec2>> {
    let mut obstacles = obstacles.clone();
    let _ = obstacles.remove(&tower);

    let goals: Vec<CellCoord> = NEIGHBOURS
        .iter()
        .map(|(column, row)| tower.offset(*column, *row))
        .filter(|cell| grid.is_walkable(*cell) && !obstacles.contains(cell))
        .collect();
    search(CellCoord::containing(start), &goals, &obstacles, grid)
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    index: usize,
    f_score: u32,
}

fn search(
    start: CellCoord,
    goals: &[CellCoord],
    obstacles: &BTreeSet<CellCoord>,
    grid: &TileGrid,
) -> Option<Vec<Vec2>> {
    if goals.is_empty() {
        return None;
    }
    let start_index = grid.index(start)?;

    let heuristic = |cell: CellCoord| {
        goals
            .iter()
            .map(|goal| cell.chebyshev_distance(*goal))
            .min()
            .unwrap_or(u32::MAX)
    };

    let mut g_scores = vec![u32::MAX; grid.len()];
    let mut parents: Vec<Option<usize>> = vec![None; grid.len()];
    let mut closed = vec![false; grid.len()];
    let mut open: Vec<OpenEntry> = Vec::new();

    g_scores[start_index] = 0;
    open.push(OpenEntry {
        index: start_index,
        f_score: heuristic(start),
    });

    while let Some(position) = lowest_f_score(&open) {
        let current = open.remove(position).index;
        let cell = grid.cell_at(current);

        if goals.contains(&cell) {
            return Some(reconstruct(current, &parents, grid));
        }
        closed[current] = true;

        for (column, row) in NEIGHBOURS {
            let neighbour = cell.offset(column, row);
            let Some(tile) = grid.tile(neighbour) else {
                continue;
            };
            if !tile.walkable || obstacles.contains(&neighbour) {
                continue;
            }
            let Some(index) = grid.index(neighbour) else {
                continue;
            };
            if closed[index] {
                continue;
            }

            let tentative = g_scores[current].saturating_add(tile.movement_cost);
            if tentative >= g_scores[index] {
                continue;
            }
            g_scores[index] = tentative;
            parents[index] = Some(current);

            let f_score = tentative.saturating_add(heuristic(neighbour));
            match open.iter_mut().find(|entry| entry.index == index) {
                Some(entry) => entry.f_score = f_score,
                None => open.push(OpenEntry { index, f_score }),
            }
        }
    }

    None
}

fn lowest_f_score(open: &[OpenEntry]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (position, entry) in open.iter().enumerate() {
        match best {
            Some((_, f_score)) if entry.f_score >= f_score => {}
            _ => best = Some((position, entry.f_score)),
        }
    }
    best.map(|(position, _)| position)
}

fn reconstruct(goal: usize, parents: &[Option<usize>], grid: &TileGrid) -> Vec<Vec2> {
    let mut reversed = vec![goal];
    let mut current = goal;
    while let Some(parent) = parents[current] {
        reversed.push(parent);
        current = parent;
    }
    reversed
        .into_iter()
        .rev()
        .map(|index| grid.cell_at(index).center())
        .collect()
}
