//! Tile oracle answering walkability, movement cost and deployability queries.

use std::collections::HashMap;

use cultivator_defence_core::{CellCoord, MapDefinition, MapError, CASTLE_SIZE, TILE_SIZE};
use glam::Vec2;

/// Properties of a single tile as seen by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileProperties {
    /// Whether attackers may traverse the tile.
    pub walkable: bool,
    /// Cost of entering the tile during path search.
    pub movement_cost: u32,
    /// Whether defenders may be deployed on the tile.
    pub deployable: bool,
}

const CASTLE_TILE: TileProperties = TileProperties {
    walkable: false,
    movement_cost: 1,
    deployable: false,
};

/// Resolved map layout with the castle footprint baked in.
#[derive(Clone, Debug)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tiles: Vec<TileProperties>,
    castle: CellCoord,
}

impl TileGrid {
    /// Resolves an authored map definition.
    pub fn from_definition(definition: &MapDefinition) -> Result<Self, MapError> {
        if definition.columns == 0 || definition.rows == 0 || definition.tile_types.is_empty() {
            return Err(MapError::Empty);
        }

        let mut types: HashMap<&str, TileProperties> = HashMap::new();
        for tile_type in &definition.tile_types {
            if tile_type.movement_cost == 0 {
                return Err(MapError::ZeroMovementCost(tile_type.key.clone()));
            }
            let properties = TileProperties {
                walkable: tile_type.walkable,
                movement_cost: tile_type.movement_cost,
                deployable: tile_type.deployable,
            };
            if types.insert(tile_type.key.as_str(), properties).is_some() {
                return Err(MapError::DuplicateTileType(tile_type.key.clone()));
            }
        }

        let columns = definition.columns as usize;
        let rows = definition.rows as usize;
        let tiles = if definition.tiles.is_empty() {
            let first = &definition.tile_types[0];
            vec![types[first.key.as_str()]; columns * rows]
        } else {
            if definition.tiles.len() != rows {
                return Err(MapError::RowCount {
                    expected: definition.rows,
                    actual: definition.tiles.len(),
                });
            }

            let mut tiles = Vec::with_capacity(columns * rows);
            for (row, keys) in definition.tiles.iter().enumerate() {
                if keys.len() != columns {
                    return Err(MapError::RowWidth {
                        row,
                        expected: definition.columns,
                        actual: keys.len(),
                    });
                }
                for (column, key) in keys.iter().enumerate() {
                    let properties =
                        types
                            .get(key.as_str())
                            .ok_or_else(|| MapError::UnknownTileType {
                                key: key.clone(),
                                column,
                                row,
                            })?;
                    tiles.push(*properties);
                }
            }
            tiles
        };

        let castle = definition.castle_origin();
        let fits = castle.column() >= 0
            && castle.row() >= 0
            && i64::from(castle.column()) + i64::from(CASTLE_SIZE) <= i64::from(definition.columns)
            && i64::from(castle.row()) + i64::from(CASTLE_SIZE) <= i64::from(definition.rows);
        if !fits {
            return Err(MapError::CastleOutOfBounds {
                column: castle.column(),
                row: castle.row(),
            });
        }

        Ok(Self {
            columns: definition.columns,
            rows: definition.rows,
            tiles,
            castle,
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Upper-left tile of the castle footprint.
    #[must_use]
    pub const fn castle_origin(&self) -> CellCoord {
        self.castle
    }

    /// World-space centre of the castle footprint.
    #[must_use]
    pub fn castle_center(&self) -> Vec2 {
        let half = CASTLE_SIZE as f32 * TILE_SIZE / 2.0;
        Vec2::new(
            self.castle.column() as f32 * TILE_SIZE + half,
            self.castle.row() as f32 * TILE_SIZE + half,
        )
    }

    /// Reports whether the cell lies on the castle footprint.
    #[must_use]
    pub fn is_castle(&self, cell: CellCoord) -> bool {
        let column = cell.column() - self.castle.column();
        let row = cell.row() - self.castle.row();
        (0..CASTLE_SIZE).contains(&column) && (0..CASTLE_SIZE).contains(&row)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Properties of the tile, or `None` when the cell lies outside the grid.
    ///
    /// Castle tiles always report as neither walkable nor deployable.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileProperties> {
        let index = self.index(cell)?;
        if self.is_castle(cell) {
            return Some(CASTLE_TILE);
        }
        self.tiles.get(index).copied()
    }

    /// Reports whether attackers may traverse the cell.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.tile(cell).is_some_and(|tile| tile.walkable)
    }

    /// Reports whether defenders may be deployed on the cell.
    #[must_use]
    pub fn is_deployable(&self, cell: CellCoord) -> bool {
        self.tile(cell).is_some_and(|tile| tile.deployable)
    }

    /// Walkable tiles of the top row, where attackers enter the map.
    #[must_use]
    pub fn entry_cells(&self) -> Vec<CellCoord> {
        (0..self.columns as i32)
            .map(|column| CellCoord::new(column, 0))
            .filter(|cell| self.is_walkable(*cell))
            .collect()
    }

    /// In-bounds tiles touching the castle footprint, diagonals included.
    #[must_use]
    pub fn castle_ring(&self) -> Vec<CellCoord> {
        let origin = self.castle;
        let mut ring = Vec::new();
        for row in -1..=CASTLE_SIZE {
            for column in -1..=CASTLE_SIZE {
                let cell = origin.offset(column, row);
                if !self.is_castle(cell) && self.contains(cell) {
                    ring.push(cell);
                }
            }
        }
        ring
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }

    pub(crate) fn cell_at(&self, index: usize) -> CellCoord {
        let columns = self.columns as usize;
        CellCoord::new((index % columns) as i32, (index / columns) as i32)
    }

    pub(crate) fn len(&self) -> usize {
        self.tiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cultivator_defence_core::TileTypeDefinition;

    fn grass() -> TileTypeDefinition {
        TileTypeDefinition {
            key: "grass".into(),
            walkable: true,
            movement_cost: 1,
            deployable: true,
        }
    }

    fn road() -> TileTypeDefinition {
        TileTypeDefinition {
            key: "road".into(),
            walkable: true,
            movement_cost: 1,
            deployable: false,
        }
    }

    #[test]
    fn out_of_bounds_tiles_are_absent() {
        let grid = TileGrid::from_definition(&MapDefinition::uniform(4, 4, grass())).expect("map");
        assert!(grid.tile(CellCoord::new(-1, 0)).is_none());
        assert!(grid.tile(CellCoord::new(4, 0)).is_none());
        assert!(grid.tile(CellCoord::new(0, 4)).is_none());
        assert!(grid.tile(CellCoord::new(3, 3)).is_some());
    }

    #[test]
    fn castle_footprint_blocks_walking_and_deployment() {
        let grid = TileGrid::from_definition(&MapDefinition::uniform(6, 6, grass())).expect("map");
        assert_eq!(grid.castle_origin(), CellCoord::new(2, 4));
        for cell in [
            CellCoord::new(2, 4),
            CellCoord::new(3, 4),
            CellCoord::new(2, 5),
            CellCoord::new(3, 5),
        ] {
            assert_eq!(grid.tile(cell), Some(CASTLE_TILE));
        }
        assert!(grid.is_walkable(CellCoord::new(1, 4)));
        assert_eq!(grid.castle_center(), Vec2::new(120.0, 200.0));
    }

    #[test]
    fn walkable_and_deployable_are_independent() {
        let definition = MapDefinition {
            columns: 2,
            rows: 2,
            tile_types: vec![grass(), road()],
            tiles: vec![
                vec!["road".into(), "grass".into()],
                vec!["grass".into(), "grass".into()],
            ],
            castle: Some(CellCoord::new(0, 0)),
        };
        let grid = TileGrid::from_definition(&definition).expect("map");
        assert!(grid.castle_ring().is_empty());

        let definition = MapDefinition {
            columns: 4,
            rows: 3,
            tile_types: vec![grass(), road()],
            tiles: vec![
                vec!["road".into(), "grass".into(), "grass".into(), "grass".into()],
                vec!["grass".into(), "grass".into(), "grass".into(), "grass".into()],
                vec!["grass".into(), "grass".into(), "grass".into(), "grass".into()],
            ],
            castle: Some(CellCoord::new(2, 1)),
        };
        let grid = TileGrid::from_definition(&definition).expect("map");
        let road_tile = grid.tile(CellCoord::new(0, 0)).expect("road");
        assert!(road_tile.walkable);
        assert!(!road_tile.deployable);
    }

    #[test]
    fn castle_ring_skips_out_of_bounds_tiles() {
        let grid = TileGrid::from_definition(&MapDefinition::uniform(6, 6, grass())).expect("map");
        let ring = grid.castle_ring();
        assert_eq!(ring.len(), 8);
        assert!(ring.contains(&CellCoord::new(1, 3)));
        assert!(ring.contains(&CellCoord::new(4, 5)));
        assert!(!ring.iter().any(|cell| grid.is_castle(*cell)));
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let definition = MapDefinition {
            columns: 2,
            rows: 2,
            tile_types: vec![grass()],
            tiles: vec![vec!["grass".into(), "grass".into()], vec!["grass".into()]],
            castle: None,
        };
        assert_eq!(
            TileGrid::from_definition(&definition).expect_err("short row"),
            MapError::RowWidth {
                row: 1,
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn unknown_tile_type_is_rejected() {
        let definition = MapDefinition {
            columns: 2,
            rows: 2,
            tile_types: vec![grass()],
            tiles: vec![
                vec!["grass".into(), "lava".into()],
                vec!["grass".into(), "grass".into()],
            ],
            castle: None,
        };
        assert!(matches!(
            TileGrid::from_definition(&definition),
            Err(MapError::UnknownTileType { column: 1, row: 0, .. })
        ));
    }

    #[test]
    fn castle_outside_map_is_rejected() {
        let mut definition = MapDefinition::uniform(4, 4, grass());
        definition.castle = Some(CellCoord::new(3, 0));
        assert_eq!(
            TileGrid::from_definition(&definition).expect_err("castle"),
            MapError::CastleOutOfBounds { column: 3, row: 0 }
        );
    }

    #[test]
    fn zero_movement_cost_is_rejected() {
        let mut tile = grass();
        tile.movement_cost = 0;
        assert_eq!(
            TileGrid::from_definition(&MapDefinition::uniform(4, 4, tile)).expect_err("cost"),
            MapError::ZeroMovementCost("grass".into())
        );
    }
}
