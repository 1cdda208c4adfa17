//! Authored map layouts consumed by the world's tile oracle.

use serde::{Deserialize, Serialize};

use crate::CellCoord;

/// Properties shared by every tile of one type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTypeDefinition {
    /// Unique key referenced by the tile rows.
    pub key: String,
    /// Whether attackers may traverse the tile.
    pub walkable: bool,
    /// Cost of entering the tile during path search; at least one.
    #[serde(default = "default_movement_cost")]
    pub movement_cost: u32,
    /// Whether defenders may be deployed on the tile.
    pub deployable: bool,
}

fn default_movement_cost() -> u32 {
    1
}

/// Grid of tile-type references plus the castle location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDefinition {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Tile types referenced by `tiles`.
    pub tile_types: Vec<TileTypeDefinition>,
    /// Row-major tile-type keys. When empty, every tile uses the first type.
    #[serde(default)]
    pub tiles: Vec<Vec<String>>,
    /// Upper-left tile of the 2×2 castle footprint. Defaults to bottom-centre.
    #[serde(default)]
    pub castle: Option<CellCoord>,
}

impl MapDefinition {
    /// Creates a map in which every tile shares the provided type.
    #[must_use]
    pub fn uniform(columns: u32, rows: u32, tile_type: TileTypeDefinition) -> Self {
        Self {
            columns,
            rows,
            tile_types: vec![tile_type],
            tiles: Vec::new(),
            castle: None,
        }
    }

    /// Castle origin, falling back to the bottom-centre of the grid.
    #[must_use]
    pub fn castle_origin(&self) -> CellCoord {
        self.castle.unwrap_or_else(|| {
            let column = (self.columns as i32 / 2 - 1).max(0);
            let row = (self.rows as i32 - 2).max(0);
            CellCoord::new(column, row)
        })
    }
}

/// Errors raised while resolving a [`MapDefinition`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The map has no tiles or no tile types.
    #[error("map must contain at least one tile and one tile type")]
    Empty,
    /// Two tile types share a key.
    #[error("duplicate tile type `{0}`")]
    DuplicateTileType(String),
    /// A tile type declares a zero movement cost.
    #[error("tile type `{0}` must have a movement cost of at least one")]
    ZeroMovementCost(String),
    /// The number of tile rows does not match the declared height.
    #[error("expected {expected} tile rows, found {actual}")]
    RowCount {
        /// Declared number of rows.
        expected: u32,
        /// Rows present in the definition.
        actual: usize,
    },
    /// A tile row does not match the declared width.
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RowWidth {
        /// Offending row.
        row: usize,
        /// Declared number of columns.
        expected: u32,
        /// Tiles present in the row.
        actual: usize,
    },
    /// A tile references an unknown tile type.
    #[error("unknown tile type `{key}` at ({column}, {row})")]
    UnknownTileType {
        /// Missing key.
        key: String,
        /// Column of the tile.
        column: usize,
        /// Row of the tile.
        row: usize,
    },
    /// The castle footprint does not fit inside the grid.
    #[error("castle at ({column}, {row}) does not fit inside the map")]
    CastleOutOfBounds {
        /// Column of the requested castle origin.
        column: i32,
        /// Row of the requested castle origin.
        row: i32,
    },
}
