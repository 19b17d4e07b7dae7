//! Immutable terrain grid generated once per world.

use dorf_core::{CellCoord, CellKind, TerrainView};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default terrain width and height measured in cells.
pub const DEFAULT_TERRAIN_SIZE: u32 = 20;
/// Default chance, in percent, that an interior cell grows a tree.
pub const DEFAULT_TREE_PERCENT: u8 = 20;
/// Largest number of cells a terrain may hold.
pub const MAX_TERRAIN_CELLS: u64 = 1 << 24;

/// Parameters controlling terrain generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Number of cell columns.
    pub width: u32,
    /// Number of cell rows.
    pub height: u32,
    /// Independent chance, in percent, that an interior cell becomes a tree.
    pub tree_percent: u8,
}

impl TerrainConfig {
    /// Creates a configuration with the default tree density.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tree_percent: DEFAULT_TREE_PERCENT,
        }
    }

    /// Replaces the tree density.
    #[must_use]
    pub const fn with_tree_percent(mut self, tree_percent: u8) -> Self {
        self.tree_percent = tree_percent;
        self
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TERRAIN_SIZE, DEFAULT_TERRAIN_SIZE)
    }
}

/// Reasons terrain construction or lookup may fail.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TerrainError {
    /// Width or height was zero, or the grid would exceed [`MAX_TERRAIN_CELLS`].
    #[error(
        "terrain dimensions {width}x{height} are invalid; both must be positive \
         and the grid may hold at most {max} cells",
        max = MAX_TERRAIN_CELLS
    )]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// Tree density exceeded one hundred percent.
    #[error("tree density {0}% exceeds 100%")]
    InvalidTreePercent(u8),
    /// Explicit cell data did not match the declared dimensions.
    #[error("expected {expected} cells but {actual} were supplied")]
    CellCountMismatch {
        /// Cell count implied by the dimensions.
        expected: usize,
        /// Cell count supplied by the caller.
        actual: usize,
    },
    /// A perimeter cell was not an indestructible wall.
    #[error("perimeter cell {0} must be indestructible")]
    OpenPerimeter(CellCoord),
    /// A lookup addressed a cell outside the terrain.
    #[error("cell {cell} lies outside the {width}x{height} terrain")]
    OutOfBounds {
        /// Cell that was requested.
        cell: CellCoord,
        /// Terrain width.
        width: u32,
        /// Terrain height.
        height: u32,
    },
}

/// Bounded grid of cell kinds with an indestructible border.
///
/// No cell changes after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terrain {
    width: u32,
    height: u32,
    cells: Vec<CellKind>,
}

impl Terrain {
    /// Generates a `width` x `height` terrain with the default tree density.
    pub fn new<R>(rng: &mut R, width: u32, height: u32) -> Result<Self, TerrainError>
    where
        R: Rng + ?Sized,
    {
        Self::generate(rng, TerrainConfig::new(width, height))
    }

    /// Generates terrain from the provided configuration.
    ///
    /// Border cells are walls. Every interior cell independently becomes a
    /// tree with probability `tree_percent / 100`, rolled column by column.
    pub fn generate<R>(rng: &mut R, config: TerrainConfig) -> Result<Self, TerrainError>
    where
        R: Rng + ?Sized,
    {
        if config.tree_percent > 100 {
            return Err(TerrainError::InvalidTreePercent(config.tree_percent));
        }
        let cell_count = cell_count(config.width, config.height)?;

        let mut terrain = Self {
            width: config.width,
            height: config.height,
            cells: vec![CellKind::Empty; cell_count],
        };

        for column in 0..terrain.width {
            for row in 0..terrain.height {
                let index = terrain.index_of(column, row);
                if terrain.is_border(column, row) {
                    terrain.cells[index] = CellKind::Indestructible;
                } else if rng.gen_range(0..100u8) < config.tree_percent {
                    terrain.cells[index] = CellKind::Tree;
                }
            }
        }

        debug!(
            width = terrain.width,
            height = terrain.height,
            trees = terrain.count(CellKind::Tree),
            "generated terrain"
        );
        Ok(terrain)
    }

    /// Builds terrain from explicit row-major cell kinds.
    pub fn from_cells(width: u32, height: u32, cells: Vec<CellKind>) -> Result<Self, TerrainError> {
        let expected = cell_count(width, height)?;
        if cells.len() != expected {
            return Err(TerrainError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }

        let terrain = Self {
            width,
            height,
            cells,
        };
        for row in 0..height {
            for column in 0..width {
                if terrain.is_border(column, row)
                    && terrain.cells[terrain.index_of(column, row)] != CellKind::Indestructible
                {
                    return Err(TerrainError::OpenPerimeter(to_coord(column, row)));
                }
            }
        }

        Ok(terrain)
    }

    /// Width and height measured in cells.
    #[must_use]
    pub const fn bounds(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Kind of the provided cell.
    pub fn kind(&self, cell: CellCoord) -> Result<CellKind, TerrainError> {
        self.view().kind(cell).ok_or(TerrainError::OutOfBounds {
            cell,
            width: self.width,
            height: self.height,
        })
    }

    /// Read-only view used by searches and movement strategies.
    #[must_use]
    pub fn view(&self) -> TerrainView<'_> {
        TerrainView::new(&self.cells, self.width, self.height)
    }

    /// Number of cells of the provided kind.
    #[must_use]
    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|cell| **cell == kind).count()
    }

    fn is_border(&self, column: u32, row: u32) -> bool {
        column == 0 || row == 0 || column + 1 == self.width || row + 1 == self.height
    }

    fn index_of(&self, column: u32, row: u32) -> usize {
        row as usize * self.width as usize + column as usize
    }
}

fn cell_count(width: u32, height: u32) -> Result<usize, TerrainError> {
    let invalid = TerrainError::InvalidDimensions { width, height };
    let cells = u64::from(width) * u64::from(height);
    if width == 0 || height == 0 || cells > MAX_TERRAIN_CELLS {
        return Err(invalid);
    }

    usize::try_from(cells).map_err(|_| invalid)
}

fn to_coord(column: u32, row: u32) -> CellCoord {
    CellCoord::new(
        i32::try_from(column).unwrap_or(i32::MAX),
        i32::try_from(row).unwrap_or(i32::MAX),
    )
}
