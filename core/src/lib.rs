#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Dorf simulation.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes them through its `apply`
//! entry point and reports what happened as [`Event`] values. Systems such as
//! the grid search only ever read the terrain through a [`TerrainView`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed: nothing stops a job from walking an actor past the
/// terrain border, so a cell is not guaranteed to lie inside any terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Cell where actors appear when no explicit location is supplied.
    pub const START: CellCoord = CellCoord::new(1, 1);

    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the cell displaced by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(
            self.column.saturating_add(columns),
            self.row.saturating_add(rows),
        )
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Computes the Chebyshev (king-move) distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Reports whether `other` is one of the eight cells surrounding `self`.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self != other && self.chebyshev_distance(other) == 1
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Kind of ground occupying a terrain cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Open ground.
    Empty,
    /// Border wall that can never be removed.
    Indestructible,
    /// Loose soil. Reserved; nothing generates it yet.
    Dirt,
    /// Standing water. Reserved; nothing generates it yet.
    Water,
    /// Bare rock. Reserved; nothing generates it yet.
    Rock,
    /// Tree obstacle scattered over the interior.
    Tree,
}

impl CellKind {
    /// Every cell kind ordered by its numeric code.
    pub const ALL: [CellKind; 6] = [
        CellKind::Empty,
        CellKind::Indestructible,
        CellKind::Dirt,
        CellKind::Water,
        CellKind::Rock,
        CellKind::Tree,
    ];

    /// Stable numeric code assigned to the kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Indestructible => 1,
            Self::Dirt => 2,
            Self::Water => 3,
            Self::Rock => 4,
            Self::Tree => 5,
        }
    }

    /// Resolves a kind from its numeric code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Cost of stepping onto a cell of this kind, or `None` when impassable.
    #[must_use]
    pub const fn traversal_cost(self) -> Option<u32> {
        match self {
            Self::Empty | Self::Dirt => Some(1),
            Self::Indestructible | Self::Water | Self::Rock | Self::Tree => None,
        }
    }
}

/// Read-only view over a dense, row-major terrain grid.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    cells: &'a [CellKind],
    width: u32,
    height: u32,
}

impl<'a> TerrainView<'a> {
    /// Captures a new terrain view backed by the provided cell slice.
    ///
    /// `cells` must hold exactly `width * height` entries laid out row by row.
    #[must_use]
    pub fn new(cells: &'a [CellKind], width: u32, height: u32) -> Self {
        debug_assert_eq!(
            Some(cells.len()),
            usize::try_from(u64::from(width) * u64::from(height)).ok(),
            "terrain view dimensions must match the backing slice"
        );
        Self {
            cells,
            width,
            height,
        }
    }

    /// Width and height of the terrain measured in cells.
    #[must_use]
    pub const fn bounds(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reports whether the cell lies within `[0, width) x [0, height)`.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Kind of the provided cell, or `None` when it lies outside the terrain.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Cost of stepping onto the cell, or `None` when it is impassable or
    /// outside the terrain.
    #[must_use]
    pub fn cost_of(&self, cell: CellCoord) -> Option<u32> {
        self.kind(cell).and_then(CellKind::traversal_cost)
    }

    /// Iterates the up to eight in-bounds cells surrounding `cell`.
    ///
    /// Corners yield three neighbours, non-corner edges five and interior
    /// cells eight. The iteration order is fixed.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + 'a {
        let view = *self;
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(columns, rows)| cell.offset(columns, rows))
            .filter(move |neighbor| view.contains(*neighbor))
    }

    /// Iterates every cell together with its kind in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellKind)> + 'a {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, kind)| {
            let width = usize::try_from(width).unwrap_or(usize::MAX).max(1);
            let column = i32::try_from(index % width).unwrap_or(i32::MAX);
            let row = i32::try_from(index / width).unwrap_or(i32::MAX);
            (CellCoord::new(column, row), *kind)
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(column).ok()?;
        let row = usize::try_from(row).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Unique identifier assigned to an actor by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
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

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Unique identifier assigned to a job when it enters the pending queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(u32);

impl JobId {
    /// Creates a new job identifier with the provided numeric value.
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

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Serializable description of a unit of work that adapters may queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobSpec {
    /// Walk the assigned actor to the destination cell.
    MoveTo {
        /// Cell the actor must end up on.
        destination: CellCoord,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Appends an actor to the end of the roster.
    AddActor {
        /// Display name of the actor.
        name: String,
        /// Cell the actor starts on.
        cell: CellCoord,
    },
    /// Appends a job to the tail of the pending queue.
    AddJob {
        /// Work to perform.
        job: JobSpec,
    },
    /// Advances the whole simulation by exactly one tick.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that an actor joined the roster.
    ActorAdded {
        /// Identifier allocated to the actor.
        actor: ActorId,
        /// Cell the actor starts on.
        cell: CellCoord,
    },
    /// Confirms that a job entered the pending queue.
    JobQueued {
        /// Identifier allocated to the job.
        job: JobId,
    },
    /// Reports that an idle actor pulled a job from the pending queue.
    JobAssigned {
        /// Actor that now holds the job.
        actor: ActorId,
        /// Job moved from pending to in-flight.
        job: JobId,
    },
    /// Reports that an actor changed cells while working on a job.
    ActorMoved {
        /// Actor that moved.
        actor: ActorId,
        /// Cell occupied before the step.
        from: CellCoord,
        /// Cell occupied after the step.
        to: CellCoord,
    },
    /// Reports that an actor finished its job and the world stopped tracking it.
    JobCompleted {
        /// Actor that completed the job.
        actor: ActorId,
        /// Job removed from the in-flight list.
        job: JobId,
    },
}

/// Immutable representation of a single actor's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorSnapshot {
    /// Identifier allocated to the actor by the world.
    pub id: ActorId,
    /// Display name of the actor.
    pub name: String,
    /// Cell the actor currently occupies.
    pub cell: CellCoord,
    /// Job the actor is executing, if any.
    pub job: Option<JobId>,
    /// Destination of the current job when it is a movement job.
    pub destination: Option<CellCoord>,
}
