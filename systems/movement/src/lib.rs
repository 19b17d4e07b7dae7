#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement strategies that decide an actor's next cell on the way to a
//! destination.
//!
//! Two strategies exist side by side. [`MovementStrategy::Greedy`] steps along
//! the sign of the displacement and never looks at the terrain.
//! [`MovementStrategy::PathFollowing`] plans a route with the grid search and
//! walks it one cell per call. Both only ever return the current cell or one
//! of its eight neighbours.

use std::{collections::VecDeque, fmt, str::FromStr};

use dorf_core::{CellCoord, TerrainView};
use dorf_system_pathfinding::{GridSearch, Heuristic, Traversal, UnknownOption};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration-level selector for a movement strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementKind {
    /// Straight-line sign stepping that ignores terrain.
    #[default]
    Greedy,
    /// Walks a route computed by the grid search.
    PathFollowing,
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greedy => f.write_str("greedy"),
            Self::PathFollowing => f.write_str("path-following"),
        }
    }
}

impl FromStr for MovementKind {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "greedy" => Ok(Self::Greedy),
            "path-following" => Ok(Self::PathFollowing),
            other => Err(UnknownOption::new(other)),
        }
    }
}

/// Strategy consulted by movement jobs once per tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MovementStrategy {
    /// See [`greedy_step`].
    #[default]
    Greedy,
    /// See [`PathFollower`].
    PathFollowing(PathFollower),
}

impl MovementStrategy {
    /// Builds the strategy selected by `kind` with default search options.
    #[must_use]
    pub fn from_kind(kind: MovementKind) -> Self {
        match kind {
            MovementKind::Greedy => Self::Greedy,
            MovementKind::PathFollowing => Self::PathFollowing(PathFollower::default()),
        }
    }

    /// Selector that would rebuild this strategy.
    #[must_use]
    pub fn kind(&self) -> MovementKind {
        match self {
            Self::Greedy => MovementKind::Greedy,
            Self::PathFollowing(_) => MovementKind::PathFollowing,
        }
    }

    /// Cell the actor standing on `from` should occupy next.
    pub fn next_step(
        &mut self,
        from: CellCoord,
        destination: CellCoord,
        terrain: TerrainView<'_>,
    ) -> CellCoord {
        match self {
            Self::Greedy => greedy_step(from, destination),
            Self::PathFollowing(follower) => follower.next_step(from, destination, terrain),
        }
    }
}

/// Moves one cell toward `destination` along the sign of each axis.
///
/// Column and row are stepped independently by -1, 0 or +1, so diagonal
/// displacement is covered diagonally. No bounds or obstacle checks happen.
#[must_use]
pub fn greedy_step(from: CellCoord, destination: CellCoord) -> CellCoord {
    let columns = destination.column().saturating_sub(from.column()).signum();
    let rows = destination.row().saturating_sub(from.row()).signum();
    from.offset(columns, rows)
}

/// Walks a cached grid-search route, replanning when the actor leaves it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathFollower {
    heuristic: Heuristic,
    traversal: Traversal,
    destination: Option<CellCoord>,
    // Front is the cell the actor is expected to occupy.
    route: VecDeque<CellCoord>,
    stranded_at: Option<CellCoord>,
}

impl PathFollower {
    /// Creates a follower that plans with the provided search options.
    #[must_use]
    pub fn new(heuristic: Heuristic, traversal: Traversal) -> Self {
        Self {
            heuristic,
            traversal,
            ..Self::default()
        }
    }

    /// Cells still ahead of the actor, current cell first.
    pub fn remaining_route(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.route.iter().copied()
    }

    /// Cell the actor standing on `from` should occupy next.
    ///
    /// Returns `from` unchanged when no route to `destination` exists.
    pub fn next_step(
        &mut self,
        from: CellCoord,
        destination: CellCoord,
        terrain: TerrainView<'_>,
    ) -> CellCoord {
        if self.destination != Some(destination) {
            self.destination = Some(destination);
            self.stranded_at = None;
            self.route.clear();
        }

        if self.route.front() != Some(&from) {
            if self.stranded_at == Some(from) {
                return from;
            }
            self.plan(from, destination, terrain);
        }

        match self.route.get(1).copied() {
            Some(next) => {
                let _ = self.route.pop_front();
                next
            }
            None => from,
        }
    }

    fn plan(&mut self, from: CellCoord, destination: CellCoord, terrain: TerrainView<'_>) {
        let search = GridSearch::new(terrain)
            .with_heuristic(self.heuristic)
            .with_traversal(self.traversal);

        match search.solve(from, destination) {
            Some(path) => {
                debug!(%from, %destination, steps = path.len(), "planned route");
                self.route = path.into_cells().into();
                self.stranded_at = None;
            }
            None => {
                debug!(%from, %destination, "destination unreachable; holding position");
                self.route.clear();
                self.stranded_at = Some(from);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dorf_core::CellKind;

    fn open_cells(width: u32, height: u32) -> Vec<CellKind> {
        vec![CellKind::Empty; (width * height) as usize]
    }

    #[test]
    fn greedy_step_follows_displacement_signs() {
        let origin = CellCoord::new(12, 15);
        assert_eq!(greedy_step(origin, CellCoord::new(1, 1)), CellCoord::new(11, 14));
        assert_eq!(greedy_step(origin, CellCoord::new(12, 20)), CellCoord::new(12, 16));
        assert_eq!(greedy_step(origin, CellCoord::new(14, 15)), CellCoord::new(13, 15));
        assert_eq!(greedy_step(origin, origin), origin);
    }

    #[test]
    fn greedy_step_ignores_terrain_bounds() {
        let cells = open_cells(3, 3);
        let mut strategy = MovementStrategy::Greedy;
        let next = strategy.next_step(
            CellCoord::new(0, 0),
            CellCoord::new(-4, 0),
            TerrainView::new(&cells, 3, 3),
        );
        assert_eq!(next, CellCoord::new(-1, 0));
    }

    #[test]
    fn follower_walks_planned_route() {
        let cells = open_cells(8, 8);
        let terrain = TerrainView::new(&cells, 8, 8);
        let mut follower = PathFollower::default();
        let destination = CellCoord::new(5, 5);
        let mut cell = CellCoord::new(1, 1);

        for _ in 0..4 {
            let next = follower.next_step(cell, destination, terrain);
            assert!(cell.is_adjacent(next));
            cell = next;
        }

        assert_eq!(cell, destination);
        assert_eq!(follower.next_step(cell, destination, terrain), destination);
    }

    #[test]
    fn follower_replans_after_displacement() {
        let cells = open_cells(8, 8);
        let terrain = TerrainView::new(&cells, 8, 8);
        let mut follower = PathFollower::default();
        let destination = CellCoord::new(6, 1);

        let _ = follower.next_step(CellCoord::new(1, 1), destination, terrain);
        let displaced = CellCoord::new(1, 6);
        let next = follower.next_step(displaced, destination, terrain);

        assert!(displaced.is_adjacent(next));
        assert_eq!(follower.remaining_route().last(), Some(destination));
    }

    #[test]
    fn follower_holds_position_when_unreachable() {
        let mut cells = open_cells(5, 5);
        for index in [6, 7, 8, 11, 13, 16, 17, 18] {
            cells[index] = CellKind::Tree;
        }
        let terrain = TerrainView::new(&cells, 5, 5);
        let mut follower = PathFollower::new(Heuristic::Chebyshev, Traversal::TerrainAware);
        let origin = CellCoord::new(0, 0);

        assert_eq!(follower.next_step(origin, CellCoord::new(2, 2), terrain), origin);
        assert_eq!(follower.next_step(origin, CellCoord::new(2, 2), terrain), origin);
        assert_eq!(follower.remaining_route().count(), 0);
    }

    #[test]
    fn kinds_parse_and_round_trip_through_strategies() {
        assert_eq!("greedy".parse::<MovementKind>(), Ok(MovementKind::Greedy));
        assert_eq!(
            "path-following".parse::<MovementKind>(),
            Ok(MovementKind::PathFollowing)
        );
        for kind in [MovementKind::Greedy, MovementKind::PathFollowing] {
            assert_eq!(MovementStrategy::from_kind(kind).kind(), kind);
        }
    }
}
