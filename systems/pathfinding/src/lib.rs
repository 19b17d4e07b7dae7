#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A* grid search over an immutable terrain view.
//!
//! The search moves in eight directions. By default every in-bounds cell costs
//! one step to enter, trees and walls included, and the remaining distance is
//! estimated with the Manhattan metric. Because diagonal steps also cost one,
//! Manhattan over-estimates and the returned route is not guaranteed to be the
//! shortest; [`Heuristic::Chebyshev`] restores optimality and
//! [`Traversal::TerrainAware`] makes the search respect obstacles.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    fmt,
    str::FromStr,
};

use dorf_core::{CellCoord, TerrainView};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Estimate of the remaining cost between a cell and the goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Heuristic {
    /// Sum of the absolute column and row differences.
    #[default]
    Manhattan,
    /// Largest of the absolute column and row differences.
    Chebyshev,
}

impl Heuristic {
    /// Estimated cost of reaching `goal` from `cell`.
    #[must_use]
    pub fn estimate(self, cell: CellCoord, goal: CellCoord) -> u32 {
        match self {
            Self::Manhattan => cell.manhattan_distance(goal),
            Self::Chebyshev => cell.chebyshev_distance(goal),
        }
    }
}

impl FromStr for Heuristic {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manhattan" => Ok(Self::Manhattan),
            "chebyshev" => Ok(Self::Chebyshev),
            other => Err(UnknownOption::new(other)),
        }
    }
}

/// Rule deciding what it costs to enter a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Traversal {
    /// Every in-bounds cell costs one step regardless of its kind.
    #[default]
    Uniform,
    /// Cells cost what their kind reports; impassable cells are never entered.
    TerrainAware,
}

impl Traversal {
    fn step_cost(self, terrain: &TerrainView<'_>, cell: CellCoord) -> Option<u32> {
        match self {
            Self::Uniform => Some(1),
            Self::TerrainAware => terrain.cost_of(cell),
        }
    }
}

impl FromStr for Traversal {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "uniform" => Ok(Self::Uniform),
            "terrain-aware" => Ok(Self::TerrainAware),
            other => Err(UnknownOption::new(other)),
        }
    }
}

/// Error returned when parsing an unrecognised option name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownOption(String);

impl UnknownOption {
    /// Wraps the rejected option text.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown option '{}'", self.0)
    }
}

impl std::error::Error for UnknownOption {}

/// Route produced by a successful search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<CellCoord>,
    cost: u32,
}

impl Path {
    /// Cells from start to goal inclusive.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of cells on the route, start and goal included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`; a route holds at least its start cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Accumulated step cost along the route.
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// First cell of the route.
    #[must_use]
    pub fn start(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }

    /// Last cell of the route.
    #[must_use]
    pub fn goal(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }

    /// Consumes the route, yielding its cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<CellCoord> {
        self.cells
    }
}

/// A* solver bound to a single terrain.
#[derive(Clone, Copy, Debug)]
pub struct GridSearch<'a> {
    terrain: TerrainView<'a>,
    heuristic: Heuristic,
    traversal: Traversal,
}

impl<'a> GridSearch<'a> {
    /// Creates a solver using the Manhattan heuristic and uniform traversal.
    #[must_use]
    pub fn new(terrain: TerrainView<'a>) -> Self {
        Self {
            terrain,
            heuristic: Heuristic::default(),
            traversal: Traversal::default(),
        }
    }

    /// Replaces the remaining-cost estimate.
    #[must_use]
    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Replaces the cell entry cost rule.
    #[must_use]
    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// In-bounds cells reachable in a single step from `cell`.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + 'a {
        self.terrain.neighbors(cell)
    }

    /// Computes a route from `start` to `goal`, or `None` when the open set
    /// runs dry before the goal is reached.
    #[must_use]
    pub fn solve(&self, start: CellCoord, goal: CellCoord) -> Option<Path> {
        let mut came_from: HashMap<CellCoord, CellCoord> = HashMap::new();
        let mut g_scores: HashMap<CellCoord, u32> = HashMap::new();
        let mut f_scores: HashMap<CellCoord, u32> = HashMap::new();
        let mut open: BinaryHeap<Reverse<(u32, CellCoord)>> = BinaryHeap::new();

        let start_f = self.heuristic.estimate(start, goal);
        let _ = g_scores.insert(start, 0);
        let _ = f_scores.insert(start, start_f);
        open.push(Reverse((start_f, start)));

        let mut expanded: usize = 0;
        while let Some(Reverse((f, current))) = open.pop() {
            // Entries superseded by a cheaper route stay in the heap; skip them.
            if f != score(&f_scores, current) {
                continue;
            }

            if current == goal {
                let cost = score(&g_scores, goal);
                let cells = reconstruct_path(&came_from, current);
                debug!(%start, %goal, cost, steps = cells.len(), expanded, "route found");
                return Some(Path { cells, cost });
            }

            expanded += 1;
            let current_g = score(&g_scores, current);
            for neighbor in self.terrain.neighbors(current) {
                let Some(step) = self.traversal.step_cost(&self.terrain, neighbor) else {
                    continue;
                };

                let tentative = current_g.saturating_add(step);
                if tentative >= score(&g_scores, neighbor) {
                    continue;
                }

                let neighbor_f = tentative.saturating_add(self.heuristic.estimate(neighbor, goal));
                let _ = came_from.insert(neighbor, current);
                let _ = g_scores.insert(neighbor, tentative);
                let _ = f_scores.insert(neighbor, neighbor_f);
                open.push(Reverse((neighbor_f, neighbor)));
            }
        }

        debug!(%start, %goal, expanded, "no route");
        None
    }
}

/// Score recorded for `cell`, defaulting to `u32::MAX` for unseen cells.
fn score(scores: &HashMap<CellCoord, u32>, cell: CellCoord) -> u32 {
    scores.get(&cell).copied().unwrap_or(u32::MAX)
}

fn reconstruct_path(came_from: &HashMap<CellCoord, CellCoord>, goal: CellCoord) -> Vec<CellCoord> {
    let mut cells = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        cells.push(previous);
        current = previous;
    }
    cells.reverse();
    cells
}
