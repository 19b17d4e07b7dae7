#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scenario loading and world seeding for the Dorf simulation.
//!
//! A [`Scenario`] is a small TOML document naming the terrain parameters, the
//! movement strategy, the starting roster and the initial job queue. Building
//! it yields a populated [`World`] ready to tick.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use dorf_core::{CellCoord, Command, Event, JobSpec};
use dorf_system_movement::MovementKind;
use dorf_world::{
    self as world, TerrainConfig, TerrainError, World, WorldError, DEFAULT_TERRAIN_SIZE,
    DEFAULT_TREE_PERCENT,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Seed used when a scenario does not name one.
pub const DEFAULT_SEED: u64 = 0;

/// Reasons a scenario could not be loaded or turned into a world.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("failed to read scenario {path}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The scenario document is not valid TOML or has unknown fields.
    #[error("malformed scenario")]
    Parse(#[from] toml::de::Error),
    /// An actor starts outside the terrain.
    #[error("actor {name} starts at {cell}, outside the {width}x{height} terrain")]
    ActorOutOfBounds {
        /// Name of the misplaced actor.
        name: String,
        /// Requested starting cell.
        cell: CellCoord,
        /// Terrain width.
        width: u32,
        /// Terrain height.
        height: u32,
    },
    /// Terrain generation rejected the parameters.
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    /// Seeding the world broke its bookkeeping.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Actor placed in the world before the first tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActorSeed {
    /// Display name.
    pub name: String,
    /// Starting column.
    pub column: i32,
    /// Starting row.
    pub row: i32,
}

impl ActorSeed {
    /// Creates an actor seed.
    #[must_use]
    pub fn new(name: impl Into<String>, column: i32, row: i32) -> Self {
        Self {
            name: name.into(),
            column,
            row,
        }
    }

    /// Starting cell.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.column, self.row)
    }
}

/// Move job queued before the first tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSeed {
    /// Destination column.
    pub column: i32,
    /// Destination row.
    pub row: i32,
}

impl JobSeed {
    /// Creates a job seed.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Destination cell.
    #[must_use]
    pub const fn destination(&self) -> CellCoord {
        CellCoord::new(self.column, self.row)
    }
}

/// Everything needed to reproduce a simulation run.
///
/// Missing fields fall back to the classic scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    /// Terrain width in cells.
    pub width: u32,
    /// Terrain height in cells.
    pub height: u32,
    /// Chance, in percent, that an interior cell grows a tree.
    pub tree_percent: u8,
    /// Seed for terrain generation.
    pub seed: u64,
    /// Strategy move jobs use to pick their steps.
    pub movement: MovementKind,
    /// Roster in tick order.
    pub actors: Vec<ActorSeed>,
    /// Initial job queue, oldest first.
    pub jobs: Vec<JobSeed>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::classic()
    }
}

impl Scenario {
    /// Sally on a 20x20 map with two jobs in the top-left corner.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            width: DEFAULT_TERRAIN_SIZE,
            height: DEFAULT_TERRAIN_SIZE,
            tree_percent: DEFAULT_TREE_PERCENT,
            seed: DEFAULT_SEED,
            movement: MovementKind::Greedy,
            actors: vec![ActorSeed::new("Sally", 12, 15)],
            jobs: vec![JobSeed::new(1, 1), JobSeed::new(4, 1)],
        }
    }

    /// Parses a scenario from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Terrain parameters described by the scenario.
    #[must_use]
    pub const fn terrain_config(&self) -> TerrainConfig {
        TerrainConfig::new(self.width, self.height).with_tree_percent(self.tree_percent)
    }

    /// Commands that seed the roster and the job queue, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        let actors = self.actors.iter().map(|actor| Command::AddActor {
            name: actor.name.clone(),
            cell: actor.cell(),
        });
        let jobs = self.jobs.iter().map(|job| Command::AddJob {
            job: JobSpec::MoveTo {
                destination: job.destination(),
            },
        });
        actors.chain(jobs).collect()
    }

    /// Generates the terrain and seeds the world.
    ///
    /// Events produced while seeding are appended to `out_events`.
    pub fn build(&self, out_events: &mut Vec<Event>) -> Result<World, ScenarioError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut world = World::generate(&mut rng, self.terrain_config())?
            .with_movement(self.movement);

        self.check_placements(&world)?;
        for command in self.commands() {
            world::apply(&mut world, command, out_events)?;
        }

        info!(
            width = self.width,
            height = self.height,
            seed = self.seed,
            movement = %self.movement,
            actors = self.actors.len(),
            jobs = self.jobs.len(),
            "scenario ready"
        );
        Ok(world)
    }

    fn check_placements(&self, world: &World) -> Result<(), ScenarioError> {
        let terrain = world.terrain();
        for actor in &self.actors {
            let cell = actor.cell();
            let kind = terrain.kind(cell).map_err(|_| {
                let (width, height) = terrain.bounds();
                ScenarioError::ActorOutOfBounds {
                    name: actor.name.clone(),
                    cell,
                    width,
                    height,
                }
            })?;
            if kind.traversal_cost().is_none() {
                warn!(actor = %actor.name, %cell, ?kind, "actor starts on an impassable cell");
            }
        }

        for job in &self.jobs {
            let destination = job.destination();
            match terrain.kind(destination) {
                Ok(kind) if kind.traversal_cost().is_none() => {
                    warn!(%destination, ?kind, "job destination is impassable");
                }
                Ok(_) => {}
                Err(_) => warn!(%destination, "job destination lies outside the terrain"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dorf_world::query;

    #[test]
    fn default_is_the_classic_scenario() {
        let scenario = Scenario::default();
        assert_eq!(scenario.width, 20);
        assert_eq!(scenario.height, 20);
        assert_eq!(scenario.tree_percent, 20);
        assert_eq!(scenario.actors, vec![ActorSeed::new("Sally", 12, 15)]);
        assert_eq!(scenario.jobs, vec![JobSeed::new(1, 1), JobSeed::new(4, 1)]);
        assert_eq!(scenario.movement, MovementKind::Greedy);
    }

    #[test]
    fn partial_documents_fall_back_to_classic_values() {
        let scenario = Scenario::from_toml_str(
            r#"
            seed = 42
            movement = "path-following"
            "#,
        )
        .expect("valid scenario");

        assert_eq!(scenario.seed, 42);
        assert_eq!(scenario.movement, MovementKind::PathFollowing);
        assert_eq!(scenario.actors, Scenario::classic().actors);
    }

    #[test]
    fn full_documents_replace_roster_and_jobs() {
        let scenario = Scenario::from_toml_str(
            r#"
            width = 12
            height = 8
            tree_percent = 0

            [[actors]]
            name = "Urist"
            column = 3
            row = 4

            [[jobs]]
            column = 9
            row = 2
            "#,
        )
        .expect("valid scenario");

        assert_eq!(scenario.terrain_config(), TerrainConfig::new(12, 8).with_tree_percent(0));
        assert_eq!(
            scenario.commands(),
            vec![
                Command::AddActor {
                    name: "Urist".to_owned(),
                    cell: CellCoord::new(3, 4),
                },
                Command::AddJob {
                    job: JobSpec::MoveTo {
                        destination: CellCoord::new(9, 2),
                    },
                },
            ]
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = Scenario::from_toml_str("depth = 3").expect_err("unknown field");
        assert!(matches!(error, ScenarioError::Parse(_)));
    }

    #[test]
    fn build_seeds_roster_and_queue() {
        let mut events = Vec::new();
        let world = Scenario::classic().build(&mut events).expect("classic builds");

        assert_eq!(query::actors(&world).len(), 1);
        assert_eq!(query::actors(&world)[0].cell(), CellCoord::new(12, 15));
        assert_eq!(world.pending_len(), 2);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Event::ActorAdded { .. }));
    }

    #[test]
    fn build_is_reproducible_for_a_seed() {
        let first = Scenario::classic().build(&mut Vec::new()).expect("builds");
        let second = Scenario::classic().build(&mut Vec::new()).expect("builds");
        assert_eq!(query::terrain(&first), query::terrain(&second));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let scenario = Scenario {
            width: 0,
            ..Scenario::classic()
        };
        let error = scenario.build(&mut Vec::new()).expect_err("invalid terrain");
        assert!(matches!(
            error,
            ScenarioError::Terrain(TerrainError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn actors_outside_the_terrain_are_rejected() {
        let scenario = Scenario {
            actors: vec![ActorSeed::new("Lost", 30, 2)],
            ..Scenario::classic()
        };
        let error = scenario.build(&mut Vec::new()).expect_err("actor out of bounds");
        assert!(matches!(error, ScenarioError::ActorOutOfBounds { .. }));
    }

    #[test]
    fn actors_on_walls_are_tolerated() {
        let scenario = Scenario {
            actors: vec![ActorSeed::new("Climber", 0, 0)],
            ..Scenario::classic()
        };
        let world = scenario.build(&mut Vec::new()).expect("walls only warn");
        assert_eq!(query::actors(&world)[0].cell(), CellCoord::new(0, 0));
    }
}
