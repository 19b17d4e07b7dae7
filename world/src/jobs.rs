//! Units of work that actors execute one tick at a time.

use std::fmt;

use dorf_core::{CellCoord, JobId, JobSpec, TerrainView};
use dorf_system_movement::{MovementKind, MovementStrategy};

use crate::actors::Actor;

/// World state a job may consult while it runs.
#[derive(Clone, Copy, Debug)]
pub struct JobContext<'a> {
    terrain: TerrainView<'a>,
}

impl<'a> JobContext<'a> {
    /// Captures the context for a single job tick.
    #[must_use]
    pub fn new(terrain: TerrainView<'a>) -> Self {
        Self { terrain }
    }

    /// Terrain the actor stands on.
    #[must_use]
    pub fn terrain(&self) -> TerrainView<'a> {
        self.terrain
    }
}

/// Incremental unit of work.
///
/// A job never knows which actor holds it. The world tracks it by [`JobId`]
/// while the actor executing it owns the job itself.
pub trait Job: fmt::Debug {
    /// Performs one unit of progress on behalf of `actor`.
    ///
    /// Returns `true` once the job is complete.
    fn tick(&mut self, actor: &mut Actor, context: &JobContext<'_>) -> bool;

    /// Short human-readable summary used in logs and snapshots.
    fn describe(&self) -> String;

    /// Cell the job is heading for, when it moves its actor.
    fn destination(&self) -> Option<CellCoord> {
        None
    }
}

/// Walks the actor to a destination cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveToJob {
    destination: CellCoord,
    strategy: MovementStrategy,
}

impl MoveToJob {
    /// Creates a move job that steps greedily toward `destination`.
    #[must_use]
    pub fn new(destination: CellCoord) -> Self {
        Self::with_strategy(destination, MovementStrategy::Greedy)
    }

    /// Creates a move job that consults the provided strategy each tick.
    #[must_use]
    pub fn with_strategy(destination: CellCoord, strategy: MovementStrategy) -> Self {
        Self {
            destination,
            strategy,
        }
    }

    /// Cell the actor must reach.
    #[must_use]
    pub const fn destination(&self) -> CellCoord {
        self.destination
    }

    /// Strategy used to pick each step.
    #[must_use]
    pub fn strategy(&self) -> &MovementStrategy {
        &self.strategy
    }
}

impl Job for MoveToJob {
    fn tick(&mut self, actor: &mut Actor, context: &JobContext<'_>) -> bool {
        let next = self
            .strategy
            .next_step(actor.cell(), self.destination, context.terrain());
        actor.set_cell(next);
        actor.cell() == self.destination
    }

    fn describe(&self) -> String {
        format!("move to {} ({})", self.destination, self.strategy.kind())
    }

    fn destination(&self) -> Option<CellCoord> {
        Some(self.destination)
    }
}

/// Instantiates the job described by `spec`.
#[must_use]
pub fn job_from_spec(spec: JobSpec, movement: MovementKind) -> Box<dyn Job> {
    match spec {
        JobSpec::MoveTo { destination } => Box::new(MoveToJob::with_strategy(
            destination,
            MovementStrategy::from_kind(movement),
        )),
    }
}

/// Job handed to an actor by the world.
#[derive(Debug)]
pub struct AssignedJob {
    id: JobId,
    job: Box<dyn Job>,
}

impl AssignedJob {
    pub(crate) fn new(id: JobId, job: Box<dyn Job>) -> Self {
        Self { id, job }
    }

    /// Identifier the world tracks the job under.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// The job itself.
    #[must_use]
    pub fn job(&self) -> &dyn Job {
        self.job.as_ref()
    }

    pub(crate) fn job_mut(&mut self) -> &mut dyn Job {
        self.job.as_mut()
    }
}
