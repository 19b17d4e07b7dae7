#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Dorf simulation.
//!
//! The world owns the terrain, the actor roster and the job queues. Each call
//! to [`World::tick`] lets every actor, in the order they were added, pull a
//! job if idle and advance it by exactly one step.

mod actors;
mod jobs;
mod terrain;

use std::collections::VecDeque;

use dorf_core::{ActorId, CellCoord, Command, Event, JobId};
use dorf_system_movement::MovementKind;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

pub use actors::Actor;
pub use jobs::{job_from_spec, AssignedJob, Job, JobContext, MoveToJob};
pub use terrain::{
    Terrain, TerrainConfig, TerrainError, DEFAULT_TERRAIN_SIZE, DEFAULT_TREE_PERCENT,
    MAX_TERRAIN_CELLS,
};

/// Internal-consistency violations detected by the world.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// A job was reported complete although it is not in flight.
    #[error("{0} was reported complete but is not in flight")]
    JobNotInFlight(JobId),
}

#[derive(Debug)]
struct PendingJob {
    id: JobId,
    job: Box<dyn Job>,
}

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    terrain: Terrain,
    actors: Vec<Actor>,
    pending: VecDeque<PendingJob>,
    in_flight: Vec<JobId>,
    movement: MovementKind,
    next_actor_id: u32,
    next_job_id: u32,
}

impl World {
    /// Creates an empty world over the provided terrain.
    #[must_use]
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            actors: Vec::new(),
            pending: VecDeque::new(),
            in_flight: Vec::new(),
            movement: MovementKind::default(),
            next_actor_id: 0,
            next_job_id: 0,
        }
    }

    /// Generates fresh terrain and wraps it in an empty world.
    pub fn generate<R>(rng: &mut R, config: TerrainConfig) -> Result<Self, TerrainError>
    where
        R: Rng + ?Sized,
    {
        Terrain::generate(rng, config).map(Self::new)
    }

    /// Selects the movement strategy given to jobs created through [`apply`].
    #[must_use]
    pub fn with_movement(mut self, movement: MovementKind) -> Self {
        self.movement = movement;
        self
    }

    /// Movement strategy given to jobs created through [`apply`].
    #[must_use]
    pub const fn movement(&self) -> MovementKind {
        self.movement
    }

    /// Terrain the actors live on.
    #[must_use]
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Appends an actor to the end of the roster.
    pub fn add_actor(&mut self, name: impl Into<String>, cell: CellCoord) -> ActorId {
        let id = ActorId::new(self.next_actor_id);
        self.next_actor_id = self.next_actor_id.wrapping_add(1);
        let actor = Actor::new(id, name.into(), cell);
        debug!(actor = %actor.name(), %cell, "actor added");
        self.actors.push(actor);
        id
    }

    /// Appends an actor standing on [`CellCoord::START`].
    pub fn add_actor_at_start(&mut self, name: impl Into<String>) -> ActorId {
        self.add_actor(name, CellCoord::START)
    }

    /// Appends a job to the tail of the pending queue.
    pub fn add_job<J>(&mut self, job: J) -> JobId
    where
        J: Job + 'static,
    {
        self.add_boxed_job(Box::new(job))
    }

    /// Appends an already boxed job to the tail of the pending queue.
    pub fn add_boxed_job(&mut self, job: Box<dyn Job>) -> JobId {
        let id = JobId::new(self.next_job_id);
        self.next_job_id = self.next_job_id.wrapping_add(1);
        debug!(job = %id, task = %job.describe(), "job queued");
        self.pending.push_back(PendingJob { id, job });
        id
    }

    /// Moves the oldest pending job to the in-flight list and hands it out.
    ///
    /// Returns `None` when nothing is pending.
    pub fn assign_job(&mut self) -> Option<AssignedJob> {
        let PendingJob { id, job } = self.pending.pop_front()?;
        self.in_flight.push(id);
        Some(AssignedJob::new(id, job))
    }

    /// Stops tracking a finished job.
    ///
    /// Reporting a job that is not in flight means the bookkeeping is broken;
    /// callers should treat the error as fatal.
    pub fn job_completed(&mut self, job: JobId) -> Result<(), WorldError> {
        let Some(position) = self.in_flight.iter().position(|tracked| *tracked == job) else {
            return Err(WorldError::JobNotInFlight(job));
        };
        let _ = self.in_flight.remove(position);
        Ok(())
    }

    /// Advances every actor once, in roster order.
    pub fn tick(&mut self, out_events: &mut Vec<Event>) -> Result<(), WorldError> {
        let mut actors = std::mem::take(&mut self.actors);
        let outcome = actors
            .iter_mut()
            .try_for_each(|actor| actor.tick(self, out_events));
        self.actors = actors;
        trace!(
            pending = self.pending.len(),
            in_flight = self.in_flight.len(),
            "tick finished"
        );
        outcome
    }

    /// Pending plus in-flight job count.
    #[must_use]
    pub fn job_list_size(&self) -> usize {
        self.pending.len() + self.in_flight.len()
    }

    /// Number of jobs waiting for an actor.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of jobs currently held by actors.
    #[must_use]
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    match command {
        Command::AddActor { name, cell } => {
            let actor = world.add_actor(name, cell);
            out_events.push(Event::ActorAdded { actor, cell });
        }
        Command::AddJob { job } => {
            let job = world.add_boxed_job(job_from_spec(job, world.movement));
            out_events.push(Event::JobQueued { job });
        }
        Command::Tick => world.tick(out_events)?,
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use dorf_core::{ActorId, ActorSnapshot, JobId, TerrainView};
    use dorf_system_pathfinding::{GridSearch, Path};

    use super::{Actor, Terrain, World};

    /// Provides read-only access to the terrain.
    #[must_use]
    pub fn terrain(world: &World) -> &Terrain {
        &world.terrain
    }

    /// Exposes a read-only view of the terrain cells.
    #[must_use]
    pub fn terrain_view(world: &World) -> TerrainView<'_> {
        world.terrain.view()
    }

    /// Actors in roster order.
    #[must_use]
    pub fn actors(world: &World) -> &[Actor] {
        &world.actors
    }

    /// Captures snapshots of every actor in roster order.
    #[must_use]
    pub fn actor_snapshots(world: &World) -> Vec<ActorSnapshot> {
        world.actors.iter().map(snapshot).collect()
    }

    /// Identifiers of pending jobs, oldest first.
    #[must_use]
    pub fn pending_jobs(world: &World) -> Vec<JobId> {
        world.pending.iter().map(|pending| pending.id).collect()
    }

    /// Identifiers of jobs currently held by actors, in assignment order.
    #[must_use]
    pub fn in_flight_jobs(world: &World) -> &[JobId] {
        &world.in_flight
    }

    /// Pending plus in-flight job count.
    #[must_use]
    pub fn job_list_size(world: &World) -> usize {
        world.job_list_size()
    }

    /// Grid search over the world terrain with default options.
    #[must_use]
    pub fn grid_search(world: &World) -> GridSearch<'_> {
        GridSearch::new(world.terrain.view())
    }

    /// Candidate route from an actor to the destination of its current job.
    ///
    /// Intended for display. Movement jobs do not consult it.
    #[must_use]
    pub fn route_for(world: &World, actor: ActorId) -> Option<Path> {
        let actor = world.actors.iter().find(|candidate| candidate.id() == actor)?;
        let destination = actor.current_job()?.job().destination()?;
        grid_search(world).solve(actor.cell(), destination)
    }

    fn snapshot(actor: &Actor) -> ActorSnapshot {
        let job = actor.current_job();
        ActorSnapshot {
            id: actor.id(),
            name: actor.name().to_owned(),
            cell: actor.cell(),
            job: job.map(|assigned| assigned.id()),
            destination: job.and_then(|assigned| assigned.job().destination()),
        }
    }
}
