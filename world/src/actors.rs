//! Simulated agents that pull jobs from the world and work them off.

use dorf_core::{ActorId, CellCoord, Event, JobId};
use tracing::{debug, info};

use crate::{
    jobs::{AssignedJob, JobContext},
    World, WorldError,
};

/// Agent with a position and at most one job.
#[derive(Debug)]
pub struct Actor {
    id: ActorId,
    name: String,
    cell: CellCoord,
    current: Option<AssignedJob>,
}

impl Actor {
    pub(crate) fn new(id: ActorId, name: String, cell: CellCoord) -> Self {
        Self {
            id,
            name,
            cell,
            current: None,
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Display name. Not required to be unique.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cell the actor currently occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Moves the actor. No bounds or obstacle checks are performed.
    pub fn set_cell(&mut self, cell: CellCoord) {
        self.cell = cell;
    }

    /// Job the actor is working on, if any.
    #[must_use]
    pub fn current_job(&self) -> Option<&AssignedJob> {
        self.current.as_ref()
    }

    /// Identifier of the current job, if any.
    #[must_use]
    pub fn current_job_id(&self) -> Option<JobId> {
        self.current.as_ref().map(AssignedJob::id)
    }

    /// Pulls a job when idle, then advances the held job by one step.
    pub(crate) fn tick(
        &mut self,
        world: &mut World,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        if self.current.is_none() {
            self.current = world.assign_job();
            if let Some(assigned) = &self.current {
                info!(
                    actor = %self.name,
                    job = %assigned.id(),
                    task = %assigned.job().describe(),
                    "job assigned"
                );
                out_events.push(Event::JobAssigned {
                    actor: self.id,
                    job: assigned.id(),
                });
            }
        }

        let Some(mut assigned) = self.current.take() else {
            return Ok(());
        };

        let from = self.cell;
        let context = JobContext::new(world.terrain().view());
        let completed = assigned.job_mut().tick(self, &context);

        if self.cell != from {
            debug!(actor = %self.name, %from, to = %self.cell, "actor moved");
            out_events.push(Event::ActorMoved {
                actor: self.id,
                from,
                to: self.cell,
            });
        }

        if !completed {
            self.current = Some(assigned);
            return Ok(());
        }

        world.job_completed(assigned.id())?;
        info!(actor = %self.name, job = %assigned.id(), cell = %self.cell, "job completed");
        out_events.push(Event::JobCompleted {
            actor: self.id,
            job: assigned.id(),
        });
        Ok(())
    }
}
