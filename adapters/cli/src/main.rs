#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Dorf scenario headlessly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dorf_core::{Command, Event};
use dorf_system_bootstrap::Scenario;
use dorf_system_movement::MovementKind;
use dorf_world::{self as world, query, World};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for running a simulation.
#[derive(Debug, Parser)]
#[command(name = "dorf", about = "Runs the Dorf job simulation without a display.")]
struct Cli {
    /// TOML scenario to load instead of the classic one.
    #[arg(long, value_name = "FILE")]
    scenario: Option<PathBuf>,
    /// Overrides the terrain width.
    #[arg(long)]
    width: Option<u32>,
    /// Overrides the terrain height.
    #[arg(long)]
    height: Option<u32>,
    /// Overrides the terrain generation seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the tree density, in percent.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    tree_percent: Option<u8>,
    /// Overrides the movement strategy (greedy or path-following).
    #[arg(long)]
    movement: Option<MovementKind>,
    /// Runs exactly this many ticks instead of stopping once all jobs are done.
    #[arg(long)]
    ticks: Option<u32>,
    /// Upper bound on ticks when running until all jobs are done.
    #[arg(long, default_value_t = 1000)]
    max_ticks: u32,
    /// Logs the grid-search route of every active move job after each tick.
    #[arg(long)]
    show_routes: bool,
    /// Log filter, for example `info` or `dorf_world=debug`. Defaults to `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

impl Cli {
    fn scenario(&self) -> Result<Scenario> {
        let mut scenario = match &self.scenario {
            Some(path) => Scenario::load(path)
                .with_context(|| format!("failed to load scenario {}", path.display()))?,
            None => Scenario::classic(),
        };

        if let Some(width) = self.width {
            scenario.width = width;
        }
        if let Some(height) = self.height {
            scenario.height = height;
        }
        if let Some(seed) = self.seed {
            scenario.seed = seed;
        }
        if let Some(tree_percent) = self.tree_percent {
            scenario.tree_percent = tree_percent;
        }
        if let Some(movement) = self.movement {
            scenario.movement = movement;
        }
        Ok(scenario)
    }
}

/// Entry point for the Dorf command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let scenario = cli.scenario()?;
    let mut events = Vec::new();
    let mut world = scenario
        .build(&mut events)
        .context("failed to build the world")?;
    log_events(0, &events);

    let ticks = run(&mut world, &cli)?;

    let outstanding = world.job_list_size();
    if cli.ticks.is_none() && outstanding > 0 {
        warn!(
            ticks,
            outstanding, "tick limit reached before every job completed"
        );
    }
    info!(ticks, outstanding, "simulation finished");

    println!("finished after {ticks} ticks with {outstanding} jobs outstanding");
    for actor in query::actor_snapshots(&world) {
        match actor.job {
            Some(job) => println!("{} at {} working on {job}", actor.name, actor.cell),
            None => println!("{} at {} idle", actor.name, actor.cell),
        }
    }
    Ok(())
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(filter) => EnvFilter::try_new(filter)
            .with_context(|| format!("invalid log filter {filter:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

/// Ticks the world and returns how many ticks ran.
fn run(world: &mut World, cli: &Cli) -> Result<u32> {
    let limit = cli.ticks.unwrap_or(cli.max_ticks);
    let mut events = Vec::new();
    let mut tick = 0;

    while tick < limit {
        if cli.ticks.is_none() && world.job_list_size() == 0 {
            break;
        }
        tick += 1;

        events.clear();
        world::apply(world, Command::Tick, &mut events)
            .with_context(|| format!("tick {tick} failed"))?;
        log_events(tick, &events);

        if cli.show_routes {
            log_routes(world, tick);
        }
    }
    Ok(tick)
}

fn log_events(tick: u32, events: &[Event]) {
    for event in events {
        debug!(tick, ?event, "event");
    }
}

fn log_routes(world: &World, tick: u32) {
    for actor in query::actors(world) {
        let Some(job) = actor.current_job() else {
            continue;
        };
        match query::route_for(world, actor.id()) {
            Some(route) => {
                let cells = route
                    .cells()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                info!(
                    tick,
                    actor = %actor.name(),
                    job = %job.id(),
                    cost = route.cost(),
                    %cells,
                    "route"
                );
            }
            None => info!(tick, actor = %actor.name(), job = %job.id(), "no route"),
        }
    }
}
