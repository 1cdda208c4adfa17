#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Cultivator Defence session.

mod content;
mod deployment;

use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use cultivator_defence_core::{Command, Event, GameSnapshot, SpeedMultiplier};
use cultivator_defence_simulation::Simulation;
use cultivator_defence_world::query;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{content::Content, deployment::DeploymentOrder};

/// Command-line arguments accepted by the Cultivator Defence runner.
#[derive(Debug, Parser)]
#[command(name = "cultivator-defence", about = "Runs a headless Cultivator Defence session")]
struct CliArgs {
    /// Simulation settings in TOML.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Catalog of person types, skills and items in TOML.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
    /// Map definition in TOML.
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,
    /// Authored waves in TOML.
    #[arg(long, value_name = "PATH")]
    waves: Option<PathBuf>,
    /// Playback speed multiplier applied when pacing in real time.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    speed: u8,
    /// Paces ticks against the wall clock instead of running flat out.
    #[arg(long)]
    realtime: bool,
    /// Upper bound on executed ticks.
    #[arg(long, default_value_t = 20_000)]
    max_ticks: u64,
    /// Overrides the configured RNG seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Defenders deployed before the first wave, as `key@column,row`.
    #[arg(long = "tower", value_name = "KEY@COL,ROW")]
    towers: Vec<DeploymentOrder>,
    /// Prints the final snapshot as JSON.
    #[arg(long)]
    json: bool,
    /// Log filter directive; takes precedence over `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

/// Entry point for the Cultivator Defence command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_level.as_deref())?;

    let content = Content::load(
        args.config.as_deref(),
        args.catalog.as_deref(),
        args.map.as_deref(),
        args.waves.as_deref(),
    )?;
    let mut config = content.config;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut simulation = Simulation::new(config, content.catalog, &content.map, content.waves)
        .context("failed to build simulation")?;
    deploy(&mut simulation, &args.towers)?;

    let speed = SpeedMultiplier::new(args.speed).unwrap_or_default();
    simulation.submit(Command::SetSpeed { multiplier: speed })?;
    simulation.submit(Command::StartWave)?;
    report(&simulation.drain_events());

    if args.realtime {
        run_realtime(&mut simulation, args.max_ticks)?;
    } else {
        while !simulation.status().is_over() && simulation.ticks() < args.max_ticks {
            simulation.step()?;
            report(&simulation.drain_events());
        }
    }

    let snapshot = simulation.snapshot();
    if args.json {
        let json =
            serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;
        println!("{json}");
    } else {
        println!("{}", summary(&snapshot, simulation.ticks()));
    }
    Ok(())
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
    Ok(())
}

fn deploy(simulation: &mut Simulation, orders: &[DeploymentOrder]) -> Result<()> {
    for order in orders {
        let person_type = query::catalog(simulation.world())
            .person_type_by_key(&order.person_type)
            .map(|person_type| person_type.id)
            .with_context(|| format!("unknown person type `{}`", order.person_type))?;
        simulation.submit(Command::PlaceTower {
            person_type,
            cell: order.cell,
        })?;
    }
    Ok(())
}

fn run_realtime(simulation: &mut Simulation, max_ticks: u64) -> Result<()> {
    let mut last = Instant::now();
    while !simulation.status().is_over() && simulation.ticks() < max_ticks {
        thread::sleep(Duration::from_millis(5));
        let now = Instant::now();
        let _ = simulation.advance(now - last)?;
        last = now;
        report(&simulation.drain_events());
    }
    Ok(())
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::WaveCompleted { wave } => info!(wave, "wave cleared"),
            Event::TowerPlaced { tower, cell, .. } => {
                info!(
                    tower = tower.get(),
                    column = cell.column(),
                    row = cell.row(),
                    "defender deployed"
                );
            }
            Event::TowerPlacementRejected { reason, .. } => {
                warn!(%reason, "deployment rejected");
            }
            Event::TowerLeveledUp { tower, level } => {
                info!(tower = tower.get(), level, "defender broke through");
            }
            Event::TowerDestroyed { tower } => info!(tower = tower.get(), "defender fell"),
            _ => {}
        }
    }
}

fn summary(snapshot: &GameSnapshot, ticks: u64) -> String {
    format!(
        "status: {:?}\nwave: {}\nscore: {}\ncastle: {}/{}\nqi: {}\ndefenders: {}\nticks: {}\nelapsed: {:.1}s",
        snapshot.status,
        snapshot.wave,
        snapshot.score,
        snapshot.castle_health,
        snapshot.castle_max_health,
        snapshot.qi,
        snapshot.towers.len(),
        ticks,
        snapshot.elapsed.as_secs_f64(),
    )
}
