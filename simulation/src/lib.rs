#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-interval scheduler that drives a Cultivator Defence session.
//!
//! [`Simulation`] owns the world together with every pure system. Each tick
//! advances the world by one fixed slice of game time, feeds the resulting
//! events to the wave director, lets defenders pick targets and fire, and
//! closes waves once the battlefield is clear. Hosts either call
//! [`Simulation::step`] directly or hand real elapsed time to
//! [`Simulation::advance`], which honours the playback speed.

use std::time::Duration;

use cultivator_defence_core::{
    Catalog, CatalogDefinition, CatalogError, Command, Event, GameSnapshot, GameStatus,
    GenerationError, MapDefinition, MapError, TowerTarget, WaveConfig, TICK_INTERVAL,
};
use cultivator_defence_system_spawning::{Config as DirectorConfig, WaveDirector};
use cultivator_defence_system_tower_targeting::TowerTargeting;
use cultivator_defence_world::{self as world, query, TileGrid, World, WorldSettings};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod presets;

/// Session parameters loadable from configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Game time covered by a single tick, in milliseconds.
    pub tick_interval_ms: u64,
    /// Spacing of attackers in synthesized waves, in milliseconds.
    pub synthesized_interval_ms: u64,
    /// Seed shared by world placement rolls and wave synthesis.
    pub seed: u64,
    /// Qi available before the first deployment.
    pub starting_qi: u32,
    /// Castle health at full strength.
    pub castle_health: u32,
    /// Waves that must be cleared for victory.
    pub total_waves: u32,
    /// Starts the next wave as soon as the previous one completes.
    pub auto_start: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let world = WorldSettings::default();
        Self {
            tick_interval_ms: TICK_INTERVAL.as_millis() as u64,
            synthesized_interval_ms: 1000,
            seed: world.seed,
            starting_qi: world.starting_qi,
            castle_health: world.castle_health,
            total_waves: world.total_waves,
            auto_start: true,
        }
    }
}

impl SimulationConfig {
    /// Game time covered by a single tick.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            starting_qi: self.starting_qi,
            castle_health: self.castle_health,
            total_waves: self.total_waves,
            seed: self.seed,
        }
    }

    fn director_config(&self) -> DirectorConfig {
        DirectorConfig::new(
            Duration::from_millis(self.synthesized_interval_ms),
            self.seed.rotate_left(17) ^ 0x5851_f42d_4c95_7f2d,
        )
    }
}

/// Failures raised while building or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The catalog could not be resolved.
    #[error("invalid catalog")]
    Catalog(#[from] CatalogError),
    /// The map could not be resolved.
    #[error("invalid map")]
    Map(#[from] MapError),
    /// A wave could not be generated.
    #[error("wave generation failed")]
    Generation(#[from] GenerationError),
}

/// Simulation context owned by the host loop.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    director: WaveDirector,
    targeting: TowerTargeting,
    targets: Vec<TowerTarget>,
    tick_interval: Duration,
    auto_start: bool,
    accumulator: Duration,
    ticks: u64,
    events: Vec<Event>,
}

impl Simulation {
    /// Builds a session from authored content.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Catalog`] or [`SimulationError::Map`] when
    /// the content fails to resolve.
    pub fn new(
        config: SimulationConfig,
        catalog: CatalogDefinition,
        map: &MapDefinition,
        waves: Vec<WaveConfig>,
    ) -> Result<Self, SimulationError> {
        let catalog = Catalog::from_definition(catalog)?;
        let grid = TileGrid::from_definition(map)?;

        Ok(Self {
            world: World::new(catalog, grid, config.world_settings()),
            director: WaveDirector::new(config.director_config(), waves),
            targeting: TowerTargeting::new(),
            targets: Vec::new(),
            tick_interval: config.tick_interval(),
            auto_start: config.auto_start,
            accumulator: Duration::ZERO,
            ticks: 0,
            events: Vec::new(),
        })
    }

    /// Builds a session on the built-in catalog, map and waves.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures from [`Simulation::new`].
    pub fn standard(config: SimulationConfig) -> Result<Self, SimulationError> {
        Self::new(
            config,
            presets::standard_catalog(),
            &presets::standard_map(),
            presets::standard_waves(),
        )
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current session status.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        query::status(&self.world)
    }

    /// Number of ticks executed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Captures the state presentation layers render.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        query::snapshot(&self.world)
    }

    /// Takes every event broadcast since the previous call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Applies a player command immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Generation`] when the command starts a wave
    /// that cannot be generated.
    pub fn submit(&mut self, command: Command) -> Result<(), SimulationError> {
        self.execute(command)
    }

    /// Feeds real elapsed time and runs every tick that fell due.
    ///
    /// Each tick waits `tick_interval / speed` of real time. Nothing runs
    /// while paused and leftover time is discarded so resuming does not
    /// replay the pause.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Simulation::step`].
    pub fn advance(&mut self, real_dt: Duration) -> Result<u32, SimulationError> {
        let mut executed = 0;
        let Some(interval) = query::speed(&self.world).real_tick_interval(self.tick_interval)
        else {
            self.accumulator = Duration::ZERO;
            return Ok(executed);
        };

        self.accumulator = self.accumulator.saturating_add(real_dt);
        while self.accumulator >= interval {
            if self.status() != GameStatus::Playing {
                self.accumulator = Duration::ZERO;
                break;
            }
            self.accumulator -= interval;
            self.step()?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Runs exactly one tick regardless of playback speed.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Generation`] when an automatically started
    /// wave cannot be generated.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        if self.status() != GameStatus::Playing {
            return Ok(());
        }

        self.ticks += 1;
        self.execute(Command::Tick {
            dt: self.tick_interval,
        })?;
        self.fire_towers()?;
        self.close_wave()
    }

    fn fire_towers(&mut self) -> Result<(), SimulationError> {
        self.targeting.handle(
            query::status(&self.world),
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.targets,
        );

        let targets = std::mem::take(&mut self.targets);
        for target in &targets {
            self.execute(Command::FireProjectile {
                tower: target.tower,
                target: target.enemy,
            })?;
        }
        self.targets = targets;
        Ok(())
    }

    fn close_wave(&mut self) -> Result<(), SimulationError> {
        let cleared = query::wave_in_progress(&self.world)
            && !self.director.in_progress()
            && query::attacker_count(&self.world) == 0;
        if !cleared {
            return Ok(());
        }

        self.execute(Command::CompleteWave)?;
        if self.auto_start && self.status() == GameStatus::Playing {
            debug!(wave = query::wave(&self.world) + 1, "auto-starting next wave");
            self.execute(Command::StartWave)?;
        }
        Ok(())
    }

    /// Applies `command` and every spawn the director releases in response.
    fn execute(&mut self, command: Command) -> Result<(), SimulationError> {
        let mut pending = vec![command];
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }

            let released = self
                .director
                .handle(&events, query::catalog(&self.world), &mut pending);
            self.events.extend(events);
            released?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: SimulationConfig =
            toml::from_str("seed = 42\nauto_start = false").expect("valid config");

        assert_eq!(config.seed, 42);
        assert!(!config.auto_start);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.synthesized_interval_ms, 1000);
        assert_eq!(config.starting_qi, 500);
    }

    #[test]
    fn zero_tick_interval_is_clamped() {
        let config = SimulationConfig {
            tick_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }
}
