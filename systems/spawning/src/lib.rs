#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave director responsible for emitting attacker spawn commands.
//!
//! When a wave starts the director resolves its composition, either from an
//! authored [`WaveConfig`] or by synthesis, and queues every release on a
//! logical timeline keyed by game time. Releases only advance with
//! [`Event::TimeAdvanced`], so pausing the world suspends every group timer
//! at once.

use std::{
    cmp::{Ordering, Reverse},
    collections::{BTreeMap, BinaryHeap},
    time::Duration,
};

use cultivator_defence_core::{
    Catalog, Command, Event, GenerationError, PersonTypeId, UnitRole, WaveConfig,
    WaveConfigError,
};
use rand::{
    distributions::{Distribution, WeightedIndex},
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Attackers released by a synthesized wave before the per-wave increase.
pub const SYNTHESIZED_BASE_COUNT: u32 = 5;

/// Additional attackers released per wave number by a synthesized wave.
pub const SYNTHESIZED_COUNT_PER_WAVE: u32 = 2;

/// Health multiplier increase per wave beyond the first.
pub const SYNTHESIZED_HEALTH_STEP: f32 = 0.3;

/// Number of attackers a synthesized wave releases.
#[must_use]
pub fn synthesized_count(wave: u32) -> u32 {
    SYNTHESIZED_BASE_COUNT.saturating_add(wave.saturating_mul(SYNTHESIZED_COUNT_PER_WAVE))
}

/// Health multiplier applied to attackers of a synthesized wave.
#[must_use]
pub fn synthesized_health_multiplier(wave: u32) -> f32 {
    1.0 + wave.saturating_sub(1) as f32 * SYNTHESIZED_HEALTH_STEP
}

/// Checks an authored wave against the catalog.
///
/// # Errors
///
/// Returns the first [`WaveConfigError`] found, in group order.
pub fn validate(config: &WaveConfig, catalog: &Catalog) -> Result<(), WaveConfigError> {
    resolve(config, catalog).map(|_| ())
}

/// Configuration parameters required to construct the wave director.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    synthesized_interval: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the synthesized cadence and seed.
    #[must_use]
    pub const fn new(synthesized_interval: Duration, rng_seed: u64) -> Self {
        Self {
            synthesized_interval,
            rng_seed,
        }
    }
}

/// Group of identical releases resolved against the catalog.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ResolvedGroup {
    person_type: PersonTypeId,
    count: u32,
    interval: Duration,
    delay: Duration,
}

fn resolve(config: &WaveConfig, catalog: &Catalog) -> Result<Vec<ResolvedGroup>, WaveConfigError> {
    let wave = config.wave;
    if config.groups.is_empty() {
        return Err(WaveConfigError::NoGroups { wave });
    }

    config
        .groups
        .iter()
        .enumerate()
        .map(|(group, authored)| {
            let person_type = catalog.person_type_by_key(&authored.person_type).ok_or_else(|| {
                WaveConfigError::UnknownPersonType {
                    wave,
                    group,
                    key: authored.person_type.clone(),
                }
            })?;
            if person_type.role != UnitRole::Attacker {
                return Err(WaveConfigError::NotAnAttacker {
                    wave,
                    group,
                    key: authored.person_type.clone(),
                });
            }
            if authored.count == 0 {
                return Err(WaveConfigError::ZeroCount { wave, group });
            }
            if authored.spawn_interval_ms == 0 {
                return Err(WaveConfigError::ZeroInterval { wave, group });
            }

            Ok(ResolvedGroup {
                person_type: person_type.id,
                count: authored.count,
                interval: Duration::from_millis(authored.spawn_interval_ms),
                delay: Duration::from_millis(authored.spawn_delay_ms),
            })
        })
        .collect()
}

/// Attacker release scheduled on the director's timeline.
#[derive(Clone, Copy, Debug)]
struct PendingSpawn {
    at: Duration,
    sequence: u64,
    person_type: PersonTypeId,
    health_multiplier: f32,
}

impl PartialEq for PendingSpawn {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingSpawn {}

impl PartialOrd for PendingSpawn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingSpawn {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.sequence).cmp(&(other.at, other.sequence))
    }
}

/// Pure system that turns wave starts into timed spawn commands.
#[derive(Debug)]
pub struct WaveDirector {
    authored: BTreeMap<u32, WaveConfig>,
    synthesized_interval: Duration,
    clock: Duration,
    pending: BinaryHeap<Reverse<PendingSpawn>>,
    next_sequence: u64,
    rng: ChaCha8Rng,
}

impl WaveDirector {
    /// Creates a director with authored waves keyed by their wave number.
    ///
    /// Later entries replace earlier ones that target the same wave.
    #[must_use]
    pub fn new(config: Config, authored: Vec<WaveConfig>) -> Self {
        Self {
            authored: authored
                .into_iter()
                .map(|wave| (wave.wave, wave))
                .collect(),
            synthesized_interval: config.synthesized_interval,
            clock: Duration::ZERO,
            pending: BinaryHeap::new(),
            next_sequence: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Reports whether releases are still queued for the current wave.
    #[must_use]
    pub fn in_progress(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of releases still queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Consumes world events and emits the spawn commands that fell due.
    ///
    /// Releases scheduled at the current game time, such as the first
    /// attacker of an undelayed group, are emitted in the same call that
    /// observed the wave start.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::NoEligibleTypes`] when a wave must be
    /// synthesized but the catalog holds no attacker that may appear in it.
    pub fn handle(
        &mut self,
        events: &[Event],
        catalog: &Catalog,
        out: &mut Vec<Command>,
    ) -> Result<(), GenerationError> {
        for event in events {
            match event {
                Event::WaveStarted { wave } => self.schedule(*wave, catalog)?,
                Event::TimeAdvanced { dt } => self.clock = self.clock.saturating_add(*dt),
                Event::GameOver { .. } | Event::Victory { .. } => self.pending.clear(),
                _ => {}
            }
        }

        self.release(out);
        Ok(())
    }

    fn schedule(&mut self, wave: u32, catalog: &Catalog) -> Result<(), GenerationError> {
        let authored = self
            .authored
            .get(&wave)
            .map(|config| resolve(config, catalog));

        match authored {
            Some(Ok(groups)) => {
                debug!(wave, groups = groups.len(), "scheduling authored wave");
                for group in groups {
                    for index in 0..group.count {
                        let offset = group.delay.saturating_add(group.interval.saturating_mul(index));
                        self.enqueue(offset, group.person_type, 1.0);
                    }
                }
                Ok(())
            }
            Some(Err(error)) => {
                warn!(wave, %error, "invalid authored wave, synthesizing instead");
                self.synthesize(wave, catalog)
            }
            None => self.synthesize(wave, catalog),
        }
    }

    fn synthesize(&mut self, wave: u32, catalog: &Catalog) -> Result<(), GenerationError> {
        let eligible: Vec<(PersonTypeId, u32)> = catalog
            .attackers()
            .filter(|person_type| person_type.first_wave <= wave && person_type.spawn_weight > 0)
            .map(|person_type| (person_type.id, person_type.spawn_weight))
            .collect();
        let weights = WeightedIndex::new(eligible.iter().map(|(_, weight)| *weight))
            .map_err(|_| GenerationError::NoEligibleTypes { wave })?;

        let count = synthesized_count(wave);
        let health_multiplier = synthesized_health_multiplier(wave);
        debug!(wave, count, health_multiplier, "scheduling synthesized wave");

        for index in 0..count {
            let (person_type, _) = eligible[weights.sample(&mut self.rng)];
            let offset = self.synthesized_interval.saturating_mul(index);
            self.enqueue(offset, person_type, health_multiplier);
        }
        Ok(())
    }

    fn enqueue(&mut self, offset: Duration, person_type: PersonTypeId, health_multiplier: f32) {
        let spawn = PendingSpawn {
            at: self.clock.saturating_add(offset),
            sequence: self.next_sequence,
            person_type,
            health_multiplier,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.pending.push(Reverse(spawn));
    }

    fn release(&mut self, out: &mut Vec<Command>) {
        while self
            .pending
            .peek()
            .is_some_and(|Reverse(next)| next.at <= self.clock)
        {
            let Some(Reverse(spawn)) = self.pending.pop() else {
                break;
            };
            out.push(Command::SpawnEnemy {
                person_type: spawn.person_type,
                health_multiplier: spawn.health_multiplier,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cultivator_defence_core::{
        BaseStats, CatalogDefinition, PersonTypeDefinition, SpawnGroup,
    };

    fn person(key: &str, role: UnitRole, spawn_weight: u32, first_wave: u32) -> PersonTypeDefinition {
        PersonTypeDefinition {
            key: key.to_owned(),
            name: key.to_owned(),
            emoji: String::new(),
            role,
            stats: BaseStats {
                damage: 5,
                attack_speed_ms: 1000,
                range: 0,
                health: 40,
            },
            speed: 1.0,
            reward: 10,
            cost: 100,
            spawn_weight,
            first_wave,
            skills: Vec::new(),
            items: Vec::new(),
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_definition(CatalogDefinition {
            person_types: vec![
                person("disciple", UnitRole::Defender, 0, 1),
                person("bandit", UnitRole::Attacker, 3, 1),
                person("demon", UnitRole::Attacker, 1, 3),
            ],
            ..CatalogDefinition::default()
        })
        .expect("valid catalog")
    }

    fn group(person_type: &str, count: u32, interval: u64, delay: u64) -> SpawnGroup {
        SpawnGroup {
            person_type: person_type.to_owned(),
            count,
            spawn_interval_ms: interval,
            spawn_delay_ms: delay,
        }
    }

    fn director(authored: Vec<WaveConfig>) -> WaveDirector {
        WaveDirector::new(Config::new(Duration::from_millis(1000), 7), authored)
    }

    #[test]
    fn synthesized_parameters_follow_wave_number() {
        assert_eq!(synthesized_count(1), 7);
        assert_eq!(synthesized_count(4), 13);
        assert_eq!(synthesized_health_multiplier(1), 1.0);
        assert!((synthesized_health_multiplier(3) - 1.6).abs() < 1e-6);
    }

    #[test]
    fn validation_reports_first_offending_group() {
        let catalog = catalog();
        let config = |groups| WaveConfig { wave: 2, groups };

        assert_eq!(
            validate(&config(Vec::new()), &catalog),
            Err(WaveConfigError::NoGroups { wave: 2 })
        );
        assert_eq!(
            validate(
                &config(vec![group("bandit", 1, 100, 0), group("ghost", 1, 100, 0)]),
                &catalog
            ),
            Err(WaveConfigError::UnknownPersonType {
                wave: 2,
                group: 1,
                key: "ghost".into(),
            })
        );
        assert_eq!(
            validate(&config(vec![group("disciple", 1, 100, 0)]), &catalog),
            Err(WaveConfigError::NotAnAttacker {
                wave: 2,
                group: 0,
                key: "disciple".into(),
            })
        );
        assert_eq!(
            validate(&config(vec![group("bandit", 0, 100, 0)]), &catalog),
            Err(WaveConfigError::ZeroCount { wave: 2, group: 0 })
        );
        assert_eq!(
            validate(&config(vec![group("bandit", 2, 0, 0)]), &catalog),
            Err(WaveConfigError::ZeroInterval { wave: 2, group: 0 })
        );
        assert_eq!(
            validate(&config(vec![group("demon", 2, 250, 500)]), &catalog),
            Ok(())
        );
    }

    #[test]
    fn synthesis_only_picks_types_that_have_appeared() {
        let catalog = catalog();
        let mut director = director(Vec::new());
        let mut out = Vec::new();

        director
            .handle(&[Event::WaveStarted { wave: 1 }], &catalog, &mut out)
            .expect("wave 1 has eligible attackers");

        let bandit = catalog.person_type_by_key("bandit").map(|ty| ty.id);
        assert_eq!(out.len(), 1);
        assert_eq!(director.pending(), 6);
        assert!(out.iter().all(|command| matches!(
            command,
            Command::SpawnEnemy { person_type, health_multiplier }
                if Some(*person_type) == bandit && *health_multiplier == 1.0
        )));
    }

    #[test]
    fn missing_attackers_surface_generation_error() {
        let catalog = Catalog::from_definition(CatalogDefinition {
            person_types: vec![
                person("disciple", UnitRole::Defender, 0, 1),
                person("demon", UnitRole::Attacker, 1, 5),
            ],
            ..CatalogDefinition::default()
        })
        .expect("valid catalog");
        let mut director = director(Vec::new());
        let mut out = Vec::new();

        let result = director.handle(&[Event::WaveStarted { wave: 2 }], &catalog, &mut out);

        assert_eq!(result, Err(GenerationError::NoEligibleTypes { wave: 2 }));
        assert!(out.is_empty());
        assert!(!director.in_progress());
    }

    #[test]
    fn releases_wait_for_game_time() {
        let catalog = catalog();
        let mut director = director(vec![WaveConfig {
            wave: 1,
            groups: vec![group("bandit", 2, 300, 200)],
        }]);
        let mut out = Vec::new();

        director
            .handle(&[Event::WaveStarted { wave: 1 }], &catalog, &mut out)
            .expect("authored wave");
        assert!(out.is_empty());
        assert!(director.in_progress());

        let tick = Event::TimeAdvanced {
            dt: Duration::from_millis(100),
        };
        director.handle(&[tick.clone()], &catalog, &mut out).expect("tick");
        assert!(out.is_empty());
        director.handle(&[tick.clone()], &catalog, &mut out).expect("tick");
        assert_eq!(out.len(), 1);

        director
            .handle(&[tick.clone(), tick.clone()], &catalog, &mut out)
            .expect("tick");
        assert_eq!(out.len(), 1);
        director.handle(&[tick], &catalog, &mut out).expect("tick");
        assert_eq!(out.len(), 2);
        assert!(!director.in_progress());
    }

    #[test]
    fn game_over_discards_pending_releases() {
        let catalog = catalog();
        let mut director = director(Vec::new());
        let mut out = Vec::new();

        director
            .handle(&[Event::WaveStarted { wave: 1 }], &catalog, &mut out)
            .expect("synthesized wave");
        assert!(director.in_progress());

        director
            .handle(&[Event::GameOver { score: 0 }], &catalog, &mut out)
            .expect("game over");
        assert!(!director.in_progress());
    }
}
