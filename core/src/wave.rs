//! Authored wave configurations and the errors raised while using them.

use serde::{Deserialize, Serialize};

/// One group of identical attackers released on its own timer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Key of the attacker person type.
    pub person_type: String,
    /// Number of attackers released by the group.
    pub count: u32,
    /// Milliseconds between consecutive releases.
    pub spawn_interval_ms: u64,
    /// Milliseconds to wait after the wave starts before the first release.
    #[serde(default)]
    pub spawn_delay_ms: u64,
}

/// Authored wave composed of concurrently running spawn groups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// One-based wave number the configuration applies to.
    pub wave: u32,
    /// Groups released concurrently when the wave starts.
    #[serde(default)]
    pub groups: Vec<SpawnGroup>,
}

/// Reasons an authored wave fails validation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WaveConfigError {
    /// The wave declares no spawn groups.
    #[error("wave {wave} has no spawn groups")]
    NoGroups {
        /// Offending wave.
        wave: u32,
    },
    /// A group references a person type missing from the catalog.
    #[error("wave {wave} group {group} references unknown person type `{key}`")]
    UnknownPersonType {
        /// Offending wave.
        wave: u32,
        /// Index of the group within the wave.
        group: usize,
        /// Missing key.
        key: String,
    },
    /// A group references a person type that cannot attack.
    #[error("wave {wave} group {group} references non-attacker `{key}`")]
    NotAnAttacker {
        /// Offending wave.
        wave: u32,
        /// Index of the group within the wave.
        group: usize,
        /// Offending key.
        key: String,
    },
    /// A group releases no attackers.
    #[error("wave {wave} group {group} has a count of zero")]
    ZeroCount {
        /// Offending wave.
        wave: u32,
        /// Index of the group within the wave.
        group: usize,
    },
    /// A group releases attackers without any spacing.
    #[error("wave {wave} group {group} has a spawn interval of zero")]
    ZeroInterval {
        /// Offending wave.
        wave: u32,
        /// Index of the group within the wave.
        group: usize,
    },
}

/// Failures that leave the director without any safe fallback.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The catalog holds no attacker eligible for the wave.
    #[error("no attacker person type is eligible for wave {wave}")]
    NoEligibleTypes {
        /// Wave being generated.
        wave: u32,
    },
}
