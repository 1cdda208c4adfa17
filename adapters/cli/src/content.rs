use std::{fs, path::Path};

use anyhow::{Context, Result};
use cultivator_defence_core::{CatalogDefinition, MapDefinition, WaveConfig};
use cultivator_defence_simulation::{presets, SimulationConfig};
use serde::{de::DeserializeOwned, Deserialize};

/// Authored waves file layout: a top-level `[[waves]]` array.
#[derive(Debug, Deserialize)]
struct WaveFile {
    #[serde(default)]
    waves: Vec<WaveConfig>,
}

/// Content a session is built from.
#[derive(Debug)]
pub(crate) struct Content {
    pub(crate) config: SimulationConfig,
    pub(crate) catalog: CatalogDefinition,
    pub(crate) map: MapDefinition,
    pub(crate) waves: Vec<WaveConfig>,
}

impl Content {
    /// Loads every supplied file, falling back to the built-in presets.
    pub(crate) fn load(
        config: Option<&Path>,
        catalog: Option<&Path>,
        map: Option<&Path>,
        waves: Option<&Path>,
    ) -> Result<Self> {
        let waves = match waves {
            Some(path) => read_toml::<WaveFile>(path, "waves")?.waves,
            None => presets::standard_waves(),
        };

        Ok(Self {
            config: config
                .map(|path| read_toml(path, "simulation config"))
                .transpose()?
                .unwrap_or_default(),
            catalog: catalog
                .map(|path| read_toml(path, "catalog"))
                .transpose()?
                .unwrap_or_else(presets::standard_catalog),
            map: map
                .map(|path| read_toml(path, "map"))
                .transpose()?
                .unwrap_or_else(presets::standard_map),
            waves,
        })
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse {what} in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_file_parses_groups() {
        let file: WaveFile = toml::from_str(
            r#"
            [[waves]]
            wave = 2

            [[waves.groups]]
            person_type = "wolf_demon"
            count = 4
            spawn_interval_ms = 500
            "#,
        )
        .expect("valid waves file");

        assert_eq!(file.waves.len(), 1);
        assert_eq!(file.waves[0].groups[0].count, 4);
        assert_eq!(file.waves[0].groups[0].spawn_delay_ms, 0);
    }

    #[test]
    fn missing_files_fall_back_to_presets() {
        let content = Content::load(None, None, None, None).expect("presets load");
        assert_eq!(content.map, presets::standard_map());
        assert_eq!(content.config, SimulationConfig::default());
        assert_eq!(content.waves, presets::standard_waves());
    }

    #[test]
    fn unreadable_file_reports_its_path() {
        let error = Content::load(Some(Path::new("/nonexistent/sim.toml")), None, None, None)
            .expect_err("missing file");
        assert!(format!("{error:#}").contains("/nonexistent/sim.toml"));
    }
}
