//! Driver configuration file.

use anyhow::{Context, Result};
use savanna_core::{RunConfig, SimulationConfig};
use savanna_world::{SpeciesRegistry, SpeciesTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top level of the JSON file passed on the command line. Every key is
/// optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub simulation: SimulationConfig,
    pub run: RunConfig,
    /// Replaces the built-in species table when present
    pub species: Option<SpeciesTable>,
}

impl CliConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CliConfig = serde_json::from_str(json).context("malformed config file")?;
        config.simulation.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    pub fn registry(&self) -> Result<SpeciesRegistry> {
        match &self.species {
            Some(table) => Ok(SpeciesRegistry::from_table(table.clone())?),
            None => Ok(SpeciesRegistry::savanna()),
        }
    }
}
