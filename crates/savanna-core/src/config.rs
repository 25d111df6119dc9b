//! Configuration types for the simulation.

use crate::{Error, Result, Species};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_DEPTH: i32 = 115;
pub const DEFAULT_WIDTH: i32 = 180;

/// Field dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of rows
    pub depth: i32,
    /// Number of columns
    pub width: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            width: DEFAULT_WIDTH,
        }
    }
}

impl GridConfig {
    pub fn is_valid(&self) -> bool {
        self.depth > 0 && self.width > 0
    }

    /// Dimensions to actually build with. Non-positive input is not an
    /// error: it is replaced by the default dimensions.
    pub fn resolved(&self) -> GridConfig {
        if self.is_valid() {
            *self
        } else {
            warn!(
                depth = self.depth,
                width = self.width,
                default_depth = DEFAULT_DEPTH,
                default_width = DEFAULT_WIDTH,
                "Grid dimensions must be greater than zero, using defaults"
            );
            GridConfig::default()
        }
    }
}

/// Per-cell creation probabilities used when the field is populated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub elephant: f64,
    pub zebra: f64,
    pub buffalo: f64,
    pub grass: f64,
    pub lion: f64,
    pub human: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            elephant: 0.02,
            zebra: 0.03,
            buffalo: 0.02,
            grass: 0.10,
            lion: 0.025,
            human: 0.025,
        }
    }
}

impl PopulationConfig {
    /// Species in the order they are rolled for each cell. The first
    /// successful roll claims the cell.
    pub fn priority(&self) -> [(Species, f64); 6] {
        [
            (Species::Elephant, self.elephant),
            (Species::Zebra, self.zebra),
            (Species::Buffalo, self.buffalo),
            (Species::Grass, self.grass),
            (Species::Lion, self.lion),
            (Species::Human, self.human),
        ]
    }

    /// A population config that never creates anything
    pub fn empty() -> Self {
        Self {
            elephant: 0.0,
            zebra: 0.0,
            buffalo: 0.0,
            grass: 0.0,
            lion: 0.0,
            human: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (species, probability) in self.priority() {
            check_probability(&format!("{} creation probability", species), probability)?;
        }
        Ok(())
    }
}

/// Day/night and weather cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Day and night toggle every `day_length` steps
    pub day_length: u64,
    /// Lower bound (inclusive) of the per-tick weather interval draw
    pub weather_interval_min: u64,
    /// Upper bound (exclusive) of the per-tick weather interval draw
    pub weather_interval_max: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            day_length: 10,
            weather_interval_min: 5,
            weather_interval_max: 10,
        }
    }
}

impl EnvironmentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.day_length == 0 {
            return Err(Error::InvalidConfig("day_length must be positive".to_string()));
        }
        if self.weather_interval_min == 0 || self.weather_interval_min >= self.weather_interval_max {
            return Err(Error::InvalidConfig(format!(
                "weather interval [{}, {}) must be a non-empty range of positive steps",
                self.weather_interval_min, self.weather_interval_max
            )));
        }
        Ok(())
    }
}

/// Disease parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseConfig {
    /// Per-contact transmission probability
    pub virality: f64,
    /// Steps left to live once infected
    pub virulence: u32,
}

impl Default for DiseaseConfig {
    fn default() -> Self {
        Self {
            virality: 0.05,
            virulence: 10,
        }
    }
}

impl DiseaseConfig {
    pub fn validate(&self) -> Result<()> {
        check_probability("disease virality", self.virality)
    }
}

/// Everything the world needs to (re)build itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub population: PopulationConfig,
    pub environment: EnvironmentConfig,
    pub disease: DiseaseConfig,
    /// Seed for the shared random source; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Ticks between population metric snapshots in the log
    pub metrics_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            population: PopulationConfig::default(),
            environment: EnvironmentConfig::default(),
            disease: DiseaseConfig::default(),
            seed: None,
            metrics_interval: 100,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        self.population.validate()?;
        self.environment.validate()?;
        self.disease.validate()?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Headless run parameters for the driver binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum number of ticks to run
    pub max_steps: u64,
    /// Pause between ticks (milliseconds)
    pub tick_delay_ms: u64,
    /// Stop early once fewer than two species remain
    pub stop_when_unviable: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            tick_delay_ms: 10,
            stop_when_unviable: true,
        }
    }
}

pub fn check_probability(what: &str, probability: f64) -> Result<()> {
    if (0.0..=1.0).contains(&probability) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be within [0, 1], got {}",
            what, probability
        )))
    }
}
