// Tunable defaults in one place; `SimConfig` overrides them from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::{check_rate, Kind};
use crate::error::{ConfigError, SimError};
use crate::grid::EdgePolicy;

// World
pub const GRID_WIDTH: usize = 20;
pub const GRID_HEIGHT: usize = 20;
pub const SEED: u64 = 42;

// Plants
pub const PLANT_COUNT: usize = 20;
pub const PLANT_REPRODUCTION_RATE: f64 = 0.1;
pub const PLANT_GROW_TIME: u32 = 5;

// Herbivores
pub const HERBIVORE_COUNT: usize = 10;
pub const HERBIVORE_REPRODUCTION_RATE: f64 = 0.2;
pub const HERBIVORE_MAX_STARVATION: u32 = 5;
pub const HERBIVORE_INITIAL_RESERVE: u32 = 7;
pub const HERBIVORE_SATIATION: u32 = 5;

// Predators
pub const PREDATOR_COUNT: usize = 3;
pub const PREDATOR_REPRODUCTION_RATE: f64 = 0.05;
pub const PREDATOR_MAX_STARVATION: u32 = 10;

// Terrain
pub const ALTITUDE_MIN: f64 = -1.0;
pub const ALTITUDE_MAX: f64 = 1.0;
pub const SMOOTHING_PASSES: u32 = 2;

// Metrics
pub const METRICS_WINDOW: usize = 1000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub initial_count: usize,
    /// Per-tick chance of attempting a cutting.
    pub reproduction_rate: f64,
    /// Ticks from cutting to maturity.
    pub grow_time: u32,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            initial_count: PLANT_COUNT,
            reproduction_rate: PLANT_REPRODUCTION_RATE,
            grow_time: PLANT_GROW_TIME,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HerbivoreConfig {
    pub initial_count: usize,
    pub reproduction_rate: f64,
    /// Ticks an empty-reserve herbivore survives.
    pub max_starvation: u32,
    pub initial_energy_reserve: u32,
    /// At or above this reserve the herbivore shares instead of eating.
    pub satiation_threshold: u32,
}

impl Default for HerbivoreConfig {
    fn default() -> Self {
        Self {
            initial_count: HERBIVORE_COUNT,
            reproduction_rate: HERBIVORE_REPRODUCTION_RATE,
            max_starvation: HERBIVORE_MAX_STARVATION,
            initial_energy_reserve: HERBIVORE_INITIAL_RESERVE,
            satiation_threshold: HERBIVORE_SATIATION,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorConfig {
    pub initial_count: usize,
    pub reproduction_rate: f64,
    /// Full energy reserve; also the number of hungry ticks before death.
    pub max_starvation: u32,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            initial_count: PREDATOR_COUNT,
            reproduction_rate: PREDATOR_REPRODUCTION_RATE,
            max_starvation: PREDATOR_MAX_STARVATION,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesConfigs {
    pub plant: PlantConfig,
    pub herbivore: HerbivoreConfig,
    pub predator: PredatorConfig,
}

impl SpeciesConfigs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate(Kind::Plant, self.plant.reproduction_rate)?;
        check_rate(Kind::Herbivore, self.herbivore.reproduction_rate)?;
        check_rate(Kind::Predator, self.predator.reproduction_rate)?;
        Ok(())
    }

    /// Only the given counts; every other field keeps its default.
    pub fn with_counts(plants: usize, herbivores: usize, predators: usize) -> Self {
        let mut species = Self::default();
        species.plant.initial_count = plants;
        species.herbivore.initial_count = herbivores;
        species.predator.initial_count = predators;
        species
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeSource {
    /// Independent uniform samples.
    #[default]
    Uniform,
    /// Fractal Perlin noise rescaled into the altitude range.
    Fractal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub altitude_min: f64,
    pub altitude_max: f64,
    /// Number of 3x3 box-blur passes over the raw field.
    pub smoothing_passes: u32,
    pub source: AltitudeSource,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            altitude_min: ALTITUDE_MIN,
            altitude_max: ALTITUDE_MAX,
            smoothing_passes: SMOOTHING_PASSES,
            source: AltitudeSource::Uniform,
        }
    }
}

impl MapConfig {
    /// Every cell strictly above water.
    pub fn all_land() -> Self {
        Self {
            altitude_min: 0.5,
            altitude_max: 1.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.altitude_min, self.altitude_max);
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConfigError::InvalidAltitudeRange { min, max });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    pub edge_policy: EdgePolicy,
    /// Seeds every random draw of the run.
    pub seed: u64,
    pub map: MapConfig,
    pub species: SpeciesConfigs,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            edge_policy: EdgePolicy::Wrap,
            seed: SEED,
            map: MapConfig::default(),
            species: SpeciesConfigs::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        self.map.validate()?;
        self.species.validate()
    }

    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
