//! Grid-based population dynamics: plants, herbivores and predators on a
//! generated terrain, advanced by a random-activation scheduler.

pub mod config;
pub mod entity;
pub mod error;
pub mod grid;
pub mod habitat;
pub mod herbivore;
pub mod movement;
pub mod plant;
pub mod predator;
pub mod registry;
pub mod reproduction;
pub mod run;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod terrain;
pub mod world;

pub use config::{MapConfig, SimConfig, SpeciesConfigs};
pub use entity::{Entity, EntityId, Kind, Position, Sex};
pub use error::{ConfigError, InvariantViolation, SimError};
pub use grid::EdgePolicy;
pub use run::{RunLimit, RunOutcome, StopReason};
pub use scheduler::TickReport;
pub use sink::{EventSink, MemorySink, NullSink, SimEvent, TracingSink};
pub use stats::{MetricsCollector, TickMetrics, WindowSummary};
pub use world::{EntitySnapshot, World};
