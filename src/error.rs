use thiserror::Error;

use crate::entity::{EntityId, Kind, Position};

/// Rejected at construction time; no world is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{kind:?} reproduction rate {value} is outside [0, 1]")]
    InvalidRate { kind: Kind, value: f64 },
    #[error("grid dimensions must be positive (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[error("altitude range [{min}, {max}] is empty or not finite")]
    InvalidAltitudeRange { min: f64, max: f64 },
}

/// Engine bug detected mid-tick. The run must stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("plant {id} grew to stage {stage}, past grow time {grow_time}")]
    GrowthOverflow { id: EntityId, stage: u32, grow_time: u32 },
    #[error("entity {0} registered twice")]
    DuplicateId(EntityId),
    #[error("entity {0} registered with an id the registry never issued")]
    UnallocatedId(EntityId),
    #[error("entity {id} placed outside the grid at {position}")]
    OutOfBounds { id: EntityId, position: Position },
    #[error("entity {0} is already on the grid")]
    AlreadyPlaced(EntityId),
    #[error("entity {0} is not on the grid")]
    NotPlaced(EntityId),
    #[error("registry and grid disagree about entity {0}")]
    Desync(EntityId),
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("world halted after a fatal error at tick {tick}")]
    Halted { tick: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
