use std::fmt;

use ::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Run-unique handle. Issued in strictly increasing order and never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Grid coordinate, `0 <= x < width`, `0 <= y < height`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Plant,
    Herbivore,
    Predator,
    Terrain,
}

impl Kind {
    /// Kinds that live in the registry and get scheduled.
    pub const LIVING: [Kind; 3] = [Kind::Plant, Kind::Herbivore, Kind::Predator];
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn random(rng: &mut impl Rng) -> Self {
        if rng.gen::<bool>() {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

pub(crate) fn check_rate(kind: Kind, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidRate { kind, value })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Plant {
    pub id: EntityId,
    pub position: Position,
    pub growth_stage: u32,
    pub grow_time: u32,
    pub is_mature: bool,
    pub reproduction_rate: f64,
}

impl Plant {
    /// A fresh, immature cutting.
    pub fn new(
        id: EntityId,
        position: Position,
        grow_time: u32,
        reproduction_rate: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            id,
            position,
            growth_stage: 0,
            grow_time,
            is_mature: false,
            reproduction_rate: check_rate(Kind::Plant, reproduction_rate)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Herbivore {
    pub id: EntityId,
    pub position: Position,
    pub energy_reserve: u32,
    pub starvation_counter: u32,
    pub sex: Sex,
    pub reproduction_rate: f64,
    pub max_starvation: u32,
    /// Tick of the last birth this animal took part in (newborns: their birth tick).
    #[serde(skip)]
    pub bred_on: Option<u64>,
}

impl Herbivore {
    pub fn new(
        id: EntityId,
        position: Position,
        sex: Sex,
        energy_reserve: u32,
        reproduction_rate: f64,
        max_starvation: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            id,
            position,
            energy_reserve,
            starvation_counter: max_starvation,
            sex,
            reproduction_rate: check_rate(Kind::Herbivore, reproduction_rate)?,
            max_starvation,
            bred_on: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Predator {
    pub id: EntityId,
    pub position: Position,
    pub energy_reserve: u32,
    pub sex: Sex,
    pub reproduction_rate: f64,
    pub max_starvation: u32,
    #[serde(skip)]
    pub bred_on: Option<u64>,
}

impl Predator {
    /// Starts fully fed: `energy_reserve == max_starvation`.
    pub fn new(
        id: EntityId,
        position: Position,
        sex: Sex,
        reproduction_rate: f64,
        max_starvation: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            id,
            position,
            energy_reserve: max_starvation,
            sex,
            reproduction_rate: check_rate(Kind::Predator, reproduction_rate)?,
            max_starvation,
            bred_on: None,
        })
    }
}

/// Everything the registry can hold. Terrain lives in `TerrainMap` instead.
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Plant(Plant),
    Herbivore(Herbivore),
    Predator(Predator),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Plant(p) => p.id,
            Entity::Herbivore(h) => h.id,
            Entity::Predator(p) => p.id,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Entity::Plant(_) => Kind::Plant,
            Entity::Herbivore(_) => Kind::Herbivore,
            Entity::Predator(_) => Kind::Predator,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Entity::Plant(p) => p.position,
            Entity::Herbivore(h) => h.position,
            Entity::Predator(p) => p.position,
        }
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        match self {
            Entity::Plant(p) => p.position = position,
            Entity::Herbivore(h) => h.position = position,
            Entity::Predator(p) => p.position = position,
        }
    }

    /// Scalar reported by `World::average_health`.
    pub fn health(&self) -> f64 {
        match self {
            Entity::Plant(p) => p.growth_stage as f64,
            Entity::Herbivore(h) => h.starvation_counter as f64,
            Entity::Predator(p) => p.energy_reserve as f64,
        }
    }

    pub fn as_plant(&self) -> Option<&Plant> {
        match self {
            Entity::Plant(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_herbivore(&self) -> Option<&Herbivore> {
        match self {
            Entity::Herbivore(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_predator(&self) -> Option<&Predator> {
        match self {
            Entity::Predator(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_plant_mut(&mut self) -> Option<&mut Plant> {
        match self {
            Entity::Plant(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_herbivore_mut(&mut self) -> Option<&mut Herbivore> {
        match self {
            Entity::Herbivore(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_predator_mut(&mut self) -> Option<&mut Predator> {
        match self {
            Entity::Predator(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn constructors_reject_rates_outside_unit_interval() {
        let pos = Position::new(0, 0);
        assert!(Plant::new(EntityId(0), pos, 3, -0.1).is_err());
        assert!(Plant::new(EntityId(0), pos, 3, f64::NAN).is_err());
        assert_eq!(
            Herbivore::new(EntityId(1), pos, Sex::Male, 7, 1.5, 5),
            Err(ConfigError::InvalidRate {
                kind: Kind::Herbivore,
                value: 1.5
            })
        );
        assert!(Predator::new(EntityId(2), pos, Sex::Female, 1.0, 4).is_ok());
    }

    #[test]
    fn new_animals_start_with_full_counters() {
        let pos = Position::new(2, 3);
        let h = Herbivore::new(EntityId(1), pos, Sex::Female, 0, 0.2, 5).unwrap();
        assert_eq!(h.starvation_counter, 5);
        assert_eq!(h.energy_reserve, 0);

        let p = Predator::new(EntityId(2), pos, Sex::Male, 0.2, 8).unwrap();
        assert_eq!(p.energy_reserve, 8);
        assert_eq!(Entity::Predator(p).health(), 8.0);
    }

    #[test]
    fn random_sex_produces_both_values() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let draws: Vec<Sex> = (0..64).map(|_| Sex::random(&mut rng)).collect();
        assert!(draws.contains(&Sex::Male));
        assert!(draws.contains(&Sex::Female));
        assert_eq!(Sex::Male.opposite(), Sex::Female);
    }
}
