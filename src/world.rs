use ::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::{SimConfig, SpeciesConfigs};
use crate::entity::{Entity, EntityId, Herbivore, Kind, Plant, Position, Predator, Sex};
use crate::error::{InvariantViolation, SimError};
use crate::grid::SpatialGrid;
use crate::habitat::{Habitat, Ledger};
use crate::registry::IdentityRegistry;
use crate::scheduler::{Scheduler, TickReport};
use crate::sink::{EventSink, NullSink};
use crate::terrain::TerrainMap;

/// Per-kind state exposed to renderers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Attributes {
    Plant {
        growth_stage: u32,
        is_mature: bool,
    },
    Herbivore {
        energy_reserve: u32,
        starvation_counter: u32,
        sex: Sex,
    },
    Predator {
        energy_reserve: u32,
        sex: Sex,
    },
    Terrain {
        altitude: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub kind: Kind,
    /// `None` for terrain cells.
    pub id: Option<EntityId>,
    pub position: Position,
    pub attributes: Attributes,
}

impl EntitySnapshot {
    fn of(entity: &Entity) -> Self {
        let attributes = match entity {
            Entity::Plant(p) => Attributes::Plant {
                growth_stage: p.growth_stage,
                is_mature: p.is_mature,
            },
            Entity::Herbivore(h) => Attributes::Herbivore {
                energy_reserve: h.energy_reserve,
                starvation_counter: h.starvation_counter,
                sex: h.sex,
            },
            Entity::Predator(p) => Attributes::Predator {
                energy_reserve: p.energy_reserve,
                sex: p.sex,
            },
        };
        Self {
            kind: entity.kind(),
            id: Some(entity.id()),
            position: entity.position(),
            attributes,
        }
    }
}

/// A complete simulation run: terrain, population and scheduler.
pub struct World {
    config: SimConfig,
    hab: Habitat,
    scheduler: Scheduler,
    halted: bool,
    last_report: Option<TickReport>,
}

impl World {
    pub fn new(
        width: usize,
        height: usize,
        species: SpeciesConfigs,
        seed: u64,
    ) -> Result<Self, SimError> {
        let config = SimConfig {
            width,
            height,
            seed,
            species,
            ..SimConfig::default()
        };
        Self::with_sink(config, Box::new(NullSink))
    }

    pub fn from_config(config: SimConfig) -> Result<Self, SimError> {
        Self::with_sink(config, Box::new(NullSink))
    }

    /// Validate, generate terrain, then seed plants, herbivores and predators.
    pub fn with_sink(config: SimConfig, sink: Box<dyn EventSink>) -> Result<Self, SimError> {
        config.validate()?;
        let (width, height) = (config.width, config.height);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let terrain = TerrainMap::generate(width, height, config.edge_policy, &config.map, &mut rng);

        let hab = Habitat {
            grid: SpatialGrid::new(width, height, config.edge_policy),
            registry: IdentityRegistry::new(),
            terrain,
            rng,
            species: config.species.clone(),
            sink,
            tick: 0,
            ledger: Ledger::default(),
        };
        let mut world = Self {
            config,
            hab,
            scheduler: Scheduler::new(),
            halted: false,
            last_report: None,
        };

        let species = world.config.species.clone();
        for _ in 0..species.plant.initial_count {
            let pos = world.random_position();
            world.spawn_plant(pos)?;
        }
        for _ in 0..species.herbivore.initial_count {
            let pos = world.random_position();
            let sex = Sex::random(&mut world.hab.rng);
            world.spawn_herbivore(pos, sex)?;
        }
        for _ in 0..species.predator.initial_count {
            let pos = world.random_position();
            let sex = Sex::random(&mut world.hab.rng);
            world.spawn_predator(pos, sex)?;
        }
        world.hab.ledger = Ledger::default();
        Ok(world)
    }

    fn random_position(&mut self) -> Position {
        Position::new(
            self.hab.rng.gen_range(0..self.config.width),
            self.hab.rng.gen_range(0..self.config.height),
        )
    }

    fn insert(&mut self, entity: Entity) -> Result<EntityId, SimError> {
        if self.halted {
            return Err(SimError::Halted { tick: self.hab.tick });
        }
        Ok(self.hab.insert(entity)?)
    }

    /// Add an immature plant with the species settings.
    pub fn spawn_plant(&mut self, pos: Position) -> Result<EntityId, SimError> {
        let cfg = &self.config.species.plant;
        let id = self.hab.registry.allocate_id();
        let plant = Plant::new(id, pos, cfg.grow_time, cfg.reproduction_rate)?;
        self.insert(Entity::Plant(plant))
    }

    pub fn spawn_herbivore(&mut self, pos: Position, sex: Sex) -> Result<EntityId, SimError> {
        let cfg = &self.config.species.herbivore;
        let id = self.hab.registry.allocate_id();
        let herbivore = Herbivore::new(
            id,
            pos,
            sex,
            cfg.initial_energy_reserve,
            cfg.reproduction_rate,
            cfg.max_starvation,
        )?;
        self.insert(Entity::Herbivore(herbivore))
    }

    pub fn spawn_predator(&mut self, pos: Position, sex: Sex) -> Result<EntityId, SimError> {
        let cfg = &self.config.species.predator;
        let id = self.hab.registry.allocate_id();
        let predator = Predator::new(id, pos, sex, cfg.reproduction_rate, cfg.max_starvation)?;
        self.insert(Entity::Predator(predator))
    }

    /// Advance one step. After a fatal error every later call fails with
    /// `SimError::Halted`.
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        if self.halted {
            return Err(SimError::Halted { tick: self.hab.tick });
        }
        match self.scheduler.tick(&mut self.hab) {
            Ok(report) => {
                self.last_report = Some(report.clone());
                Ok(report)
            }
            Err(err) => {
                self.halted = true;
                Err(err.into())
            }
        }
    }

    /// Terrain first (row-major), then live entities in id order.
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        let terrain = self.hab.terrain.cells().iter().map(|cell| EntitySnapshot {
            kind: Kind::Terrain,
            id: None,
            position: cell.position,
            attributes: Attributes::Terrain {
                altitude: cell.altitude,
            },
        });
        terrain
            .chain(self.hab.registry.iter().map(EntitySnapshot::of))
            .collect()
    }

    pub fn population_count(&self, kind: Kind) -> usize {
        match kind {
            Kind::Terrain => self.hab.terrain.cells().len(),
            living => self.hab.registry.count(living),
        }
    }

    /// Mean health of `kind`, 0.0 when there are none. See [`Entity::health`].
    pub fn average_health(&self, kind: Kind) -> f64 {
        let (sum, count) = match kind {
            Kind::Terrain => self
                .hab
                .terrain
                .cells()
                .iter()
                .fold((0.0, 0usize), |(s, n), c| (s + c.altitude, n + 1)),
            living => self
                .hab
                .registry
                .iter()
                .filter(|e| e.kind() == living)
                .fold((0.0, 0usize), |(s, n), e| (s + e.health(), n + 1)),
        };
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    pub fn mature_plant_count(&self) -> usize {
        self.hab
            .registry
            .iter()
            .filter_map(Entity::as_plant)
            .filter(|p| p.is_mature)
            .count()
    }

    pub fn herbivore_reserves(&self) -> Vec<u32> {
        self.hab
            .registry
            .iter()
            .filter_map(Entity::as_herbivore)
            .map(|h| h.energy_reserve)
            .collect()
    }

    /// Whether at least one herbivore or predator is alive.
    pub fn has_animals(&self) -> bool {
        self.population_count(Kind::Herbivore) + self.population_count(Kind::Predator) > 0
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.hab.registry.is_alive(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.hab.registry.get(id)
    }

    /// Ids on the cell at `pos`, in cell order.
    pub fn contents_at(&self, pos: Position) -> Vec<EntityId> {
        self.hab.grid.contents_at(pos)
    }

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.hab.tick
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    /// Activation snapshot of the most recent tick.
    pub fn last_activation_order(&self) -> &[EntityId] {
        self.scheduler.activation_order()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainMap {
        &self.hab.terrain
    }

    /// Check that grid and registry agree on every live entity.
    pub fn audit(&self) -> Result<(), InvariantViolation> {
        if self.hab.grid.len() != self.hab.registry.len() {
            let stray = self
                .hab
                .registry
                .iter()
                .map(Entity::id)
                .find(|id| self.hab.grid.position_of(*id).is_none())
                .unwrap_or(EntityId(u64::MAX));
            return Err(InvariantViolation::Desync(stray));
        }
        for entity in self.hab.registry.iter() {
            if self.hab.grid.position_of(entity.id()) != Some(entity.position()) {
                return Err(InvariantViolation::Desync(entity.id()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AltitudeSource, MapConfig};
    use crate::grid::EdgePolicy;
    use crate::sink::{MemorySink, SimEvent};

    fn species(plants: usize, herbivores: usize, predators: usize) -> SpeciesConfigs {
        SpeciesConfigs::with_counts(plants, herbivores, predators)
    }

    #[test]
    fn starving_herbivore_dies_after_one_tick() {
        let mut s = species(0, 1, 0);
        s.herbivore.initial_energy_reserve = 0;
        s.herbivore.max_starvation = 1;
        let mut world = World::new(10, 10, s, 7).unwrap();
        assert_eq!(world.population_count(Kind::Herbivore), 1);

        world.tick().unwrap();
        assert_eq!(world.population_count(Kind::Herbivore), 0);
        assert!(world.snapshot().iter().all(|e| e.kind == Kind::Terrain));
        world.audit().unwrap();
    }

    #[test]
    fn plants_mature_exactly_at_grow_time() {
        let mut s = species(2, 0, 0);
        s.plant.grow_time = 3;
        s.plant.reproduction_rate = 0.0;
        let mut world = World::new(5, 5, s, 1).unwrap();
        let mature = |w: &World| {
            w.snapshot()
                .iter()
                .filter(|e| matches!(e.attributes, Attributes::Plant { is_mature: true, .. }))
                .count()
        };

        world.tick().unwrap();
        world.tick().unwrap();
        assert_eq!(mature(&world), 0);
        world.tick().unwrap();
        assert_eq!(mature(&world), 2);
        assert_eq!(world.population_count(Kind::Plant), 2);
    }

    #[test]
    fn colocated_pair_with_certain_rate_has_one_offspring() {
        let mut s = species(0, 0, 0);
        s.herbivore.reproduction_rate = 1.0;
        let mut world = World::new(1, 1, s, 3).unwrap();
        let cell = Position::new(0, 0);
        world.spawn_herbivore(cell, Sex::Male).unwrap();
        world.spawn_herbivore(cell, Sex::Female).unwrap();

        let report = world.tick().unwrap();
        assert_eq!(world.population_count(Kind::Herbivore), 3);
        assert_eq!(report.ledger.births_of(Kind::Herbivore), 1);
        assert_eq!(report.activated, 2);
    }

    #[test]
    fn identical_seeds_give_identical_histories() {
        let run = |seed: u64| {
            let config = SimConfig {
                width: 12,
                height: 12,
                seed,
                species: species(30, 12, 3),
                ..SimConfig::default()
            };
            let mut world = World::from_config(config).unwrap();
            let mut counts = Vec::new();
            for _ in 0..40 {
                world.tick().unwrap();
                counts.push(Kind::LIVING.map(|k| world.population_count(k)));
            }
            counts
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn herbivore_growth_is_bounded_by_births() {
        let config = SimConfig {
            width: 6,
            height: 6,
            species: {
                let mut s = species(20, 15, 2);
                s.herbivore.reproduction_rate = 0.5;
                s
            },
            ..SimConfig::default()
        };
        let mut world = World::from_config(config).unwrap();
        for _ in 0..30 {
            let before = world.population_count(Kind::Herbivore);
            let report = world.tick().unwrap();
            let after = world.population_count(Kind::Herbivore);
            assert!(after <= before + report.ledger.births_of(Kind::Herbivore));
            assert_eq!(
                after,
                before + report.ledger.births_of(Kind::Herbivore)
                    - report.ledger.deaths_of(Kind::Herbivore)
            );
            world.audit().unwrap();
        }
    }

    #[test]
    fn invalid_rate_fails_construction() {
        let mut s = species(1, 1, 1);
        s.plant.reproduction_rate = 1.01;
        assert!(matches!(
            World::new(4, 4, s, 0),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            World::new(0, 4, species(0, 0, 0), 0),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn snapshot_lists_terrain_then_entities() {
        let config = SimConfig {
            width: 3,
            height: 2,
            map: MapConfig::all_land(),
            species: species(2, 1, 1),
            ..SimConfig::default()
        };
        let world = World::from_config(config).unwrap();
        let snap = world.snapshot();
        assert_eq!(snap.len(), 6 + 4);
        assert!(snap[..6].iter().all(|e| e.kind == Kind::Terrain && e.id.is_none()));
        let ids: Vec<EntityId> = snap[6..].iter().filter_map(|e| e.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(world.population_count(Kind::Terrain), 6);
        assert!(world.average_health(Kind::Terrain) > 0.0);
    }

    #[test]
    fn average_health_of_empty_population_is_zero() {
        let world = World::new(3, 3, species(0, 0, 0), 0).unwrap();
        assert_eq!(world.average_health(Kind::Predator), 0.0);
    }

    #[test]
    fn sink_receives_seeding_and_tick_events() {
        let events = MemorySink::new();
        let config = SimConfig {
            width: 4,
            height: 4,
            species: species(3, 0, 0),
            ..SimConfig::default()
        };
        let mut world = World::with_sink(config, Box::new(events.clone())).unwrap();
        world.tick().unwrap();
        let log = events.events();
        let spawned = log
            .iter()
            .filter(|e| matches!(e, SimEvent::Spawned { tick: 0, .. }))
            .count();
        assert!(spawned >= 3);
        assert!(log
            .iter()
            .any(|e| matches!(e, SimEvent::TickCompleted { tick: 0, .. })));
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn world_halts_after_an_invariant_violation() {
        let mut world = World::new(2, 2, species(0, 0, 0), 0).unwrap();
        let id = world.spawn_plant(Position::new(0, 0)).unwrap();
        if let Some(Entity::Plant(p)) = world.hab.registry.get_mut(id) {
            p.growth_stage = p.grow_time + 1;
        }
        assert!(matches!(world.tick(), Err(SimError::Invariant(_))));
        assert!(world.is_halted());
        assert!(matches!(world.tick(), Err(SimError::Halted { tick: 0 })));
    }

    #[test]
    fn bounded_fractal_world_stays_consistent() {
        let config = SimConfig {
            width: 9,
            height: 7,
            edge_policy: EdgePolicy::Bounded,
            seed: 17,
            map: MapConfig {
                source: AltitudeSource::Fractal,
                ..MapConfig::default()
            },
            species: species(25, 10, 3),
        };
        let mut world = World::from_config(config).unwrap();
        for _ in 0..60 {
            world.tick().unwrap();
            world.audit().unwrap();
            for entity in world.snapshot() {
                assert!(entity.position.x < 9 && entity.position.y < 7);
            }
        }
        assert_eq!(world.population_count(Kind::Terrain), 63);
        assert_eq!(world.tick_count(), 60);
    }
}
