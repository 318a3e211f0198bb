use rand_chacha::ChaCha8Rng;

use crate::config::SpeciesConfigs;
use crate::entity::{Entity, EntityId, Kind, Position};
use crate::error::InvariantViolation;
use crate::grid::SpatialGrid;
use crate::registry::IdentityRegistry;
use crate::sink::{DeathCause, EventSink, SimEvent};
use crate::terrain::TerrainMap;

/// Births and deaths since the ledger was last reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    pub births: [usize; 3],
    pub deaths: [usize; 3],
}

fn kind_slot(kind: Kind) -> Option<usize> {
    match kind {
        Kind::Plant => Some(0),
        Kind::Herbivore => Some(1),
        Kind::Predator => Some(2),
        Kind::Terrain => None,
    }
}

impl Ledger {
    pub fn births_of(&self, kind: Kind) -> usize {
        kind_slot(kind).map_or(0, |i| self.births[i])
    }

    pub fn deaths_of(&self, kind: Kind) -> usize {
        kind_slot(kind).map_or(0, |i| self.deaths[i])
    }

    pub fn total_births(&self) -> usize {
        self.births.iter().sum()
    }

    pub fn total_deaths(&self) -> usize {
        self.deaths.iter().sum()
    }
}

/// All mutable run state. Behavior rules get `&mut Habitat` and go through
/// `spawn`/`destroy`/`relocate`, which keep grid and registry in lockstep.
pub struct Habitat {
    pub grid: SpatialGrid,
    pub registry: IdentityRegistry,
    pub terrain: TerrainMap,
    pub rng: ChaCha8Rng,
    pub species: SpeciesConfigs,
    pub sink: Box<dyn EventSink>,
    /// Tick currently running (or the next one, between ticks).
    pub tick: u64,
    pub ledger: Ledger,
}

impl Habitat {
    /// Allocate an id, build the entity, then register and place it.
    pub fn spawn(
        &mut self,
        build: impl FnOnce(EntityId) -> Entity,
    ) -> Result<EntityId, InvariantViolation> {
        let id = self.registry.allocate_id();
        self.insert(build(id))
    }

    /// Register and place an entity whose id came from `registry.allocate_id`.
    pub fn insert(&mut self, entity: Entity) -> Result<EntityId, InvariantViolation> {
        let (id, kind, position) = (entity.id(), entity.kind(), entity.position());
        self.grid.place(id, position)?;
        if let Err(err) = self.registry.register(entity) {
            self.grid.remove(id);
            return Err(err);
        }
        if let Some(i) = kind_slot(kind) {
            self.ledger.births[i] += 1;
        }
        self.sink.record(&SimEvent::Spawned {
            tick: self.tick,
            id,
            kind,
            position,
        });
        Ok(id)
    }

    /// Remove `id` from grid and registry together.
    ///
    /// Returns `Ok(false)` if it was already dead.
    pub fn destroy(&mut self, id: EntityId, cause: DeathCause) -> Result<bool, InvariantViolation> {
        let on_grid = self.grid.remove(id).is_some();
        let entity = self.registry.unregister(id);
        let Some(entity) = entity else {
            return if on_grid {
                Err(InvariantViolation::Desync(id))
            } else {
                Ok(false)
            };
        };
        if !on_grid {
            return Err(InvariantViolation::Desync(id));
        }
        let kind = entity.kind();
        if let Some(i) = kind_slot(kind) {
            self.ledger.deaths[i] += 1;
        }
        self.sink.record(&SimEvent::Died {
            tick: self.tick,
            id,
            kind,
            cause,
        });
        Ok(true)
    }

    /// Move `id` on the grid and update its stored position.
    pub fn relocate(&mut self, id: EntityId, to: Position) -> Result<(), InvariantViolation> {
        let Some(entity) = self.registry.get_mut(id) else {
            return Err(InvariantViolation::NotPlaced(id));
        };
        self.grid.move_to(id, to)?;
        entity.set_position(to);
        Ok(())
    }

    /// Live entities at `pos`, in cell order, as an owned id list.
    pub fn cellmates(&self, pos: Position, kind: Kind) -> Vec<EntityId> {
        self.grid
            .contents_at(pos)
            .into_iter()
            .filter(|id| self.registry.get(*id).is_some_and(|e| e.kind() == kind))
            .collect()
    }

    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.registry.get(id).map(Entity::position)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entity::{Herbivore, Plant, Sex};
    use crate::grid::EdgePolicy;
    use crate::sink::{MemorySink, NullSink};
    use ::rand::SeedableRng;

    /// All-land habitat with no entities.
    pub(crate) fn empty_habitat(width: usize, height: usize, species: SpeciesConfigs) -> Habitat {
        Habitat {
            grid: SpatialGrid::new(width, height, EdgePolicy::Wrap),
            registry: IdentityRegistry::new(),
            terrain: TerrainMap::flat(width, height, 1.0),
            rng: ChaCha8Rng::seed_from_u64(11),
            species,
            sink: Box::new(NullSink),
            tick: 0,
            ledger: Ledger::default(),
        }
    }

    #[test]
    fn spawn_registers_and_places_together() {
        let mut hab = empty_habitat(3, 3, SpeciesConfigs::default());
        let events = MemorySink::new();
        hab.sink = Box::new(events.clone());

        let pos = Position::new(2, 1);
        let id = hab
            .spawn(|id| Entity::Plant(Plant::new(id, pos, 3, 0.0).unwrap()))
            .unwrap();

        assert!(hab.registry.is_alive(id));
        assert_eq!(hab.grid.position_of(id), Some(pos));
        assert_eq!(hab.ledger.births_of(Kind::Plant), 1);
        assert!(matches!(events.events()[0], SimEvent::Spawned { .. }));
    }

    #[test]
    fn spawn_out_of_bounds_leaves_no_trace() {
        let mut hab = empty_habitat(2, 2, SpeciesConfigs::default());
        let result = hab.spawn(|id| {
            Entity::Plant(Plant::new(id, Position::new(5, 5), 3, 0.0).unwrap())
        });
        assert!(matches!(result, Err(InvariantViolation::OutOfBounds { .. })));
        assert!(hab.registry.is_empty());
        assert!(hab.grid.is_empty());
    }

    #[test]
    fn destroying_twice_is_a_quiet_no_op() {
        let mut hab = empty_habitat(3, 3, SpeciesConfigs::default());
        let id = hab
            .spawn(|id| {
                Entity::Herbivore(
                    Herbivore::new(id, Position::new(0, 0), Sex::Male, 1, 0.0, 3).unwrap(),
                )
            })
            .unwrap();

        assert_eq!(hab.destroy(id, DeathCause::Starved), Ok(true));
        assert!(!hab.registry.is_alive(id));
        assert_eq!(hab.destroy(id, DeathCause::Starved), Ok(false));
        assert!(!hab.registry.is_alive(id));
        assert!(hab.grid.is_empty());
        assert_eq!(hab.ledger.deaths_of(Kind::Herbivore), 1);
    }

    #[test]
    fn relocate_updates_grid_and_entity() {
        let mut hab = empty_habitat(4, 4, SpeciesConfigs::default());
        let id = hab
            .spawn(|id| {
                Entity::Herbivore(
                    Herbivore::new(id, Position::new(0, 0), Sex::Female, 1, 0.0, 3).unwrap(),
                )
            })
            .unwrap();
        hab.relocate(id, Position::new(3, 3)).unwrap();
        assert_eq!(hab.position_of(id), Some(Position::new(3, 3)));
        assert_eq!(hab.cellmates(Position::new(3, 3), Kind::Herbivore), vec![id]);
        assert!(hab.cellmates(Position::new(3, 3), Kind::Plant).is_empty());
    }
}
