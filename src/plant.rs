use ::rand::seq::SliceRandom;
use ::rand::Rng;

use crate::entity::{Entity, EntityId, Kind, Plant};
use crate::error::InvariantViolation;
use crate::habitat::Habitat;

/// One plant turn: grow, then try to take a cutting.
pub fn act(hab: &mut Habitat, id: EntityId) -> Result<(), InvariantViolation> {
    let Some(plant) = hab.registry.get_mut(id).and_then(Entity::as_plant_mut) else {
        return Ok(());
    };
    grow(plant)?;
    reproduce(hab, id)?;
    Ok(())
}

/// Advance one growth stage; flag maturity once `grow_time` is reached.
pub fn grow(plant: &mut Plant) -> Result<(), InvariantViolation> {
    if plant.growth_stage > plant.grow_time {
        return Err(InvariantViolation::GrowthOverflow {
            id: plant.id,
            stage: plant.growth_stage,
            grow_time: plant.grow_time,
        });
    }
    if plant.growth_stage < plant.grow_time {
        plant.growth_stage += 1;
    }
    if plant.growth_stage == plant.grow_time {
        plant.is_mature = true;
    }
    Ok(())
}

/// Chance that a cutting survives next to `competitors` existing plants.
pub fn survival_odds(competitors: usize) -> f64 {
    1.0 / (competitors as f64 + 1.0)
}

/// Asexual cutting into the Moore neighborhood (center included).
///
/// Returns the new plant's id when a cutting took root.
pub fn reproduce(hab: &mut Habitat, id: EntityId) -> Result<Option<EntityId>, InvariantViolation> {
    let Some(origin) = hab.position_of(id) else {
        return Ok(None);
    };
    let rate = hab.species.plant.reproduction_rate;
    if hab.rng.gen::<f64>() >= rate {
        return Ok(None);
    }
    let targets = hab.grid.moore_neighborhood(origin, true);
    let Some(&target) = targets.choose(&mut hab.rng) else {
        return Ok(None);
    };

    let competitors = hab.cellmates(target, Kind::Plant).len();
    let competition = 1.0 - survival_odds(competitors);
    let roll: f64 = hab.rng.gen();
    if roll <= competition || !hab.terrain.is_land(target) {
        return Ok(None);
    }

    let grow_time = hab.species.plant.grow_time;
    let child = hab.spawn(|child| {
        Entity::Plant(Plant {
            id: child,
            position: target,
            growth_stage: 0,
            grow_time,
            is_mature: false,
            reproduction_rate: rate,
        })
    })?;
    Ok(Some(child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeciesConfigs;
    use crate::entity::Position;
    use crate::habitat::tests::empty_habitat;
    use crate::terrain::TerrainMap;

    fn seeded(hab: &mut Habitat, pos: Position, grow_time: u32) -> EntityId {
        let rate = hab.species.plant.reproduction_rate;
        hab.spawn(|id| Entity::Plant(Plant::new(id, pos, grow_time, rate).unwrap()))
            .unwrap()
    }

    fn plant(hab: &Habitat, id: EntityId) -> Plant {
        hab.registry.get(id).and_then(Entity::as_plant).unwrap().clone()
    }

    #[test]
    fn growth_is_monotonic_and_maturity_sticks() {
        let mut p = Plant::new(EntityId(0), Position::new(0, 0), 3, 0.0).unwrap();
        let mut last = p.growth_stage;
        for tick in 1..=6 {
            grow(&mut p).unwrap();
            assert!(p.growth_stage >= last);
            last = p.growth_stage;
            assert_eq!(p.is_mature, tick >= 3);
        }
        assert_eq!(p.growth_stage, 3);
    }

    #[test]
    fn growth_past_grow_time_is_fatal() {
        let mut p = Plant::new(EntityId(5), Position::new(0, 0), 2, 0.0).unwrap();
        p.growth_stage = 4;
        assert_eq!(
            grow(&mut p),
            Err(InvariantViolation::GrowthOverflow {
                id: EntityId(5),
                stage: 4,
                grow_time: 2
            })
        );
    }

    #[test]
    fn competition_damps_survival() {
        assert_eq!(survival_odds(0), 1.0);
        assert_eq!(survival_odds(1), 0.5);
        assert!(survival_odds(9) < 0.11);
    }

    #[test]
    fn zero_rate_never_spawns() {
        let mut species = SpeciesConfigs::default();
        species.plant.reproduction_rate = 0.0;
        let mut hab = empty_habitat(5, 5, species);
        let id = seeded(&mut hab, Position::new(2, 2), 3);
        for _ in 0..50 {
            act(&mut hab, id).unwrap();
        }
        assert_eq!(hab.registry.count(Kind::Plant), 1);
    }

    #[test]
    fn certain_rate_spreads_into_the_neighborhood() {
        let mut species = SpeciesConfigs::default();
        species.plant.reproduction_rate = 1.0;
        let mut hab = empty_habitat(7, 7, species);
        let origin = Position::new(3, 3);
        let id = seeded(&mut hab, origin, 3);

        let mut children = Vec::new();
        for _ in 0..30 {
            if let Some(child) = reproduce(&mut hab, id).unwrap() {
                children.push(child);
            }
        }
        assert!(!children.is_empty());
        let neighborhood = hab.grid.moore_neighborhood(origin, true);
        for child in children {
            let p = plant(&hab, child);
            assert!(neighborhood.contains(&p.position));
            assert_eq!(p.growth_stage, 0);
            assert!(!p.is_mature);
            assert_eq!(p.reproduction_rate, 1.0);
        }
    }

    #[test]
    fn cuttings_use_the_species_rate_not_the_parent_instance() {
        let mut species = SpeciesConfigs::default();
        species.plant.reproduction_rate = 1.0;
        let mut hab = empty_habitat(3, 3, species);
        let id = seeded(&mut hab, Position::new(1, 1), 3);
        if let Some(Entity::Plant(p)) = hab.registry.get_mut(id) {
            p.reproduction_rate = 0.0;
        }
        let child = (0..30).find_map(|_| reproduce(&mut hab, id).unwrap()).unwrap();
        assert_eq!(plant(&hab, child).reproduction_rate, 1.0);
    }

    #[test]
    fn water_blocks_cuttings() {
        let mut species = SpeciesConfigs::default();
        species.plant.reproduction_rate = 1.0;
        let mut hab = empty_habitat(4, 4, species);
        hab.terrain = TerrainMap::flat(4, 4, -0.5);
        let id = seeded(&mut hab, Position::new(1, 1), 3);
        for _ in 0..50 {
            assert_eq!(reproduce(&mut hab, id).unwrap(), None);
        }
        assert_eq!(hab.registry.count(Kind::Plant), 1);
    }
}
