use ::rand::Rng;

use crate::config::SpeciesConfigs;
use crate::entity::{Entity, EntityId, Herbivore, Kind, Position, Predator, Sex};
use crate::error::InvariantViolation;
use crate::habitat::Habitat;

/// The kinds that breed sexually.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Animal {
    Herbivore,
    Predator,
}

impl Animal {
    fn kind(self) -> Kind {
        match self {
            Animal::Herbivore => Kind::Herbivore,
            Animal::Predator => Kind::Predator,
        }
    }
}

/// Mating-relevant view of an animal.
struct Breeder {
    animal: Animal,
    sex: Sex,
    rate: f64,
    bred_on: Option<u64>,
}

fn breeder(entity: &Entity) -> Option<Breeder> {
    match entity {
        Entity::Herbivore(h) => Some(Breeder {
            animal: Animal::Herbivore,
            sex: h.sex,
            rate: h.reproduction_rate,
            bred_on: h.bred_on,
        }),
        Entity::Predator(p) => Some(Breeder {
            animal: Animal::Predator,
            sex: p.sex,
            rate: p.reproduction_rate,
            bred_on: p.bred_on,
        }),
        Entity::Plant(_) => None,
    }
}

fn mark_bred(hab: &mut Habitat, id: EntityId) {
    let tick = hab.tick;
    match hab.registry.get_mut(id) {
        Some(Entity::Herbivore(h)) => h.bred_on = Some(tick),
        Some(Entity::Predator(p)) => p.bred_on = Some(tick),
        _ => {}
    }
}

/// Fresh animal with species defaults; nothing is inherited.
fn newborn(
    animal: Animal,
    id: EntityId,
    position: Position,
    sex: Sex,
    species: &SpeciesConfigs,
    tick: u64,
) -> Entity {
    match animal {
        Animal::Predator => {
            let cfg = &species.predator;
            Entity::Predator(Predator {
                id,
                position,
                energy_reserve: cfg.max_starvation,
                sex,
                reproduction_rate: cfg.reproduction_rate,
                max_starvation: cfg.max_starvation,
                bred_on: Some(tick),
            })
        }
        Animal::Herbivore => {
            let cfg = &species.herbivore;
            Entity::Herbivore(Herbivore {
                id,
                position,
                energy_reserve: cfg.initial_energy_reserve,
                starvation_counter: cfg.max_starvation,
                sex,
                reproduction_rate: cfg.reproduction_rate,
                max_starvation: cfg.max_starvation,
                bred_on: Some(tick),
            })
        }
    }
}

/// One mating attempt for the animal `id` with a same-kind cellmate.
///
/// The partner is the first opposite-sex cellmate in cell order that has
/// not already bred this tick. Returns the newborn's id on success.
pub fn mate(hab: &mut Habitat, id: EntityId) -> Result<Option<EntityId>, InvariantViolation> {
    let Some(actor) = hab.registry.get(id) else {
        return Ok(None);
    };
    let position = actor.position();
    let Some(me) = breeder(actor) else {
        return Ok(None);
    };
    let tick = hab.tick;
    if me.bred_on == Some(tick) {
        return Ok(None);
    }

    let partner = hab.cellmates(position, me.animal.kind()).into_iter().find(|&other| {
        other != id
            && hab
                .registry
                .get(other)
                .and_then(breeder)
                .is_some_and(|b| b.sex == me.sex.opposite() && b.bred_on != Some(tick))
    });
    let Some(partner) = partner else {
        return Ok(None);
    };

    if hab.rng.gen::<f64>() >= me.rate {
        return Ok(None);
    }

    let sex = Sex::random(&mut hab.rng);
    let species = hab.species.clone();
    let child_id = hab.spawn(|child| newborn(me.animal, child, position, sex, &species, tick))?;
    mark_bred(hab, id);
    mark_bred(hab, partner);
    Ok(Some(child_id))
}
