use ::rand::seq::SliceRandom;

use crate::entity::{Entity, EntityId, Kind, Predator};
use crate::error::InvariantViolation;
use crate::habitat::Habitat;
use crate::movement;
use crate::reproduction;
use crate::sink::DeathCause;

fn predator_mut(hab: &mut Habitat, id: EntityId) -> Option<&mut Predator> {
    hab.registry.get_mut(id).and_then(Entity::as_predator_mut)
}

/// One predator turn: move, mate, then hunt.
pub fn act(hab: &mut Habitat, id: EntityId) -> Result<(), InvariantViolation> {
    if predator_mut(hab, id).is_none() {
        return Ok(());
    }
    movement::random_step(hab, id)?;
    reproduction::mate(hab, id)?;
    hunt(hab, id)?;
    Ok(())
}

/// Catch a random herbivore on the cell and refill, or lose one unit of
/// reserve and die when it runs out. Returns the prey's id if one was caught.
pub fn hunt(hab: &mut Habitat, id: EntityId) -> Result<Option<EntityId>, InvariantViolation> {
    let Some(pos) = hab.position_of(id) else {
        return Ok(None);
    };
    let prey = hab.cellmates(pos, Kind::Herbivore);
    if let Some(&victim) = prey.choose(&mut hab.rng) {
        hab.destroy(victim, DeathCause::Eaten { by: id })?;
        if let Some(p) = predator_mut(hab, id) {
            p.energy_reserve = p.max_starvation;
        }
        return Ok(Some(victim));
    }

    let Some(p) = predator_mut(hab, id) else {
        return Ok(None);
    };
    p.energy_reserve = p.energy_reserve.saturating_sub(1);
    if p.energy_reserve == 0 {
        hab.destroy(id, DeathCause::Starved)?;
    }
    Ok(None)
}
