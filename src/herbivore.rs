use ::rand::seq::SliceRandom;

use crate::entity::{Entity, EntityId, Herbivore, Kind, Position};
use crate::error::InvariantViolation;
use crate::habitat::Habitat;
use crate::movement;
use crate::reproduction;
use crate::sink::DeathCause;

fn herbivore_mut(hab: &mut Habitat, id: EntityId) -> Option<&mut Herbivore> {
    hab.registry.get_mut(id).and_then(Entity::as_herbivore_mut)
}

/// One herbivore turn: move, forage, mate, then feed or starve.
pub fn act(hab: &mut Habitat, id: EntityId) -> Result<(), InvariantViolation> {
    if herbivore_mut(hab, id).is_none() {
        return Ok(());
    }
    let pos = movement::random_step(hab, id)?;
    forage(hab, id, pos)?;
    reproduction::mate(hab, id)?;
    feed(hab, id)
}

/// Eat one random mature plant on the cell, if any. Returns whether it ate.
pub fn forage(hab: &mut Habitat, id: EntityId, pos: Position) -> Result<bool, InvariantViolation> {
    let ripe: Vec<EntityId> = hab
        .cellmates(pos, Kind::Plant)
        .into_iter()
        .filter(|&p| {
            hab.registry
                .get(p)
                .and_then(Entity::as_plant)
                .is_some_and(|plant| plant.is_mature)
        })
        .collect();
    let Some(&meal) = ripe.choose(&mut hab.rng) else {
        return Ok(false);
    };
    hab.destroy(meal, DeathCause::Eaten { by: id })?;
    if let Some(h) = herbivore_mut(hab, id) {
        h.energy_reserve += 1;
    }
    Ok(true)
}

/// Spend or share reserve, or starve when it is empty.
pub fn feed(hab: &mut Habitat, id: EntityId) -> Result<(), InvariantViolation> {
    let satiation = hab.species.herbivore.satiation_threshold;
    let Some(h) = herbivore_mut(hab, id) else {
        return Ok(());
    };

    if h.energy_reserve == 0 {
        h.starvation_counter = h.starvation_counter.saturating_sub(1);
        if h.starvation_counter == 0 {
            hab.destroy(id, DeathCause::Starved)?;
        }
    } else if h.energy_reserve < satiation {
        h.energy_reserve -= 1;
        h.starvation_counter = h.max_starvation;
    } else {
        share(hab, id);
    }
    Ok(())
}

/// Hand one unit of reserve to a random other herbivore on the cell.
fn share(hab: &mut Habitat, id: EntityId) {
    let Some(pos) = hab.position_of(id) else {
        return;
    };
    let others: Vec<EntityId> = hab
        .cellmates(pos, Kind::Herbivore)
        .into_iter()
        .filter(|&other| other != id)
        .collect();
    let Some(&receiver) = others.choose(&mut hab.rng) else {
        return;
    };
    if let Some(giver) = herbivore_mut(hab, id) {
        giver.energy_reserve -= 1;
    }
    if let Some(taker) = herbivore_mut(hab, receiver) {
        taker.energy_reserve += 1;
    }
}
