use ::rand::seq::SliceRandom;

use crate::entity::{EntityId, Position};
use crate::error::InvariantViolation;
use crate::habitat::Habitat;

/// Step to a uniformly random Moore neighbor. Returns the new position;
/// with no candidate cell (bounded 1x1 grid) the entity stays put.
pub fn random_step(hab: &mut Habitat, id: EntityId) -> Result<Position, InvariantViolation> {
    let Some(from) = hab.position_of(id) else {
        return Err(InvariantViolation::NotPlaced(id));
    };
    let candidates = hab.grid.moore_neighborhood(from, false);
    let Some(&to) = candidates.choose(&mut hab.rng) else {
        return Ok(from);
    };
    hab.relocate(id, to)?;
    Ok(to)
}
