use std::collections::BTreeMap;

use crate::entity::{Entity, EntityId, Kind};
use crate::error::InvariantViolation;

/// Id allocator plus the set of live entities.
///
/// Ids come from a monotonic counter, so a dead id can never alias a newer
/// entity. Live entities are kept in id order, which makes `all_live_ids`
/// deterministic for a given seed.
pub struct IdentityRegistry {
    next_id: u64,
    live: BTreeMap<EntityId, Entity>,
    counts: [usize; 3],
}

fn slot(entity: &Entity) -> usize {
    match entity {
        Entity::Plant(_) => 0,
        Entity::Herbivore(_) => 1,
        Entity::Predator(_) => 2,
    }
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            live: BTreeMap::new(),
            counts: [0; 3],
        }
    }

    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn register(&mut self, entity: Entity) -> Result<(), InvariantViolation> {
        let id = entity.id();
        if id.0 >= self.next_id {
            return Err(InvariantViolation::UnallocatedId(id));
        }
        if self.live.contains_key(&id) {
            return Err(InvariantViolation::DuplicateId(id));
        }
        self.counts[slot(&entity)] += 1;
        self.live.insert(id, entity);
        Ok(())
    }

    /// Returns the removed entity, or `None` if it was already gone.
    pub fn unregister(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.live.remove(&id)?;
        self.counts[slot(&entity)] -= 1;
        Some(entity)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.live.contains_key(&id)
    }

    /// Live ids in ascending order.
    pub fn all_live_ids(&self) -> Vec<EntityId> {
        self.live.keys().copied().collect()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.live.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.live.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.live.values()
    }

    pub fn count(&self, kind: Kind) -> usize {
        match kind {
            Kind::Plant => self.counts[0],
            Kind::Herbivore => self.counts[1],
            Kind::Predator => self.counts[2],
            Kind::Terrain => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
