use ::rand::seq::SliceRandom;

use crate::entity::{EntityId, Kind};
use crate::error::InvariantViolation;
use crate::habitat::{Habitat, Ledger};
use crate::herbivore;
use crate::plant;
use crate::predator;
use crate::sink::SimEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ticking,
}

/// Outcome of one completed tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// Entities whose behavior ran.
    pub activated: usize,
    /// Snapshot entries that had died earlier in the same tick.
    pub skipped: usize,
    pub ledger: Ledger,
}

/// Random-activation scheduler: every entity alive at tick start acts once,
/// in a freshly shuffled order.
pub struct Scheduler {
    phase: Phase,
    activation_order: Vec<EntityId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            activation_order: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The shuffled snapshot used by the most recent tick.
    pub fn activation_order(&self) -> &[EntityId] {
        &self.activation_order
    }

    /// Run one tick to completion. The first invariant violation aborts it.
    pub fn tick(&mut self, hab: &mut Habitat) -> Result<TickReport, InvariantViolation> {
        self.phase = Phase::Ticking;
        let result = self.drain(hab);
        self.phase = Phase::Idle;
        result
    }

    fn drain(&mut self, hab: &mut Habitat) -> Result<TickReport, InvariantViolation> {
        hab.ledger = Ledger::default();
        let mut order = hab.registry.all_live_ids();
        order.shuffle(&mut hab.rng);
        self.activation_order = order;

        let mut activated = 0;
        let mut skipped = 0;
        for &id in &self.activation_order {
            let Some(kind) = hab.registry.get(id).map(|e| e.kind()) else {
                skipped += 1;
                continue;
            };
            match kind {
                Kind::Plant => plant::act(hab, id)?,
                Kind::Herbivore => herbivore::act(hab, id)?,
                Kind::Predator => predator::act(hab, id)?,
                Kind::Terrain => continue,
            }
            activated += 1;
        }

        let tick = hab.tick;
        hab.sink.record(&SimEvent::TickCompleted {
            tick,
            activated,
            skipped,
        });
        hab.tick += 1;
        Ok(TickReport {
            tick,
            activated,
            skipped,
            ledger: hab.ledger,
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
