use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info};

use crate::entity::{EntityId, Kind, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Starved,
    Eaten { by: EntityId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Spawned {
        tick: u64,
        id: EntityId,
        kind: Kind,
        position: Position,
    },
    Died {
        tick: u64,
        id: EntityId,
        kind: Kind,
        cause: DeathCause,
    },
    TickCompleted {
        tick: u64,
        activated: usize,
        skipped: usize,
    },
}

/// Capability handed to the world at construction; receives every event.
pub trait EventSink {
    fn record(&mut self, event: &SimEvent);
}

/// Drops everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &SimEvent) {}
}

/// Forwards events to whatever `tracing` subscriber the host installed.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: &SimEvent) {
        match event {
            SimEvent::Spawned {
                tick,
                id,
                kind,
                position,
            } => debug!(tick, %id, ?kind, %position, "spawned"),
            SimEvent::Died {
                tick,
                id,
                kind,
                cause,
            } => debug!(tick, %id, ?kind, ?cause, "died"),
            SimEvent::TickCompleted {
                tick,
                activated,
                skipped,
            } => info!(tick, activated, skipped, "tick completed"),
        }
    }
}

/// Buffers events behind a shared handle so the caller can read them back
/// after handing the sink to a world.
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Rc<RefCell<Vec<SimEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.events.borrow().clone()
    }

    pub fn drain(&self) -> Vec<SimEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, event: &SimEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
