//! Boundary to the external signal bus

use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::{Entity, EntityId};

/// Emitted once per entity when it stops being alive.
pub const ENTITY_DEATH: &str = "ENTITY_DEATH";

/// Publish point the core emits lifecycle signals into. The core never
/// subscribes.
pub trait SignalBus {
    fn emit(&mut self, signal: &'static str, entity: &Entity);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub name: &'static str,
    pub entity: EntityId,
}

/// In-memory bus that records every signal. Clones share the same queue, so
/// a caller can keep one handle while the world owns another.
#[derive(Debug, Clone, Default)]
pub struct SignalQueue {
    inner: Rc<RefCell<Vec<Signal>>>,
}

impl SignalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .iter()
            .filter(|signal| signal.name == name)
            .count()
    }

    pub fn drain(&self) -> Vec<Signal> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }
}

impl SignalBus for SignalQueue {
    fn emit(&mut self, signal: &'static str, entity: &Entity) {
        self.inner.borrow_mut().push(Signal {
            name: signal,
            entity: entity.id(),
        });
    }
}
