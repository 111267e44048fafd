//! Identity allocation for entities and components

use std::fmt;

use serde::{Deserialize, Serialize};

/// Entity identifier. The sole equality/hash identity of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap a raw value. Only meant for tests and tooling; live ids come from
    /// an [`IdentityAllocator`].
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Component identifier, assigned when a component is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(u64);

impl ComponentId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Per-world id source. Ids start at 1, only ever grow and are never
/// handed out twice, even after the owner is destroyed.
#[derive(Debug, Default)]
pub struct IdentityAllocator {
    last_entity: u64,
    last_component: u64,
}

impl IdentityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_entity(&mut self) -> EntityId {
        self.last_entity = self
            .last_entity
            .checked_add(1)
            .expect("entity id space exhausted");
        EntityId(self.last_entity)
    }

    pub fn next_component(&mut self) -> ComponentId {
        self.last_component = self
            .last_component
            .checked_add(1)
            .expect("component id space exhausted");
        ComponentId(self.last_component)
    }

    /// Number of entity ids issued so far.
    pub fn entities_issued(&self) -> u64 {
        self.last_entity
    }

    /// Number of component ids issued so far.
    pub fn components_issued(&self) -> u64 {
        self.last_component
    }
}
