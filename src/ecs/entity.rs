//! Entities and their local component index

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::warn;

use super::component::{Attached, Frame};
use super::{ComponentHandle, ComponentId, ComponentKind, EcsError, EcsResult, EntityId};
use crate::signal::{SignalBus, ENTITY_DEATH};
use crate::spatial::{ChunkCoord, ChunkSize, Position};

/// Position, chunk and z-layer, each with the value it held before the
/// last change.
#[derive(Debug, Clone, PartialEq)]
pub struct Spatial {
    position: Position,
    prev_position: Position,
    chunk: ChunkCoord,
    prev_chunk: ChunkCoord,
    zlayer: i32,
    prev_zlayer: i32,
}

impl Default for Spatial {
    fn default() -> Self {
        Self {
            position: Position::new(0.0, 0.0),
            prev_position: Position::new(0.0, 0.0),
            chunk: ChunkCoord::default(),
            prev_chunk: ChunkCoord::default(),
            zlayer: 0,
            prev_zlayer: 0,
        }
    }
}

impl Spatial {
    /// Spatial state for something that starts out at `position`, with no
    /// history yet.
    pub fn at(position: Position, chunk_size: ChunkSize) -> Self {
        let chunk = chunk_size.chunk_of(position);
        Self {
            position,
            prev_position: position,
            chunk,
            prev_chunk: chunk,
            zlayer: 0,
            prev_zlayer: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn previous_position(&self) -> Position {
        self.prev_position
    }

    pub fn chunk(&self) -> ChunkCoord {
        self.chunk
    }

    pub fn previous_chunk(&self) -> ChunkCoord {
        self.prev_chunk
    }

    pub fn zlayer(&self) -> i32 {
        self.zlayer
    }

    pub fn previous_zlayer(&self) -> i32 {
        self.prev_zlayer
    }

    pub fn set_position(&mut self, position: Position) {
        self.prev_position = self.position;
        self.position = position;
    }

    pub fn set_chunk(&mut self, chunk: ChunkCoord) {
        self.prev_chunk = self.chunk;
        self.chunk = chunk;
    }

    /// Move and recompute the chunk the new position falls in.
    pub fn move_to(&mut self, position: Position, chunk_size: ChunkSize) {
        self.set_position(position);
        self.set_chunk(chunk_size.chunk_of(position));
    }

    pub fn set_zlayer(&mut self, zlayer: i32) {
        self.prev_zlayer = self.zlayer;
        self.zlayer = zlayer;
    }
}

/// Entity-level update hook, run before the entity's components.
pub trait EntityBehavior {
    fn update(&mut self, id: EntityId, spatial: &mut Spatial, frame: &Frame);
}

/// Addressable simulation object. Owns its attached components.
///
/// Equality and hashing look at the id only.
pub struct Entity {
    id: EntityId,
    alive: bool,
    spatial: Spatial,
    components: BTreeMap<ComponentId, Attached>,
    behavior: Option<Box<dyn EntityBehavior>>,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            alive: true,
            spatial: Spatial::default(),
            components: BTreeMap::new(),
            behavior: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn spatial(&self) -> &Spatial {
        &self.spatial
    }

    pub fn spatial_mut(&mut self) -> &mut Spatial {
        &mut self.spatial
    }

    pub fn set_zlayer(&mut self, zlayer: i32) {
        self.spatial.set_zlayer(zlayer);
    }

    pub fn set_behavior(&mut self, behavior: impl EntityBehavior + 'static) {
        self.behavior = Some(Box::new(behavior));
    }

    /// Liveness only goes true -> false. The death signal goes out on that
    /// transition, before any teardown. Returns whether the entity died now.
    pub fn set_alive(&mut self, alive: bool, bus: &mut dyn SignalBus) -> bool {
        if !self.alive {
            warn!(entity = %self.id, "already dead");
            return false;
        }
        if alive {
            return false;
        }
        self.alive = false;
        bus.emit(ENTITY_DEATH, self);
        true
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn has_components(&self) -> bool {
        !self.components.is_empty()
    }

    /// Attached components in attachment order.
    pub fn components(&self) -> impl Iterator<Item = &Attached> {
        self.components.values()
    }

    /// Point-in-time list of what is attached.
    pub fn handles(&self) -> Vec<ComponentHandle> {
        self.components.values().map(Attached::handle).collect()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn component_by_id(&self, id: ComponentId) -> EcsResult<&Attached> {
        self.components.get(&id).ok_or(EcsError::NotAttached {
            entity: self.id,
            id,
        })
    }

    pub fn component_by_id_mut(&mut self, id: ComponentId) -> EcsResult<&mut Attached> {
        let entity = self.id;
        self.components
            .get_mut(&id)
            .ok_or(EcsError::NotAttached { entity, id })
    }

    pub fn components_by_kind(&self, kind: ComponentKind) -> Vec<&Attached> {
        self.iter_components_by_kind(kind).collect()
    }

    pub fn iter_components_by_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &Attached> {
        self.components.values().filter(move |a| a.kind() == kind)
    }

    /// Behavior hook, then every component in attachment order.
    pub fn update(&mut self, frame: &Frame) {
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.update(self.id, &mut self.spatial, frame);
        }
        for attached in self.components.values_mut() {
            attached.run_update(frame, &mut self.spatial);
        }
    }

    pub fn debug(&self) {
        for attached in self.components.values() {
            attached.component().debug(self.id, attached.id());
        }
    }

    pub(crate) fn link(&mut self, attached: Attached) {
        let id = attached.id();
        assert_eq!(attached.owner(), self.id, "component {id} linked to the wrong entity");
        let previous = self.components.insert(id, attached);
        assert!(previous.is_none(), "component id {id} issued twice");
    }

    pub(crate) fn run_post_attach(&mut self, id: ComponentId) {
        let members = self.members();
        if let Some(attached) = self.components.get_mut(&id) {
            attached.run_post_attach(&members);
        }
    }

    /// Local removal. With `reload`, every remaining component gets its
    /// post-attach hook again.
    pub(crate) fn remove_component(&mut self, id: ComponentId, reload: bool) -> Option<Attached> {
        let removed = self.components.remove(&id)?;
        if reload {
            let members = self.members();
            for attached in self.components.values_mut() {
                attached.run_post_attach(&members);
            }
        }
        Some(removed)
    }

    fn members(&self) -> Vec<(ComponentId, ComponentKind)> {
        self.components
            .values()
            .map(|a| (a.id(), a.kind()))
            .collect()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("alive", &self.alive)
            .field("spatial", &self.spatial)
            .field("components", &self.components.len())
            .finish()
    }
}
