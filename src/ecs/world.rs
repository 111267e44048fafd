//! World - owns entities, the registry, the id allocator and the signal bus

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use super::component::Attached;
use super::{
    Component, ComponentHandle, ComponentId, ComponentIter, ComponentKind, ComponentRegistry,
    EcsError, EcsResult, Entity, EntityId, Frame, IdentityAllocator, Spatial,
};
use crate::signal::{SignalBus, SignalQueue};
use crate::spatial::{Camera2D, ChunkSize, Position, VisibleChunks};

pub struct World {
    ids: IdentityAllocator,
    registry: ComponentRegistry,
    entities: BTreeMap<EntityId, Entity>,
    signals: Box<dyn SignalBus>,
    chunk_size: ChunkSize,
    tick: u64,
}

impl World {
    pub fn new(chunk_size: ChunkSize, signals: impl SignalBus + 'static) -> Self {
        Self {
            ids: IdentityAllocator::new(),
            registry: ComponentRegistry::new(),
            entities: BTreeMap::new(),
            signals: Box::new(signals),
            chunk_size,
            tick: 0,
        }
    }

    /// World backed by an in-memory queue; the returned handle observes
    /// every signal the world emits.
    pub fn with_signal_queue(chunk_size: ChunkSize) -> (Self, SignalQueue) {
        let queue = SignalQueue::new();
        (Self::new(chunk_size, queue.clone()), queue)
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Move to the next tick and describe it.
    pub fn advance(&mut self, dt: f64) -> Frame {
        self.tick += 1;
        Frame {
            tick: self.tick,
            dt,
            chunk_size: self.chunk_size,
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn ids(&self) -> &IdentityAllocator {
        &self.ids
    }

    /// Create a new entity
    pub fn spawn(&mut self) -> EntityId {
        let id = self.ids.next_entity();
        let previous = self.entities.insert(id, Entity::new(id));
        assert!(previous.is_none(), "entity id {id} issued twice");
        debug!(entity = %id, "spawned");
        id
    }

    pub fn spawn_at(&mut self, position: Position) -> EntityId {
        let id = self.spawn();
        let chunk_size = self.chunk_size;
        if let Some(entity) = self.entities.get_mut(&id) {
            *entity.spatial_mut() = Spatial::at(position, chunk_size);
        }
        id
    }

    pub fn entity(&self, id: EntityId) -> EcsResult<&Entity> {
        self.entities.get(&id).ok_or(EcsError::EntityNotFound(id))
    }

    /// Entity bound to this world, so component traffic reaches the registry.
    pub fn entity_mut(&mut self, id: EntityId) -> EcsResult<EntityMut<'_>> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::EntityNotFound(id))?;
        Ok(EntityMut {
            entity,
            registry: &mut self.registry,
            ids: &mut self.ids,
            signals: self.signals.as_mut(),
        })
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn alive_count(&self) -> usize {
        self.entities.values().filter(|e| e.is_alive()).count()
    }

    pub fn component_count(&self) -> usize {
        self.registry.total()
    }

    pub fn attach_component(
        &mut self,
        entity: EntityId,
        component: impl Component,
    ) -> EcsResult<ComponentHandle> {
        Ok(self.entity_mut(entity)?.add_component(component))
    }

    /// Detach without reloading siblings. Unknown owners and missing
    /// buckets are tolerated so mass teardown can overlap.
    pub fn detach_component(&mut self, handle: ComponentHandle) -> Option<Attached> {
        let Some(entity) = self.entities.get_mut(&handle.entity) else {
            warn!(entity = %handle.entity, component = %handle.id, "owner gone, skipping detach");
            return None;
        };
        self.registry.detach_component(handle, entity)
    }

    pub fn remove_component(
        &mut self,
        handle: ComponentHandle,
        reload: bool,
    ) -> EcsResult<Option<Attached>> {
        self.entity_mut(handle.entity)?.remove_component(handle, reload)
    }

    pub fn get_component(&self, kind: ComponentKind, id: ComponentId) -> EcsResult<&Attached> {
        let handle = self.registry.get_component(kind, id)?;
        self.component(handle)
    }

    pub fn get_component_mut(
        &mut self,
        kind: ComponentKind,
        id: ComponentId,
    ) -> EcsResult<&mut Attached> {
        let handle = self.registry.get_component(kind, id)?;
        self.component_mut(handle)
    }

    pub fn component(&self, handle: ComponentHandle) -> EcsResult<&Attached> {
        let entity = self.entity(handle.entity)?;
        entity.component_by_id(handle.id)
    }

    pub fn component_mut(&mut self, handle: ComponentHandle) -> EcsResult<&mut Attached> {
        let entity = self
            .entities
            .get_mut(&handle.entity)
            .ok_or(EcsError::EntityNotFound(handle.entity))?;
        entity.component_by_id_mut(handle.id)
    }

    pub fn component_as<T: Component>(&self, handle: ComponentHandle) -> EcsResult<&T> {
        let attached = self.component(handle)?;
        let actual = attached.kind();
        attached.downcast_ref::<T>().ok_or(EcsError::KindMismatch {
            id: handle.id,
            expected: handle.kind,
            actual,
        })
    }

    pub fn component_as_mut<T: Component>(&mut self, handle: ComponentHandle) -> EcsResult<&mut T> {
        let attached = self.component_mut(handle)?;
        let actual = attached.kind();
        attached.downcast_mut::<T>().ok_or(EcsError::KindMismatch {
            id: handle.id,
            expected: handle.kind,
            actual,
        })
    }

    /// Lazy walk over a snapshot of the `kind` bucket.
    pub fn iter_components(&self, kind: ComponentKind) -> EcsResult<ComponentIter> {
        self.registry.iter_components(kind)
    }

    /// Every live component of `kind`, resolved through its owner.
    pub fn get_components(&self, kind: ComponentKind) -> EcsResult<Vec<&Attached>> {
        self.registry
            .get_components(kind)?
            .into_iter()
            .map(|handle| self.component(handle))
            .collect()
    }

    pub fn set_alive(&mut self, id: EntityId, alive: bool) -> EcsResult<bool> {
        Ok(self.entity_mut(id)?.set_alive(alive))
    }

    /// Detach everything from `id`. The entity itself stays.
    pub fn clean(&mut self, id: EntityId) -> EcsResult<usize> {
        Ok(self.entity_mut(id)?.clean())
    }

    /// Kill, tear down and drop an entity.
    pub fn despawn(&mut self, id: EntityId) -> EcsResult<Entity> {
        {
            let mut entity = self.entity_mut(id)?;
            entity.set_alive(false);
            entity.clean();
        }
        self.entities
            .remove(&id)
            .ok_or(EcsError::EntityNotFound(id))
    }

    /// Tear down and drop every entity that is no longer alive.
    pub fn reap_dead(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| !e.is_alive())
            .map(Entity::id)
            .collect();
        for &id in &dead {
            if let Ok(mut entity) = self.entity_mut(id) {
                entity.clean();
            }
            self.entities.remove(&id);
            debug!(entity = %id, "reaped");
        }
        dead
    }

    /// Run every live entity's update for `frame`.
    pub fn update_entities(&mut self, frame: &Frame) {
        for entity in self.entities.values_mut() {
            if entity.is_alive() {
                entity.update(frame);
            }
        }
    }

    pub fn debug_entities(&self) {
        for entity in self.entities.values() {
            debug!(entity = %entity.id(), alive = entity.is_alive(), components = entity.component_count(), "entity");
            entity.debug();
        }
    }

    /// Chunks the camera component behind `camera` currently sees.
    pub fn visible_chunks(&self, camera: ComponentHandle) -> EcsResult<VisibleChunks> {
        let component = self.component_as::<Camera2D>(camera)?;
        let owner = self.entity(camera.entity)?;
        Ok(component.visible_chunks(owner.spatial().chunk()))
    }

    pub fn audit(&self) -> EcsResult<()> {
        self.registry.audit(&self.entities)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(ChunkSize::default(), SignalQueue::new())
    }
}

/// An entity together with the world pieces it needs: the registry for
/// component traffic and the bus for its death signal.
pub struct EntityMut<'w> {
    entity: &'w mut Entity,
    registry: &'w mut ComponentRegistry,
    ids: &'w mut IdentityAllocator,
    signals: &'w mut (dyn SignalBus + 'static),
}

impl EntityMut<'_> {
    pub fn add_component(&mut self, component: impl Component) -> ComponentHandle {
        self.add_boxed(Box::new(component))
    }

    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> ComponentHandle {
        self.registry
            .attach_component(self.ids, component, self.entity)
    }

    /// Remove one component. With `reload` the remaining components get
    /// their post-attach hook again.
    pub fn remove_component(
        &mut self,
        handle: ComponentHandle,
        reload: bool,
    ) -> EcsResult<Option<Attached>> {
        if handle.entity != self.entity.id() {
            return Err(EcsError::NotAttached {
                entity: self.entity.id(),
                id: handle.id,
            });
        }
        Ok(self.registry.unlink(handle, self.entity, reload))
    }

    pub fn set_alive(&mut self, alive: bool) -> bool {
        self.entity.set_alive(alive, self.signals)
    }

    /// Detach a snapshot of everything currently attached. Returns how many
    /// components were detached.
    pub fn clean(&mut self) -> usize {
        let mut detached = 0;
        for handle in self.entity.handles() {
            if self
                .registry
                .detach_component(handle, self.entity)
                .is_some()
            {
                detached += 1;
            }
        }
        detached
    }
}

impl Deref for EntityMut<'_> {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &*self.entity
    }
}

impl DerefMut for EntityMut<'_> {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut *self.entity
    }
}
