//! Type-indexed component registry
//!
//! The registry owns no components; entities do. It keeps the authoritative
//! secondary index `kind -> (component id -> owner)` and is the only path
//! through which components get attached or detached, so the two indices
//! never disagree between calls.

use std::collections::{BTreeMap, HashMap};
use std::vec;

use tracing::{debug, warn};

use super::component::Attached;
use super::{
    Component, ComponentHandle, ComponentId, ComponentKind, EcsError, EcsResult, Entity, EntityId,
    IdentityAllocator,
};

#[derive(Debug, Default)]
pub struct ComponentRegistry {
    buckets: HashMap<ComponentKind, BTreeMap<ComponentId, EntityId>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket for `kind` so queries on it succeed before
    /// the first instance is attached. Returns false if it already existed.
    pub fn register_kind(&mut self, kind: ComponentKind) -> bool {
        if self.buckets.contains_key(&kind) {
            return false;
        }
        self.buckets.insert(kind, BTreeMap::new());
        true
    }

    pub fn is_registered(&self, kind: ComponentKind) -> bool {
        self.buckets.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<ComponentKind> {
        let mut kinds: Vec<_> = self.buckets.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Live components of `kind`; zero for unknown kinds.
    pub fn len(&self, kind: ComponentKind) -> usize {
        self.buckets.get(&kind).map_or(0, BTreeMap::len)
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn contains(&self, handle: ComponentHandle) -> bool {
        self.buckets
            .get(&handle.kind)
            .and_then(|bucket| bucket.get(&handle.id))
            == Some(&handle.entity)
    }

    /// Give `component` a fresh id, link it into `entity` and the kind
    /// bucket, then run its post-attach hook. Siblings are not notified.
    pub fn attach_component(
        &mut self,
        ids: &mut IdentityAllocator,
        component: Box<dyn Component>,
        entity: &mut Entity,
    ) -> ComponentHandle {
        let id = ids.next_component();
        let attached = Attached::new(id, entity.id(), component);
        let handle = attached.handle();

        entity.link(attached);
        let previous = self
            .buckets
            .entry(handle.kind)
            .or_default()
            .insert(id, handle.entity);
        assert!(previous.is_none(), "component id {id} indexed twice");

        entity.run_post_attach(id);
        debug!(entity = %handle.entity, component = %id, kind = %handle.kind, "attached");
        handle
    }

    /// Unlink a component from its owner and from the index without
    /// reloading siblings. Detaching something already gone is a no-op.
    pub fn detach_component(
        &mut self,
        handle: ComponentHandle,
        entity: &mut Entity,
    ) -> Option<Attached> {
        self.unlink(handle, entity, false)
    }

    pub(crate) fn unlink(
        &mut self,
        handle: ComponentHandle,
        entity: &mut Entity,
        reload: bool,
    ) -> Option<Attached> {
        if !self.buckets.contains_key(&handle.kind) {
            warn!(component = %handle.id, kind = %handle.kind, "no bucket for kind, skipping detach");
            return None;
        }
        assert_eq!(
            entity.id(),
            handle.entity,
            "component {} detached through the wrong entity",
            handle.id
        );

        let Some(removed) = entity.remove_component(handle.id, reload) else {
            warn!(entity = %handle.entity, component = %handle.id, "component already detached");
            return None;
        };
        let indexed = self
            .buckets
            .get_mut(&removed.kind())
            .and_then(|bucket| bucket.remove(&handle.id));
        assert!(
            indexed.is_some(),
            "component {} was attached to {} but missing from the index",
            handle.id,
            handle.entity
        );

        debug!(entity = %handle.entity, component = %handle.id, kind = %removed.kind(), reload, "detached");
        Some(removed)
    }

    /// Owner of the component `id` of `kind`.
    pub fn get_component(&self, kind: ComponentKind, id: ComponentId) -> EcsResult<ComponentHandle> {
        let bucket = self.bucket(kind)?;
        let entity = bucket
            .get(&id)
            .copied()
            .ok_or(EcsError::ComponentNotFound { kind, id })?;
        Ok(ComponentHandle { id, kind, entity })
    }

    /// Snapshot of the bucket at call time; attaching or detaching while
    /// the iterator is alive does not affect what it yields.
    pub fn iter_components(&self, kind: ComponentKind) -> EcsResult<ComponentIter> {
        Ok(ComponentIter {
            inner: self.get_components(kind)?.into_iter(),
        })
    }

    pub fn get_components(&self, kind: ComponentKind) -> EcsResult<Vec<ComponentHandle>> {
        let bucket = self.bucket(kind)?;
        Ok(bucket
            .iter()
            .map(|(&id, &entity)| ComponentHandle { id, kind, entity })
            .collect())
    }

    /// Cross-check the index against the entities that own the components.
    pub fn audit(&self, entities: &BTreeMap<EntityId, Entity>) -> EcsResult<()> {
        for (&kind, bucket) in &self.buckets {
            for (&id, &owner) in bucket {
                let entity = entities.get(&owner).ok_or_else(|| {
                    EcsError::IndexCorrupted(format!("{id} indexed under missing entity {owner}"))
                })?;
                let attached = entity.component_by_id(id).map_err(|_| {
                    EcsError::IndexCorrupted(format!("{id} indexed but not attached to {owner}"))
                })?;
                if attached.kind() != kind {
                    return Err(EcsError::IndexCorrupted(format!(
                        "{id} indexed as `{kind}` but is a `{}`",
                        attached.kind()
                    )));
                }
            }
        }

        for entity in entities.values() {
            for attached in entity.components() {
                if !self.contains(attached.handle()) {
                    return Err(EcsError::IndexCorrupted(format!(
                        "{} attached to {} but not indexed",
                        attached.id(),
                        entity.id()
                    )));
                }
            }
        }
        Ok(())
    }

    fn bucket(&self, kind: ComponentKind) -> EcsResult<&BTreeMap<ComponentId, EntityId>> {
        self.buckets.get(&kind).ok_or(EcsError::UnknownKind(kind))
    }
}

/// Iterator over a point-in-time copy of one kind bucket.
#[derive(Debug, Clone)]
pub struct ComponentIter {
    inner: vec::IntoIter<ComponentHandle>,
}

impl Iterator for ComponentIter {
    type Item = ComponentHandle;

    fn next(&mut self) -> Option<ComponentHandle> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ComponentIter {}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::ecs::UpdateContext;

    struct Health(u32);

    impl Health {
        const KIND: ComponentKind = ComponentKind::new("health");
    }

    impl Component for Health {
        fn kind(&self) -> ComponentKind {
            Self::KIND
        }

        fn update(&mut self, _ctx: &mut UpdateContext<'_>) {
            self.0 = self.0.saturating_sub(1);
        }

        fn debug(&self, _owner: EntityId, _id: ComponentId) {}

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn setup() -> (ComponentRegistry, IdentityAllocator, BTreeMap<EntityId, Entity>) {
        let mut ids = IdentityAllocator::new();
        let mut entities = BTreeMap::new();
        for _ in 0..2 {
            let id = ids.next_entity();
            entities.insert(id, Entity::new(id));
        }
        (ComponentRegistry::new(), ids, entities)
    }

    #[test]
    fn test_attach_links_both_indices() {
        let (mut registry, mut ids, mut entities) = setup();
        let owner = EntityId::from_raw(1);
        let entity = entities.get_mut(&owner).unwrap();

        let handle = registry.attach_component(&mut ids, Box::new(Health(5)), entity);

        assert_eq!(handle.entity, owner);
        assert!(entity.contains(handle.id));
        assert!(registry.contains(handle));
        assert_eq!(registry.get_component(Health::KIND, handle.id).unwrap(), handle);
        registry.audit(&entities).unwrap();
    }

    #[test]
    fn test_detach_unlinks_both_indices() {
        let (mut registry, mut ids, mut entities) = setup();
        let entity = entities.get_mut(&EntityId::from_raw(2)).unwrap();
        let handle = registry.attach_component(&mut ids, Box::new(Health(5)), entity);

        let removed = registry.detach_component(handle, entity).unwrap();
        assert_eq!(removed.downcast_ref::<Health>().unwrap().0, 5);
        assert!(!entity.contains(handle.id));
        assert!(!registry.contains(handle));
        assert_eq!(registry.len(Health::KIND), 0);
        assert!(registry.is_registered(Health::KIND));

        assert!(registry.detach_component(handle, entity).is_none());
        registry.audit(&entities).unwrap();
    }

    #[test]
    fn test_detach_without_bucket_is_noop() {
        let (mut registry, _, mut entities) = setup();
        let entity = entities.get_mut(&EntityId::from_raw(1)).unwrap();
        let handle = ComponentHandle {
            id: ComponentId::from_raw(99),
            kind: Health::KIND,
            entity: entity.id(),
        };

        assert!(registry.detach_component(handle, entity).is_none());
        assert!(!registry.is_registered(Health::KIND));
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let (mut registry, mut ids, mut entities) = setup();

        assert_eq!(
            registry.get_components(Health::KIND).unwrap_err(),
            EcsError::UnknownKind(Health::KIND)
        );
        assert!(registry.iter_components(Health::KIND).is_err());

        let entity = entities.get_mut(&EntityId::from_raw(1)).unwrap();
        registry.attach_component(&mut ids, Box::new(Health(1)), entity);
        let missing = ComponentId::from_raw(42);
        assert_eq!(
            registry.get_component(Health::KIND, missing).unwrap_err(),
            EcsError::ComponentNotFound {
                kind: Health::KIND,
                id: missing
            }
        );
    }

    #[test]
    fn test_iteration_is_a_snapshot() {
        let (mut registry, mut ids, mut entities) = setup();
        let owner = EntityId::from_raw(1);
        for hp in 0..3 {
            let entity = entities.get_mut(&owner).unwrap();
            registry.attach_component(&mut ids, Box::new(Health(hp)), entity);
        }

        let iter = registry.iter_components(Health::KIND).unwrap();
        let entity = entities.get_mut(&owner).unwrap();
        registry.attach_component(&mut ids, Box::new(Health(10)), entity);
        let first = registry.get_components(Health::KIND).unwrap()[0];
        registry.detach_component(first, entity);

        let seen: Vec<_> = iter.map(|h| h.id.raw()).collect();
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(registry.len(Health::KIND), 3);
    }

    #[test]
    fn test_register_kind_allows_empty_queries() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.register_kind(Health::KIND));
        assert!(!registry.register_kind(Health::KIND));
        assert_eq!(registry.get_components(Health::KIND).unwrap().len(), 0);
        assert_eq!(registry.kinds(), vec![Health::KIND]);
    }

    #[test]
    fn test_audit_detects_unindexed_component() {
        let (registry, _, mut entities) = setup();
        let entity = entities.get_mut(&EntityId::from_raw(1)).unwrap();
        let id = ComponentId::from_raw(1);
        entity.link(Attached::new(id, entity.id(), Box::new(Health(1))));

        assert!(matches!(
            registry.audit(&entities),
            Err(EcsError::IndexCorrupted(_))
        ));
    }
}
