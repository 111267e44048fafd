//! Component contract and attachment records
//!
//! Components are plain values implementing [`Component`]. Once attached they
//! live inside their owning [`Entity`](super::Entity) wrapped in an
//! [`Attached`] record, which carries the id, the owner back-reference, the
//! kind tag and the free-form attribute bag.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::entity::Spatial;
use super::{ComponentId, EntityId};
use crate::spatial::ChunkSize;

/// Explicit type tag used to index components. Two kinds are the same iff
/// their names are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ComponentKind(&'static str);

impl ComponentKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Ad hoc per-component state. No coordination is provided between
/// components that read and write the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: HashMap<String, Value>,
}

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Timing and world constants for the tick being processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tick: u64,
    pub dt: f64,
    pub chunk_size: ChunkSize,
}

/// What a component may touch while updating: its owner's spatial state and
/// its own attribute bag.
pub struct UpdateContext<'a> {
    pub entity: EntityId,
    pub component: ComponentId,
    pub frame: &'a Frame,
    pub spatial: &'a mut Spatial,
    pub attributes: &'a mut Attributes,
}

/// The owner's component set as seen from one member during `post_attach`.
pub struct Siblings<'a> {
    owner: EntityId,
    this: ComponentId,
    members: &'a [(ComponentId, ComponentKind)],
}

impl<'a> Siblings<'a> {
    pub(crate) fn new(
        owner: EntityId,
        this: ComponentId,
        members: &'a [(ComponentId, ComponentKind)],
    ) -> Self {
        Self {
            owner,
            this,
            members,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Id of the component the hook is running on.
    pub fn this(&self) -> ComponentId {
        self.this
    }

    /// Every other component on the owner, in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, ComponentKind)> + '_ {
        let this = self.this;
        self.members.iter().copied().filter(move |(id, _)| *id != this)
    }

    pub fn of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = ComponentId> + '_ {
        self.iter()
            .filter(move |(_, k)| *k == kind)
            .map(|(id, _)| id)
    }

    /// Earliest-attached sibling of `kind`.
    pub fn first_of(&self, kind: ComponentKind) -> Option<ComponentId> {
        self.of_kind(kind).next()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability contract every component variant implements.
pub trait Component: Any {
    fn kind(&self) -> ComponentKind;

    /// Per-tick behavior, called in attachment order by the owner.
    fn update(&mut self, ctx: &mut UpdateContext<'_>);

    /// Diagnostics only. May do nothing.
    fn debug(&self, owner: EntityId, id: ComponentId);

    /// Runs once on attach, and again on every remaining component when a
    /// sibling is removed with reload. Must be idempotent and cheap.
    fn post_attach(&mut self, _siblings: &Siblings<'_>) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Lightweight reference to an attached component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ComponentHandle {
    pub id: ComponentId,
    pub kind: ComponentKind,
    pub entity: EntityId,
}

/// A component bound to its owner.
pub struct Attached {
    id: ComponentId,
    owner: EntityId,
    kind: ComponentKind,
    attributes: Attributes,
    component: Box<dyn Component>,
}

impl Attached {
    pub(crate) fn new(id: ComponentId, owner: EntityId, component: Box<dyn Component>) -> Self {
        Self {
            id,
            owner,
            kind: component.kind(),
            attributes: Attributes::default(),
            component,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn handle(&self) -> ComponentHandle {
        ComponentHandle {
            id: self.id,
            kind: self.kind,
            entity: self.owner,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub fn component_mut(&mut self) -> &mut dyn Component {
        self.component.as_mut()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.component.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.component.as_any_mut().downcast_mut::<T>()
    }

    pub fn into_inner(self) -> Box<dyn Component> {
        self.component
    }

    pub(crate) fn run_post_attach(&mut self, members: &[(ComponentId, ComponentKind)]) {
        let siblings = Siblings::new(self.owner, self.id, members);
        self.component.post_attach(&siblings);
    }

    pub(crate) fn run_update(&mut self, frame: &Frame, spatial: &mut Spatial) {
        let mut ctx = UpdateContext {
            entity: self.owner,
            component: self.id,
            frame,
            spatial,
            attributes: &mut self.attributes,
        };
        self.component.update(&mut ctx);
    }
}

impl fmt::Debug for Attached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attached")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}
