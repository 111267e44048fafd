//! Entity/component bookkeeping
//!
//! Entities own their components; the [`ComponentRegistry`] indexes every
//! attached component by kind and id. All attach/detach traffic goes through
//! the registry (usually via [`World`] or [`EntityMut`]) so both indices stay
//! consistent.

pub mod component;
pub mod entity;
pub mod error;
pub mod id;
pub mod registry;
pub mod world;

pub use component::{
    Attached, Attributes, Component, ComponentHandle, ComponentKind, Frame, Siblings,
    UpdateContext,
};
pub use entity::{Entity, EntityBehavior, Spatial};
pub use error::{EcsError, EcsResult};
pub use id::{ComponentId, EntityId, IdentityAllocator};
pub use registry::{ComponentIter, ComponentRegistry};
pub use world::{EntityMut, World};
