//! Built-in component variants

use std::any::Any;

use tracing::debug;

use crate::ecs::{Component, ComponentId, ComponentKind, EntityId, Siblings, UpdateContext};
use crate::spatial::Position;

/// Constant velocity in pixels per second.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub velocity: Position,
}

impl Motion {
    pub const KIND: ComponentKind = ComponentKind::new("motion");

    pub fn new(dx: f32, dy: f32) -> Self {
        Self {
            velocity: Position::new(dx, dy),
        }
    }
}

impl Component for Motion {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let next = ctx.spatial.position() + self.velocity * ctx.frame.dt as f32;
        ctx.spatial.move_to(next, ctx.frame.chunk_size);
    }

    fn debug(&self, owner: EntityId, id: ComponentId) {
        debug!(%owner, %id, dx = self.velocity.x, dy = self.velocity.y, "motion");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Drawable that tracks which sibling drives its movement. The sibling is
/// re-resolved whenever the owner's component set changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sprite {
    pub layer: i32,
    motion: Option<ComponentId>,
    resolves: u32,
}

impl Sprite {
    pub const KIND: ComponentKind = ComponentKind::new("sprite");

    pub fn new(layer: i32) -> Self {
        Self {
            layer,
            ..Self::default()
        }
    }

    /// The `Motion` sibling seen at the last resolve, if any.
    pub fn motion(&self) -> Option<ComponentId> {
        self.motion
    }

    /// How many times the sibling lookup has run.
    pub fn resolves(&self) -> u32 {
        self.resolves
    }
}

impl Component for Sprite {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if ctx.spatial.zlayer() != self.layer {
            ctx.spatial.set_zlayer(self.layer);
        }
        ctx.attributes.insert("moving", self.motion.is_some());
    }

    fn debug(&self, owner: EntityId, id: ComponentId) {
        debug!(%owner, %id, layer = self.layer, motion = ?self.motion, "sprite");
    }

    fn post_attach(&mut self, siblings: &Siblings<'_>) {
        self.motion = siblings.first_of(Motion::KIND);
        self.resolves += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Remaining ticks before the owner dies. Counted down in bulk by
/// [`LifetimeSystem`](crate::systems::LifetimeSystem).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifetime {
    pub remaining: u32,
}

impl Lifetime {
    pub const KIND: ComponentKind = ComponentKind::new("lifetime");

    pub fn new(ticks: u32) -> Self {
        Self { remaining: ticks }
    }

    /// Count one tick down; true once nothing is left.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

impl Component for Lifetime {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    fn debug(&self, owner: EntityId, id: ComponentId) {
        debug!(%owner, %id, remaining = self.remaining, "lifetime");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
