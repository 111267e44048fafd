use std::any::Any;

use tracing::debug;

use super::{ChunkCoord, VisibleChunks};
use crate::ecs::{Component, ComponentId, ComponentKind, EntityId, UpdateContext};

/// 2D camera behavior attached to an ordinary entity. It has no grid of its
/// own; visibility is centered on whatever chunk the owner is in.
#[derive(Debug, Clone)]
pub struct Camera2D {
    render_distance: u16,
}

impl Camera2D {
    pub const KIND: ComponentKind = ComponentKind::new("camera2d");

    pub fn new(render_distance: u16) -> Self {
        Self { render_distance }
    }

    pub fn render_distance(&self) -> u16 {
        self.render_distance
    }

    pub fn set_render_distance(&mut self, render_distance: u16) {
        self.render_distance = render_distance;
    }

    /// Chunks visible around `center`, computed fresh on every call.
    pub fn visible_chunks(&self, center: ChunkCoord) -> VisibleChunks {
        VisibleChunks::new(center, self.render_distance)
    }
}

impl Component for Camera2D {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    // The owner's chunk is kept in step by whatever moves it.
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    fn debug(&self, owner: EntityId, id: ComponentId) {
        debug!(
            %owner,
            %id,
            render_distance = self.render_distance,
            "camera2d"
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Motion;
    use crate::ecs::World;
    use crate::signal::SignalQueue;
    use crate::spatial::{ChunkSize, Position};

    #[test]
    fn test_visible_chunks_around_center() {
        let camera = Camera2D::new(1);
        let chunks: Vec<(i32, i32)> = camera
            .visible_chunks(ChunkCoord::new(2, 0))
            .map(|c| (c.x, c.y))
            .collect();

        assert_eq!(chunks, vec![(1, -1), (1, 0), (2, -1), (2, 0)]);
    }

    #[test]
    fn test_camera_keeps_previous_chunk_of_moving_owner() {
        let mut world = World::new(ChunkSize::new(4096, 4096), SignalQueue::new());
        let id = world.spawn_at(Position::new(4000.0, 0.0));
        world.attach_component(id, Motion::new(200.0, 0.0)).unwrap();
        world.attach_component(id, Camera2D::new(1)).unwrap();

        let frame = world.advance(1.0);
        world.update_entities(&frame);

        let spatial = world.entity(id).unwrap().spatial();
        assert_eq!(spatial.position(), Position::new(4200.0, 0.0));
        assert_eq!(spatial.chunk(), ChunkCoord::new(1, 0));
        assert_eq!(spatial.previous_chunk(), ChunkCoord::new(0, 0));
    }

    #[test]
    fn test_camera_follows_world_grid() {
        let mut world = World::new(ChunkSize::new(100, 100), SignalQueue::new());
        let id = world.spawn_at(Position::new(250.0, 0.0));
        let camera = world.attach_component(id, Camera2D::new(2)).unwrap();

        let frame = world.advance(1.0);
        world.update_entities(&frame);

        assert_eq!(world.entity(id).unwrap().spatial().chunk(), ChunkCoord::new(2, 0));
        let visible = world.visible_chunks(camera).unwrap();
        assert_eq!(visible.center(), ChunkCoord::new(2, 0));
        assert_eq!(visible.len(), 16);
    }
}
